// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::{HtmlTag, ParseContext, SpanKind};

/// What the parser should do with an opening tag a [TagHandler] claimed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagAction {
    /// Fall through to the built-in handling.
    Decline,
    /// Start a span of this kind, closed by the matching close tag.
    Open(SpanKind),
    /// The handler wrote its own output; the matching close tag is dropped.
    Handled,
    /// Capture the element's whole subtree as raw HTML and pass it to
    /// [TagHandler::handle_verbatim] instead of parsing it.
    Verbatim,
}

/// Parser plugin for opening tags. Handlers are consulted in registration
/// order and the first whose [TagHandler::can_handle_tag] accepts the tag
/// decides.
pub trait TagHandler {
    fn can_handle_tag(&self, tag: &HtmlTag) -> bool;

    fn handle_tag(&self, tag: &HtmlTag, cx: &mut ParseContext) -> TagAction;

    fn handle_verbatim(
        &self,
        _tag: &HtmlTag,
        _raw_html: &str,
        _cx: &mut ParseContext,
    ) {
    }
}

/// Parser plugin for comments. The first handler returning true stops the
/// chain; if none does, the comment is kept as a comment span.
pub trait CommentHandler {
    fn handle_comment(&self, text: &str, cx: &mut ParseContext) -> bool;
}
