// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Converts HTML into a styled text buffer and back, and keeps the buffer's
//! block structure consistent while it is being edited.
//!
//! ```text
//! HTML ─▶ HtmlParser ─▶ SpannedText ─▶ Editor (EditRouter ─▶ BlockHandlers)
//!                                            │
//!                              HtmlSerializer ◀┘ ─▶ HTML
//! ```

mod attributes;
pub mod blocks;
mod coalescer;
mod editor;
mod errors;
pub mod parser;
mod router;
mod serializer;
mod spanned_text;
mod spans;

pub use crate::attributes::AttributeSet;
pub use crate::coalescer::{CoalescerConfig, EditCoalescer};
pub use crate::editor::{Editor, EditorConfig};
pub use crate::errors::{EditError, InvariantViolation, SpanRangeError};
pub use crate::parser::{
    parse_html, CommentHandler, HtmlParser, HtmlTag, ParseContext,
    ParseReport, TagAction, TagHandler,
};
pub use crate::router::{EditRouter, TextChange};
pub use crate::serializer::{to_html, HtmlSerializer, SpanHandler};
pub use crate::spanned_text::{
    SpanId, SpannedText, END_OF_BUFFER_MARKER, NEWLINE,
    OBJECT_REPLACEMENT_CHAR,
};
pub use crate::spans::{
    block_kind_for_tag, inline_kind_for_tag, kind_for_tag, BlockKind,
    InlineKind, Span, SpanKind,
};
