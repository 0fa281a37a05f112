// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! HTML to [crate::SpannedText].
//!
//! Parsing happens in two stages. html5ever's tokenizer produces a flat
//! token list ([token_collector]), then [HtmlParser] walks it and builds
//! spans through a [ParseContext], consulting the registered tag and
//! comment handler chains before its built-in rules.

mod context;
mod parse;
mod tag_handlers;
mod token_collector;

pub use context::ParseContext;
pub use parse::{parse_html, HtmlParser, ParseReport};
pub use tag_handlers::{CommentHandler, TagAction, TagHandler};
pub use token_collector::HtmlTag;
