// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The span taxonomy.
//!
//! | Class       | Covers                          | Start grows | End grows |
//! |-------------|---------------------------------|-------------|-----------|
//! | Block       | whole lines, closing newline    | yes         | no        |
//! | Inline      | characters                      | no          | yes       |
//! | Link        | characters                      | no          | no        |
//! | Void        | one `\n` (br) or `U+FFFC`       | no          | no        |
//! | Comment     | one `U+FFFC`                    | no          | no        |
//! | Unknown     | one `U+FFFC`, raw HTML attached | no          | no        |
//!
//! A zero-length span grows on insertion at its position if either flag is
//! set, which is what lets a freshly created empty block capture typing.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use strum_macros::{AsRefStr, Display, EnumString};

use crate::AttributeSet;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum InlineKind {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Link,
    Code,
    Superscript,
    Subscript,
    Big,
    Small,
    Monospace,
    Font,
    Generic,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum BlockKind {
    Heading,
    UnorderedList,
    OrderedList,
    ListItem,
    Quote,
    Preformat,
    Paragraph,
    Generic,
}

impl BlockKind {
    pub fn is_list(&self) -> bool {
        matches!(self, Self::UnorderedList | Self::OrderedList)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpanKind {
    Inline(InlineKind),
    Block(BlockKind),
    /// `br`, `hr`, `img`: one placeholder character, no closing tag.
    Void,
    /// An HTML comment, body without the `<!--`/`-->` delimiters.
    Comment(String),
    /// Raw HTML of an element the parser does not model.
    Unknown(String),
}

impl SpanKind {
    pub fn is_block(&self) -> bool {
        matches!(self, Self::Block(_))
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline(_))
    }

    /// Spans that stand in for a single placeholder character and serialize
    /// to a self-contained fragment.
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Void | Self::Comment(_) | Self::Unknown(_))
    }

    pub fn block_kind(&self) -> Option<BlockKind> {
        match self {
            Self::Block(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Default boundary growth as `(grows_at_start, grows_at_end)`.
    pub fn default_growth(&self) -> (bool, bool) {
        match self {
            Self::Block(_) => (true, false),
            Self::Inline(InlineKind::Link) => (false, false),
            Self::Inline(_) => (false, true),
            Self::Void | Self::Comment(_) | Self::Unknown(_) => (false, false),
        }
    }
}

/// A styled range over a [crate::SpannedText].
///
/// Ranges are half-open UTF-16 offsets and are owned by the buffer; read
/// them back through the buffer after any edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub kind: SpanKind,
    /// Tag name used for serialization, always lower case.
    pub tag: String,
    pub attributes: AttributeSet,
    pub nesting_level: usize,
    /// Whether the tag was written `<br/>` style in the source.
    pub self_closing: bool,
    pub grows_at_start: bool,
    pub grows_at_end: bool,
    pub(crate) start: usize,
    pub(crate) end: usize,
}

impl Span {
    pub fn new(
        kind: SpanKind,
        tag: impl Into<String>,
        attributes: AttributeSet,
        nesting_level: usize,
    ) -> Self {
        let (grows_at_start, grows_at_end) = kind.default_growth();
        Self {
            kind,
            tag: tag.into(),
            attributes,
            nesting_level,
            self_closing: false,
            grows_at_start,
            grows_at_end,
            start: 0,
            end: 0,
        }
    }

    pub fn block(kind: BlockKind, tag: &str, nesting_level: usize) -> Self {
        Self::new(
            SpanKind::Block(kind),
            tag,
            AttributeSet::new(),
            nesting_level,
        )
    }

    pub fn inline(kind: InlineKind, tag: &str) -> Self {
        Self::new(SpanKind::Inline(kind), tag, AttributeSet::new(), 0)
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_block(&self) -> bool {
        self.kind.is_block()
    }

    /// A copy of this span's style with no range, for splitting a block.
    pub fn clone_style(&self) -> Self {
        Self {
            start: 0,
            end: 0,
            ..self.clone()
        }
    }

    pub fn contains_range(&self, start: usize, end: usize) -> bool {
        self.start <= start && end <= self.end
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tag tables
// ────────────────────────────────────────────────────────────────────────────

static INLINE_TAGS: Lazy<HashMap<&'static str, InlineKind>> = Lazy::new(|| {
    HashMap::from([
        ("b", InlineKind::Bold),
        ("strong", InlineKind::Bold),
        ("i", InlineKind::Italic),
        ("em", InlineKind::Italic),
        ("cite", InlineKind::Italic),
        ("dfn", InlineKind::Italic),
        ("u", InlineKind::Underline),
        ("s", InlineKind::Strikethrough),
        ("strike", InlineKind::Strikethrough),
        ("del", InlineKind::Strikethrough),
        ("a", InlineKind::Link),
        ("code", InlineKind::Code),
        ("sup", InlineKind::Superscript),
        ("sub", InlineKind::Subscript),
        ("big", InlineKind::Big),
        ("small", InlineKind::Small),
        ("tt", InlineKind::Monospace),
        ("font", InlineKind::Font),
        ("span", InlineKind::Generic),
    ])
});

static BLOCK_TAGS: Lazy<HashMap<&'static str, BlockKind>> = Lazy::new(|| {
    HashMap::from([
        ("h1", BlockKind::Heading),
        ("h2", BlockKind::Heading),
        ("h3", BlockKind::Heading),
        ("h4", BlockKind::Heading),
        ("h5", BlockKind::Heading),
        ("h6", BlockKind::Heading),
        ("ul", BlockKind::UnorderedList),
        ("ol", BlockKind::OrderedList),
        ("li", BlockKind::ListItem),
        ("blockquote", BlockKind::Quote),
        ("pre", BlockKind::Preformat),
        ("p", BlockKind::Paragraph),
        ("div", BlockKind::Generic),
    ])
});

/// Elements that never have content or a closing tag in HTML.
static VOID_ELEMENTS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link",
        "meta", "param", "source", "track", "wbr",
    ]
});

pub fn inline_kind_for_tag(tag: &str) -> Option<InlineKind> {
    INLINE_TAGS.get(tag).copied()
}

pub fn block_kind_for_tag(tag: &str) -> Option<BlockKind> {
    BLOCK_TAGS.get(tag).copied()
}

/// Void tags the parser models natively.
pub fn is_native_void(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img")
}

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// The natively supported kind for a tag name, if any.
pub fn kind_for_tag(tag: &str) -> Option<SpanKind> {
    if let Some(kind) = block_kind_for_tag(tag) {
        Some(SpanKind::Block(kind))
    } else if let Some(kind) = inline_kind_for_tag(tag) {
        Some(SpanKind::Inline(kind))
    } else if is_native_void(tag) {
        Some(SpanKind::Void)
    } else {
        None
    }
}
