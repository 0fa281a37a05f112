// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::spanned_text::NEWLINE;
use crate::spans::is_native_void;
use crate::{
    BlockKind, HtmlTag, Span, SpanId, SpanKind, SpannedText,
    END_OF_BUFFER_MARKER, OBJECT_REPLACEMENT_CHAR,
};

#[derive(Debug)]
struct OpenElement {
    tag: String,
    /// `None` for elements a plugin consumed itself.
    span: Option<SpanId>,
    start: usize,
    is_block: bool,
    is_preformat: bool,
}

/// Output state threaded through one parse and handed to every tag and
/// comment handler.
///
/// The nesting level is the number of currently open block elements, so it
/// is always derived from the open-element stack rather than kept as a
/// separate counter.
#[derive(Debug)]
pub struct ParseContext {
    output: SpannedText,
    open: Vec<OpenElement>,
    /// Buffer length right after the most recent closing newline.
    closing_newline_end: Option<usize>,
    /// Set after `<pre>` opens, so one leading newline can be dropped.
    at_preformat_start: bool,
}

impl ParseContext {
    pub(crate) fn new() -> Self {
        Self {
            output: SpannedText::unterminated(),
            open: Vec::new(),
            closing_newline_end: None,
            at_preformat_start: false,
        }
    }

    pub fn nesting_level(&self) -> usize {
        self.open.iter().filter(|el| el.is_block).count()
    }

    /// Current output position in UTF-16 code units.
    pub fn position(&self) -> usize {
        self.output.len()
    }

    pub fn in_preformat(&self) -> bool {
        self.open.iter().any(|el| el.is_preformat)
    }

    pub fn output(&self) -> &SpannedText {
        &self.output
    }

    /// Appends text exactly as given, without whitespace handling.
    pub fn append_text(&mut self, text: &str) {
        self.at_preformat_start = false;
        self.output.push_str_unadjusted(text);
    }

    /// Appends one placeholder character covered by a span of `kind`.
    /// A `br` stands on a newline, everything else on `U+FFFC`.
    pub fn append_placeholder(
        &mut self,
        kind: SpanKind,
        tag: &HtmlTag,
    ) -> Option<SpanId> {
        let start = self.position();
        let c = if tag.name == "br" {
            NEWLINE
        } else {
            OBJECT_REPLACEMENT_CHAR
        };
        self.at_preformat_start = false;
        self.output.push_char_unadjusted(c);
        let mut span = Span::new(
            kind,
            tag.name.as_str(),
            tag.attributes.clone(),
            self.nesting_level(),
        );
        span.self_closing = tag.self_closing;
        self.output.add_span(span, start, start + 1).ok()
    }

    /// Text from the source, with HTML whitespace rules applied.
    pub(crate) fn append_source_text(&mut self, text: &str) {
        let text = text.replace(END_OF_BUFFER_MARKER, "");
        if self.in_preformat() {
            let text: &str = if self.at_preformat_start {
                text.strip_prefix('\n').unwrap_or(&text)
            } else {
                &text
            };
            self.append_text(text);
            return;
        }

        let is_layout_whitespace = text.trim().is_empty()
            && text.contains(|c| c == '\n' || c == '\r');
        if is_layout_whitespace {
            return;
        }

        let normalized: String = text
            .chars()
            .filter(|c| *c != '\r')
            .map(|c| if c == '\n' { ' ' } else { c })
            .collect();
        self.append_text(&normalized);
    }

    /// Starts a span for `tag`. Blocks begin on a fresh line; voids are
    /// written immediately.
    pub(crate) fn open(&mut self, tag: &HtmlTag, kind: SpanKind) {
        match kind {
            SpanKind::Block(block) => self.open_block(tag, block),
            SpanKind::Inline(_) => {
                let start = self.position();
                let span = Span::new(
                    kind,
                    tag.name.as_str(),
                    tag.attributes.clone(),
                    self.nesting_level(),
                );
                let id = self.output.add_span(span, start, start).ok();
                self.open.push(OpenElement {
                    tag: tag.name.clone(),
                    span: id,
                    start,
                    is_block: false,
                    is_preformat: false,
                });
            }
            SpanKind::Void | SpanKind::Comment(_) | SpanKind::Unknown(_) => {
                self.append_placeholder(kind, tag);
            }
        }
    }

    fn open_block(&mut self, tag: &HtmlTag, kind: BlockKind) {
        let len = self.position();
        if len > 0 && !self.output.is_newline_at(len - 1) {
            self.output.push_char_unadjusted(NEWLINE);
        }
        let start = self.position();
        let span = Span::new(
            SpanKind::Block(kind),
            tag.name.as_str(),
            tag.attributes.clone(),
            self.nesting_level(),
        );
        let id = self.output.add_span(span, start, start).ok();
        let is_preformat = kind == BlockKind::Preformat;
        self.at_preformat_start = is_preformat;
        self.open.push(OpenElement {
            tag: tag.name.clone(),
            span: id,
            start,
            is_block: true,
            is_preformat,
        });
    }

    /// Records a tag a plugin consumed, so its close tag is swallowed.
    pub(crate) fn open_consumed(&mut self, tag: &HtmlTag) {
        if tag.self_closing || is_native_void(&tag.name) {
            return;
        }
        self.open.push(OpenElement {
            tag: tag.name.clone(),
            span: None,
            start: self.position(),
            is_block: false,
            is_preformat: false,
        });
    }

    /// Closes the most recent open element named `name` and everything
    /// opened after it. Returns false when nothing matched.
    pub(crate) fn close(&mut self, name: &str) -> bool {
        match self.open.iter().rposition(|el| el.tag == name) {
            Some(index) => {
                self.close_down_to(index);
                true
            }
            None => false,
        }
    }

    fn close_down_to(&mut self, index: usize) {
        while self.open.len() > index {
            if let Some(element) = self.open.pop() {
                self.finish_element(element);
            }
        }
    }

    fn finish_element(&mut self, element: OpenElement) {
        let Some(id) = element.span else { return };
        let len = self.position();
        if element.is_block {
            if len == element.start || self.closing_newline_end != Some(len) {
                self.output.push_char_unadjusted(NEWLINE);
                self.closing_newline_end = Some(len + 1);
            }
            self.at_preformat_start = false;
            let end = self.position();
            self.output.set_span_range_unchecked(id, element.start, end);
        } else if len == element.start {
            self.output.remove_span(id);
        } else {
            self.output.set_span_range_unchecked(id, element.start, len);
        }
    }

    /// Closes what is still open and terminates the buffer with the
    /// end-of-buffer marker. A trailing closing newline becomes the marker.
    pub(crate) fn finish(mut self) -> SpannedText {
        self.close_down_to(0);
        let len = self.position();
        if len > 0 && self.closing_newline_end == Some(len) {
            self.output
                .replace_char_unadjusted(len - 1, END_OF_BUFFER_MARKER);
        } else {
            self.output.push_char_unadjusted(END_OF_BUFFER_MARKER);
        }
        self.output
    }
}

impl Default for ParseContext {
    fn default() -> Self {
        Self::new()
    }
}
