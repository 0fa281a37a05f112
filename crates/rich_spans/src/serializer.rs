// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! [SpannedText] to HTML.
//!
//! Blocks are written as a tree: a block's children are the blocks it
//! contains, ordered by start, then by length (longest first), then by
//! nesting level. Between and inside blocks, inline spans are synced run by
//! run against a stack of open tags, so block tags are never written inside
//! an inline pair and overlapping inline spans are closed and reopened
//! where they cross.
//!
//! A newline between text and a following block only separates the two and
//! is not written; other newlines become `<br>`, or stay raw inside `<pre>`.

use std::collections::HashSet;

use crate::spanned_text::{MARKER_UNIT, NEWLINE_UNIT};
use crate::{
    BlockKind, Span, SpanId, SpanKind, SpannedText, END_OF_BUFFER_MARKER,
    NEWLINE,
};

/// Serializer plugin for spans. The first handler whose
/// [SpanHandler::can_handle_span] accepts a span writes its tags.
pub trait SpanHandler {
    fn can_handle_span(&self, span: &Span) -> bool;

    fn handle_span_start(&self, html: &mut String, span: &Span);

    fn handle_span_end(&self, html: &mut String, span: &Span);
}

/// Serialize with no plugins registered.
pub fn to_html(text: &SpannedText) -> String {
    HtmlSerializer::new().serialize(text)
}

#[derive(Default)]
pub struct HtmlSerializer {
    span_handlers: Vec<Box<dyn SpanHandler>>,
}

impl HtmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_span_handler(
        &mut self,
        handler: Box<dyn SpanHandler>,
    ) -> &mut Self {
        self.span_handlers.push(handler);
        self
    }

    pub fn serialize(&self, text: &SpannedText) -> String {
        let mut blocks: Vec<(SpanId, &Span)> = text
            .spans()
            .filter(|(_, span)| span.is_block() && !span.is_empty())
            .collect();
        blocks.sort_by(|(a_id, a), (b_id, b)| {
            a.start()
                .cmp(&b.start())
                .then(b.end().cmp(&a.end()))
                .then(a.nesting_level.cmp(&b.nesting_level))
                .then(a_id.cmp(b_id))
        });

        let block_starts: HashSet<usize> =
            blocks.iter().map(|(_, span)| span.start()).collect();

        let mut writer = Writer {
            serializer: self,
            text,
            inline: text
                .spans()
                .filter(|(_, span)| !span.is_block() && !span.is_empty())
                .collect(),
            block_starts,
            preformat_depth: 0,
            html: String::new(),
        };
        let block_spans: Vec<&Span> = blocks.iter().map(|(_, s)| *s).collect();
        writer.write_container(&block_spans, 0, text.len());
        writer.html
    }

    fn handler_for(&self, span: &Span) -> Option<&dyn SpanHandler> {
        self.span_handlers
            .iter()
            .find(|handler| handler.can_handle_span(span))
            .map(|handler| handler.as_ref())
    }

    fn write_start(&self, html: &mut String, span: &Span) {
        if let Some(handler) = self.handler_for(span) {
            handler.handle_span_start(html, span);
            return;
        }
        match &span.kind {
            SpanKind::Comment(body) => {
                html.push_str("<!--");
                html.push_str(body);
                html.push_str("-->");
            }
            SpanKind::Unknown(raw) => html.push_str(raw),
            SpanKind::Void | SpanKind::Inline(_) | SpanKind::Block(_) => {
                html.push('<');
                html.push_str(&span.tag);
                if !span.attributes.is_empty() {
                    html.push(' ');
                    html.push_str(&span.attributes.serialize());
                }
                html.push_str(if span.self_closing { " />" } else { ">" });
            }
        }
    }

    fn write_end(&self, html: &mut String, span: &Span) {
        if let Some(handler) = self.handler_for(span) {
            handler.handle_span_end(html, span);
            return;
        }
        if !span.kind.is_placeholder() {
            html.push_str("</");
            html.push_str(&span.tag);
            html.push('>');
        }
    }
}

struct Writer<'a> {
    serializer: &'a HtmlSerializer,
    text: &'a SpannedText,
    /// Non-block spans, in insertion order.
    inline: Vec<(SpanId, &'a Span)>,
    /// Offsets where some non-empty block starts.
    block_starts: HashSet<usize>,
    preformat_depth: usize,
    html: String,
}

impl<'a> Writer<'a> {
    /// Writes `[start, end)` where `blocks` are all blocks inside it, sorted.
    fn write_container(
        &mut self,
        blocks: &[&'a Span],
        start: usize,
        end: usize,
    ) {
        let mut cursor = start;
        let mut i = 0;
        while i < blocks.len() {
            let child = blocks[i];
            let mut j = i + 1;
            while j < blocks.len()
                && child.contains_range(blocks[j].start(), blocks[j].end())
            {
                j += 1;
            }
            let before = child.start().min(end);
            if cursor < before {
                self.write_inline(cursor, before);
            }
            self.write_block(child, &blocks[i + 1..j]);
            cursor = cursor.max(child.end());
            i = j;
        }
        if cursor < end {
            self.write_inline(cursor, end);
        }
    }

    fn write_block(&mut self, block: &'a Span, descendants: &[&'a Span]) {
        let is_preformat = block.kind == SpanKind::Block(BlockKind::Preformat);
        self.serializer.write_start(&mut self.html, block);
        if is_preformat {
            self.preformat_depth += 1;
        }
        let content_end = self.content_end(block);
        self.write_container(descendants, block.start(), content_end);
        if is_preformat {
            self.preformat_depth -= 1;
        }
        self.serializer.write_end(&mut self.html, block);
    }

    /// A block's last character is dropped when it is the end-of-buffer
    /// marker or the newline closing the block.
    fn content_end(&self, block: &Span) -> usize {
        if block.is_empty() {
            return block.end();
        }
        let last = block.end() - 1;
        match self.text.unit_at(last) {
            Some(MARKER_UNIT) => last,
            Some(NEWLINE_UNIT) if self.placeholder_at(last).is_none() => last,
            _ => block.end(),
        }
    }

    fn placeholder_at(&self, index: usize) -> Option<&'a Span> {
        self.inline
            .iter()
            .map(|(_, span)| *span)
            .find(|span| span.kind.is_placeholder() && span.start() == index)
    }

    fn write_inline(&mut self, start: usize, end: usize) {
        let mut points = vec![start, end];
        for (_, span) in &self.inline {
            for point in [span.start(), span.end()] {
                if start < point && point < end {
                    points.push(point);
                }
            }
        }
        points.sort_unstable();
        points.dedup();

        let mut open: Vec<(SpanId, &'a Span)> = Vec::new();
        for run in points.windows(2) {
            let (from, to) = (run[0], run[1]);
            let mut wanted: Vec<(SpanId, &'a Span)> = self
                .inline
                .iter()
                .filter(|(_, span)| {
                    span.kind.is_inline()
                        && span.start() <= from
                        && to <= span.end()
                })
                .copied()
                .collect();
            wanted.sort_by(|(a_id, a), (b_id, b)| {
                a.start()
                    .cmp(&b.start())
                    .then(b.end().cmp(&a.end()))
                    .then(a_id.cmp(b_id))
            });

            let keep = open
                .iter()
                .zip(wanted.iter())
                .take_while(|((a, _), (b, _))| a == b)
                .count();
            while open.len() > keep {
                if let Some((_, span)) = open.pop() {
                    self.serializer.write_end(&mut self.html, span);
                }
            }
            for (id, span) in wanted.into_iter().skip(keep) {
                self.serializer.write_start(&mut self.html, span);
                open.push((id, span));
            }

            match self.placeholder_at(from) {
                Some(placeholder) => {
                    self.serializer.write_start(&mut self.html, placeholder);
                    self.serializer.write_end(&mut self.html, placeholder);
                }
                None => self.write_text(from, to),
            }
        }
        while let Some((_, span)) = open.pop() {
            self.serializer.write_end(&mut self.html, span);
        }
    }

    fn write_text(&mut self, start: usize, end: usize) {
        let mut plain = String::new();
        let mut index = start;
        for c in self.text.slice_to_string(start, end).chars() {
            let at = index;
            index += c.len_utf16();
            match c {
                END_OF_BUFFER_MARKER => {}
                NEWLINE => {
                    self.flush_text(&mut plain);
                    if self.is_block_separator(at) {
                        continue;
                    }
                    if self.preformat_depth > 0 {
                        self.html.push(NEWLINE);
                    } else {
                        self.html.push_str("<br>");
                    }
                }
                _ => plain.push(c),
            }
        }
        self.flush_text(&mut plain);
    }

    /// A newline between a character and the block that follows it only
    /// exists because the block starts on a new line.
    fn is_block_separator(&self, index: usize) -> bool {
        index > 0
            && self.block_starts.contains(&(index + 1))
            && self.text.unit_at(index - 1) != Some(NEWLINE_UNIT)
    }

    fn flush_text(&mut self, plain: &mut String) {
        if !plain.is_empty() {
            push_escaped_text(&mut self.html, plain);
            plain.clear();
        }
    }
}

/// Escapes `text` for an HTML text node. A no-break space is written as
/// `&nbsp;` so it survives as an entity.
pub(crate) fn push_escaped_text(html: &mut String, text: &str) {
    for (i, part) in text.split('\u{A0}').enumerate() {
        if i > 0 {
            html.push_str("&nbsp;");
        }
        html.push_str(&html_escape::encode_text(part));
    }
}
