// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The styled text buffer.
//!
//! [SpannedText] is a UTF-16 character sequence with an overlay of [Span]s.
//! Every finished buffer ends with exactly one [END_OF_BUFFER_MARKER]. Spans
//! follow their text through insertions and deletions according to their
//! growth flags:
//!
//! | Insertion at `pos`          | Effect                                   |
//! |-----------------------------|------------------------------------------|
//! | `pos < start`               | span shifts right                        |
//! | `pos == start`, empty span  | grows if either flag is set, else shifts |
//! | `pos == start`              | grows if `grows_at_start`, else shifts   |
//! | `start < pos < end`         | span grows                               |
//! | `pos == end`                | grows if `grows_at_end`                  |

use std::fmt::Write as _;

use widestring::{Utf16Str, Utf16String};

use crate::errors::{EditError, InvariantViolation, SpanRangeError};
use crate::Span;

/// Sentinel that always occupies the last position of a buffer.
pub const END_OF_BUFFER_MARKER: char = '\u{200B}';
/// Placeholder character for images, rules, comments and unknown elements.
pub const OBJECT_REPLACEMENT_CHAR: char = '\u{FFFC}';
pub const NEWLINE: char = '\n';

pub(crate) const MARKER_UNIT: u16 = 0x200B;
pub(crate) const NEWLINE_UNIT: u16 = 0x000A;

/// Stable handle to a span inside one [SpannedText].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpanId(usize);

#[derive(Clone, Debug, PartialEq)]
pub struct SpannedText {
    text: Utf16String,
    spans: Vec<Option<Span>>,
}

impl Default for SpannedText {
    fn default() -> Self {
        Self::new()
    }
}

impl SpannedText {
    /// An empty document: just the end-of-buffer marker.
    pub fn new() -> Self {
        let mut text = Utf16String::new();
        text.push(END_OF_BUFFER_MARKER);
        Self {
            text,
            spans: Vec::new(),
        }
    }

    /// Unstyled text followed by the end-of-buffer marker.
    pub fn from_plain_text(plain: &str) -> Self {
        let mut text = Utf16String::from_str(plain);
        text.push(END_OF_BUFFER_MARKER);
        Self {
            text,
            spans: Vec::new(),
        }
    }

    /// A buffer under construction, without the marker guarantee.
    pub(crate) fn unterminated() -> Self {
        Self {
            text: Utf16String::new(),
            spans: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text(&self) -> &Utf16Str {
        &self.text
    }

    pub fn unit_at(&self, index: usize) -> Option<u16> {
        self.text.as_slice().get(index).copied()
    }

    pub(crate) fn is_newline_at(&self, index: usize) -> bool {
        self.unit_at(index) == Some(NEWLINE_UNIT)
    }

    pub(crate) fn is_marker_at(&self, index: usize) -> bool {
        self.unit_at(index) == Some(MARKER_UNIT)
    }

    /// The text between two offsets, lossily decoded.
    pub fn slice_to_string(&self, start: usize, end: usize) -> String {
        let units = self.text.as_slice();
        let end = end.min(units.len());
        let start = start.min(end);
        String::from_utf16_lossy(&units[start..end])
    }

    /// The document text without the end-of-buffer marker.
    pub fn plain_text(&self) -> String {
        let end = if self.is_marker_at(self.len().wrapping_sub(1)) {
            self.len() - 1
        } else {
            self.len()
        };
        self.slice_to_string(0, end)
    }

    // ────────────────────────────────────────────────────────────────────
    // Text mutation
    // ────────────────────────────────────────────────────────────────────

    pub fn insert_text(
        &mut self,
        pos: usize,
        text: &str,
    ) -> Result<usize, EditError> {
        self.check_position(pos)?;
        let inserted = Utf16String::from_str(text);
        let count = inserted.len();
        if count == 0 {
            return Ok(0);
        }
        self.text.insert_utfstr(pos, &inserted);
        for span in self.spans.iter_mut().flatten() {
            shift_for_insert(span, pos, count);
        }
        Ok(count)
    }

    /// Removes `[start, end)`. Spans inside the range are dropped, spans
    /// crossing it are truncated and later spans move left.
    pub fn delete_text(
        &mut self,
        start: usize,
        end: usize,
    ) -> Result<(), EditError> {
        self.check_range(start, end)?;
        if start == end {
            return Ok(());
        }
        let _ = self.text.drain(start..end);
        for slot in self.spans.iter_mut() {
            let Some(span) = slot else { continue };
            let swallowed = if span.is_empty() {
                start < span.start && span.start < end
            } else {
                start <= span.start && span.end <= end
            };
            if swallowed {
                *slot = None;
                continue;
            }
            span.start = map_through_delete(span.start, start, end);
            span.end = map_through_delete(span.end, start, end);
        }
        Ok(())
    }

    /// Fails the way [SpannedText::delete_text] would for `[start, end)`.
    pub(crate) fn check_range(
        &self,
        start: usize,
        end: usize,
    ) -> Result<(), EditError> {
        if start > end {
            return Err(EditError::ReversedRange { start, end });
        }
        self.check_position(start)?;
        self.check_position(end)
    }

    fn check_position(&self, pos: usize) -> Result<(), EditError> {
        let len = self.len();
        if pos > len {
            return Err(EditError::OutOfBounds { pos, len });
        }
        if self.splits_surrogate_pair(pos) {
            return Err(EditError::NotCharBoundary { pos });
        }
        Ok(())
    }

    fn splits_surrogate_pair(&self, pos: usize) -> bool {
        let units = self.text.as_slice();
        if pos == 0 || pos >= units.len() {
            return false;
        }
        (0xD800..0xDC00).contains(&units[pos - 1])
            && (0xDC00..0xE000).contains(&units[pos])
    }

    /// Appends without moving any span. Only the parser builds buffers this
    /// way, setting span ranges itself.
    pub(crate) fn push_str_unadjusted(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub(crate) fn push_char_unadjusted(&mut self, c: char) {
        self.text.push(c);
    }

    pub(crate) fn replace_char_unadjusted(&mut self, index: usize, c: char) {
        if index < self.len() {
            self.text.remove(index);
            self.text.insert(index, c);
        }
    }

    /// Restores the single trailing end-of-buffer marker.
    ///
    /// Stray markers are deleted. When the marker itself was lost it is
    /// appended and every block ending at the old buffer end is extended
    /// over it. Returns the index of an appended marker.
    pub(crate) fn restore_end_marker(&mut self) -> Option<usize> {
        let last = self.len().checked_sub(1);
        let strays: Vec<usize> = self
            .text
            .as_slice()
            .iter()
            .enumerate()
            .filter(|(i, unit)| **unit == MARKER_UNIT && Some(*i) != last)
            .map(|(i, _)| i)
            .collect();
        for index in strays.into_iter().rev() {
            // Indices come from the buffer itself, so this cannot fail.
            let _ = self.delete_text(index, index + 1);
        }

        let len = self.len();
        if len > 0 && self.is_marker_at(len - 1) {
            return None;
        }

        self.text.push(END_OF_BUFFER_MARKER);
        for span in self.spans.iter_mut().flatten() {
            if span.is_block() && span.end == len {
                span.end = len + 1;
            }
        }
        Some(len)
    }

    // ────────────────────────────────────────────────────────────────────
    // Span access
    // ────────────────────────────────────────────────────────────────────

    pub fn span(&self, id: SpanId) -> Option<&Span> {
        self.spans.get(id.0).and_then(Option::as_ref)
    }

    /// Mutable access to a span's style. Ranges can only be changed through
    /// [SpannedText::set_span_range].
    pub fn span_mut(&mut self, id: SpanId) -> Option<&mut Span> {
        self.spans.get_mut(id.0).and_then(Option::as_mut)
    }

    /// All spans in insertion order.
    pub fn spans(&self) -> impl Iterator<Item = (SpanId, &Span)> {
        self.spans
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (SpanId(i), s)))
    }

    pub fn span_count(&self) -> usize {
        self.spans.iter().flatten().count()
    }

    /// Attaches `span` over `[start, end)`, with the same validation as
    /// [SpannedText::set_span_range].
    pub fn add_span(
        &mut self,
        mut span: Span,
        start: usize,
        end: usize,
    ) -> Result<SpanId, SpanRangeError> {
        self.validate_range(None, span.is_block(), start, end)?;
        span.start = start;
        span.end = end;
        self.spans.push(Some(span));
        Ok(SpanId(self.spans.len() - 1))
    }

    /// Moves a span. Refuses reversed or out-of-range bounds, and block
    /// bounds that would partially overlap another block.
    pub fn set_span_range(
        &mut self,
        id: SpanId,
        start: usize,
        end: usize,
    ) -> Result<(), SpanRangeError> {
        let is_block = self
            .span(id)
            .ok_or(SpanRangeError::UnknownSpan(id))?
            .is_block();
        self.validate_range(Some(id), is_block, start, end)?;
        if let Some(span) = self.span_mut(id) {
            span.start = start;
            span.end = end;
        }
        Ok(())
    }

    /// Parser only: spans still being built may nest in any order until
    /// their close tags are seen.
    pub(crate) fn set_span_range_unchecked(
        &mut self,
        id: SpanId,
        start: usize,
        end: usize,
    ) {
        if let Some(span) = self.span_mut(id) {
            span.start = start;
            span.end = end;
        }
    }

    pub fn remove_span(&mut self, id: SpanId) -> Option<Span> {
        self.spans.get_mut(id.0).and_then(Option::take)
    }

    fn validate_range(
        &self,
        id: Option<SpanId>,
        is_block: bool,
        start: usize,
        end: usize,
    ) -> Result<(), SpanRangeError> {
        if start > end {
            return Err(SpanRangeError::Reversed { start, end });
        }
        if end > self.len() {
            return Err(SpanRangeError::OutOfBounds {
                start,
                end,
                len: self.len(),
            });
        }
        if !is_block || start == end {
            return Ok(());
        }
        let conflict = self.spans().find(|(other_id, other)| {
            Some(*other_id) != id
                && other.is_block()
                && !other.is_empty()
                && partially_overlap(start, end, other.start, other.end)
        });
        match conflict {
            Some((other, _)) => {
                Err(SpanRangeError::PartialBlockOverlap { start, end, other })
            }
            None => Ok(()),
        }
    }

    // ────────────────────────────────────────────────────────────────────
    // Span queries
    // ────────────────────────────────────────────────────────────────────

    /// Spans matching `filter` that overlap `[start, end)`, ordered by start
    /// and then by nesting level (outermost first).
    ///
    /// A non-empty span that only touches the edge of a non-empty query is
    /// not an overlap; any span touching a zero-length query is.
    pub fn get_spans<F>(
        &self,
        start: usize,
        end: usize,
        filter: F,
    ) -> Vec<SpanId>
    where
        F: Fn(&Span) -> bool,
    {
        let mut found: Vec<(SpanId, &Span)> = self
            .spans()
            .filter(|(_, span)| filter(span) && overlaps(span, start, end))
            .collect();
        found.sort_by_key(|(_, span)| (span.start, span.nesting_level));
        found.into_iter().map(|(id, _)| id).collect()
    }

    pub fn blocks_in(&self, start: usize, end: usize) -> Vec<SpanId> {
        self.get_spans(start, end, Span::is_block)
    }

    /// Deepest block nesting level over `[index, next)`.
    ///
    /// A block ending at `index` does not count when the character before
    /// `index` is a newline: that newline closed it.
    pub fn nesting_level_at(&self, index: usize, next: usize) -> usize {
        let after_newline = index > 0 && self.is_newline_at(index - 1);
        self.blocks_in(index, next)
            .into_iter()
            .filter_map(|id| self.span(id))
            .filter(|span| !(span.end == index && after_newline))
            .filter(|span| {
                index != next
                    || span.start != index
                    || index == 0
                    || after_newline
            })
            .map(|span| span.nesting_level)
            .max()
            .unwrap_or(0)
    }

    /// The enclosing block with the deepest nesting level below `id`'s.
    ///
    /// A block that merely ends where `id` starts does not enclose it.
    pub fn parent_of(&self, id: SpanId) -> Option<SpanId> {
        let block = self.span(id)?;
        let (start, end, level) = (block.start, block.end, block.nesting_level);
        self.spans()
            .filter(|(other_id, other)| {
                *other_id != id
                    && other.is_block()
                    && other.nesting_level < level
                    && other.contains_range(start, end)
                    && start < other.end
            })
            .max_by_key(|(_, other)| other.nesting_level)
            .map(|(other_id, _)| other_id)
    }

    pub fn max_nesting_level(&self) -> usize {
        self.spans()
            .filter(|(_, span)| span.is_block())
            .map(|(_, span)| span.nesting_level)
            .max()
            .unwrap_or(0)
    }

    // ────────────────────────────────────────────────────────────────────
    // Invariants
    // ────────────────────────────────────────────────────────────────────

    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        let units = self.text.as_slice();
        let markers = units.iter().filter(|u| **u == MARKER_UNIT).count();
        if markers != 1 || units.last() != Some(&MARKER_UNIT) {
            return Err(InvariantViolation::EndMarker);
        }

        for (id, span) in self.spans() {
            if span.start > span.end || span.end > self.len() {
                return Err(InvariantViolation::SpanOutOfBounds(id));
            }
        }

        let blocks: Vec<(SpanId, &Span)> = self
            .spans()
            .filter(|(_, span)| span.is_block() && !span.is_empty())
            .collect();

        for (i, (a_id, a)) in blocks.iter().enumerate() {
            for (b_id, b) in blocks.iter().skip(i + 1) {
                if partially_overlap(a.start, a.end, b.start, b.end) {
                    return Err(InvariantViolation::PartialOverlap(
                        *a_id, *b_id,
                    ));
                }
            }
        }

        for (child_id, child) in &blocks {
            let parent = blocks
                .iter()
                .filter(|(id, other)| {
                    id != child_id
                        && other.contains_range(child.start, child.end)
                        && (other.len() > child.len()
                            || other.nesting_level < child.nesting_level)
                })
                .map(|(_, other)| other.nesting_level)
                .max();
            let expected = parent.map_or(0, |level| level + 1);
            if child.nesting_level != expected {
                return Err(InvariantViolation::NestingLevel {
                    child: *child_id,
                    expected,
                    actual: child.nesting_level,
                });
            }
        }

        Ok(())
    }

    /// Panics if any structural invariant is broken.
    pub fn explicitly_assert_invariants(&self) {
        if let Err(violation) = self.check_invariants() {
            panic!("{violation}\n{}", self.to_tree());
        }
    }

    /// Human-readable dump of the text and spans, for debugging and tests.
    pub fn to_tree(&self) -> String {
        let mut out = String::new();
        let shown: String = self
            .slice_to_string(0, self.len())
            .chars()
            .map(|c| match c {
                END_OF_BUFFER_MARKER => '¶',
                NEWLINE => '⏎',
                OBJECT_REPLACEMENT_CHAR => '□',
                other => other,
            })
            .collect();
        let _ = writeln!(out, "\"{shown}\"");
        let mut ordered: Vec<(SpanId, &Span)> = self.spans().collect();
        ordered.sort_by_key(|(_, span)| (span.start, span.nesting_level));
        for (_, span) in ordered {
            let indent = "  ".repeat(span.nesting_level);
            let _ = writeln!(
                out,
                "{indent}└>{} [{}, {})",
                span.tag, span.start, span.end
            );
        }
        out
    }
}

fn shift_for_insert(span: &mut Span, pos: usize, count: usize) {
    if span.is_empty() && span.start == pos {
        if !(span.grows_at_start || span.grows_at_end) {
            span.start += count;
        }
        span.end += count;
        return;
    }
    if pos < span.start || (pos == span.start && !span.grows_at_start) {
        span.start += count;
    }
    if pos < span.end || (pos == span.end && span.grows_at_end) {
        span.end += count;
    }
}

fn map_through_delete(pos: usize, start: usize, end: usize) -> usize {
    if pos <= start {
        pos
    } else if pos >= end {
        pos - (end - start)
    } else {
        start
    }
}

fn overlaps(span: &Span, start: usize, end: usize) -> bool {
    if span.start > end || span.end < start {
        return false;
    }
    let touches_only = span.start == end || span.end == start;
    !(touches_only && !span.is_empty() && start != end)
}

fn partially_overlap(
    a_start: usize,
    a_end: usize,
    b_start: usize,
    b_end: usize,
) -> bool {
    let intersect = a_start < b_end && b_start < a_end;
    let a_in_b = b_start <= a_start && a_end <= b_end;
    let b_in_a = a_start <= b_start && b_end <= a_end;
    intersect && !a_in_b && !b_in_a
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use super::*;
    use crate::{BlockKind, InlineKind, Span, SpanKind};

    fn bold() -> Span {
        Span::inline(InlineKind::Bold, "b")
    }

    fn quote(level: usize) -> Span {
        Span::block(BlockKind::Quote, "blockquote", level)
    }

    fn range(text: &SpannedText, id: SpanId) -> (usize, usize) {
        let span = text.span(id).unwrap();
        (span.start(), span.end())
    }

    // ===================================================================
    // Text and marker
    // ===================================================================

    #[test]
    fn new_buffer_holds_only_the_marker() {
        let text = SpannedText::new();
        assert_eq!(text.len(), 1);
        assert!(text.is_marker_at(0));
        assert_eq!(text.plain_text(), "");
        text.explicitly_assert_invariants();
    }

    #[test]
    fn plain_text_excludes_the_marker() {
        let text = SpannedText::from_plain_text("abc");
        assert_eq!(text.len(), 4);
        assert_eq!(text.plain_text(), "abc");
    }

    #[test]
    fn insert_beyond_the_end_is_an_error() {
        let mut text = SpannedText::from_plain_text("ab");
        assert_that!(text.insert_text(9, "x"))
            .is_err()
            .is_equal_to(EditError::OutOfBounds { pos: 9, len: 3 });
    }

    #[test]
    fn offsets_are_utf16_code_units() {
        let mut text = SpannedText::from_plain_text("a😀b");
        assert_eq!(text.len(), 5);
        assert_that!(text.insert_text(2, "x"))
            .is_err()
            .is_equal_to(EditError::NotCharBoundary { pos: 2 });
        assert_that!(text.insert_text(3, "x")).is_ok().is_equal_to(1);
        assert_eq!(text.plain_text(), "a😀xb");
    }

    #[test]
    fn restoring_the_marker_removes_strays() {
        let mut text = SpannedText::from_plain_text("a\u{200B}b");
        assert_eq!(text.restore_end_marker(), None);
        assert_eq!(text.plain_text(), "ab");
        text.explicitly_assert_invariants();
    }

    #[test]
    fn restoring_a_lost_marker_extends_blocks_at_the_end() {
        let mut text = SpannedText::from_plain_text("ab");
        let q = text.add_span(quote(0), 0, 3).unwrap();
        text.delete_text(2, 3).unwrap();
        assert_eq!(range(&text, q), (0, 2));
        assert_eq!(text.restore_end_marker(), Some(2));
        assert_eq!(range(&text, q), (0, 3));
        text.explicitly_assert_invariants();
    }

    // ===================================================================
    // Span growth on insert
    // ===================================================================

    #[test]
    fn insert_before_span_shifts_it() {
        let mut text = SpannedText::from_plain_text("abcd");
        let b = text.add_span(bold(), 1, 3).unwrap();
        text.insert_text(0, "xx").unwrap();
        assert_eq!(range(&text, b), (3, 5));
    }

    #[test]
    fn insert_inside_span_grows_it() {
        let mut text = SpannedText::from_plain_text("abcd");
        let b = text.add_span(bold(), 1, 3).unwrap();
        text.insert_text(2, "xx").unwrap();
        assert_eq!(range(&text, b), (1, 5));
    }

    #[test]
    fn inline_span_grows_at_end_but_not_at_start() {
        let mut text = SpannedText::from_plain_text("abcd");
        let b = text.add_span(bold(), 1, 3).unwrap();
        text.insert_text(3, "x").unwrap();
        assert_eq!(range(&text, b), (1, 4));
        text.insert_text(1, "y").unwrap();
        assert_eq!(range(&text, b), (2, 5));
    }

    #[test]
    fn block_grows_at_start_but_not_at_end() {
        let mut text = SpannedText::from_plain_text("abcd");
        let q = text.add_span(quote(0), 1, 3).unwrap();
        text.insert_text(1, "x").unwrap();
        assert_eq!(range(&text, q), (1, 4));
        text.insert_text(4, "y").unwrap();
        assert_eq!(range(&text, q), (1, 4));
    }

    #[test]
    fn empty_mark_captures_typing() {
        let mut text = SpannedText::new();
        let q = text.add_span(quote(0), 0, 0).unwrap();
        text.insert_text(0, "hi").unwrap();
        assert_eq!(range(&text, q), (0, 2));
    }

    #[test]
    fn empty_exclusive_span_is_pushed_along() {
        let mut text = SpannedText::new();
        let mut span = bold();
        span.grows_at_end = false;
        let b = text.add_span(span, 0, 0).unwrap();
        text.insert_text(0, "hi").unwrap();
        assert_eq!(range(&text, b), (2, 2));
    }

    // ===================================================================
    // Span adjustment on delete
    // ===================================================================

    #[test]
    fn delete_removes_spans_inside_the_range() {
        let mut text = SpannedText::from_plain_text("abcdef");
        let b = text.add_span(bold(), 2, 4).unwrap();
        text.delete_text(1, 5).unwrap();
        assert_that!(text.span(b)).is_none();
        assert_eq!(text.plain_text(), "af");
    }

    #[test]
    fn delete_truncates_overlapping_spans() {
        let mut text = SpannedText::from_plain_text("abcdef");
        let left = text.add_span(bold(), 0, 3).unwrap();
        let right = text.add_span(bold(), 3, 6).unwrap();
        text.delete_text(2, 4).unwrap();
        assert_eq!(range(&text, left), (0, 2));
        assert_eq!(range(&text, right), (2, 4));
    }

    #[test]
    fn delete_shifts_later_spans_left() {
        let mut text = SpannedText::from_plain_text("abcdef");
        let b = text.add_span(bold(), 4, 6).unwrap();
        text.delete_text(0, 2).unwrap();
        assert_eq!(range(&text, b), (2, 4));
    }

    // ===================================================================
    // Range validation
    // ===================================================================

    #[test]
    fn reversed_range_is_rejected() {
        let mut text = SpannedText::from_plain_text("abc");
        let b = text.add_span(bold(), 0, 1).unwrap();
        assert_that!(text.set_span_range(b, 2, 1))
            .is_err()
            .is_equal_to(SpanRangeError::Reversed { start: 2, end: 1 });
        assert_eq!(range(&text, b), (0, 1));
    }

    #[test]
    fn partial_block_overlap_is_rejected() {
        let mut text = SpannedText::from_plain_text("abcdef");
        let outer = text.add_span(quote(0), 0, 4).unwrap();
        let inner = text.add_span(quote(1), 1, 3).unwrap();
        let result = text.set_span_range(inner, 2, 6);
        assert_that!(result).is_err().is_equal_to(
            SpanRangeError::PartialBlockOverlap {
                start: 2,
                end: 6,
                other: outer,
            },
        );
        assert_eq!(range(&text, inner), (1, 3));
    }

    #[test]
    fn inline_spans_may_overlap_freely() {
        let mut text = SpannedText::from_plain_text("abcdef");
        text.add_span(bold(), 0, 4).unwrap();
        let italic = Span::inline(InlineKind::Italic, "i");
        assert_that!(text.add_span(italic, 2, 6)).is_ok();
    }

    // ===================================================================
    // Queries
    // ===================================================================

    #[test]
    fn spans_touching_a_range_edge_do_not_overlap_it() {
        let mut text = SpannedText::from_plain_text("abcdef");
        text.add_span(quote(0), 0, 3).unwrap();
        let second = text.add_span(quote(0), 3, 6).unwrap();
        assert_eq!(text.blocks_in(3, 4), vec![second]);
        assert_eq!(text.blocks_in(3, 3).len(), 2);
    }

    #[test]
    fn spans_are_ordered_by_start_then_nesting() {
        let mut text = SpannedText::from_plain_text("abcdef");
        let inner = text.add_span(quote(1), 0, 4).unwrap();
        let outer = text.add_span(quote(0), 0, 6).unwrap();
        assert_eq!(text.blocks_in(1, 2), vec![outer, inner]);
    }

    #[test]
    fn nesting_level_ignores_a_block_closed_by_the_previous_newline() {
        let mut text = SpannedText::from_plain_text("ab\ncd");
        text.add_span(Span::block(BlockKind::UnorderedList, "ul", 0), 0, 3)
            .unwrap();
        text.add_span(Span::block(BlockKind::ListItem, "li", 1), 0, 3)
            .unwrap();
        assert_eq!(text.nesting_level_at(1, 2), 1);
        assert_eq!(text.nesting_level_at(3, 3), 0);
        assert_eq!(text.nesting_level_at(3, 4), 0);
    }

    #[test]
    fn parent_is_the_deepest_enclosing_block() {
        let mut text = SpannedText::from_plain_text("ab\ncd");
        let ul = text
            .add_span(Span::block(BlockKind::UnorderedList, "ul", 0), 0, 6)
            .unwrap();
        let li = text
            .add_span(Span::block(BlockKind::ListItem, "li", 1), 3, 6)
            .unwrap();
        assert_eq!(text.parent_of(li), Some(ul));
        assert_eq!(text.parent_of(ul), None);
    }

    #[test]
    fn block_ending_where_another_starts_is_not_its_parent() {
        let mut text = SpannedText::from_plain_text("a\nb\n\n");
        let ul = text
            .add_span(Span::block(BlockKind::UnorderedList, "ul", 0), 0, 6)
            .unwrap();
        let li = text
            .add_span(Span::block(BlockKind::ListItem, "li", 1), 0, 5)
            .unwrap();
        let inner = text
            .add_span(Span::block(BlockKind::UnorderedList, "ul", 2), 2, 4)
            .unwrap();
        let empty = text
            .add_span(Span::block(BlockKind::ListItem, "li", 3), 4, 5)
            .unwrap();
        assert_eq!(text.parent_of(empty), Some(li));
        assert_eq!(text.parent_of(inner), Some(li));
        assert_eq!(text.parent_of(li), Some(ul));
    }

    #[test]
    fn nesting_level_mismatch_is_an_invariant_violation() {
        let mut text = SpannedText::from_plain_text("ab");
        text.add_span(quote(0), 0, 3).unwrap();
        let inner = text.add_span(quote(2), 0, 2).unwrap();
        assert_that!(text.check_invariants()).is_err().is_equal_to(
            InvariantViolation::NestingLevel {
                child: inner,
                expected: 1,
                actual: 2,
            },
        );
    }

    #[test]
    fn tree_lists_spans_by_position() {
        let mut text = SpannedText::from_plain_text("hi");
        text.add_span(quote(0), 0, 3).unwrap();
        let strong = Span::new(
            SpanKind::Inline(InlineKind::Bold),
            "strong",
            Default::default(),
            1,
        );
        text.add_span(strong, 0, 2).unwrap();
        let tree = text.to_tree();
        assert!(tree.starts_with("\"hi¶\""), "unexpected tree: {tree}");
        assert!(
            tree.contains("└>blockquote [0, 3)"),
            "unexpected tree: {tree}"
        );
        assert!(
            tree.contains("  └>strong [0, 2)"),
            "unexpected tree: {tree}"
        );
    }
}
