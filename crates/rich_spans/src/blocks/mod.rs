// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Incremental block maintenance.
//!
//! After every insertion, each [BlockHandler] looks at the blocks it manages
//! around the inserted range and classifies every inserted newline against
//! its governing block:
//!
//! | Position             | Meaning                            |
//! |----------------------|------------------------------------|
//! | StartOfBlock         | newline is the block's first char  |
//! | EmptyLineAtBlockEnd  | second newline in a row at the end |
//! | EmptyLineAtEmptyBody | block held nothing but this line   |
//! | BufferEnd            | newline is the buffer's last char  |
//! | Body                 | anywhere else                      |
//!
//! The positions are the variants of [NewlinePosition].
//!
//! Handlers react through a [BlockContext]. Text is never deleted while
//! handlers run: a newline that has served as a command is marked in
//! [PendingEdits] and removed once dispatch is over, and a handler that
//! retracts its block from a newline asks for that newline to be replayed
//! so enclosing blocks see it.
//!
//! Deletions are prepared before the text goes away: blocks that would
//! collapse onto the line above are retired first.

mod collapse;
mod generic;
mod heading;
mod list;
mod list_item;
mod preformat;
mod quote;

use std::ops::Range;

use tracing::trace;

pub use generic::GenericBlockHandler;
pub use heading::HeadingHandler;
pub use list::ListHandler;
pub use list_item::ListItemHandler;
pub use preformat::PreformatHandler;
pub use quote::QuoteHandler;

pub(crate) use collapse::collapse_before_delete;

use crate::errors::SpanRangeError;
use crate::spanned_text::{MARKER_UNIT, NEWLINE_UNIT};
use crate::{Span, SpanId, SpannedText};

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum NewlinePosition {
    StartOfBlock,
    EmptyLineAtBlockEnd,
    EmptyLineAtEmptyBody,
    BufferEnd,
    Body,
}

/// One inserted range, as seen by every handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextChanged {
    pub input_start: usize,
    pub count: usize,
    /// Deepest block nesting level over the inserted range.
    pub nesting_level: usize,
    pub is_replay: bool,
}

/// Work handlers leave for after the dispatch of one edit.
#[derive(Debug, Default)]
pub struct PendingEdits {
    deletions: Vec<Range<usize>>,
    replay: Option<usize>,
}

impl PendingEdits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_for_deletion(&mut self, start: usize, end: usize) {
        if !self.deletions.contains(&(start..end)) {
            self.deletions.push(start..end);
        }
    }

    pub fn is_marked_for_deletion(&self, start: usize, end: usize) -> bool {
        self.deletions
            .iter()
            .any(|range| range.start < end && start < range.end)
    }

    pub fn request_replay(&mut self, index: usize) {
        self.replay = Some(index);
    }

    pub(crate) fn take_replay(&mut self) -> Option<usize> {
        self.replay.take()
    }

    /// Marked ranges, highest first, so deleting them in order keeps the
    /// remaining offsets valid.
    pub(crate) fn take_deletions(&mut self) -> Vec<Range<usize>> {
        let mut deletions = std::mem::take(&mut self.deletions);
        deletions.sort_by(|a, b| b.start.cmp(&a.start));
        deletions
    }
}

/// A handler's view of the buffer while it reacts to one newline or to the
/// end-of-buffer marker.
pub struct BlockContext<'a> {
    text: &'a mut SpannedText,
    pending: &'a mut PendingEdits,
    block: SpanId,
    newline_index: usize,
    marker_index: usize,
    event: TextChanged,
}

impl<'a> BlockContext<'a> {
    pub fn text(&self) -> &SpannedText {
        &*self.text
    }

    pub fn event(&self) -> TextChanged {
        self.event
    }

    pub fn block_id(&self) -> SpanId {
        self.block
    }

    pub fn block(&self) -> Option<&Span> {
        self.text.span(self.block)
    }

    /// `None` once the block has been removed.
    pub fn block_range(&self) -> Option<(usize, usize)> {
        self.block().map(|span| (span.start(), span.end()))
    }

    pub fn newline_index(&self) -> usize {
        self.newline_index
    }

    /// Position of the end-of-buffer marker for marker events.
    pub fn marker_index(&self) -> usize {
        self.marker_index
    }

    /// Whether the newline is the last character of the block's content,
    /// just before its closing newline or the marker, or the last character
    /// of the buffer.
    pub fn is_newline_at_block_end(&self) -> bool {
        self.block_range().map_or(false, |(_, end)| {
            newline_at_block_end(&*self.text, end, self.newline_index)
        })
    }

    pub fn set_block_start(&mut self, start: usize) {
        if let Some((_, end)) = self.block_range() {
            self.set_block_range(start, end);
        }
    }

    pub fn set_block_end(&mut self, end: usize) {
        if let Some((start, _)) = self.block_range() {
            self.set_block_range(start, end);
        }
    }

    pub fn set_block_range(&mut self, start: usize, end: usize) {
        if let Err(err) = self.text.set_span_range(self.block, start, end) {
            reject(&*self.text, err);
        }
    }

    pub fn remove_block(&mut self) {
        self.text.remove_span(self.block);
    }

    /// Adds a block with the current block's style over `[start, end)`.
    pub fn add_block_like(
        &mut self,
        start: usize,
        end: usize,
    ) -> Option<SpanId> {
        let span = self.block()?.clone_style();
        match self.text.add_span(span, start, end) {
            Ok(id) => Some(id),
            Err(err) => {
                reject(&*self.text, err);
                None
            }
        }
    }

    /// Range of the block enclosing the current one.
    pub fn parent_range(&self) -> Option<(usize, usize)> {
        let parent = self.text.parent_of(self.block)?;
        self.text.span(parent).map(|span| (span.start(), span.end()))
    }

    pub fn mark_for_deletion(&mut self, start: usize, end: usize) {
        self.pending.mark_for_deletion(start, end);
    }

    pub fn is_marked_for_deletion(&self, start: usize, end: usize) -> bool {
        self.pending.is_marked_for_deletion(start, end)
    }

    pub fn request_replay(&mut self, index: usize) {
        self.pending.request_replay(index);
    }
}

/// Per block type reaction to newline insertion. Every hook defaults to
/// doing nothing.
pub trait BlockHandler {
    fn manages(&self, span: &Span) -> bool;

    fn should_handle(&self, block_level: usize, nesting_level: usize) -> bool {
        block_level == nesting_level
    }

    fn handle_newline_at_start_of_block(&self, _cx: &mut BlockContext<'_>) {}

    fn handle_newline_at_empty_line_at_block_end(
        &self,
        _cx: &mut BlockContext<'_>,
    ) {
    }

    fn handle_newline_at_empty_body(&self, _cx: &mut BlockContext<'_>) {}

    fn handle_newline_at_text_end(&self, _cx: &mut BlockContext<'_>) {}

    fn handle_newline_in_body(&self, _cx: &mut BlockContext<'_>) {}

    fn handle_end_of_buffer_marker(&self, _cx: &mut BlockContext<'_>) {}

    /// Runs the hooks for every newline in `[input_start, input_start +
    /// count)`, against every managed block containing that newline, then
    /// the marker hook when the insertion is the end-of-buffer marker.
    ///
    /// Governing blocks are looked up again for each newline, so lines
    /// pasted in one go are split one after the other.
    fn handle_text_changed(
        &self,
        text: &mut SpannedText,
        event: TextChanged,
        pending: &mut PendingEdits,
    ) {
        let TextChanged {
            input_start, count, ..
        } = event;
        let input_end = input_start + count;

        let newlines: Vec<usize> = (input_start..input_end)
            .filter(|i| text.unit_at(*i) == Some(NEWLINE_UNIT))
            .collect();
        for newline_index in newlines {
            for block in governing_blocks(text, self, newline_index) {
                let Some(span) = text.span(block) else { continue };
                if !self
                    .should_handle(span.nesting_level, event.nesting_level)
                {
                    continue;
                }
                let position = classify_newline(
                    text,
                    span.start(),
                    span.end(),
                    newline_index,
                    event.is_replay,
                );
                trace!(
                    tag = %span.tag,
                    newline = newline_index,
                    %position,
                    "classified newline"
                );

                let mut cx = BlockContext {
                    text: &mut *text,
                    pending: &mut *pending,
                    block,
                    newline_index,
                    marker_index: input_start,
                    event,
                };
                match position {
                    NewlinePosition::StartOfBlock => {
                        self.handle_newline_at_start_of_block(&mut cx)
                    }
                    NewlinePosition::EmptyLineAtBlockEnd => {
                        self.handle_newline_at_empty_line_at_block_end(&mut cx)
                    }
                    NewlinePosition::EmptyLineAtEmptyBody => {
                        self.handle_newline_at_empty_body(&mut cx)
                    }
                    NewlinePosition::BufferEnd => {
                        self.handle_newline_at_text_end(&mut cx)
                    }
                    NewlinePosition::Body => {
                        self.handle_newline_in_body(&mut cx)
                    }
                }
            }
        }

        let got_end_of_buffer_marker =
            count == 1 && text.unit_at(input_start) == Some(MARKER_UNIT);
        if !got_end_of_buffer_marker {
            return;
        }
        for block in governing_blocks(text, self, input_start) {
            let Some(span) = text.span(block) else { continue };
            if !self.should_handle(span.nesting_level, event.nesting_level) {
                continue;
            }
            let mut cx = BlockContext {
                text: &mut *text,
                pending: &mut *pending,
                block,
                newline_index: input_start,
                marker_index: input_start,
                event,
            };
            self.handle_end_of_buffer_marker(&mut cx);
        }
    }
}

/// Blocks managed by `handler` that contain `index`, outermost first.
fn governing_blocks<H>(
    text: &SpannedText,
    handler: &H,
    index: usize,
) -> Vec<SpanId>
where
    H: BlockHandler + ?Sized,
{
    text.get_spans(index, index + 1, |span| {
        span.is_block()
            && handler.manages(span)
            && span.start() <= index
            && index < span.end()
    })
}

/// Where `newline_index` sits in the block `[start, end)`.
pub fn classify_newline(
    text: &SpannedText,
    start: usize,
    end: usize,
    newline_index: usize,
    is_replay: bool,
) -> NewlinePosition {
    let len = end - start;
    let is_empty_body =
        len == 1 || (len == 2 && text.unit_at(end - 1) == Some(MARKER_UNIT));
    if newline_index == start && is_empty_body {
        return NewlinePosition::EmptyLineAtEmptyBody;
    }

    let at_end = newline_at_block_end(text, end, newline_index);
    if newline_index == start {
        return if at_end {
            NewlinePosition::EmptyLineAtBlockEnd
        } else {
            NewlinePosition::StartOfBlock
        };
    }

    // A double enter only counts when the previous newline sits at the same
    // depth, or deeper outside a replay.
    let previous_level =
        text.nesting_level_at(newline_index - 1, newline_index);
    let current_level =
        text.nesting_level_at(newline_index, newline_index + 1);
    let same_or_deeper = previous_level == current_level
        || (previous_level > current_level && !is_replay);
    if text.unit_at(newline_index - 1) == Some(NEWLINE_UNIT)
        && same_or_deeper
        && at_end
    {
        return NewlinePosition::EmptyLineAtBlockEnd;
    }

    if newline_index + 1 == text.len() {
        return NewlinePosition::BufferEnd;
    }

    NewlinePosition::Body
}

fn newline_at_block_end(
    text: &SpannedText,
    end: usize,
    newline_index: usize,
) -> bool {
    let closes_block = end >= 2
        && newline_index == end - 2
        && matches!(text.unit_at(end - 1), Some(NEWLINE_UNIT | MARKER_UNIT));
    closes_block || newline_index + 1 == text.len()
}

/// Refused block changes are no-ops, except in builds that assert
/// invariants.
fn reject(text: &SpannedText, err: SpanRangeError) {
    cfg_if::cfg_if! {
        if #[cfg(feature = "assert-invariants")] {
            panic!("rejected block change: {err}\n{}", text.to_tree());
        } else {
            tracing::warn!(
                %err,
                tree = %text.to_tree(),
                "rejected block change"
            );
        }
    }
}
