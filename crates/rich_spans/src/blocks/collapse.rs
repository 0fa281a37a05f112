// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Block bookkeeping that has to happen before text is deleted.
//!
//! A block is anchored to the newline in front of it. Deleting that newline
//! joins the block's first line onto the line above, and a block whose only
//! line is joined that way would collapse to nothing. Such blocks are
//! retired before the deletion and the blocks that ended at the deleted
//! newline take over their text.

use tracing::debug;

use super::reject;
use crate::{BlockKind, SpanId, SpannedText};

/// Retires the blocks that deleting `[start, end)` would collapse.
///
/// The range must already be valid for the buffer.
pub(crate) fn collapse_before_delete(
    text: &mut SpannedText,
    start: usize,
    end: usize,
) {
    let len = text.len();
    let next_newline_end = (end..len)
        .find(|i| text.is_newline_at(*i))
        .map_or(len, |i| i + 1);
    let moves_heading_up = end > start
        && text.is_newline_at(end - 1)
        && (end == 1 || text.is_newline_at(end - 2));

    let newlines: Vec<usize> =
        (start..end).rev().filter(|i| text.is_newline_at(*i)).collect();
    for newline in newlines {
        let anchor = newline + 1;
        if anchor + 1 > len {
            continue;
        }
        let keep_heading = moves_heading_up && anchor == end;

        let mut retired = Vec::new();
        let mut survives = false;
        for (id, span) in text.spans() {
            if !span.is_block() || span.start() != anchor {
                continue;
            }
            let is_heading = span.kind.block_kind() == Some(BlockKind::Heading);
            if span.end() > next_newline_end || (keep_heading && is_heading) {
                survives = true;
            } else {
                retired.push((id, span.nesting_level, span.end()));
            }
        }
        if retired.is_empty() {
            continue;
        }
        for (id, _, _) in &retired {
            text.remove_span(*id);
        }
        debug!(newline, retired = retired.len(), "collapsed blocks");
        if survives {
            continue;
        }

        let min_level = retired.iter().map(|(_, level, _)| *level).min();
        let new_end = retired.iter().map(|(_, _, end)| *end).max();
        let (Some(min_level), Some(new_end)) = (min_level, new_end) else {
            continue;
        };
        take_over_line(text, anchor, min_level, new_end);
    }
}

/// Extends the blocks ending at `anchor`, from `min_level` inwards, so they
/// cover the line that follows.
fn take_over_line(
    text: &mut SpannedText,
    anchor: usize,
    min_level: usize,
    new_end: usize,
) {
    let mut preceding: Vec<(SpanId, usize, usize)> = text
        .spans()
        .filter(|(_, span)| {
            span.is_block()
                && span.end() == anchor
                && span.start() < anchor
                && span.nesting_level >= min_level
        })
        .map(|(id, span)| (id, span.nesting_level, span.start()))
        .collect();
    preceding.sort_by_key(|(_, level, _)| *level);
    for (id, _, block_start) in preceding {
        if let Err(err) = text.set_span_range(id, block_start, new_end) {
            reject(text, err);
        }
    }
}
