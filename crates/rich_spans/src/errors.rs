// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::SpanId;

/// An edit addressed a position the buffer does not have.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("position {pos} is beyond the end of the buffer (length {len})")]
    OutOfBounds { pos: usize, len: usize },
    #[error("range {start}..{end} is reversed")]
    ReversedRange { start: usize, end: usize },
    #[error("position {pos} splits a surrogate pair")]
    NotCharBoundary { pos: usize },
}

/// A span mutation that was refused because it would corrupt the buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanRangeError {
    #[error("span range {start}..{end} is reversed")]
    Reversed { start: usize, end: usize },
    #[error("span range {start}..{end} exceeds buffer length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("block range {start}..{end} partially overlaps block {other:?}")]
    PartialBlockOverlap {
        start: usize,
        end: usize,
        other: SpanId,
    },
    #[error("no span with id {0:?}")]
    UnknownSpan(SpanId),
}

/// A structural invariant that does not hold for a buffer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvariantViolation {
    #[error("buffer must end with exactly one end-of-buffer marker")]
    EndMarker,
    #[error("blocks {0:?} and {1:?} partially overlap")]
    PartialOverlap(SpanId, SpanId),
    #[error("block {child:?} has nesting level {actual}, expected {expected}")]
    NestingLevel {
        child: SpanId,
        expected: usize,
        actual: usize,
    },
    #[error("span {0:?} lies outside the buffer")]
    SpanOutOfBounds(SpanId),
}
