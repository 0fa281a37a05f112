// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::blocks::generic::{close_before_newline, remove_with_newline};
use crate::blocks::{BlockContext, BlockHandler};
use crate::Span;

/// `ul` and `ol` containers. Their extent follows their items, so they only
/// react when an item is left empty.
#[derive(Debug, Default)]
pub struct ListHandler;

impl BlockHandler for ListHandler {
    fn manages(&self, span: &Span) -> bool {
        span.kind.block_kind().map_or(false, |kind| kind.is_list())
    }

    /// Edits land inside the items, one level below the list.
    fn should_handle(&self, block_level: usize, nesting_level: usize) -> bool {
        block_level + 1 == nesting_level || block_level == nesting_level
    }

    fn handle_newline_at_empty_line_at_block_end(
        &self,
        cx: &mut BlockContext<'_>,
    ) {
        close_before_newline(cx);
    }

    fn handle_newline_at_empty_body(&self, cx: &mut BlockContext<'_>) {
        remove_with_newline(cx);
    }
}
