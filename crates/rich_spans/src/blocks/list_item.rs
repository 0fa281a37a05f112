// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::blocks::{BlockContext, BlockHandler};
use crate::{BlockKind, Span, SpanKind};

/// `li`. Every newline inside an item starts a sibling item; a newline on
/// an empty last item leaves it for the list to close.
#[derive(Debug, Default)]
pub struct ListItemHandler;

impl BlockHandler for ListItemHandler {
    fn manages(&self, span: &Span) -> bool {
        span.kind == SpanKind::Block(BlockKind::ListItem)
    }

    fn handle_newline_at_start_of_block(&self, cx: &mut BlockContext<'_>) {
        let newline = cx.newline_index();
        cx.add_block_like(newline, newline + 1);
        cx.set_block_start(newline + 1);
    }

    fn handle_newline_at_empty_line_at_block_end(
        &self,
        cx: &mut BlockContext<'_>,
    ) {
        let Some((_, end)) = cx.block_range() else { return };
        match cx.parent_range() {
            // The list already retracted away from this item.
            None | Some((0, 0)) => cx.remove_block(),
            Some((_, parent_end)) if parent_end == end => cx.remove_block(),
            Some(_) => {}
        }
    }

    fn handle_newline_at_empty_body(&self, cx: &mut BlockContext<'_>) {
        cx.remove_block();
    }

    fn handle_newline_in_body(&self, cx: &mut BlockContext<'_>) {
        let Some((_, end)) = cx.block_range() else { return };
        let newline = cx.newline_index();
        // A double enter newline is about to go, so anchor on it instead of
        // past it.
        let new_start = if cx.is_marked_for_deletion(newline, newline + 1) {
            newline
        } else {
            newline + 1
        };
        cx.add_block_like(new_start, end);
        cx.set_block_end(new_start);
    }

    fn handle_end_of_buffer_marker(&self, cx: &mut BlockContext<'_>) {
        let Some((start, _)) = cx.block_range() else { return };
        let marker = cx.marker_index();
        if start == marker {
            return;
        }
        cx.add_block_like(marker, marker + 1);
        cx.set_block_end(marker);
    }
}
