// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::blocks::generic::remove_with_newline;
use crate::blocks::{BlockContext, BlockHandler};
use crate::{BlockKind, Span, SpanKind};

/// `h1` to `h6`. Enter inside a heading splits it in two; enter at its end
/// leaves the heading, and enter on an empty heading removes it.
#[derive(Debug, Default)]
pub struct HeadingHandler;

impl BlockHandler for HeadingHandler {
    fn manages(&self, span: &Span) -> bool {
        span.kind == SpanKind::Block(BlockKind::Heading)
    }

    fn handle_newline_at_start_of_block(&self, cx: &mut BlockContext<'_>) {
        let newline = cx.newline_index();
        cx.set_block_start(newline + 1);
    }

    fn handle_newline_at_empty_line_at_block_end(
        &self,
        cx: &mut BlockContext<'_>,
    ) {
        remove_with_newline(cx);
    }

    fn handle_newline_at_empty_body(&self, cx: &mut BlockContext<'_>) {
        remove_with_newline(cx);
    }

    fn handle_newline_in_body(&self, cx: &mut BlockContext<'_>) {
        let Some((_, end)) = cx.block_range() else { return };
        let newline = cx.newline_index();
        if !cx.is_newline_at_block_end() {
            cx.add_block_like(newline + 1, end);
        }
        cx.set_block_end(newline + 1);
    }

    fn handle_end_of_buffer_marker(&self, cx: &mut BlockContext<'_>) {
        let Some((start, _)) = cx.block_range() else { return };
        let marker = cx.marker_index();
        if start != marker {
            cx.set_block_end(marker);
        }
    }
}
