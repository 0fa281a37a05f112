// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::blocks::generic::{close_before_newline, remove_with_newline};
use crate::blocks::{BlockContext, BlockHandler};
use crate::{BlockKind, Span, SpanKind};

#[derive(Debug, Default)]
pub struct QuoteHandler;

impl BlockHandler for QuoteHandler {
    fn manages(&self, span: &Span) -> bool {
        span.kind == SpanKind::Block(BlockKind::Quote)
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
