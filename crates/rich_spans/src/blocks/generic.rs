// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use crate::blocks::{BlockContext, BlockHandler};
use crate::{BlockKind, Span, SpanKind};

/// Paragraphs and `div`s. A double enter at the end closes the block; a
/// double enter in an empty block removes it.
#[derive(Debug, Default)]
pub struct GenericBlockHandler;

impl BlockHandler for GenericBlockHandler {
    fn manages(&self, span: &Span) -> bool {
        matches!(
            span.kind,
            SpanKind::Block(BlockKind::Paragraph | BlockKind::Generic)
        )
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

/// Pulls the block's end back before the newline, drops the newline and
/// replays it so the enclosing block can react.
pub(crate) fn close_before_newline(cx: &mut BlockContext<'_>) {
    let newline = cx.newline_index();
    cx.set_block_end(newline);
    cx.mark_for_deletion(newline, newline + 1);
    cx.request_replay(newline);
}

pub(crate) fn remove_with_newline(cx: &mut BlockContext<'_>) {
    let newline = cx.newline_index();
    cx.remove_block();
    cx.mark_for_deletion(newline, newline + 1);
}

#[cfg(test)]
mod tests {
    use speculoos::prelude::*;

    use crate::Editor;

    #[test]
    fn enter_inside_a_paragraph_is_a_line_break() {
        let mut editor = Editor::from_html("<p>abc</p>");
        editor.insert(1, "\n").unwrap();
        editor.buffer().explicitly_assert_invariants();
        assert_that!(editor.to_html())
            .is_equal_to("<p>a<br>bc</p>".to_string());
    }

    #[test]
    fn double_enter_at_end_closes_the_paragraph() {
        let mut editor = Editor::from_html("<p>abc</p>");
        editor.insert(3, "\n").unwrap();
        editor.insert(4, "\n").unwrap();
        editor.insert(4, "x").unwrap();
        editor.buffer().explicitly_assert_invariants();
        assert_that!(editor.to_html()).is_equal_to("<p>abc</p>x".to_string());
    }

    #[test]
    fn enter_on_empty_div_removes_it() {
        let mut editor = Editor::from_html("<div></div>");
        editor.insert(0, "\n").unwrap();
        assert_that!(editor.to_html()).is_equal_to(String::new());
        assert_that!(editor.buffer().span_count()).is_equal_to(0);
    }
}
