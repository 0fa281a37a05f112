// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::time::Instant;

use tracing::{debug, warn};

use crate::blocks::{collapse_before_delete, PendingEdits};
use crate::{
    CoalescerConfig, EditCoalescer, EditError, EditRouter, HtmlParser,
    HtmlSerializer, SpannedText, TextChange,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EditorConfig {
    pub coalescer: CoalescerConfig,
    /// Replays allowed per edit. `None` uses the document's nesting depth.
    pub max_replay_depth: Option<usize>,
}

/// A document being edited: the buffer plus everything that keeps its
/// block structure in shape while text changes.
pub struct Editor {
    text: SpannedText,
    router: EditRouter,
    parser: HtmlParser,
    serializer: HtmlSerializer,
    coalescer: EditCoalescer,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    /// An empty document.
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    pub fn with_config(config: EditorConfig) -> Self {
        let mut router = EditRouter::new();
        router.set_max_replay_depth(config.max_replay_depth);
        Self {
            text: SpannedText::new(),
            router,
            parser: HtmlParser::new(),
            serializer: HtmlSerializer::new(),
            coalescer: EditCoalescer::new(config.coalescer),
        }
    }

    pub fn from_html(html: &str) -> Self {
        let mut editor = Self::new();
        editor.set_html(html);
        editor
    }

    /// Replaces the whole document. Held input events are dropped.
    pub fn set_html(&mut self, html: &str) {
        self.coalescer.flush();
        self.text = self.parser.parse(html);
    }

    pub fn to_html(&self) -> String {
        self.serializer.serialize(&self.text)
    }

    /// The document text, without the end-of-buffer marker.
    pub fn text(&self) -> String {
        self.text.plain_text()
    }

    pub fn buffer(&self) -> &SpannedText {
        &self.text
    }

    pub fn parser_mut(&mut self) -> &mut HtmlParser {
        &mut self.parser
    }

    pub fn serializer_mut(&mut self) -> &mut HtmlSerializer {
        &mut self.serializer
    }

    pub fn router_mut(&mut self) -> &mut EditRouter {
        &mut self.router
    }

    pub fn insert(&mut self, pos: usize, text: &str) -> Result<(), EditError> {
        self.apply(TextChange::insert(pos, text))
    }

    pub fn delete(
        &mut self,
        start: usize,
        end: usize,
    ) -> Result<(), EditError> {
        if start > end {
            return Err(EditError::ReversedRange { start, end });
        }
        self.apply(TextChange::delete(start, end))
    }

    pub fn replace(
        &mut self,
        start: usize,
        end: usize,
        text: &str,
    ) -> Result<(), EditError> {
        if start > end {
            return Err(EditError::ReversedRange { start, end });
        }
        self.apply(TextChange::replace(start, end, text))
    }

    /// Applies one edit and brings the block structure back in line.
    ///
    /// Blocks that the deletion would collapse onto the line above are
    /// retired before any text goes away.
    pub fn apply(&mut self, change: TextChange) -> Result<(), EditError> {
        let TextChange {
            start,
            deleted,
            inserted,
        } = change;
        let end = start.saturating_add(deleted);
        if deleted > 0 {
            self.text.check_range(start, end)?;
            collapse_before_delete(&mut self.text, start, end);
        }
        self.text.delete_text(start, end)?;
        let count = self.text.insert_text(start, &inserted)?;

        let mut pending = PendingEdits::new();
        self.router.dispatch(&mut self.text, start, count, &mut pending);
        self.delete_marked(pending);

        if let Some(marker) = self.text.restore_end_marker() {
            debug!(marker, "end-of-buffer marker restored");
            if marker > 0 && self.text.is_newline_at(marker - 1) {
                let mut pending = PendingEdits::new();
                self.router.dispatch(&mut self.text, marker, 1, &mut pending);
                self.delete_marked(pending);
            }
        }
        Ok(())
    }

    fn delete_marked(&mut self, mut pending: PendingEdits) {
        for range in pending.take_deletions() {
            if let Err(err) = self.text.delete_text(range.start, range.end) {
                warn!(%err, "could not delete marked text");
            }
        }
    }

    /// Feeds a raw input event through the coalescing pre-filter and applies
    /// whatever it releases.
    pub fn queue(
        &mut self,
        change: TextChange,
        at: Instant,
    ) -> Result<(), EditError> {
        let released =
            self.coalescer.push(self.text.text().as_slice(), change, at);
        self.apply_all(released)
    }

    /// Applies held input events once their burst window has passed.
    pub fn poll(&mut self, now: Instant) -> Result<(), EditError> {
        let released = self.coalescer.poll(now);
        self.apply_all(released)
    }

    /// Applies every held input event now.
    pub fn flush(&mut self) -> Result<(), EditError> {
        let released = self.coalescer.flush();
        self.apply_all(released)
    }

    fn apply_all(&mut self, changes: Vec<TextChange>) -> Result<(), EditError> {
        for change in changes {
            self.apply(change)?;
        }
        Ok(())
    }
}
