// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use tracing::{debug, warn};

use crate::blocks::{
    BlockHandler, GenericBlockHandler, HeadingHandler, ListHandler,
    ListItemHandler, PendingEdits, PreformatHandler, QuoteHandler, TextChanged,
};
use crate::SpannedText;

/// One edit as reported by a text widget: `deleted` code units removed at
/// `start`, then `inserted` written there.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextChange {
    pub start: usize,
    pub deleted: usize,
    pub inserted: String,
}

impl TextChange {
    pub fn insert(start: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            deleted: 0,
            inserted: text.into(),
        }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self {
            start,
            deleted: end.saturating_sub(start),
            inserted: String::new(),
        }
    }

    pub fn replace(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            deleted: end.saturating_sub(start),
            inserted: text.into(),
        }
    }

    /// Length of the inserted text in UTF-16 code units.
    pub fn inserted_len(&self) -> usize {
        self.inserted.encode_utf16().count()
    }

    pub fn is_insertion(&self) -> bool {
        self.deleted == 0 && !self.inserted.is_empty()
    }

    pub fn is_deletion(&self) -> bool {
        self.deleted > 0 && self.inserted.is_empty()
    }
}

/// Hands every inserted range to the block handlers, in order, and replays
/// newlines a handler retracted its block from.
pub struct EditRouter {
    handlers: Vec<Box<dyn BlockHandler>>,
    max_replay_depth: Option<usize>,
}

impl Default for EditRouter {
    fn default() -> Self {
        let mut router = Self::empty();
        router
            .add_handler(Box::new(HeadingHandler))
            .add_handler(Box::new(ListHandler))
            .add_handler(Box::new(ListItemHandler))
            .add_handler(Box::new(QuoteHandler))
            .add_handler(Box::new(PreformatHandler))
            .add_handler(Box::new(GenericBlockHandler));
        router
    }
}

impl EditRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A router with no handlers.
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
            max_replay_depth: None,
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn BlockHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    /// Caps replays per edit. Without a cap, the buffer's deepest nesting
    /// level plus one applies.
    pub fn set_max_replay_depth(&mut self, depth: Option<usize>) {
        self.max_replay_depth = depth;
    }

    pub fn dispatch(
        &self,
        text: &mut SpannedText,
        start: usize,
        count: usize,
        pending: &mut PendingEdits,
    ) {
        self.dispatch_at_depth(text, start, count, false, 0, pending);
    }

    fn dispatch_at_depth(
        &self,
        text: &mut SpannedText,
        start: usize,
        count: usize,
        is_replay: bool,
        depth: usize,
        pending: &mut PendingEdits,
    ) {
        if count == 0 || start + count > text.len() {
            return;
        }

        let event = TextChanged {
            input_start: start,
            count,
            nesting_level: text.nesting_level_at(start, start + count),
            is_replay,
        };
        debug!(
            start,
            count,
            level = event.nesting_level,
            is_replay,
            "dispatch"
        );
        for handler in &self.handlers {
            handler.handle_text_changed(text, event, pending);
        }

        let Some(index) = pending.take_replay() else { return };
        let limit = self
            .max_replay_depth
            .unwrap_or_else(|| text.max_nesting_level() + 1);
        if depth < limit {
            self.dispatch_at_depth(text, index, 1, true, depth + 1, pending);
        } else {
            warn!(index, depth, "replay depth exhausted");
        }
    }
}
