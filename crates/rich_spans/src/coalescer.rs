// Copyright (c) 2026 Element Creations Ltd
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Pre-filter that rewrites known input-method event bursts before they
//! reach the editor.
//!
//! Some keyboards insert a space inside a word by deleting the word in two
//! steps and typing it back in two steps, all within a few milliseconds.
//! Handled naively, those four events tear down and rebuild every span over
//! the word. The coalescer holds closely timed events back while they still
//! match such a burst and, once the burst is complete, releases the single
//! insertion it stands for.
//!
//! Time is supplied by the caller, so the filter has no timer of its own:
//! call [EditCoalescer::poll] when the host's debounce timer fires.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::TextChange;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoalescerConfig {
    /// Longest pause between two events of one burst.
    pub max_gap: Duration,
    pub enabled: bool,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            max_gap: Duration::from_millis(50),
            enabled: true,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Delete,
    Insert,
}

/// Delete twice, then insert twice.
const IN_WORD_SPACE_INSERTION: [Step; 4] =
    [Step::Delete, Step::Delete, Step::Insert, Step::Insert];

#[derive(Debug)]
pub struct EditCoalescer {
    config: CoalescerConfig,
    held: VecDeque<(TextChange, Instant)>,
}

impl EditCoalescer {
    pub fn new(config: CoalescerConfig) -> Self {
        Self {
            config,
            held: VecDeque::new(),
        }
    }

    pub fn config(&self) -> CoalescerConfig {
        self.config
    }

    /// True when no event is being held back.
    pub fn is_idle(&self) -> bool {
        self.held.is_empty()
    }

    /// Offers `change`, observed at `at`, to the filter. `base` is the text
    /// the held events apply to, that is, the editor text before any of
    /// them. Returns the events that can be applied now, in order.
    pub fn push(
        &mut self,
        base: &[u16],
        change: TextChange,
        at: Instant,
    ) -> Vec<TextChange> {
        if !self.config.enabled {
            return vec![change];
        }

        let mut released = Vec::new();
        if let Some((_, last)) = self.held.back() {
            if at.saturating_duration_since(*last) > self.config.max_gap {
                released.extend(self.flush());
            }
        }
        self.held.push_back((change, at));

        let steps_match = self
            .held
            .iter()
            .zip(IN_WORD_SPACE_INSERTION.iter())
            .all(|((change, _), step)| step_of(change) == Some(*step));
        if !steps_match {
            released.extend(self.flush());
            return released;
        }
        if self.held.len() < IN_WORD_SPACE_INSERTION.len() {
            return released;
        }

        match self.space_insertion(base) {
            Some(replacement) => {
                debug!(
                    at = replacement.start,
                    "coalesced in-word space insertion"
                );
                self.held.clear();
                released.push(replacement);
            }
            None => released.extend(self.flush()),
        }
        released
    }

    /// Releases held events once the burst window has passed.
    pub fn poll(&mut self, now: Instant) -> Vec<TextChange> {
        match self.held.back() {
            Some((_, last))
                if now.saturating_duration_since(*last) > self.config.max_gap =>
            {
                self.flush()
            }
            _ => Vec::new(),
        }
    }

    /// Releases every held event unchanged.
    pub fn flush(&mut self) -> Vec<TextChange> {
        self.held.drain(..).map(|(change, _)| change).collect()
    }

    /// The single insertion the held burst amounts to, if the burst grew the
    /// text by exactly one space.
    fn space_insertion(&self, base: &[u16]) -> Option<TextChange> {
        let mut after = base.to_vec();
        for (change, _) in &self.held {
            let end = change.start.checked_add(change.deleted)?;
            if end > after.len() {
                return None;
            }
            after.splice(change.start..end, change.inserted.encode_utf16());
        }
        if after.len() != base.len() + 1 {
            return None;
        }

        let (first, _) = self.held.front()?;
        let probe = first.start + first.deleted;
        if after.get(probe) != Some(&u16::from(b' ')) {
            return None;
        }

        let index = base
            .iter()
            .zip(after.iter())
            .position(|(a, b)| a != b)
            .unwrap_or(base.len());
        Some(TextChange::insert(index, " "))
    }
}

impl Default for EditCoalescer {
    fn default() -> Self {
        Self::new(CoalescerConfig::default())
    }
}

fn step_of(change: &TextChange) -> Option<Step> {
    if change.is_deletion() {
        Some(Step::Delete)
    } else if change.is_insertion() {
        Some(Step::Insert)
    } else {
        None
    }
}
