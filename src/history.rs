//! Linear snapshot history for undo/redo.
//!
//! Each entry is a full snapshot taken after one completed gesture. The
//! cursor points at the entry matching the current state; pushing while
//! the cursor is below the top discards the forward entries.

use std::collections::VecDeque;

/// One captured state, tagged with a monotonically increasing index.
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry<S> {
    pub index: u64,
    pub snapshot: S,
}

#[derive(Clone, Debug)]
pub struct History<S> {
    entries: VecDeque<HistoryEntry<S>>,
    cursor: usize,
    limit: usize,
    next_index: u64,
}

impl<S: Clone + PartialEq> History<S> {
    /// A history whose only entry is `initial`. `limit` is clamped to at
    /// least one entry.
    pub fn new(initial: S, limit: usize) -> Self {
        let mut history = Self {
            entries: VecDeque::new(),
            cursor: 0,
            limit: limit.max(1),
            next_index: 0,
        };
        history.reset(initial);
        history
    }

    /// Drops every entry and starts over from `snapshot`.
    pub fn reset(&mut self, snapshot: S) {
        self.entries.clear();
        self.entries.push_back(HistoryEntry {
            index: self.next_index,
            snapshot,
        });
        self.next_index += 1;
        self.cursor = 0;
    }

    /// Records a new state. Returns false when `snapshot` equals the
    /// current entry, in which case nothing changes.
    pub fn push(&mut self, snapshot: S) -> bool {
        if self.current() == Some(&snapshot) {
            return false;
        }

        self.entries.truncate(self.cursor + 1);
        self.entries.push_back(HistoryEntry {
            index: self.next_index,
            snapshot,
        });
        self.next_index += 1;

        while self.entries.len() > self.limit {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        true
    }

    /// Steps back and returns the state to restore.
    pub fn undo(&mut self) -> Option<&S> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    /// Steps forward and returns the state to restore.
    pub fn redo(&mut self) -> Option<&S> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn current(&self) -> Option<&S> {
        self.entries.get(self.cursor).map(|e| &e.snapshot)
    }

    pub fn current_index(&self) -> Option<u64> {
        self.entries.get(self.cursor).map(|e| e.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
