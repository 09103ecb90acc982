use std::collections::VecDeque;

/// One committed snapshot in the undo/redo stack
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry<T> {
    step: u64,
    snapshot: T,
}

impl<T> HistoryEntry<T> {
    /// Monotonically increasing index assigned when the entry was pushed
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn snapshot(&self) -> &T {
        &self.snapshot
    }
}

/// Bounded linear undo/redo stack over full-state snapshots.
///
/// `cursor` always addresses the entry that mirrors the owner's current
/// state. Pushing after an undo discards every entry beyond the cursor, so
/// the redo branch is gone once a new snapshot lands.
#[derive(Debug, Clone)]
pub struct HistoryStack<T> {
    entries: VecDeque<HistoryEntry<T>>,
    cursor: usize,
    capacity: usize,
    next_step: u64,
}

impl<T> HistoryStack<T> {
    /// Creates an empty stack holding at most `capacity` entries (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cursor: 0,
            capacity: capacity.max(1),
            next_step: 0,
        }
    }

    /// Commits a snapshot after the cursor and returns its step index
    pub fn push(&mut self, snapshot: T) -> u64 {
        // Drop the redo branch
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }

        let step = self.next_step;
        self.next_step += 1;
        self.entries.push_back(HistoryEntry { step, snapshot });

        // Oldest entries fall off when full
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len() - 1;
        step
    }

    /// Moves the cursor back one entry, returning the entry to restore.
    /// At the oldest entry this is a no-op.
    pub fn undo(&mut self) -> Option<&HistoryEntry<T>> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Moves the cursor forward one entry, returning the entry to restore.
    /// At the newest entry this is a no-op.
    pub fn redo(&mut self) -> Option<&HistoryEntry<T>> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    /// The entry matching the owner's current state
    pub fn current(&self) -> Option<&HistoryEntry<T>> {
        self.entries.get(self.cursor)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drops every entry. Step numbering keeps increasing.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
