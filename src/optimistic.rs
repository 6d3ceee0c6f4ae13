// Copyright (c) Reelbook Team
// SPDX-License-Identifier: Apache-2.0

//! State container for optimistic UI updates with rollback on failure.

/// A confirmed value plus at most one in-flight optimistic change
#[derive(Debug, Clone)]
pub struct Optimistic<T> {
    value: T,
    snapshot: Option<T>,
}

impl<T: Clone> Optimistic<T> {
    pub fn new(value: T) -> Self {
        Self { value, snapshot: None }
    }

    /// Current value, optimistic change included
    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn is_pending(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Apply `update` now, remembering the confirmed value.
    ///
    /// A second `apply` before `settle` keeps the first snapshot, so a
    /// failure rolls back to the last confirmed value.
    pub fn apply(&mut self, update: impl FnOnce(&T) -> T) {
        let next = update(&self.value);
        if self.snapshot.is_none() {
            self.snapshot = Some(self.value.clone());
        }
        self.value = next;
    }

    /// Commit on success, restore the snapshot on failure
    pub fn settle<R, E>(&mut self, outcome: &Result<R, E>) {
        if let (Err(_), Some(previous)) = (outcome, self.snapshot.take()) {
            self.value = previous;
        }
    }

    /// Replace the value with fresh server state, dropping any snapshot
    pub fn refresh(&mut self, value: T) {
        self.value = value;
        self.snapshot = None;
    }
}
