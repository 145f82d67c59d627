//! Undo history of graph states.
//!
//! # Invariants
//! - `History` is a plain value; `push` and `pop` return the next history.
//! - With a limit set, the oldest entries are dropped first.
//! - Only graph states are recorded. Trees are rebuilt on undo.

use crate::graph::State;
use std::collections::VecDeque;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    states: VecDeque<State>,
    limit: Option<usize>,
}

impl History {
    /// Unbounded history.
    pub fn new() -> Self {
        Self::default()
    }

    /// History keeping at most `limit` states. A zero limit records nothing.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            states: VecDeque::new(),
            limit: Some(limit),
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Most recently pushed state, if any.
    pub fn peek(&self) -> Option<&State> {
        self.states.back()
    }

    pub fn push(mut self, state: State) -> Self {
        self.states.push_back(state);
        if let Some(limit) = self.limit {
            while self.states.len() > limit {
                self.states.pop_front();
            }
        }
        self
    }

    pub fn pop(mut self) -> (Self, Option<State>) {
        let state = self.states.pop_back();
        (self, state)
    }
}
