//! Move history
//!
//! `done` holds the user moves currently applied, `redo` the moves undone
//! since the last new user move. Subscribers are told about every change.

use std::panic::{AssertUnwindSafe, catch_unwind};

use serde::{Deserialize, Serialize};

use super::notation::Move;

/// Change to the move history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// A user move finished animating and was recorded
    UserMoveApplied { mv: Move, step_count: usize },
    /// A move was taken off `done` for undoing
    Undone { mv: Move, step_count: usize },
    /// A move was put back on `done` for replaying
    Redone { mv: Move, step_count: usize },
    /// Both stacks were emptied
    Cleared,
}

impl HistoryEvent {
    /// Length of `done` after this change
    pub fn step_count(&self) -> usize {
        match *self {
            HistoryEvent::UserMoveApplied { step_count, .. }
            | HistoryEvent::Undone { step_count, .. }
            | HistoryEvent::Redone { step_count, .. } => step_count,
            HistoryEvent::Cleared => 0,
        }
    }
}

/// Handle returned by [`History::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Listener = Box<dyn FnMut(&HistoryEvent)>;

/// Done/redo stacks with change notification
#[derive(Default)]
pub struct History {
    done: Vec<Move>,
    redo: Vec<Move>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u32,
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("History")
            .field("done", &self.done)
            .field("redo", &self.redo)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applied user moves, oldest first
    pub fn done(&self) -> &[Move] {
        &self.done
    }

    /// Undone moves, most recently undone last
    pub fn redo_stack(&self) -> &[Move] {
        &self.redo
    }

    /// Number of user moves currently applied
    pub fn step_count(&self) -> usize {
        self.done.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.done.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Record a completed user move; invalidates the redo stack
    pub fn record(&mut self, mv: Move) {
        self.done.push(mv);
        self.redo.clear();
        let step_count = self.done.len();
        self.emit(HistoryEvent::UserMoveApplied { mv, step_count });
    }

    /// Move the last applied move onto the redo stack
    pub fn pop_for_undo(&mut self) -> Option<Move> {
        let mv = self.done.pop()?;
        self.redo.push(mv);
        let step_count = self.done.len();
        self.emit(HistoryEvent::Undone { mv, step_count });
        Some(mv)
    }

    /// Move the last undone move back onto `done`
    pub fn pop_for_redo(&mut self) -> Option<Move> {
        let mv = self.redo.pop()?;
        self.done.push(mv);
        let step_count = self.done.len();
        self.emit(HistoryEvent::Redone { mv, step_count });
        Some(mv)
    }

    /// Moves that take the puzzle from its current state back to solved
    pub fn inverse_sequence(&self) -> Vec<Move> {
        self.done.iter().rev().map(|mv| mv.inverse()).collect()
    }

    pub fn clear(&mut self) {
        self.done.clear();
        self.redo.clear();
        self.emit(HistoryEvent::Cleared);
    }

    /// Register a listener for history changes
    pub fn subscribe(&mut self, listener: impl FnMut(&HistoryEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: HistoryEvent) {
        for (id, listener) in &mut self.listeners {
            // A failing listener must not leave the stacks half-updated
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                log::warn!("History listener {id:?} panicked on {event:?}");
            }
        }
    }
}
