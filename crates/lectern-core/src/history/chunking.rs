//! Take-management commands for chunk checking
//!
//! Recording, soft-deleting, selecting and reviewing takes all go
//! through the same undo/redo contract as the verse edits. Deletion is
//! never physical: a take keeps its storage and gains a timestamp, so
//! these commands can always walk their effects back.

use chrono::Utc;

use crate::take::{CheckingStatus, Take, TakeArena, TakeId};

use super::UndoableAction;

/// A single undoable take edit
pub enum ChunkingAction {
    /// A fresh take was recorded for the chunk.
    Record {
        take: Take,
        /// Arena id assigned on first apply; redo restores this take
        /// instead of inserting a duplicate
        id: Option<TakeId>,
    },
    /// Soft-delete a take. `was_selected` is supplied by the caller so
    /// undo can restore the selection the deletion displaced.
    Delete { id: TakeId, was_selected: bool },
    /// Change the currently-selected take.
    Select {
        id: Option<TakeId>,
        /// Selection before apply
        prev: Option<TakeId>,
    },
    /// Change a take's checking status.
    Confirm {
        id: TakeId,
        status: CheckingStatus,
        /// Status before apply
        prev: Option<CheckingStatus>,
    },
}

impl ChunkingAction {
    pub fn record(take: Take) -> Self {
        ChunkingAction::Record { take, id: None }
    }

    pub fn delete(id: TakeId, was_selected: bool) -> Self {
        ChunkingAction::Delete { id, was_selected }
    }

    pub fn select(id: Option<TakeId>) -> Self {
        ChunkingAction::Select { id, prev: None }
    }

    pub fn confirm(id: TakeId, status: CheckingStatus) -> Self {
        ChunkingAction::Confirm {
            id,
            status,
            prev: None,
        }
    }
}

impl UndoableAction for ChunkingAction {
    type Context = TakeArena;

    fn apply(&mut self, takes: &mut TakeArena) {
        match self {
            ChunkingAction::Record { take, id } => match id {
                // redo path: the take is already in the log, soft-deleted
                Some(id) => takes.restore(*id),
                None => *id = Some(takes.insert(take.clone())),
            },
            ChunkingAction::Delete { id, was_selected } => {
                takes.mark_deleted(*id, Utc::now());
                if *was_selected {
                    takes.select(None);
                }
            }
            ChunkingAction::Select { id, prev } => {
                *prev = takes.selected();
                takes.select(*id);
            }
            ChunkingAction::Confirm { id, status, prev } => {
                *prev = takes.checking(*id);
                takes.set_checking(*id, *status);
            }
        }
    }

    fn undo(&mut self, takes: &mut TakeArena) {
        match self {
            ChunkingAction::Record { id, .. } => {
                if let Some(id) = id {
                    takes.mark_deleted(*id, Utc::now());
                }
            }
            ChunkingAction::Delete { id, was_selected } => {
                takes.restore(*id);
                if *was_selected {
                    takes.select(Some(*id));
                }
            }
            ChunkingAction::Select { prev, .. } => {
                takes.select(*prev);
            }
            ChunkingAction::Confirm { id, prev, .. } => {
                if let Some(prev) = prev {
                    takes.set_checking(*id, *prev);
                }
            }
        }
    }

    // default redo re-invokes apply: Delete stamps a fresh deletion
    // time, Record/Select/Confirm re-play their captured effect
}
