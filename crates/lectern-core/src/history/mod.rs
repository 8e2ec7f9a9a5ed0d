//! Undo/redo command log
//!
//! Every edit a narrator makes goes through a command object that owns
//! the minimal pre/post state needed to invert itself and is applied
//! against an explicitly passed-in mutable context. No command holds a
//! reference into the state it edits, so there is nothing to alias and
//! nothing to persist — history lives and dies with the session.

pub mod chunking;
pub mod narration;

pub use chunking::ChunkingAction;
pub use narration::{NarrationAction, NarrationContext};

/// An invertible edit applied against a mutable context.
pub trait UndoableAction {
    type Context;

    /// Perform the edit.
    fn apply(&mut self, ctx: &mut Self::Context);

    /// Revert the edit. Only ever called after `apply` on the same
    /// value.
    fn undo(&mut self, ctx: &mut Self::Context);

    /// Re-perform the edit after an undo. Most actions simply re-apply.
    fn redo(&mut self, ctx: &mut Self::Context) {
        self.apply(ctx);
    }
}

/// Two-stack LIFO undo/redo log.
///
/// History is scoped to one chapter's working session; switching
/// chapters calls [`clear`](History::clear). Undo and redo on empty
/// stacks are silent no-ops — the UI buttons stay hot without
/// pre-checks, and nothing here ever fails.
pub struct History<A: UndoableAction> {
    undo_stack: Vec<A>,
    redo_stack: Vec<A>,
}

/// Undo/redo over verse-boundary edits
pub type NarrationHistory = History<NarrationAction>;

/// Undo/redo over take-management edits
pub type ChunkingHistory = History<ChunkingAction>;

impl<A: UndoableAction> History<A> {
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    /// Apply `action` and make it the newest undoable edit. Redoable
    /// edits are discarded — there are no branching timelines.
    pub fn execute(&mut self, mut action: A, ctx: &mut A::Context) {
        action.apply(ctx);
        self.undo_stack.push(action);
        self.redo_stack.clear();
    }

    /// Revert the newest edit, if any.
    pub fn undo(&mut self, ctx: &mut A::Context) {
        if let Some(mut action) = self.undo_stack.pop() {
            action.undo(ctx);
            self.redo_stack.push(action);
        }
    }

    /// Re-perform the most recently undone edit, if any.
    pub fn redo(&mut self, ctx: &mut A::Context) {
        if let Some(mut action) = self.redo_stack.pop() {
            action.redo(ctx);
            self.undo_stack.push(action);
        }
    }

    /// Drop both stacks (switching chapters or projects).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }
}

impl<A: UndoableAction> Default for History<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Adds a fixed amount to a counter; inverse subtracts it.
    struct AddAction(i64);

    impl UndoableAction for AddAction {
        type Context = i64;

        fn apply(&mut self, ctx: &mut i64) {
            *ctx += self.0;
        }

        fn undo(&mut self, ctx: &mut i64) {
            *ctx -= self.0;
        }
    }

    #[test]
    fn test_execute_undo_redo() {
        let mut history: History<AddAction> = History::new();
        let mut counter = 0i64;

        history.execute(AddAction(5), &mut counter);
        history.execute(AddAction(3), &mut counter);
        assert_eq!(counter, 8);

        history.undo(&mut counter);
        assert_eq!(counter, 5);
        history.redo(&mut counter);
        assert_eq!(counter, 8);
    }

    #[test]
    fn test_empty_stacks_are_silent_noops() {
        let mut history: History<AddAction> = History::new();
        let mut counter = 7i64;

        history.undo(&mut counter);
        history.redo(&mut counter);
        assert_eq!(counter, 7);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_execute_clears_redo() {
        let mut history: History<AddAction> = History::new();
        let mut counter = 0i64;

        history.execute(AddAction(10), &mut counter);
        history.undo(&mut counter);
        assert!(history.can_redo());

        history.execute(AddAction(1), &mut counter);
        assert!(!history.can_redo());
        assert_eq!(counter, 1);

        // the abandoned branch is gone for good
        history.redo(&mut counter);
        assert_eq!(counter, 1);
    }

    #[test]
    fn test_clear_drops_both_stacks() {
        let mut history: History<AddAction> = History::new();
        let mut counter = 0i64;

        history.execute(AddAction(2), &mut counter);
        history.execute(AddAction(2), &mut counter);
        history.undo(&mut counter);
        history.clear();

        assert!(!history.can_undo());
        assert!(!history.can_redo());
        // clearing history does not touch the state itself
        assert_eq!(counter, 2);
    }
}
