//! Verse-boundary commands
//!
//! The three edits a narrator can make to a chapter's verse layout:
//! record the next verse, re-record an existing one, and drag the
//! boundary between two adjacent verses. Each captures what it needs to
//! invert itself; the verse list is only reached through the context
//! passed at call time.

use crate::chapter::ChapterRepresentation;
use crate::take::{TakeArena, TakeId};
use crate::types::VerseNode;

use super::UndoableAction;

/// Mutable state narration actions operate on: the chapter's verse
/// layout plus the take log backing its recordings.
pub struct NarrationContext {
    pub chapter: ChapterRepresentation,
    pub takes: TakeArena,
}

impl NarrationContext {
    pub fn new(chapter: ChapterRepresentation) -> Self {
        Self {
            chapter,
            takes: TakeArena::new(),
        }
    }
}

/// A single undoable verse edit
pub enum NarrationAction {
    /// The narrator finished recording the next verse: the working
    /// audio grew by `take_len` bytes and a node now covers them.
    NextVerse {
        take_len: u64,
        /// Take backing this verse, when take bookkeeping is in use
        take: Option<TakeId>,
        /// Node created by `apply`, so redo restores identical
        /// boundaries
        node: Option<VerseNode>,
        prev_base: u64,
    },
    /// A verse was re-recorded; its node now covers the fresh take.
    Rerecord {
        index: usize,
        take_len: u64,
        /// Pre-edit node, captured by `apply` for undo
        replaced: Option<VerseNode>,
        prev_base: u64,
    },
    /// The shared boundary between verses `left` and `right` moved to
    /// `boundary`.
    Marker {
        left: usize,
        right: usize,
        boundary: u64,
        /// Both old boundary values, captured by `apply`
        old: Option<(u64, u64)>,
    },
}

impl NarrationAction {
    pub fn next_verse(take_len: u64) -> Self {
        NarrationAction::NextVerse {
            take_len,
            take: None,
            node: None,
            prev_base: 0,
        }
    }

    /// Next-verse edit whose audio is bookkept as `take` in the take
    /// log; redo will clear a soft-delete flag left on it.
    pub fn next_verse_with_take(take_len: u64, take: TakeId) -> Self {
        NarrationAction::NextVerse {
            take_len,
            take: Some(take),
            node: None,
            prev_base: 0,
        }
    }

    pub fn rerecord(index: usize, take_len: u64) -> Self {
        NarrationAction::Rerecord {
            index,
            take_len,
            replaced: None,
            prev_base: 0,
        }
    }

    pub fn marker(left: usize, right: usize, boundary: u64) -> Self {
        NarrationAction::Marker {
            left,
            right,
            boundary,
            old: None,
        }
    }
}

impl UndoableAction for NarrationAction {
    type Context = NarrationContext;

    fn apply(&mut self, ctx: &mut NarrationContext) {
        match self {
            NarrationAction::NextVerse {
                take_len,
                node,
                prev_base,
                ..
            } => {
                *prev_base = ctx.chapter.recording_base();
                *node = Some(ctx.chapter.append_verse(*take_len));
            }
            NarrationAction::Rerecord {
                index,
                take_len,
                replaced,
                prev_base,
            } => {
                *prev_base = ctx.chapter.recording_base();
                *replaced = ctx.chapter.replace_verse(*index, *take_len);
            }
            NarrationAction::Marker {
                left,
                right,
                boundary,
                old,
            } => {
                let (Some(l), Some(r)) = (ctx.chapter.verse(*left), ctx.chapter.verse(*right))
                else {
                    return;
                };
                *old = Some((l.end, r.start));
                // out-of-range boundaries clamp, same as seek input
                let clamped = (*boundary).clamp(l.start, r.end);
                ctx.chapter.move_marker(*left, *right, clamped);
            }
        }
    }

    fn undo(&mut self, ctx: &mut NarrationContext) {
        match self {
            NarrationAction::NextVerse { prev_base, .. } => {
                // the recorded bytes stay in the working file; only the
                // node hiding them goes away
                ctx.chapter.truncate_last();
                ctx.chapter.set_recording_base(*prev_base);
            }
            NarrationAction::Rerecord {
                index,
                replaced,
                prev_base,
                ..
            } => {
                if let Some(old) = replaced {
                    ctx.chapter.restore_verse(*index, *old);
                }
                ctx.chapter.set_recording_base(*prev_base);
            }
            NarrationAction::Marker {
                left, right, old, ..
            } => {
                if let Some((left_end, right_start)) = old {
                    ctx.chapter
                        .restore_marker(*left, *right, *left_end, *right_start);
                }
            }
        }
    }

    fn redo(&mut self, ctx: &mut NarrationContext) {
        match self {
            NarrationAction::NextVerse { node, take, .. } => {
                // re-append with the exact boundaries apply produced
                if let Some(node) = node {
                    ctx.chapter.push_verse(*node);
                }
                // a take soft-deleted while this verse was undone comes
                // back with it
                if let Some(id) = take {
                    ctx.takes.restore(*id);
                }
            }
            _ => self.apply(ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::NarrationHistory;
    use crate::take::Take;

    fn context() -> NarrationContext {
        NarrationContext::new(ChapterRepresentation::new())
    }

    #[test]
    fn test_next_verse_boundaries_accumulate() {
        let mut ctx = context();
        let mut history = NarrationHistory::new();

        let lens = [100u64, 200, 300, 400];
        for len in lens {
            history.execute(NarrationAction::next_verse(len), &mut ctx);
        }

        let verses = ctx.chapter.verses();
        assert_eq!(verses.len(), lens.len());
        let mut sum = 0;
        for (node, len) in verses.iter().zip(lens) {
            assert_eq!(node.start, sum);
            sum += len;
            assert_eq!(node.end, sum);
        }
    }

    #[test]
    fn test_undo_restores_exact_pre_action_state() {
        let mut ctx = context();
        let mut history = NarrationHistory::new();

        history.execute(NarrationAction::next_verse(100), &mut ctx);
        history.execute(NarrationAction::next_verse(200), &mut ctx);
        let before = ctx.chapter.verses();

        history.execute(NarrationAction::rerecord(0, 500), &mut ctx);
        let after = ctx.chapter.verses();
        assert_ne!(before, after);

        history.undo(&mut ctx);
        assert_eq!(ctx.chapter.verses(), before);

        history.redo(&mut ctx);
        assert_eq!(ctx.chapter.verses(), after);
    }

    #[test]
    fn test_undo_next_verse_truncates_without_deleting_audio() {
        let mut ctx = context();
        let mut history = NarrationHistory::new();

        history.execute(NarrationAction::next_verse(100), &mut ctx);
        history.execute(NarrationAction::next_verse(50), &mut ctx);
        history.undo(&mut ctx);

        assert_eq!(ctx.chapter.verses(), vec![VerseNode::new(0, 100)]);
        // the next take records where the undone one did
        assert_eq!(ctx.chapter.recording_base(), 100);

        history.redo(&mut ctx);
        assert_eq!(
            ctx.chapter.verses(),
            vec![VerseNode::new(0, 100), VerseNode::new(100, 150)]
        );
    }

    #[test]
    fn test_rerecord_scenario() {
        let mut ctx = context();
        let mut history = NarrationHistory::new();

        for len in [100u64, 200, 300, 400] {
            history.execute(NarrationAction::next_verse(len), &mut ctx);
        }

        history.execute(NarrationAction::rerecord(1, 500), &mut ctx);
        let verses = ctx.chapter.verses();
        assert_eq!(verses[1], VerseNode::new(100, 600));
        // nothing else shifted
        assert_eq!(verses[0], VerseNode::new(0, 100));
        assert_eq!(verses[2], VerseNode::new(300, 600));
        assert_eq!(verses[3], VerseNode::new(600, 1000));

        // appends continue from the re-recorded verse's end
        history.execute(NarrationAction::next_verse(50), &mut ctx);
        assert_eq!(ctx.chapter.verses()[4], VerseNode::new(600, 650));
    }

    #[test]
    fn test_marker_scenario() {
        let mut ctx = context();
        let mut history = NarrationHistory::new();

        history.execute(NarrationAction::next_verse(100), &mut ctx);
        history.execute(NarrationAction::next_verse(200), &mut ctx);

        history.execute(NarrationAction::marker(0, 1, 120), &mut ctx);
        assert_eq!(
            ctx.chapter.verses(),
            vec![VerseNode::new(0, 120), VerseNode::new(120, 300)]
        );

        history.undo(&mut ctx);
        assert_eq!(
            ctx.chapter.verses(),
            vec![VerseNode::new(0, 100), VerseNode::new(100, 300)]
        );
    }

    #[test]
    fn test_marker_clamps_out_of_range_boundary() {
        let mut ctx = context();
        let mut history = NarrationHistory::new();

        history.execute(NarrationAction::next_verse(100), &mut ctx);
        history.execute(NarrationAction::next_verse(200), &mut ctx);

        history.execute(NarrationAction::marker(0, 1, 9999), &mut ctx);
        assert_eq!(
            ctx.chapter.verses(),
            vec![VerseNode::new(0, 300), VerseNode::new(300, 300)]
        );

        history.undo(&mut ctx);
        assert_eq!(
            ctx.chapter.verses(),
            vec![VerseNode::new(0, 100), VerseNode::new(100, 300)]
        );
    }

    #[test]
    fn test_next_verse_redo_restores_soft_deleted_take() {
        let mut ctx = context();
        let mut history = NarrationHistory::new();

        let take = ctx.takes.insert(Take::new(1, "take-1.pcm"));
        history.execute(NarrationAction::next_verse_with_take(100, take), &mut ctx);

        history.undo(&mut ctx);
        // while the verse is undone, the take gets cleaned up
        ctx.takes.mark_deleted(take, chrono::Utc::now());
        assert!(ctx.takes.get(take).unwrap().state.is_deleted());

        history.redo(&mut ctx);
        assert!(!ctx.takes.get(take).unwrap().state.is_deleted());
        assert_eq!(ctx.chapter.verses(), vec![VerseNode::new(0, 100)]);
    }
}
