//! Takes and the chunk-checking log
//!
//! A take is one recorded attempt at a unit of content. The arena is an
//! append-only log with a single "latest selected" slot; deletion is a
//! soft delete (a timestamp on the record) so the checking commands can
//! always restore what they removed. Interested parties subscribe to
//! arena events over plain mpsc channels.

use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, Sender};

use chrono::{DateTime, Utc};

/// Index of a take within its owning arena.
///
/// Ids are scoped to the arena, never process-global, and stay stable
/// for the life of the log because takes are never physically removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TakeId(usize);

impl TakeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Soft-delete state of a take
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeState {
    Alive,
    Deleted { at: DateTime<Utc> },
}

impl TakeState {
    pub fn is_deleted(&self) -> bool {
        matches!(self, TakeState::Deleted { .. })
    }
}

/// Community-checking progression for a take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckingStatus {
    #[default]
    Unchecked,
    PeerChecked,
    KeywordChecked,
    Verified,
}

/// One recorded attempt for a chunk or verse
#[derive(Debug, Clone)]
pub struct Take {
    /// Display number within the chunk (1-based)
    pub number: u32,
    /// Audio file backing this take
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
    pub state: TakeState,
    pub checking: CheckingStatus,
}

impl Take {
    pub fn new(number: u32, path: impl Into<PathBuf>) -> Self {
        Self {
            number,
            path: path.into(),
            created_at: Utc::now(),
            state: TakeState::Alive,
            checking: CheckingStatus::default(),
        }
    }
}

/// Events broadcast to arena subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TakeEvent {
    Recorded(TakeId),
    Deleted(TakeId),
    Restored(TakeId),
    Selected(Option<TakeId>),
    CheckingChanged(TakeId, CheckingStatus),
}

/// Append-only take log with selection and subscriber broadcast
#[derive(Default)]
pub struct TakeArena {
    takes: Vec<Take>,
    selected: Option<TakeId>,
    subscribers: Vec<Sender<TakeEvent>>,
}

impl TakeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to arena events. Disconnected receivers are pruned on
    /// the next broadcast.
    pub fn subscribe(&mut self) -> Receiver<TakeEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn broadcast(&mut self, event: TakeEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Append a take to the log. Returns its arena id.
    pub fn insert(&mut self, take: Take) -> TakeId {
        let id = TakeId(self.takes.len());
        log::debug!("take {} recorded as {:?}", take.number, id);
        self.takes.push(take);
        self.broadcast(TakeEvent::Recorded(id));
        id
    }

    pub fn get(&self, id: TakeId) -> Option<&Take> {
        self.takes.get(id.0)
    }

    /// Every take ever recorded, soft-deleted ones included
    pub fn all(&self) -> &[Take] {
        &self.takes
    }

    /// Takes visible to numbering and selection queries
    pub fn alive(&self) -> impl Iterator<Item = (TakeId, &Take)> {
        self.takes
            .iter()
            .enumerate()
            .filter(|(_, take)| !take.state.is_deleted())
            .map(|(i, take)| (TakeId(i), take))
    }

    /// Number for the next recorded take: one past the highest live
    /// number.
    pub fn next_number(&self) -> u32 {
        self.alive().map(|(_, take)| take.number).max().unwrap_or(0) + 1
    }

    /// Soft-delete: the record keeps its storage and gains a timestamp.
    /// No-op for already-deleted or unknown ids.
    pub fn mark_deleted(&mut self, id: TakeId, at: DateTime<Utc>) {
        let Some(take) = self.takes.get_mut(id.0) else {
            return;
        };
        if take.state.is_deleted() {
            return;
        }
        take.state = TakeState::Deleted { at };
        self.broadcast(TakeEvent::Deleted(id));
    }

    /// Clear a soft-delete flag. No-op for live or unknown ids.
    pub fn restore(&mut self, id: TakeId) {
        let Some(take) = self.takes.get_mut(id.0) else {
            return;
        };
        if !take.state.is_deleted() {
            return;
        }
        take.state = TakeState::Alive;
        self.broadcast(TakeEvent::Restored(id));
    }

    pub fn selected(&self) -> Option<TakeId> {
        self.selected
    }

    /// Change the latest-selected slot
    pub fn select(&mut self, id: Option<TakeId>) {
        if self.selected == id {
            return;
        }
        self.selected = id;
        self.broadcast(TakeEvent::Selected(id));
    }

    pub fn checking(&self, id: TakeId) -> Option<CheckingStatus> {
        self.get(id).map(|take| take.checking)
    }

    pub fn set_checking(&mut self, id: TakeId, status: CheckingStatus) {
        let Some(take) = self.takes.get_mut(id.0) else {
            return;
        };
        if take.checking == status {
            return;
        }
        take.checking = status;
        self.broadcast(TakeEvent::CheckingChanged(id, status));
    }
}
