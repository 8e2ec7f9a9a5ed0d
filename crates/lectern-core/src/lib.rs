//! Lectern Core - narration engine for verse-by-verse audio recording
//!
//! The engine keeps three things consistent during a recording session:
//! a single append-only working audio file, the user-editable verse
//! boundaries over it, and an undo/redo log of every boundary edit.
//! Finalized chapters are delivered as WAV files with the verse
//! boundaries embedded as cue points.

pub mod chapter;
pub mod config;
pub mod export;
pub mod history;
pub mod take;
pub mod types;
pub mod wav;
pub mod working;

pub use types::*;
