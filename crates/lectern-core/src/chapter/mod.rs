//! Virtualized chapter audio
//!
//! [`ChapterRepresentation`] presents the ordered active verses as one
//! seekable PCM stream. Verse audio is scattered through the working
//! file — re-recorded and undone ranges stay on disk — but playback and
//! export only ever see the concatenation of the active ranges.

use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::types::VerseNode;
use crate::working::WorkingAudio;

/// Lifecycle and I/O errors raised by chapter reads
#[derive(Error, Debug)]
pub enum ChapterError {
    /// Read attempted before the working audio was attached
    #[error("chapter audio has not been opened")]
    NotOpen,

    /// Read attempted after `close()`
    #[error("chapter audio has been closed")]
    Closed,

    #[error("working audio I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

enum AudioState {
    Unopened,
    Open(Arc<dyn WorkingAudio>),
    Closed,
}

/// A chapter's verse-segmented audio as one logical stream.
///
/// Owns the active verse list exclusively; narration actions mutate it
/// through the hooks below, each of which is a single edit under one
/// write guard, so a reader observes either the pre- or post-edit list
/// and never a half-updated one.
pub struct ChapterRepresentation {
    verses: RwLock<Vec<VerseNode>>,
    audio: AudioState,
    /// Cursor into the logical stream (byte offset)
    position: u64,
    /// Where the next recorded take starts: the end of the most recently
    /// recorded verse, not necessarily the last node in the list
    recording_base: u64,
}

impl ChapterRepresentation {
    pub fn new() -> Self {
        Self {
            verses: RwLock::new(Vec::new()),
            audio: AudioState::Unopened,
            position: 0,
            recording_base: 0,
        }
    }

    /// Attach the chapter's working audio. Reads fail with `NotOpen`
    /// until this is called.
    pub fn open(&mut self, audio: Arc<dyn WorkingAudio>) {
        log::debug!("chapter audio opened ({} bytes on disk)", audio.len());
        self.audio = AudioState::Open(audio);
    }

    /// Release the audio handle. Every later read fails with `Closed`.
    pub fn close(&mut self) {
        log::debug!("chapter audio closed");
        self.audio = AudioState::Closed;
    }

    fn audio(&self) -> Result<Arc<dyn WorkingAudio>, ChapterError> {
        match &self.audio {
            AudioState::Open(audio) => Ok(audio.clone()),
            AudioState::Unopened => Err(ChapterError::NotOpen),
            AudioState::Closed => Err(ChapterError::Closed),
        }
    }

    /// Snapshot of the active verse list
    pub fn verses(&self) -> Vec<VerseNode> {
        self.verses.read().unwrap().clone()
    }

    pub fn verse(&self, index: usize) -> Option<VerseNode> {
        self.verses.read().unwrap().get(index).copied()
    }

    pub fn verse_count(&self) -> usize {
        self.verses.read().unwrap().len()
    }

    /// Total logical length: the sum of active verse ranges. Never the
    /// physical file length — superseded ranges are still on disk but
    /// excluded here.
    pub fn total_len(&self) -> u64 {
        self.verses.read().unwrap().iter().map(|v| v.len()).sum()
    }

    /// Current cursor position in the logical stream
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn has_remaining(&self) -> bool {
        self.position < self.total_len()
    }

    /// Move the cursor. Out-of-range positions clamp to
    /// `[0, total_len]` instead of erroring so scrubbing UI input never
    /// needs validation.
    pub fn seek(&mut self, position: u64) {
        self.position = position.min(self.total_len());
    }

    /// Fill `dest` starting at the current logical position and advance
    /// the cursor. Returns the number of bytes written, which is short
    /// at end of stream. A span crossing verse boundaries is mapped to
    /// the underlying physical ranges and concatenated transparently.
    pub fn read(&mut self, dest: &mut [u8]) -> Result<usize, ChapterError> {
        let audio = self.audio()?;
        let verses = self.verses();

        let mut written = 0usize;
        let mut logical = 0u64;
        for verse in &verses {
            if written == dest.len() {
                break;
            }
            let verse_start = logical;
            logical += verse.len();
            let verse_end = logical;
            if self.position >= verse_end {
                continue;
            }

            let into_verse = self.position - verse_start;
            let want = ((verse_end - self.position) as usize).min(dest.len() - written);
            let n = audio.read_range(verse.start + into_verse, &mut dest[written..written + want])?;
            written += n;
            self.position += n as u64;
            if n < want {
                // working file ends inside this verse range; stop rather
                // than fabricate bytes
                break;
            }
        }
        Ok(written)
    }

    // ─────────────────────────────────────────────────────────────
    // Mutation hooks, invoked by narration actions
    // ─────────────────────────────────────────────────────────────

    /// Append a verse of `take_len` bytes starting at the recording
    /// base. Returns the node it created.
    pub fn append_verse(&mut self, take_len: u64) -> VerseNode {
        let node = VerseNode::new(self.recording_base, self.recording_base + take_len);
        self.verses.write().unwrap().push(node);
        self.recording_base = node.end;
        node
    }

    /// Re-insert a node with known boundaries (redo of an append)
    pub fn push_verse(&mut self, node: VerseNode) {
        self.verses.write().unwrap().push(node);
        self.recording_base = node.end;
    }

    /// Remove the newest verse. The recorded bytes stay in the working
    /// file; only the node referencing them goes away. The recording
    /// base is left for the caller to restore.
    pub fn truncate_last(&mut self) -> Option<VerseNode> {
        self.verses.write().unwrap().pop()
    }

    /// Replace the verse at `index` with a fresh take of `take_len`
    /// bytes. The new range starts at the prior node's end (the start
    /// is unchanged for the first verse). Returns the replaced node, or
    /// `None` for an out-of-range index.
    pub fn replace_verse(&mut self, index: usize, take_len: u64) -> Option<VerseNode> {
        let mut verses = self.verses.write().unwrap();
        let old = *verses.get(index)?;
        let start = if index == 0 {
            old.start
        } else {
            verses[index - 1].end
        };
        let node = VerseNode::new(start, start + take_len);
        verses[index] = node;
        drop(verses);
        self.recording_base = node.end;
        Some(old)
    }

    /// Put a previously captured node back at `index` (undo of a
    /// re-record)
    pub fn restore_verse(&mut self, index: usize, node: VerseNode) {
        if let Some(slot) = self.verses.write().unwrap().get_mut(index) {
            *slot = node;
        }
    }

    /// Move the shared boundary between two adjacent verses: the left
    /// verse's end and the right verse's start both become `boundary`.
    pub fn move_marker(&mut self, left: usize, right: usize, boundary: u64) {
        let mut verses = self.verses.write().unwrap();
        if left >= verses.len() || right >= verses.len() {
            return;
        }
        verses[left].end = boundary;
        verses[right].start = boundary;
    }

    /// Restore both sides of a moved boundary (undo of a marker move)
    pub fn restore_marker(&mut self, left: usize, right: usize, left_end: u64, right_start: u64) {
        let mut verses = self.verses.write().unwrap();
        if left >= verses.len() || right >= verses.len() {
            return;
        }
        verses[left].end = left_end;
        verses[right].start = right_start;
    }

    /// Where the next take will start recording
    pub fn recording_base(&self) -> u64 {
        self.recording_base
    }

    /// Restore a previously captured recording base (undo support)
    pub fn set_recording_base(&mut self, base: u64) {
        self.recording_base = base;
    }
}

impl Default for ChapterRepresentation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::working::MemoryWorkingAudio;

    /// Chapter over an in-memory working file holding bytes 0,1,2,...
    fn chapter_with_audio(len: usize) -> ChapterRepresentation {
        let audio = MemoryWorkingAudio::new();
        let bytes: Vec<u8> = (0..len).map(|i| (i % 256) as u8).collect();
        audio.append(&bytes).unwrap();
        let mut chapter = ChapterRepresentation::new();
        chapter.open(Arc::new(audio));
        chapter
    }

    #[test]
    fn test_read_before_open_fails() {
        let mut chapter = ChapterRepresentation::new();
        let mut buf = [0u8; 4];
        assert!(matches!(
            chapter.read(&mut buf),
            Err(ChapterError::NotOpen)
        ));
    }

    #[test]
    fn test_read_after_close_fails() {
        let mut chapter = chapter_with_audio(100);
        chapter.append_verse(100);
        chapter.close();
        let mut buf = [0u8; 4];
        assert!(matches!(chapter.read(&mut buf), Err(ChapterError::Closed)));
    }

    #[test]
    fn test_append_sequence_boundaries() {
        let mut chapter = chapter_with_audio(0);
        for len in [100u64, 200, 300, 400] {
            chapter.append_verse(len);
        }
        assert_eq!(
            chapter.verses(),
            vec![
                VerseNode::new(0, 100),
                VerseNode::new(100, 300),
                VerseNode::new(300, 600),
                VerseNode::new(600, 1000),
            ]
        );
        assert_eq!(chapter.total_len(), 1000);
    }

    #[test]
    fn test_read_spans_verse_gap() {
        let mut chapter = chapter_with_audio(100);
        // two active verses with a superseded hole between them
        chapter.push_verse(VerseNode::new(0, 10));
        chapter.push_verse(VerseNode::new(50, 60));
        assert_eq!(chapter.total_len(), 20);

        let mut buf = [0u8; 20];
        assert_eq!(chapter.read(&mut buf).unwrap(), 20);
        let expected: Vec<u8> = (0..10u8).chain(50..60).collect();
        assert_eq!(&buf[..], &expected[..]);
        assert!(!chapter.has_remaining());
    }

    #[test]
    fn test_read_is_idempotent_under_seek() {
        let mut chapter = chapter_with_audio(100);
        chapter.push_verse(VerseNode::new(0, 30));
        chapter.push_verse(VerseNode::new(40, 90));

        let mut first = [0u8; 25];
        chapter.seek(15);
        assert_eq!(chapter.read(&mut first).unwrap(), 25);

        let mut second = [0u8; 25];
        chapter.seek(15);
        assert_eq!(chapter.read(&mut second).unwrap(), 25);

        assert_eq!(first, second);
    }

    #[test]
    fn test_seek_clamps() {
        let mut chapter = chapter_with_audio(50);
        chapter.append_verse(50);
        chapter.seek(10_000);
        assert_eq!(chapter.position(), 50);
        assert!(!chapter.has_remaining());
        chapter.seek(0);
        assert_eq!(chapter.position(), 0);
        assert!(chapter.has_remaining());
    }

    #[test]
    fn test_full_read_consumes_stream() {
        let mut chapter = chapter_with_audio(60);
        chapter.append_verse(25);
        chapter.append_verse(35);

        let mut buf = [0u8; 128];
        let n = chapter.read(&mut buf).unwrap();
        assert_eq!(n as u64, chapter.total_len());
        assert_eq!(chapter.position(), chapter.total_len());
        assert!(!chapter.has_remaining());

        // stream is exhausted now
        assert_eq!(chapter.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_total_len_excludes_superseded_ranges() {
        let mut chapter = chapter_with_audio(1000);
        chapter.append_verse(100);
        chapter.append_verse(200);
        // re-record verse 1: its audio now lives elsewhere, the old 200
        // bytes are dead but still on disk
        chapter.replace_verse(1, 50);
        assert_eq!(chapter.total_len(), 150);
    }

    #[test]
    fn test_replace_verse_keeps_first_start() {
        let mut chapter = chapter_with_audio(0);
        chapter.append_verse(80);
        let old = chapter.replace_verse(0, 30).unwrap();
        assert_eq!(old, VerseNode::new(0, 80));
        assert_eq!(chapter.verse(0), Some(VerseNode::new(0, 30)));
        assert_eq!(chapter.recording_base(), 30);
    }

    #[test]
    fn test_move_marker() {
        let mut chapter = chapter_with_audio(0);
        chapter.append_verse(100);
        chapter.append_verse(200);
        chapter.move_marker(0, 1, 120);
        assert_eq!(
            chapter.verses(),
            vec![VerseNode::new(0, 120), VerseNode::new(120, 300)]
        );
    }
}
