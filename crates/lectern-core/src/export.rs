//! Chapter finalize
//!
//! Streams a chapter's logical PCM into a fresh WAV file and embeds the
//! verse boundaries as cue points, so the boundaries survive as plain
//! metadata once the audio leaves the studio.

use std::path::Path;

use thiserror::Error;

use crate::chapter::{ChapterError, ChapterRepresentation};
use crate::wav::{WavCue, WavError, WavFormat, WavWriter};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("chapter read failed: {0}")]
    Chapter(#[from] ChapterError),

    #[error("WAV write failed: {0}")]
    Wav(#[from] WavError),
}

/// Copy buffer size for streaming PCM out of the chapter
const EXPORT_BUF_SIZE: usize = 16 * 1024;

/// Write the chapter's active audio to `path` with one cue point per
/// verse.
///
/// Cue locations are frame offsets into the exported stream (the verse
/// byte offsets divided by the frame size); labels are 1-based verse
/// numbers.
pub fn export_chapter(
    chapter: &mut ChapterRepresentation,
    format: &WavFormat,
    path: &Path,
) -> Result<(), ExportError> {
    let cues = verse_cues(chapter, format);

    let mut writer = WavWriter::create(path, *format)?;
    chapter.seek(0);
    let mut buf = vec![0u8; EXPORT_BUF_SIZE];
    loop {
        let n = chapter.read(&mut buf)?;
        if n == 0 {
            break;
        }
        writer.write_pcm(&buf[..n])?;
    }
    writer.finalize(&cues)?;

    log::info!(
        "exported chapter to {} ({} verses)",
        path.display(),
        cues.len()
    );
    Ok(())
}

/// Cue points marking where each verse starts in the exported stream
fn verse_cues(chapter: &ChapterRepresentation, format: &WavFormat) -> Vec<WavCue> {
    let block_align = format.block_align() as u64;
    let mut cues = Vec::new();
    let mut logical = 0u64;
    for (i, verse) in chapter.verses().iter().enumerate() {
        cues.push(WavCue::new(
            (logical / block_align) as u32,
            (i + 1).to_string(),
        ));
        logical += verse.len();
    }
    cues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::working::{MemoryWorkingAudio, WorkingAudio};
    use std::sync::Arc;

    #[test]
    fn test_export_embeds_verse_cues() {
        let audio = MemoryWorkingAudio::new();
        let pcm: Vec<u8> = (0..600u32).flat_map(|i| (i as i16).to_le_bytes()).collect();
        audio.append(&pcm).unwrap();

        let mut chapter = ChapterRepresentation::new();
        chapter.open(Arc::new(audio));
        // three verses: 100, 200, 300 frames of mono 16-bit audio
        chapter.append_verse(200);
        chapter.append_verse(400);
        chapter.append_verse(600);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapter-01.wav");
        let format = WavFormat::default();
        export_chapter(&mut chapter, &format, &path).unwrap();

        let mut reader = crate::wav::WavReader::open(&path).unwrap();
        assert_eq!(
            reader.cues(),
            &[
                WavCue::new(0, "1"),
                WavCue::new(100, "2"),
                WavCue::new(300, "3"),
            ]
        );
        assert_eq!(reader.data_len(), 1200);
        assert_eq!(reader.read_all_pcm().unwrap(), pcm);
    }

    #[test]
    fn test_export_skips_superseded_audio() {
        let audio = MemoryWorkingAudio::new();
        audio.append(&vec![0xAA; 100]).unwrap();
        audio.append(&vec![0xBB; 100]).unwrap();
        audio.append(&vec![0xCC; 100]).unwrap();

        let mut chapter = ChapterRepresentation::new();
        chapter.open(Arc::new(audio));
        // the 0xBB range was superseded and is no longer referenced
        chapter.push_verse(crate::types::VerseNode::new(0, 100));
        chapter.push_verse(crate::types::VerseNode::new(200, 300));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chapter-02.wav");
        export_chapter(&mut chapter, &WavFormat::default(), &path).unwrap();

        let mut reader = crate::wav::WavReader::open(&path).unwrap();
        assert_eq!(reader.data_len(), 200);
        let pcm = reader.read_all_pcm().unwrap();
        assert_eq!(&pcm[..100], &[0xAA; 100][..]);
        assert_eq!(&pcm[100..], &[0xCC; 100][..]);
    }

    #[test]
    fn test_export_of_closed_chapter_fails() {
        let mut chapter = ChapterRepresentation::new();
        chapter.append_verse(10);
        chapter.close();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("closed.wav");
        let result = export_chapter(&mut chapter, &WavFormat::default(), &path);
        assert!(matches!(
            result,
            Err(ExportError::Chapter(ChapterError::Closed))
        ));
    }
}
