//! Cue point codec for the RIFF `cue `/`LIST-adtl` chunk pair
//!
//! Verse boundaries travel inside delivered WAV files as cue points: one
//! (frame location, label) pair per verse. The binary layout keeps the
//! legacy cue convention — a literal "data" tag, two zero dwords and the
//! location stored twice per entry — so files stay readable by existing
//! playback tools.

use super::WavError;

/// A (frame location, label) pair embedded in WAV metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavCue {
    /// Frame offset into the PCM data
    pub location: u32,
    /// Cue label; for chapter exports this is the verse number as
    /// decimal text
    pub label: String,
}

impl WavCue {
    pub fn new(location: u32, label: impl Into<String>) -> Self {
        Self {
            location,
            label: label.into(),
        }
    }
}

/// Bytes per entry in the `cue ` chunk
const CUE_ENTRY_SIZE: usize = 24;

const DWORD: usize = 4;

fn word_aligned(len: usize) -> usize {
    if len % DWORD == 0 {
        len
    } else {
        len + DWORD - len % DWORD
    }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Encode `cues` as a `cue ` chunk followed by a `LIST`/`adtl` chunk.
///
/// Entries are sorted by location; ids are assigned sequentially from 0
/// so the `labl` sub-chunks can be matched back to locations on decode.
/// All sizes are computed, all integers little-endian.
pub fn encode_cue_chunks(cues: &[WavCue]) -> Vec<u8> {
    let mut sorted: Vec<&WavCue> = cues.iter().collect();
    sorted.sort_by_key(|c| c.location);

    let mut out = Vec::new();

    // cue chunk: count, then 24 bytes per entry
    out.extend_from_slice(b"cue ");
    let cue_size = 4 + sorted.len() * CUE_ENTRY_SIZE;
    out.extend_from_slice(&(cue_size as u32).to_le_bytes());
    out.extend_from_slice(&(sorted.len() as u32).to_le_bytes());
    for (id, cue) in sorted.iter().enumerate() {
        out.extend_from_slice(&(id as u32).to_le_bytes());
        out.extend_from_slice(&cue.location.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        // the legacy layout stores the location a second time as the
        // sample offset; decoders read this copy
        out.extend_from_slice(&cue.location.to_le_bytes());
    }

    // LIST/adtl chunk: one labl sub-chunk per cue, labels NUL-padded to
    // the next dword boundary
    let labl_total: usize = sorted
        .iter()
        .map(|c| 8 + 4 + word_aligned(c.label.len()))
        .sum();
    out.extend_from_slice(b"LIST");
    out.extend_from_slice(&((4 + labl_total) as u32).to_le_bytes());
    out.extend_from_slice(b"adtl");
    for (id, cue) in sorted.iter().enumerate() {
        let padded = word_aligned(cue.label.len());
        out.extend_from_slice(b"labl");
        out.extend_from_slice(&((4 + padded) as u32).to_le_bytes());
        out.extend_from_slice(&(id as u32).to_le_bytes());
        out.extend_from_slice(cue.label.as_bytes());
        out.resize(out.len() + (padded - cue.label.len()), 0);
    }

    out
}

/// Collects the two halves of each cue pair while walking a file's
/// metadata chunks: locations from `cue `, labels from `LIST/adtl`.
///
/// Only complete (location, label) pairs materialize; orphaned halves
/// are dropped without comment.
#[derive(Debug, Default)]
pub(crate) struct CueAccumulator {
    /// (cue id, frame location)
    locations: Vec<(u32, u32)>,
    /// (cue id, trimmed label)
    labels: Vec<(u32, String)>,
}

impl CueAccumulator {
    /// Parse the payload of a `cue ` chunk (everything after the
    /// tag/size header).
    pub(crate) fn read_cue_chunk(&mut self, data: &[u8]) -> Result<(), WavError> {
        if data.len() < 4 {
            return Err(WavError::InvalidChunk {
                chunk: "cue ".to_string(),
                declared: 4,
                actual: data.len() as u64,
            });
        }
        let count = read_u32(data, 0) as usize;
        let declared = 4 + count * CUE_ENTRY_SIZE;
        if data.len() < declared {
            return Err(WavError::InvalidChunk {
                chunk: "cue ".to_string(),
                declared: declared as u64,
                actual: data.len() as u64,
            });
        }
        for i in 0..count {
            let off = 4 + i * CUE_ENTRY_SIZE;
            let id = read_u32(data, off);
            // trailing sample-offset dword; the dword at +4 holds the
            // same value in files this codec wrote
            let location = read_u32(data, off + 20);
            self.locations.push((id, location));
        }
        Ok(())
    }

    /// Parse the payload of a `LIST` chunk. Lists other than `adtl` are
    /// ignored; within `adtl`, sub-chunks other than `labl` are skipped
    /// by their declared size.
    pub(crate) fn read_list_chunk(&mut self, data: &[u8]) -> Result<(), WavError> {
        if data.len() < 4 || &data[0..4] != b"adtl" {
            return Ok(());
        }
        let mut pos = 4;
        while pos + 8 <= data.len() {
            let tag = &data[pos..pos + 4];
            let size = read_u32(data, pos + 4) as usize;
            if pos + 8 + size > data.len() {
                return Err(WavError::InvalidChunk {
                    chunk: String::from_utf8_lossy(tag).into_owned(),
                    declared: size as u64,
                    actual: (data.len() - pos - 8) as u64,
                });
            }
            if tag == b"labl" && size >= 4 {
                let id = read_u32(data, pos + 8);
                let raw = &data[pos + 12..pos + 8 + size];
                let label = String::from_utf8_lossy(raw)
                    .trim_end_matches(&['\0', ' '][..])
                    .to_string();
                self.labels.push((id, label));
            }
            pos += 8 + size;
            if size % 2 != 0 {
                pos += 1;
            }
        }
        Ok(())
    }

    /// Materialize complete pairs, matched by cue id and sorted by
    /// location.
    pub(crate) fn finish(self) -> Vec<WavCue> {
        let mut cues: Vec<WavCue> = Vec::new();
        for (id, location) in &self.locations {
            if let Some((_, label)) = self.labels.iter().find(|(lid, _)| lid == id) {
                cues.push(WavCue::new(*location, label.clone()));
            }
        }
        cues.sort_by_key(|c| c.location);
        cues
    }
}
