//! WAV container handling
//!
//! Hand-rolled RIFF/WAVE reading and writing. The writer streams PCM into
//! a `data` chunk behind a placeholder header, then appends the cue
//! metadata and patches the RIFF and `data` size fields on finalize. The
//! reader walks chunks by tag and declared size, refusing to guess when a
//! declared size runs past the end of the file.

mod cue;

pub use cue::{encode_cue_chunks, WavCue};

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;

use crate::types::{DEFAULT_BITS_PER_SAMPLE, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};

/// Errors raised while reading or writing WAV containers
#[derive(Error, Debug)]
pub enum WavError {
    /// File is not a RIFF/WAVE container at all
    #[error("not a RIFF/WAVE file: {0}")]
    NotWave(String),

    /// A chunk declares more bytes than the file or buffer holds
    #[error("invalid WAV file: chunk '{chunk}' declares {declared} bytes but only {actual} are present")]
    InvalidChunk {
        chunk: String,
        declared: u64,
        actual: u64,
    },

    /// Required chunk never appeared
    #[error("missing required chunk: {0}")]
    MissingChunk(&'static str),

    /// Format the engine does not handle
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// PCM format parameters carried in the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    /// Number of channels (1 or 2)
    pub channels: u16,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Bits per sample (16, 24 or 32)
    pub bits_per_sample: u16,
}

impl WavFormat {
    pub fn new(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample,
        }
    }

    /// Bytes per sample frame
    pub fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    /// Bytes per second of audio
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }

    /// Check the parameters against what the engine records and plays
    pub fn validate(&self) -> Result<(), WavError> {
        if self.channels == 0 || self.channels > 2 {
            return Err(WavError::UnsupportedFormat(format!(
                "{} channels (expected mono or stereo)",
                self.channels
            )));
        }
        if self.bits_per_sample != 16 && self.bits_per_sample != 24 && self.bits_per_sample != 32 {
            return Err(WavError::UnsupportedFormat(format!(
                "{}-bit samples",
                self.bits_per_sample
            )));
        }
        Ok(())
    }
}

impl Default for WavFormat {
    fn default() -> Self {
        Self {
            channels: DEFAULT_CHANNELS,
            sample_rate: DEFAULT_SAMPLE_RATE,
            bits_per_sample: DEFAULT_BITS_PER_SAMPLE,
        }
    }
}

/// Byte offset of the RIFF size field
const RIFF_SIZE_OFFSET: u64 = 4;
/// Byte offset of the `data` chunk size field in the header this writer lays out
const DATA_SIZE_OFFSET: u64 = 40;

/// Streaming WAV writer
///
/// Writes a fixed 44-byte header with placeholder sizes, accepts raw PCM
/// in any chunk size, and on [`finalize`](WavWriter::finalize) appends
/// the cue chunks and rewrites the two size fields to their final
/// values.
pub struct WavWriter {
    file: BufWriter<File>,
    format: WavFormat,
    data_bytes: u64,
}

impl WavWriter {
    /// Create `path` and write the header. Sizes stay zero until
    /// finalize.
    pub fn create<P: AsRef<Path>>(path: P, format: WavFormat) -> Result<Self, WavError> {
        format.validate()?;
        let mut file = BufWriter::new(File::create(path)?);

        file.write_all(b"RIFF")?;
        file.write_all(&0u32.to_le_bytes())?;
        file.write_all(b"WAVE")?;

        // 16-byte PCM fmt chunk
        file.write_all(b"fmt ")?;
        file.write_all(&16u32.to_le_bytes())?;
        file.write_all(&1u16.to_le_bytes())?;
        file.write_all(&format.channels.to_le_bytes())?;
        file.write_all(&format.sample_rate.to_le_bytes())?;
        file.write_all(&format.byte_rate().to_le_bytes())?;
        file.write_all(&format.block_align().to_le_bytes())?;
        file.write_all(&format.bits_per_sample.to_le_bytes())?;

        file.write_all(b"data")?;
        file.write_all(&0u32.to_le_bytes())?;

        Ok(Self {
            file,
            format,
            data_bytes: 0,
        })
    }

    pub fn format(&self) -> &WavFormat {
        &self.format
    }

    /// Bytes of PCM written so far
    pub fn data_len(&self) -> u64 {
        self.data_bytes
    }

    /// Append raw PCM bytes to the data chunk
    pub fn write_pcm(&mut self, bytes: &[u8]) -> Result<(), WavError> {
        self.file.write_all(bytes)?;
        self.data_bytes += bytes.len() as u64;
        Ok(())
    }

    /// Close the file: append cue metadata after the data chunk and
    /// rewrite the RIFF and `data` size fields.
    pub fn finalize(self, cues: &[WavCue]) -> Result<(), WavError> {
        let mut file = self.file;

        // pad the data chunk to a word boundary; the pad byte is not
        // counted in the data size
        if self.data_bytes % 2 != 0 {
            file.write_all(&[0u8])?;
        }

        if !cues.is_empty() {
            file.write_all(&encode_cue_chunks(cues))?;
        }
        file.flush()?;

        let mut file = file.into_inner().map_err(|e| WavError::Io(e.into_error()))?;
        let total = file.seek(SeekFrom::End(0))?;
        file.seek(SeekFrom::Start(RIFF_SIZE_OFFSET))?;
        file.write_all(&((total - 8) as u32).to_le_bytes())?;
        file.seek(SeekFrom::Start(DATA_SIZE_OFFSET))?;
        file.write_all(&(self.data_bytes as u32).to_le_bytes())?;
        file.sync_all()?;

        log::debug!(
            "finalized WAV: {} data bytes, {} cues, {} bytes total",
            self.data_bytes,
            cues.len(),
            total
        );
        Ok(())
    }
}

/// WAV file reader
///
/// Parses the header and all metadata chunks up front; PCM stays on disk
/// until asked for.
pub struct WavReader {
    reader: BufReader<File>,
    format: WavFormat,
    data_offset: u64,
    data_len: u64,
    cues: Vec<WavCue>,
}

impl WavReader {
    /// Open a WAV file, validating the container and collecting cue
    /// metadata.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, WavError> {
        let file = File::open(path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let mut header = [0u8; 12];
        reader.read_exact(&mut header)?;
        if &header[0..4] != b"RIFF" {
            return Err(WavError::NotWave("missing RIFF tag".to_string()));
        }
        if &header[8..12] != b"WAVE" {
            return Err(WavError::NotWave("missing WAVE tag".to_string()));
        }

        let mut format: Option<WavFormat> = None;
        let mut data_offset: Option<u64> = None;
        let mut data_len: Option<u64> = None;
        let mut cue_acc = cue::CueAccumulator::default();

        loop {
            let mut tag = [0u8; 4];
            if reader.read_exact(&mut tag).is_err() {
                break;
            }
            let mut size_bytes = [0u8; 4];
            reader.read_exact(&mut size_bytes)?;
            let size = u32::from_le_bytes(size_bytes) as u64;

            let pos = reader.stream_position()?;
            let remaining = file_len.saturating_sub(pos);
            if size > remaining {
                return Err(WavError::InvalidChunk {
                    chunk: String::from_utf8_lossy(&tag).into_owned(),
                    declared: size,
                    actual: remaining,
                });
            }

            match &tag {
                b"fmt " => {
                    format = Some(read_fmt_chunk(&mut reader, size)?);
                }
                b"data" => {
                    data_offset = Some(pos);
                    data_len = Some(size);
                    reader.seek(SeekFrom::Current(size as i64))?;
                }
                b"cue " => {
                    let mut buf = vec![0u8; size as usize];
                    reader.read_exact(&mut buf)?;
                    cue_acc.read_cue_chunk(&buf)?;
                }
                b"LIST" => {
                    let mut buf = vec![0u8; size as usize];
                    reader.read_exact(&mut buf)?;
                    cue_acc.read_list_chunk(&buf)?;
                }
                _ => {
                    reader.seek(SeekFrom::Current(size as i64))?;
                }
            }

            // chunks are word-aligned
            if size % 2 != 0 {
                reader.seek(SeekFrom::Current(1))?;
            }
        }

        let format = format.ok_or(WavError::MissingChunk("fmt "))?;
        format.validate()?;
        let data_offset = data_offset.ok_or(WavError::MissingChunk("data"))?;
        let data_len = data_len.ok_or(WavError::MissingChunk("data"))?;

        Ok(Self {
            reader,
            format,
            data_offset,
            data_len,
            cues: cue_acc.finish(),
        })
    }

    pub fn format(&self) -> &WavFormat {
        &self.format
    }

    /// Decoded cue points, sorted by location
    pub fn cues(&self) -> &[WavCue] {
        &self.cues
    }

    /// Length of the data chunk in bytes
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    /// Number of sample frames in the data chunk
    pub fn frame_count(&self) -> u64 {
        self.data_len / self.format.block_align() as u64
    }

    pub fn duration_seconds(&self) -> f64 {
        self.frame_count() as f64 / self.format.sample_rate as f64
    }

    /// Read the entire data chunk
    pub fn read_all_pcm(&mut self) -> Result<Vec<u8>, WavError> {
        self.reader.seek(SeekFrom::Start(self.data_offset))?;
        let mut buf = vec![0u8; self.data_len as usize];
        self.reader.read_exact(&mut buf)?;
        Ok(buf)
    }
}

fn read_fmt_chunk(reader: &mut BufReader<File>, size: u64) -> Result<WavFormat, WavError> {
    if size < 16 {
        return Err(WavError::InvalidChunk {
            chunk: "fmt ".to_string(),
            declared: size,
            actual: 16,
        });
    }
    let mut fmt = vec![0u8; size as usize];
    reader.read_exact(&mut fmt)?;

    let format_tag = u16::from_le_bytes([fmt[0], fmt[1]]);
    if format_tag != 1 {
        return Err(WavError::UnsupportedFormat(format!(
            "format tag {} (expected PCM)",
            format_tag
        )));
    }
    let channels = u16::from_le_bytes([fmt[2], fmt[3]]);
    let sample_rate = u32::from_le_bytes([fmt[4], fmt[5], fmt[6], fmt[7]]);
    let bits_per_sample = u16::from_le_bytes([fmt[14], fmt[15]]);

    Ok(WavFormat {
        channels,
        sample_rate,
        bits_per_sample,
    })
}
