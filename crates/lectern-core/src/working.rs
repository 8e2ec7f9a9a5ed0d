//! Working-audio storage for a narration session
//!
//! Every verse of a chapter records into one append-only buffer;
//! re-recorded audio lands further along the same buffer and old ranges
//! simply stop being referenced. The engine needs only three operations
//! from the storage, so the surrounding project layer decides where the
//! bytes actually live.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Append-only audio storage backing a chapter's verses.
///
/// One writer appends at a time. Reads may run concurrently with capture
/// and never observe bytes past the length committed when the call
/// began, so a verse range is never torn.
pub trait WorkingAudio: Send + Sync {
    /// Current committed length in bytes
    fn len(&self) -> u64;

    /// Append raw PCM bytes at the end
    fn append(&self, bytes: &[u8]) -> io::Result<()>;

    /// Read up to `buf.len()` bytes starting at `offset`. Returns the
    /// number of bytes read; short when the range crosses the current
    /// end.
    fn read_range(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// File-backed working audio
pub struct FileWorkingAudio {
    file: Mutex<File>,
    len: AtomicU64,
}

impl FileWorkingAudio {
    /// Open (or create) the working file, resuming at its current
    /// length.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(path.as_ref())?;
        let len = file.metadata()?.len();
        log::debug!(
            "opened working audio {} ({} bytes)",
            path.as_ref().display(),
            len
        );
        Ok(Self {
            file: Mutex::new(file),
            len: AtomicU64::new(len),
        })
    }
}

impl WorkingAudio for FileWorkingAudio {
    fn len(&self) -> u64 {
        self.len.load(Ordering::Acquire)
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::End(0))?;
        file.write_all(bytes)?;
        // length becomes visible only after the bytes are fully written
        self.len.fetch_add(bytes.len() as u64, Ordering::Release);
        Ok(())
    }

    fn read_range(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        // snapshot the committed length first so a concurrent append
        // cannot hand us a partially written tail
        let len = self.len();
        if offset >= len {
            return Ok(0);
        }
        let readable = ((len - offset) as usize).min(buf.len());
        let mut file = self.file.lock().unwrap();
        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buf[..readable])?;
        Ok(readable)
    }
}

/// In-memory working audio for tests and preview sessions
#[derive(Default)]
pub struct MemoryWorkingAudio {
    data: Mutex<Vec<u8>>,
}

impl MemoryWorkingAudio {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WorkingAudio for MemoryWorkingAudio {
    fn len(&self) -> u64 {
        self.data.lock().unwrap().len() as u64
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        self.data.lock().unwrap().extend_from_slice(bytes);
        Ok(())
    }

    fn read_range(&self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        let data = self.data.lock().unwrap();
        if offset >= data.len() as u64 {
            return Ok(0);
        }
        let start = offset as usize;
        let n = (data.len() - start).min(buf.len());
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }
}
