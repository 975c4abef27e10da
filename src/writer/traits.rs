//! Output sinks for the CRSD writer.
//!
//! A CRSD file is produced strictly front to back, so a sink only needs to
//! append bytes, append zero padding and report how far it has got.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::Result;
use crate::config::DEFAULT_BUFFER_CAPACITY;

const ZEROS: [u8; 4096] = [0; 4096];

/// Append-only byte sink used by [`CrsdWriter`](super::CrsdWriter).
pub trait CrsdWrite {
    /// Append `bytes`.
    fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Append `count` zero bytes.
    fn write_zeros(&mut self, count: u64) -> Result<()> {
        let mut left = count;
        while left > 0 {
            let n = left.min(ZEROS.len() as u64) as usize;
            self.write_all(&ZEROS[..n])?;
            left -= n as u64;
        }
        Ok(())
    }

    /// Bytes appended so far.
    fn position(&self) -> u64;

    fn flush(&mut self) -> Result<()>;
}

/// Assembles a product in memory.
#[derive(Debug, Default)]
pub struct VecWriter {
    buffer: Vec<u8>,
}

impl VecWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// The finished file bytes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl CrsdWrite for VecWriter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn write_zeros(&mut self, count: u64) -> Result<()> {
        let len = self.buffer.len() + crate::blocks::u64_to_usize(count, "zero padding")?;
        self.buffer.resize(len, 0);
        Ok(())
    }

    fn position(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Streams a product to a file through a `BufWriter`.
pub struct FileWriter {
    inner: BufWriter<File>,
    written: u64,
}

impl FileWriter {
    /// Creates (or truncates) the file at `path` with a 1 MB buffer.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        Self::with_capacity(path, DEFAULT_BUFFER_CAPACITY)
    }

    pub fn with_capacity(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: BufWriter::with_capacity(capacity, file),
            written: 0,
        })
    }
}

impl CrsdWrite for FileWriter {
    fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    fn position(&self) -> u64 {
        self.written
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()?;
        Ok(())
    }
}
