//! I/O configuration shared by the reader, the writer and the byte codec.
//!
//! # Example
//!
//! ```
//! use crsd::IoConfig;
//!
//! let config = IoConfig::new()
//!     .with_num_threads(4)
//!     .with_chunk_size(8 * 1024 * 1024);
//! assert_eq!(config.num_threads, 4);
//! ```

/// Default size of the scratch buffer used when swapping data on its way to
/// the output (4 MB).
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Default `BufWriter` capacity for file output (1 MB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 1_048_576;

/// Tuning knobs for bulk reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IoConfig {
    /// Worker count for byte swapping. `1` keeps everything on the calling
    /// thread. Results never depend on this value.
    pub num_threads: usize,
    /// Bytes swapped per scratch-buffer pass when streaming to output.
    pub chunk_size: usize,
    /// Output buffer capacity for file-backed writers.
    pub buffer_capacity: usize,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            num_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            chunk_size: DEFAULT_CHUNK_SIZE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl IoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration that never leaves the calling thread.
    pub fn single_threaded() -> Self {
        Self {
            num_threads: 1,
            ..Self::default()
        }
    }

    pub fn with_num_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads.max(1);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_clamps_to_one() {
        let config = IoConfig::new().with_num_threads(0).with_chunk_size(0);
        assert_eq!(config.num_threads, 1);
        assert_eq!(config.chunk_size, 1);
    }

    #[test]
    fn test_single_threaded() {
        let config = IoConfig::single_threaded();
        assert_eq!(config.num_threads, 1);
        assert_eq!(config.buffer_capacity, DEFAULT_BUFFER_CAPACITY);
    }
}
