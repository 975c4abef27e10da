//! Error types for CRSD operations.
//!
//! This module defines the [`Error`] enum which represents all possible failures
//! that can occur when laying out parameter records, encoding or decoding
//! blocks, parsing the file header, or streaming a CRSD file.
//!
//! # Example
//!
//! ```no_run
//! use crsd::{CrsdMetadata, CrsdReader, Error, Result};
//!
//! fn open(path: &str, metadata: CrsdMetadata) -> Result<()> {
//!     match CrsdReader::open(path, metadata) {
//!         Ok(reader) => {
//!             println!("signal block at {}", reader.header().signal_block_byte_offset());
//!             Ok(())
//!         }
//!         Err(Error::IncompleteHeader(key)) => {
//!             eprintln!("header is missing {key}");
//!             Err(Error::IncompleteHeader(key))
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use thiserror::Error;

/// Errors that can occur during CRSD file operations.
///
/// Every failure is reported synchronously and immediately; nothing in this
/// crate retries. A failed `load` or `write` leaves the target block or stream
/// in an unspecified state that should not be reused.
#[derive(Debug, Error)]
pub enum Error {
    /// A field format string does not follow the format grammar, or does not
    /// fit in the declared number of words.
    #[error("Invalid format '{format}': {reason}")]
    Format { format: String, reason: String },

    /// A field placement collides with an already occupied word range.
    #[error("Field '{name}' at word offset {offset} (size {size}) overlaps an existing field")]
    Overlap {
        name: String,
        offset: usize,
        size: usize,
    },

    /// A field with this name is already declared or placed in the layout.
    #[error("Field '{0}' is already declared in the layout")]
    DuplicateName(String),

    /// An added field was already assigned on this record.
    #[error("Added field '{0}' is already set on this record")]
    DuplicateAssignment(String),

    /// A declared size disagrees with the computed one.
    #[error("Size mismatch in {context}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        context: String,
        expected: u64,
        actual: u64,
    },

    /// A channel, sequence, vector, pulse or sample index is out of bounds.
    #[error("{what} index {index} is out of range (len {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// An added field or support array was accessed without being declared.
    #[error("'{0}' is not declared")]
    UndeclaredField(String),

    /// A field was read from a record that never had it assigned.
    #[error("Field '{0}' is not set")]
    NotSet(String),

    /// An added value does not match the format declared for its field.
    #[error("Value for '{name}' does not match declared format '{format}'")]
    TypeMismatch { name: String, format: String },

    /// A required layout field has no offset.
    #[error("Required field '{0}' has no offset in the layout")]
    UnplacedField(&'static str),

    /// A header key required for the product type is missing or zero.
    #[error("File header is missing required field {0}")]
    IncompleteHeader(String),

    /// A header line names a key this format does not define.
    #[error("Unknown file header key '{0}'")]
    UnknownKey(String),

    /// The first header line is not `CRSD<type>/<version>`.
    #[error(r#"Invalid file type line: expected "CRSD<sar|tx|rcv>/<version>", found {0:?}"#)]
    InvalidFileType(String),

    /// A header value could not be parsed.
    #[error("Invalid value {value:?} for header key {key}")]
    InvalidHeaderValue { key: String, value: String },

    /// The header offset computation did not reach a fixed point.
    #[error("File header sizing did not converge after {0} iterations")]
    HeaderNotConverged(usize),

    /// The stream ended before the declared number of bytes was read.
    #[error("Unexpected end of stream: expected {expected} bytes, read {actual}")]
    EndOfStream { expected: u64, actual: u64 },

    /// Classification and release info must be set before writing.
    #[error("Classification and release info are required to write a CRSD file")]
    ClassificationRequired,

    /// A block was supplied, or is missing, contrary to the product type.
    #[error("Product type mismatch: {0}")]
    ProductMismatch(String),

    /// A block was written after the stream had already passed its offset.
    #[error("Cannot write {block} block at offset {offset}: stream is already at {position}")]
    BlockOrder {
        block: &'static str,
        offset: u64,
        position: u64,
    },

    /// A block the product requires was skipped or never written.
    #[error("Required {0} block has not been written")]
    MissingBlock(&'static str),

    /// An I/O error occurred while reading or writing the file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON sidecar could not be encoded or decoded.
    #[cfg(feature = "serde")]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn size_mismatch(context: impl Into<String>, expected: u64, actual: u64) -> Self {
        Error::SizeMismatch {
            context: context.into(),
            expected,
            actual,
        }
    }

    pub(crate) fn format(format: &str, reason: impl Into<String>) -> Self {
        Error::Format {
            format: format.to_string(),
            reason: reason.into(),
        }
    }
}

/// A specialized Result type for CRSD operations.
pub type Result<T> = core::result::Result<T, Error>;
