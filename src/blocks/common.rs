// blocks/common.rs
//! Byte helpers shared by the parameter block codec and the file header.
//!
//! Records are decoded from, and encoded into, *host-order* buffers: the
//! on-disk big-endian block has already been passed through
//! [`convert_big_endian`](crate::byte_swap::convert_big_endian) with 8-byte elements. Full-word
//! values therefore sit at their file offset, while values narrower than a word
//! move to the mirrored position inside their word on little-endian hosts.

use std::io::{ErrorKind, Read};

use crate::{Error, Result};

/// Size of one PVP/PPP word in bytes. Layout offsets and sizes count words.
pub const WORD_SIZE: usize = 8;

/// Position in a host-order buffer of a value stored at `byte_offset` (file
/// order) with `width` bytes. The value must not straddle a word boundary.
#[inline]
pub(crate) fn host_offset(byte_offset: usize, width: usize) -> usize {
    debug_assert!(width <= WORD_SIZE);
    debug_assert!(byte_offset % WORD_SIZE + width <= WORD_SIZE);
    if cfg!(target_endian = "little") {
        let word = byte_offset - byte_offset % WORD_SIZE;
        word + (WORD_SIZE - byte_offset % WORD_SIZE - width)
    } else {
        byte_offset
    }
}

/// Copy `N` bytes starting at `offset`.
#[inline]
pub(crate) fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

/// Read a host-order f64 word at `offset`.
#[inline]
pub(crate) fn read_f64(bytes: &[u8], offset: usize) -> f64 {
    f64::from_ne_bytes(read_array(bytes, offset))
}

/// Read a host-order i64 word at `offset`.
#[inline]
pub(crate) fn read_i64(bytes: &[u8], offset: usize) -> i64 {
    i64::from_ne_bytes(read_array(bytes, offset))
}

#[inline]
pub(crate) fn write_f64(bytes: &mut [u8], offset: usize, value: f64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_ne_bytes());
}

#[inline]
pub(crate) fn write_i64(bytes: &mut [u8], offset: usize, value: i64) {
    bytes[offset..offset + 8].copy_from_slice(&value.to_ne_bytes());
}

/// Convert whole words between host order and file order. The conversion is
/// its own inverse.
pub(crate) fn words_to_file_order(bytes: &[u8]) -> Vec<u8> {
    let mut out = bytes.to_vec();
    if cfg!(target_endian = "little") {
        for word in out.chunks_exact_mut(WORD_SIZE) {
            word.reverse();
        }
    }
    out
}

/// Validate that a buffer has at least `expected` bytes.
#[inline]
pub fn validate_buffer_size(bytes: &[u8], expected: usize, context: &str) -> Result<()> {
    if bytes.len() < expected {
        return Err(Error::size_mismatch(
            context,
            expected as u64,
            bytes.len() as u64,
        ));
    }
    Ok(())
}

/// Calculate padding needed to reach 8-byte alignment.
#[inline]
pub const fn padding_to_align_8(size: u64) -> u64 {
    (8 - (size % 8)) % 8
}

/// Safely convert a u64 size or offset to usize for indexing.
#[inline]
pub fn u64_to_usize(value: u64, context: &str) -> Result<usize> {
    usize::try_from(value).map_err(|_| {
        Error::size_mismatch(
            format!("{context} exceeds the addressable size on this platform"),
            usize::MAX as u64,
            value,
        )
    })
}

/// Read until `buf` is full or the stream ends; returns the bytes read.
pub(crate) fn read_fully<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_to_align_8() {
        assert_eq!(padding_to_align_8(0), 0);
        assert_eq!(padding_to_align_8(1), 7);
        assert_eq!(padding_to_align_8(8), 0);
        assert_eq!(padding_to_align_8(13), 3);
    }

    #[test]
    fn test_host_offset_mirrors_narrow_values() {
        if cfg!(target_endian = "little") {
            assert_eq!(host_offset(0, 8), 0);
            assert_eq!(host_offset(8, 8), 8);
            assert_eq!(host_offset(0, 2), 6);
            assert_eq!(host_offset(2, 2), 4);
            assert_eq!(host_offset(17, 1), 22);
        } else {
            assert_eq!(host_offset(2, 2), 2);
        }
    }

    #[test]
    fn test_narrow_value_survives_word_swap() {
        // U2 = 0x1234 at the start of a big-endian word
        let file = [0x12u8, 0x34, 0, 0, 0, 0, 0, 0];
        let host = words_to_file_order(&file);
        let at = host_offset(0, 2);
        assert_eq!(u16::from_ne_bytes(read_array(&host, at)), 0x1234);
    }

    #[test]
    fn test_words_to_file_order_is_involution() {
        let bytes: Vec<u8> = (0..24).collect();
        assert_eq!(words_to_file_order(&words_to_file_order(&bytes)), bytes);
    }

    #[test]
    fn test_read_fully_stops_at_end() {
        let mut src: &[u8] = &[1, 2, 3];
        let mut buf = [0u8; 5];
        assert_eq!(read_fully(&mut src, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_validate_buffer_size() {
        assert!(validate_buffer_size(&[0u8; 8], 8, "test").is_ok());
        assert!(matches!(
            validate_buffer_size(&[0u8; 4], 8, "test"),
            Err(Error::SizeMismatch { expected: 8, actual: 4, .. })
        ));
    }
}
