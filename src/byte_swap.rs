//! Bulk byte-order conversion for fixed-width elements.
//!
//! CRSD binary blocks are big-endian on disk. On a little-endian host every
//! element is reversed on its way in and out; on a big-endian host the
//! conversion is a passthrough. Swapping is a pure per-element transform, so
//! splitting a buffer across workers gives the same bytes for any worker
//! count.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::writer::CrsdWrite;
use crate::{Error, IoConfig, Result};

/// Buffers smaller than this are always swapped on the calling thread.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 64 * 1024;

fn check_elements(len: usize, elem_size: usize) -> Result<()> {
    if elem_size == 0 || len % elem_size != 0 {
        return Err(Error::size_mismatch(
            format!("byte swap of {elem_size}-byte elements"),
            len.next_multiple_of(elem_size.max(1)) as u64,
            len as u64,
        ));
    }
    Ok(())
}

/// Whether data must be reversed to move between file order and host order.
#[inline]
pub fn needs_swap(elem_size: usize) -> bool {
    cfg!(target_endian = "little") && elem_size > 1
}

/// Reverse the bytes of every `elem_size`-byte element of `buf`, regardless
/// of host byte order.
pub fn swap_bytes(buf: &mut [u8], elem_size: usize, num_threads: usize) -> Result<()> {
    check_elements(buf.len(), elem_size)?;
    if elem_size > 1 {
        swap_elements(buf, elem_size, num_threads);
    }
    Ok(())
}

/// Convert `buf` between big-endian (file) order and host order in place.
///
/// Applying it twice restores the original bytes.
pub fn convert_big_endian(buf: &mut [u8], elem_size: usize, num_threads: usize) -> Result<()> {
    check_elements(buf.len(), elem_size)?;
    if needs_swap(elem_size) {
        swap_elements(buf, elem_size, num_threads);
    }
    Ok(())
}

/// Write host-order `data` to `writer` in big-endian order.
///
/// The input is never modified; each pass copies at most
/// `config.chunk_size` bytes (rounded down to whole elements) into a scratch
/// buffer owned by this call.
pub fn write_swapped<W: CrsdWrite + ?Sized>(
    writer: &mut W,
    data: &[u8],
    elem_size: usize,
    config: &IoConfig,
) -> Result<()> {
    check_elements(data.len(), elem_size)?;
    if !needs_swap(elem_size) {
        return writer.write_all(data);
    }

    let chunk = (config.chunk_size / elem_size).max(1) * elem_size;
    let mut scratch = Vec::with_capacity(chunk.min(data.len()));
    for piece in data.chunks(chunk) {
        scratch.clear();
        scratch.extend_from_slice(piece);
        swap_elements(&mut scratch, elem_size, config.num_threads);
        writer.write_all(&scratch)?;
    }
    Ok(())
}

#[cfg(feature = "parallel")]
fn swap_elements(buf: &mut [u8], elem_size: usize, num_threads: usize) {
    if num_threads > 1 && buf.len() >= PARALLEL_THRESHOLD {
        let elements = buf.len() / elem_size;
        let per_worker = elements.div_ceil(num_threads) * elem_size;
        buf.par_chunks_mut(per_worker)
            .for_each(|part| swap_serial(part, elem_size));
    } else {
        swap_serial(buf, elem_size);
    }
}

#[cfg(not(feature = "parallel"))]
fn swap_elements(buf: &mut [u8], elem_size: usize, _num_threads: usize) {
    swap_serial(buf, elem_size);
}

#[inline]
fn swap_serial(buf: &mut [u8], elem_size: usize) {
    match elem_size {
        2 => buf.chunks_exact_mut(2).for_each(|e| e.swap(0, 1)),
        4 => buf.chunks_exact_mut(4).for_each(|e| {
            let mut w = [0u8; 4];
            w.copy_from_slice(e);
            e.copy_from_slice(&u32::from_ne_bytes(w).swap_bytes().to_ne_bytes());
        }),
        8 => buf.chunks_exact_mut(8).for_each(|e| {
            let mut w = [0u8; 8];
            w.copy_from_slice(e);
            e.copy_from_slice(&u64::from_ne_bytes(w).swap_bytes().to_ne_bytes());
        }),
        _ => buf.chunks_exact_mut(elem_size).for_each(|e| e.reverse()),
    }
}
