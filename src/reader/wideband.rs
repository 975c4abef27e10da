//! Offset-based access to the signal block.

use std::io::{Read, Seek, SeekFrom};
use std::ops::Range;

use crate::blocks::{FileHeader, read_fully, u64_to_usize};
use crate::byte_swap::convert_big_endian;
use crate::metadata::{ChannelParameters, DataDescription, SignalArrayFormat};
use crate::{Error, IoConfig, Result};

/// A view of the signal block of an open [`CrsdReader`](super::CrsdReader).
///
/// Channel `c` is a `num_vectors x num_samples` array of complex samples
/// stored row by row at `signal_block_byte_offset + signal_array_byte_offset`.
pub struct Wideband<'a, R: Read + Seek> {
    reader: &'a mut R,
    header: &'a FileHeader,
    data: &'a DataDescription,
    config: &'a IoConfig,
}

impl<'a, R: Read + Seek> Wideband<'a, R> {
    pub(super) fn new(
        reader: &'a mut R,
        header: &'a FileHeader,
        data: &'a DataDescription,
        config: &'a IoConfig,
    ) -> Self {
        Self {
            reader,
            header,
            data,
            config,
        }
    }

    fn channel(&self, channel: usize) -> Result<&'a ChannelParameters> {
        self.data
            .channels
            .get(channel)
            .ok_or(Error::IndexOutOfRange {
                what: "channel",
                index: channel,
                len: self.data.channels.len(),
            })
    }

    fn channel_start(&self, params: &ChannelParameters) -> u64 {
        self.header.signal_block_byte_offset() + params.signal_array_byte_offset
    }

    /// Reads samples `samples` of vectors `vectors` of an uncompressed
    /// channel, in host byte order, vector by vector.
    pub fn read(
        &mut self,
        channel: usize,
        vectors: Range<usize>,
        samples: Range<usize>,
    ) -> Result<Vec<u8>> {
        let params = self.channel(channel)?;
        if params.compressed_signal_size.is_some() {
            return Err(Error::ProductMismatch(format!(
                "channel {} is compressed",
                params.identifier
            )));
        }
        let format = self.data.signal_format.ok_or_else(|| {
            Error::ProductMismatch("no signal array format declared".to_string())
        })?;
        check_range("vector", &vectors, params.num_vectors)?;
        check_range("sample", &samples, params.num_samples)?;

        let sample_bytes = format.num_bytes();
        let row_bytes = (params.num_samples * sample_bytes) as u64;
        let wanted = samples.len() * sample_bytes;
        let mut out = vec![0u8; vectors.len() * wanted];
        let start = self.channel_start(params);

        if samples.len() == params.num_samples {
            let offset = start + vectors.start as u64 * row_bytes;
            self.fill(offset, &mut out)?;
        } else {
            for (row, chunk) in vectors.clone().zip(out.chunks_exact_mut(wanted.max(1))) {
                let offset =
                    start + row as u64 * row_bytes + (samples.start * sample_bytes) as u64;
                self.fill(offset, chunk)?;
            }
        }
        convert_big_endian(&mut out, format.component_bytes(), self.config.num_threads)?;
        tracing::trace!(
            channel = %params.identifier,
            vectors = vectors.len(),
            samples = samples.len(),
            "read signal samples"
        );
        Ok(out)
    }

    /// Reads every sample of an uncompressed channel.
    pub fn read_channel(&mut self, channel: usize) -> Result<Vec<u8>> {
        let params = self.channel(channel)?;
        self.read(channel, 0..params.num_vectors, 0..params.num_samples)
    }

    /// Reads the opaque bytes of a compressed channel.
    pub fn read_compressed(&mut self, channel: usize) -> Result<Vec<u8>> {
        let params = self.channel(channel)?;
        let size = params.compressed_signal_size.ok_or_else(|| {
            Error::ProductMismatch(format!("channel {} is not compressed", params.identifier))
        })?;
        let mut out = vec![0u8; u64_to_usize(size, "compressed signal")?];
        let offset = self.channel_start(params);
        self.fill(offset, &mut out)?;
        Ok(out)
    }

    /// Sample format of uncompressed channels.
    pub fn signal_format(&self) -> Option<SignalArrayFormat> {
        self.data.signal_format
    }

    fn fill(&mut self, offset: u64, buf: &mut [u8]) -> Result<()> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let read = read_fully(&mut *self.reader, buf)?;
        if read < buf.len() {
            return Err(Error::EndOfStream {
                expected: buf.len() as u64,
                actual: read as u64,
            });
        }
        Ok(())
    }
}

fn check_range(what: &'static str, range: &Range<usize>, len: usize) -> Result<()> {
    if range.start > range.end || range.end > len {
        return Err(Error::IndexOutOfRange {
            what,
            index: range.end.max(range.start),
            len,
        });
    }
    Ok(())
}
