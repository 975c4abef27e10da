//! CRSD file reader.
//!
//! [`CrsdReader`] is the inverse of [`CrsdWriter`](crate::CrsdWriter): it
//! parses the file header, checks it against a [`CrsdMetadata`] description
//! and gives offset-based access to every block. Binary data comes back in
//! host byte order.
//!
//! # Example
//!
//! ```no_run
//! use crsd::{CrsdMetadata, CrsdReader, Result};
//!
//! fn first_channel(path: &str) -> Result<Vec<u8>> {
//!     let metadata = CrsdMetadata::load_from_file("product.json")?;
//!     let mut reader = CrsdReader::open(path, metadata)?;
//!
//!     let pvp = reader.read_pvp_block()?;
//!     println!("first vector starts at {:?}", pvp.rcv_start(0, 0)?);
//!
//!     // samples 0..64 of every vector of channel 0
//!     let vectors = pvp.num_records(0);
//!     reader.wideband().read(0, 0..vectors, 0..64)
//! }
//! ```

mod wideband;

pub use wideband::Wideband;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use crate::blocks::{FileHeader, PppBlock, PvpBlock, read_fully, u64_to_usize};
use crate::byte_swap::convert_big_endian;
use crate::{CrsdMetadata, Error, IoConfig, Result};

/// Random-access reader over a CRSD file.
pub struct CrsdReader<R: Read + Seek> {
    reader: R,
    metadata: CrsdMetadata,
    header: FileHeader,
    config: IoConfig,
}

impl CrsdReader<BufReader<File>> {
    /// Opens the file at `path` with the default [`IoConfig`].
    pub fn open(path: impl AsRef<Path>, metadata: CrsdMetadata) -> Result<Self> {
        Self::open_with_config(path, metadata, IoConfig::default())
    }

    pub fn open_with_config(
        path: impl AsRef<Path>,
        metadata: CrsdMetadata,
        config: IoConfig,
    ) -> Result<Self> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(config.buffer_capacity, file);
        Self::from_reader(reader, metadata, config)
    }
}

impl<R: Read + Seek> CrsdReader<R> {
    /// Reads the file header from the start of `reader` and checks it against
    /// `metadata`.
    pub fn from_reader(mut reader: R, metadata: CrsdMetadata, config: IoConfig) -> Result<Self> {
        metadata.validate()?;
        reader.seek(SeekFrom::Start(0))?;
        let header = {
            let mut buffered = BufReader::new(&mut reader);
            FileHeader::read(&mut buffered)?
        };
        if header.product_type() != metadata.product_type {
            return Err(Error::ProductMismatch(format!(
                "file is a {} product, metadata describes {}",
                header.product_type(),
                metadata.product_type
            )));
        }
        let sizes = [
            ("support block", header.support_block_size(), metadata.support_block_size()),
            ("PVP block", header.pvp_block_size(), metadata.pvp_block_size()),
            ("PPP block", header.ppp_block_size(), metadata.ppp_block_size()),
            ("signal block", header.signal_block_size(), metadata.signal_block_size()),
        ];
        for (context, in_file, described) in sizes {
            if in_file != described {
                return Err(Error::size_mismatch(context, described, in_file));
            }
        }
        tracing::debug!(
            product = %header.product_type(),
            signal_offset = header.signal_block_byte_offset(),
            "opened CRSD file"
        );
        Ok(Self {
            reader,
            metadata,
            header,
            config,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn metadata(&self) -> &CrsdMetadata {
        &self.metadata
    }

    fn read_exact_at(&mut self, offset: u64, size: u64, context: &str) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; u64_to_usize(size, context)?];
        let read = read_fully(&mut self.reader, &mut buf)?;
        if read < buf.len() {
            return Err(Error::EndOfStream {
                expected: size,
                actual: read as u64,
            });
        }
        Ok(buf)
    }

    /// The XML metadata block.
    pub fn read_xml(&mut self) -> Result<String> {
        let bytes = self.read_exact_at(
            self.header.xml_block_byte_offset(),
            self.header.xml_block_size(),
            "XML block",
        )?;
        String::from_utf8(bytes).map_err(|e| {
            Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    pub fn read_pvp_block(&mut self) -> Result<PvpBlock> {
        let mut block = self.metadata.new_pvp_block()?;
        block.load(
            &mut self.reader,
            self.header.pvp_block_byte_offset(),
            self.header.pvp_block_size(),
            self.config.num_threads,
        )?;
        Ok(block)
    }

    pub fn read_ppp_block(&mut self) -> Result<PppBlock> {
        let mut block = self.metadata.new_ppp_block()?;
        block.load(
            &mut self.reader,
            self.header.ppp_block_byte_offset(),
            self.header.ppp_block_size(),
            self.config.num_threads,
        )?;
        Ok(block)
    }

    /// One support array in host byte order.
    pub fn read_support_array(&mut self, identifier: &str) -> Result<Vec<u8>> {
        let array = self
            .metadata
            .data
            .support_array(identifier)
            .cloned()
            .ok_or_else(|| Error::UndeclaredField(identifier.to_string()))?;
        let mut data = self.read_exact_at(
            self.header.support_block_byte_offset() + array.array_byte_offset,
            array.num_bytes(),
            "support array",
        )?;
        convert_big_endian(&mut data, array.bytes_per_element, self.config.num_threads)?;
        Ok(data)
    }

    /// The whole support block, each array converted with its own element
    /// size.
    pub fn read_support_block(&mut self) -> Result<Vec<u8>> {
        let mut data = self.read_exact_at(
            self.header.support_block_byte_offset(),
            self.header.support_block_size(),
            "support block",
        )?;
        for array in &self.metadata.data.support_arrays {
            let start = u64_to_usize(array.array_byte_offset, "support array offset")?;
            let end = start + u64_to_usize(array.num_bytes(), "support array size")?;
            convert_big_endian(
                &mut data[start..end],
                array.bytes_per_element,
                self.config.num_threads,
            )?;
        }
        Ok(data)
    }

    /// Access to the signal block.
    pub fn wideband(&mut self) -> Wideband<'_, R> {
        Wideband::new(
            &mut self.reader,
            &self.header,
            &self.metadata.data,
            &self.config,
        )
    }
}
