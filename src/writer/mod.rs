//! CRSD file writer module.
//!
//! This module provides [`CrsdWriter`], which streams a product to a
//! [`CrsdWrite`] sink in the on-disk order:
//!
//! ```text
//! header \f\n XML \f\n [support] [pad] PVP [pad] PPP [pad] signal
//! ```
//!
//! Block offsets come from the [`FileHeader`](crate::blocks::FileHeader), which
//! is sized from the metadata when the writer is created. Every binary block
//! is supplied in host byte order and converted to big-endian on the way out.
//!
//! # Writing Workflow
//!
//! Either call [`write()`](CrsdWriter::write) once, or write piecewise:
//!
//! 1. [`write_metadata()`](CrsdWriter::write_metadata)
//! 2. [`write_support_data()`](CrsdWriter::write_support_data) if support arrays are declared
//! 3. [`write_pvp_data()`](CrsdWriter::write_pvp_data) for SAR and RCV products
//! 4. [`write_ppp_data()`](CrsdWriter::write_ppp_data) for SAR and TX products
//! 5. [`write_signal_data()`](CrsdWriter::write_signal_data) for SAR and RCV products
//! 6. [`finalize()`](CrsdWriter::finalize)
//!
//! Steps must come in this order; going back fails with
//! [`Error::BlockOrder`], and leaving out a block the product requires fails
//! with [`Error::MissingBlock`].
//!
//! # Example
//!
//! ```no_run
//! use crsd::{CrsdMetadata, CrsdWriter, ProductType, Pvp, Result, SignalArrayFormat, Vector3};
//!
//! fn write_receive_product() -> Result<()> {
//!     let mut meta = CrsdMetadata::new(ProductType::Rcv);
//!     meta.classification = "UNCLASSIFIED".into();
//!     meta.release_info = "Unrestricted".into();
//!     meta.xml = "<CRSDrcv/>".into();
//!     meta.pvp = Some(Pvp::with_default_layout(false));
//!     meta.data.signal_format = Some(SignalArrayFormat::CF8);
//!     meta.data.add_channel("CH1", 2, 4);
//!
//!     let mut pvp = meta.new_pvp_block()?;
//!     pvp.set_rcv_pos(0, 0, Vector3::new(1.0, 2.0, 3.0))?;
//!     let signal = vec![0u8; 2 * 4 * 8];
//!
//!     let mut writer = CrsdWriter::new("receive.crsd", meta)?;
//!     writer.write(Some(&pvp), None, &[signal.as_slice()], &[])?;
//!     Ok(())
//! }
//! ```

mod io;
mod traits;

pub use traits::{CrsdWrite, FileWriter, VecWriter};

use crate::blocks::{FileHeader, PppBlock, PvpBlock, SECTION_TERMINATOR};
use crate::byte_swap::write_swapped;
use crate::{CrsdMetadata, Error, IoConfig, Result};

/// Sections in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Start,
    Metadata,
    Support,
    Pvp,
    Ppp,
    Signal,
    /// Past the last block; only used as a bound.
    End,
}

impl Stage {
    const ALL: [Stage; 7] = [
        Stage::Start,
        Stage::Metadata,
        Stage::Support,
        Stage::Pvp,
        Stage::Ppp,
        Stage::Signal,
        Stage::End,
    ];

    fn block_name(self) -> &'static str {
        match self {
            Stage::Start | Stage::End => "",
            Stage::Metadata => "header",
            Stage::Support => "support",
            Stage::Pvp => "PVP",
            Stage::Ppp => "PPP",
            Stage::Signal => "signal",
        }
    }
}

/// Streams a CRSD product to a [`CrsdWrite`] sink.
pub struct CrsdWriter<W: CrsdWrite> {
    writer: W,
    metadata: CrsdMetadata,
    header: FileHeader,
    config: IoConfig,
    stage: Stage,
}

impl<W: CrsdWrite> CrsdWriter<W> {
    /// The sized file header this writer emits.
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn metadata(&self) -> &CrsdMetadata {
        &self.metadata
    }

    /// Writes the whole product and flushes.
    ///
    /// `signal` holds one host-order buffer per channel; `support` one
    /// host-order buffer per declared support array. Blocks the product type
    /// does not have must be `None` or empty.
    pub fn write(
        &mut self,
        pvp: Option<&PvpBlock>,
        ppp: Option<&PppBlock>,
        signal: &[&[u8]],
        support: &[&[u8]],
    ) -> Result<()> {
        let ty = self.metadata.product_type;
        if pvp.is_some() != ty.has_pvp() {
            return Err(Error::ProductMismatch(format!(
                "{ty} product {} a PVP block",
                if ty.has_pvp() { "requires" } else { "does not take" }
            )));
        }
        if ppp.is_some() != ty.has_ppp() {
            return Err(Error::ProductMismatch(format!(
                "{ty} product {} a PPP block",
                if ty.has_ppp() { "requires" } else { "does not take" }
            )));
        }

        self.write_metadata()?;
        if !support.is_empty() || !self.metadata.data.support_arrays.is_empty() {
            self.write_support_data(support)?;
        }
        if let Some(block) = pvp {
            self.write_pvp_data(block)?;
        }
        if let Some(block) = ppp {
            self.write_ppp_data(block)?;
        }
        if ty.has_signal() {
            self.write_signal_data(signal)?;
        } else if !signal.is_empty() {
            return Err(Error::ProductMismatch(format!(
                "{ty} product does not take signal data"
            )));
        }
        self.finalize()
    }

    /// Writes the file header and the XML block, each followed by the section
    /// terminator.
    pub fn write_metadata(&mut self) -> Result<()> {
        if self.header.classification().is_empty() || self.header.release_info().is_empty() {
            return Err(Error::ClassificationRequired);
        }
        self.advance(Stage::Metadata, 0)?;
        let text = self.header.to_string();
        self.writer.write_all(text.as_bytes())?;
        self.writer.write_all(SECTION_TERMINATOR)?;
        self.writer.write_all(self.metadata.xml.as_bytes())?;
        self.writer.write_all(SECTION_TERMINATOR)?;
        tracing::debug!(
            header_bytes = text.len(),
            xml_bytes = self.metadata.xml.len(),
            "wrote header and XML"
        );
        Ok(())
    }

    /// Writes the support arrays, each swapped with its element size.
    pub fn write_support_data(&mut self, arrays: &[&[u8]]) -> Result<()> {
        let declared = &self.metadata.data.support_arrays;
        if arrays.len() != declared.len() {
            return Err(Error::size_mismatch(
                "support array count",
                declared.len() as u64,
                arrays.len() as u64,
            ));
        }
        for (array, data) in declared.iter().zip(arrays) {
            if data.len() as u64 != array.num_bytes() {
                return Err(Error::size_mismatch(
                    format!("support array {}", array.identifier),
                    array.num_bytes(),
                    data.len() as u64,
                ));
            }
        }

        let offset = self.header.support_block_byte_offset();
        if declared.is_empty() {
            if let Some(missing) = self.skipped(Stage::Support) {
                return Err(Error::MissingBlock(missing.block_name()));
            }
            self.stage = self.stage.max(Stage::Support);
            return Ok(());
        }
        self.advance(Stage::Support, offset)?;
        for (array, data) in self.metadata.data.support_arrays.iter().zip(arrays) {
            write_swapped(
                &mut self.writer,
                data,
                array.bytes_per_element,
                &self.config,
            )?;
        }
        tracing::debug!(
            arrays = arrays.len(),
            bytes = self.header.support_block_size(),
            "wrote support block"
        );
        Ok(())
    }

    /// Writes the PVP block after its padding.
    pub fn write_pvp_data(&mut self, block: &PvpBlock) -> Result<()> {
        if !self.metadata.product_type.has_pvp() {
            return Err(Error::ProductMismatch(format!(
                "{} product does not take a PVP block",
                self.metadata.product_type
            )));
        }
        check_block(
            "PVP",
            block.num_bytes_per_record(),
            self.metadata.pvp_record_bytes(),
            (0..block.num_groups()).map(|g| block.num_records(g)),
            &self.metadata.pvp_counts(),
        )?;
        let offset = self.header.pvp_block_byte_offset();
        self.advance(Stage::Pvp, offset)?;
        let bytes = block.write_to(&mut self.writer, &self.config)?;
        tracing::debug!(offset, bytes, channels = block.num_groups(), "wrote PVP block");
        Ok(())
    }

    /// Writes the PPP block after its padding.
    pub fn write_ppp_data(&mut self, block: &PppBlock) -> Result<()> {
        if !self.metadata.product_type.has_ppp() {
            return Err(Error::ProductMismatch(format!(
                "{} product does not take a PPP block",
                self.metadata.product_type
            )));
        }
        check_block(
            "PPP",
            block.num_bytes_per_record(),
            self.metadata.ppp_record_bytes(),
            (0..block.num_groups()).map(|g| block.num_records(g)),
            &self.metadata.ppp_counts(),
        )?;
        let offset = self.header.ppp_block_byte_offset();
        self.advance(Stage::Ppp, offset)?;
        let bytes = block.write_to(&mut self.writer, &self.config)?;
        tracing::debug!(offset, bytes, sequences = block.num_groups(), "wrote PPP block");
        Ok(())
    }

    /// Writes one host-order signal buffer per channel.
    ///
    /// Compressed channels are copied as opaque bytes; uncompressed samples
    /// are swapped per real component.
    pub fn write_signal_data(&mut self, channels: &[&[u8]]) -> Result<()> {
        let ty = self.metadata.product_type;
        if !ty.has_signal() {
            return Err(Error::ProductMismatch(format!(
                "{ty} product does not take signal data"
            )));
        }
        let data = &self.metadata.data;
        if channels.len() != data.channels.len() {
            return Err(Error::size_mismatch(
                "signal channel count",
                data.channels.len() as u64,
                channels.len() as u64,
            ));
        }
        for (channel, samples) in data.channels.iter().zip(channels) {
            let expected = data.channel_signal_bytes(channel);
            if samples.len() as u64 != expected {
                return Err(Error::size_mismatch(
                    format!("signal of channel {}", channel.identifier),
                    expected,
                    samples.len() as u64,
                ));
            }
        }

        let offset = self.header.signal_block_byte_offset();
        self.advance(Stage::Signal, offset)?;
        let component = self
            .metadata
            .data
            .signal_format
            .map_or(1, |f| f.component_bytes());
        for (channel, samples) in self.metadata.data.channels.iter().zip(channels) {
            let elem_size = if channel.compressed_signal_size.is_some() {
                1
            } else {
                component
            };
            write_swapped(&mut self.writer, samples, elem_size, &self.config)?;
            tracing::trace!(channel = %channel.identifier, bytes = samples.len(), "wrote signal array");
        }
        tracing::debug!(offset, channels = channels.len(), "wrote signal block");
        Ok(())
    }
}

/// Checks a parameter block against the metadata that sized the header.
fn check_block(
    name: &str,
    width: usize,
    declared_width: usize,
    counts: impl Iterator<Item = usize>,
    declared_counts: &[usize],
) -> Result<()> {
    if width != declared_width {
        return Err(Error::size_mismatch(
            format!("{name} bytes per record"),
            declared_width as u64,
            width as u64,
        ));
    }
    let counts: Vec<usize> = counts.collect();
    if counts != declared_counts {
        let records: usize = counts.iter().sum();
        return Err(Error::size_mismatch(
            format!("{name} record counts {counts:?}, declared {declared_counts:?}"),
            (declared_counts.iter().sum::<usize>() * declared_width) as u64,
            (records * width) as u64,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Ppp, Pvp};
    use crate::{ProductType, SignalArrayFormat, Vector3};

    fn rcv_metadata() -> CrsdMetadata {
        let mut meta = CrsdMetadata::new(ProductType::Rcv);
        meta.classification = "UNCLASSIFIED".into();
        meta.release_info = "Unrestricted".into();
        meta.xml = "<CRSDrcv>x</CRSDrcv>".into();
        meta.pvp = Some(Pvp::with_default_layout(false));
        meta.data.signal_format = Some(SignalArrayFormat::CI4);
        meta.data.add_channel("CH1", 2, 3);
        meta
    }

    #[test]
    fn test_layout_of_receive_product() {
        let meta = rcv_metadata();
        let mut pvp = meta.new_pvp_block().unwrap();
        pvp.set_rcv_pos(0, 1, Vector3::new(1.0, 2.0, 3.0)).unwrap();
        let signal: Vec<u8> = (0..2 * 3 * 4).map(|i| i as u8).collect();

        let mut writer = CrsdWriter::from_writer(VecWriter::new(), meta, IoConfig::single_threaded())
            .unwrap();
        writer.write(Some(&pvp), None, &[signal.as_slice()], &[]).unwrap();
        let header = writer.header().clone();
        let bytes = writer.into_inner().into_inner();

        let text_end = header.size() as usize;
        assert_eq!(&bytes[text_end..text_end + 2], b"\x0c\n");
        let xml = header.xml_block_byte_offset() as usize;
        assert_eq!(&bytes[xml..xml + 20], b"<CRSDrcv>x</CRSDrcv>");
        assert_eq!(&bytes[xml + 20..xml + 22], b"\x0c\n");

        let pvp_at = header.pvp_block_byte_offset() as usize;
        assert_eq!(pvp_at % 8, 0);
        assert!(bytes[xml + 22..pvp_at].iter().all(|&b| b == 0));
        // record 1, RcvPos.X at word 2
        let x = pvp_at + 208 + 16;
        assert_eq!(&bytes[x..x + 8], &1.0f64.to_be_bytes());

        let sig = header.signal_block_byte_offset() as usize;
        assert_eq!(sig, pvp_at + 2 * 208);
        assert_eq!(bytes.len(), sig + signal.len());
        // CI4 components are 16-bit big-endian on disk
        let first = u16::from_ne_bytes([signal[0], signal[1]]);
        assert_eq!(&bytes[sig..sig + 2], &first.to_be_bytes());
    }

    #[test]
    fn test_classification_required() {
        let mut meta = rcv_metadata();
        meta.release_info.clear();
        let mut writer =
            CrsdWriter::from_writer(VecWriter::new(), meta, IoConfig::single_threaded()).unwrap();
        assert!(matches!(
            writer.write_metadata(),
            Err(Error::ClassificationRequired)
        ));
    }

    #[test]
    fn test_blocks_must_come_in_order() {
        let meta = rcv_metadata();
        let pvp = meta.new_pvp_block().unwrap();
        let signal = vec![0u8; 24];
        let mut writer =
            CrsdWriter::from_writer(VecWriter::new(), meta, IoConfig::single_threaded()).unwrap();
        writer.write_metadata().unwrap();
        writer.write_pvp_data(&pvp).unwrap();
        writer.write_signal_data(&[signal.as_slice()]).unwrap();
        assert!(matches!(
            writer.write_pvp_data(&pvp),
            Err(Error::BlockOrder { block: "PVP", .. })
        ));
        assert!(matches!(
            writer.write_metadata(),
            Err(Error::BlockOrder { .. })
        ));
        writer.finalize().unwrap();
    }

    fn sar_with_support() -> CrsdMetadata {
        let mut meta = CrsdMetadata::new(ProductType::Sar);
        meta.classification = "UNCLASSIFIED".into();
        meta.release_info = "Unrestricted".into();
        meta.xml = "<CRSDsar/>".into();
        meta.pvp = Some(Pvp::with_default_layout(false));
        meta.ppp = Some(Ppp::with_default_layout(false));
        meta.data.signal_format = Some(SignalArrayFormat::CI2);
        meta.data.add_channel("CH1", 1, 4);
        meta.data.add_tx_sequence("TX1", 1);
        meta.data.add_support_array("S", 1, 1, 8);
        meta
    }

    #[test]
    fn test_required_blocks_cannot_be_skipped() {
        let meta = sar_with_support();
        let pvp = meta.new_pvp_block().unwrap();
        let ppp = meta.new_ppp_block().unwrap();
        let mut writer =
            CrsdWriter::from_writer(VecWriter::new(), meta, IoConfig::single_threaded()).unwrap();

        assert!(matches!(
            writer.write_pvp_data(&pvp),
            Err(Error::MissingBlock("header"))
        ));
        writer.write_metadata().unwrap();
        let after_metadata = writer.position();
        assert!(matches!(
            writer.write_ppp_data(&ppp),
            Err(Error::MissingBlock("support"))
        ));
        assert_eq!(writer.position(), after_metadata);

        writer.write_support_data(&[&[0u8; 8][..]]).unwrap();
        assert!(matches!(
            writer.write_ppp_data(&ppp),
            Err(Error::MissingBlock("PVP"))
        ));
        assert_eq!(writer.position(), writer.header().support_block_byte_offset() + 8);
    }

    #[test]
    fn test_finalize_reports_unwritten_block() {
        let meta = sar_with_support();
        let pvp = meta.new_pvp_block().unwrap();
        let ppp = meta.new_ppp_block().unwrap();
        let mut writer =
            CrsdWriter::from_writer(VecWriter::new(), meta, IoConfig::single_threaded()).unwrap();
        assert!(matches!(writer.finalize(), Err(Error::MissingBlock("header"))));

        writer.write_metadata().unwrap();
        writer.write_support_data(&[&[0u8; 8][..]]).unwrap();
        writer.write_pvp_data(&pvp).unwrap();
        writer.write_ppp_data(&ppp).unwrap();
        assert!(matches!(writer.finalize(), Err(Error::MissingBlock("signal"))));

        writer.write_signal_data(&[&[0u8; 8][..]]).unwrap();
        writer.finalize().unwrap();
        let size = writer.header().signal_block_byte_offset() + 8;
        assert_eq!(writer.into_inner().len() as u64, size);
    }

    #[test]
    fn test_empty_required_block_fails_before_writing() {
        let mut meta = sar_with_support();
        meta.data.channels[0].num_vectors = 0;
        assert!(matches!(
            CrsdWriter::from_writer(VecWriter::new(), meta, IoConfig::single_threaded()),
            Err(Error::ProductMismatch(_))
        ));

        let mut meta = sar_with_support();
        meta.xml.clear();
        assert!(matches!(
            CrsdWriter::from_writer(VecWriter::new(), meta, IoConfig::single_threaded()),
            Err(Error::IncompleteHeader(key)) if key == "XML_BLOCK_SIZE"
        ));
    }

    #[test]
    fn test_product_and_size_checks() {
        let meta = rcv_metadata();
        let pvp = meta.new_pvp_block().unwrap();
        let ppp = crate::blocks::PppBlock::new(Ppp::with_default_layout(false), &[1], None).unwrap();
        let mut writer = CrsdWriter::from_writer(
            VecWriter::new(),
            meta.clone(),
            IoConfig::single_threaded(),
        )
        .unwrap();
        assert!(matches!(
            writer.write(Some(&pvp), Some(&ppp), &[], &[]),
            Err(Error::ProductMismatch(_))
        ));

        let mut writer =
            CrsdWriter::from_writer(VecWriter::new(), meta.clone(), IoConfig::single_threaded())
                .unwrap();
        writer.write_metadata().unwrap();
        let wide = PvpBlock::new(Pvp::with_default_layout(false), &[2], Some(216)).unwrap();
        assert!(matches!(
            writer.write_pvp_data(&wide),
            Err(Error::SizeMismatch { expected: 208, actual: 216, .. })
        ));
        let short = PvpBlock::new(Pvp::with_default_layout(false), &[1], None).unwrap();
        assert!(matches!(
            writer.write_pvp_data(&short),
            Err(Error::SizeMismatch { .. })
        ));
        writer.write_pvp_data(&pvp).unwrap();
        assert!(matches!(
            writer.write_signal_data(&[&[0u8; 23][..]]),
            Err(Error::SizeMismatch { expected: 24, actual: 23, .. })
        ));
    }
}
