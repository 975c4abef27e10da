//! Data description of a CRSD product.
//!
//! The XML metadata block is produced and consumed by an outer layer; this
//! crate carries it as opaque text. What the binary engine needs from it
//! (record layouts, record counts, signal geometry and support array sizes)
//! lives in [`CrsdMetadata`], which can be stored next to a product as a JSON
//! sidecar.
//!
//! # Example
//!
//! ```
//! use crsd::{CrsdMetadata, ProductType, Pvp, SignalArrayFormat};
//!
//! let mut meta = CrsdMetadata::new(ProductType::Rcv);
//! meta.pvp = Some(Pvp::with_default_layout(false));
//! meta.data.signal_format = Some(SignalArrayFormat::CF8);
//! meta.data.add_channel("CH1", 4, 128);
//! meta.data.add_channel("CH2", 2, 128);
//!
//! assert_eq!(meta.pvp_block_size(), 6 * 208);
//! assert_eq!(meta.signal_block_size(), 6 * 128 * 8);
//! assert_eq!(meta.data.channels[1].signal_array_byte_offset, 4 * 128 * 8);
//! ```

use core::fmt;
use core::str::FromStr;

use crate::blocks::{Ppp, PppBlock, Pvp, PvpBlock};
use crate::{Error, ProductType, Result};

/// Sample format of the uncompressed signal arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalArrayFormat {
    /// Complex 8-bit integers, 2 bytes per sample.
    CI2,
    /// Complex 16-bit integers, 4 bytes per sample.
    CI4,
    /// Complex 32-bit floats, 8 bytes per sample.
    CF8,
}

impl SignalArrayFormat {
    /// Bytes per complex sample.
    pub fn num_bytes(self) -> usize {
        match self {
            SignalArrayFormat::CI2 => 2,
            SignalArrayFormat::CI4 => 4,
            SignalArrayFormat::CF8 => 8,
        }
    }

    /// Bytes per real component; the unit of byte swapping.
    pub fn component_bytes(self) -> usize {
        self.num_bytes() / 2
    }

    pub fn token(self) -> &'static str {
        match self {
            SignalArrayFormat::CI2 => "CI2",
            SignalArrayFormat::CI4 => "CI4",
            SignalArrayFormat::CF8 => "CF8",
        }
    }
}

impl fmt::Display for SignalArrayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for SignalArrayFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CI2" => Ok(SignalArrayFormat::CI2),
            "CI4" => Ok(SignalArrayFormat::CI4),
            "CF8" => Ok(SignalArrayFormat::CF8),
            other => Err(Error::format(other, "expected CI2, CI4 or CF8")),
        }
    }
}

/// One receive channel: its PVP group and its signal array.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelParameters {
    pub identifier: String,
    pub num_vectors: usize,
    pub num_samples: usize,
    /// Offset of the channel's signal array within the signal block.
    pub signal_array_byte_offset: u64,
    /// Size of the channel's compressed signal, when stored compressed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub compressed_signal_size: Option<u64>,
}

/// One transmit sequence: its PPP group.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxSequenceParameters {
    pub identifier: String,
    pub num_pulses: usize,
}

/// One support array: a 2-D array of fixed-size big-endian elements.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SupportArrayParameters {
    pub identifier: String,
    pub num_rows: usize,
    pub num_cols: usize,
    pub bytes_per_element: usize,
    /// Offset of the array within the support block.
    pub array_byte_offset: u64,
}

impl SupportArrayParameters {
    pub fn num_bytes(&self) -> u64 {
        (self.num_rows * self.num_cols * self.bytes_per_element) as u64
    }
}

/// Geometry of the binary blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DataDescription {
    pub signal_format: Option<SignalArrayFormat>,
    /// Declared PVP record width; the layout minimum when absent.
    pub num_bytes_pvp: Option<usize>,
    /// Declared PPP record width; the layout minimum when absent.
    pub num_bytes_ppp: Option<usize>,
    pub channels: Vec<ChannelParameters>,
    pub tx_sequences: Vec<TxSequenceParameters>,
    pub support_arrays: Vec<SupportArrayParameters>,
}

impl DataDescription {
    fn signal_end(&self) -> u64 {
        self.channels
            .last()
            .map_or(0, |ch| ch.signal_array_byte_offset + self.channel_signal_bytes(ch))
    }

    /// Appends an uncompressed channel directly after the previous one.
    pub fn add_channel(&mut self, identifier: &str, num_vectors: usize, num_samples: usize) {
        let offset = self.signal_end();
        self.channels.push(ChannelParameters {
            identifier: identifier.to_string(),
            num_vectors,
            num_samples,
            signal_array_byte_offset: offset,
            compressed_signal_size: None,
        });
    }

    /// Appends a channel whose signal is stored as `compressed_size` opaque
    /// bytes.
    pub fn add_compressed_channel(
        &mut self,
        identifier: &str,
        num_vectors: usize,
        num_samples: usize,
        compressed_size: u64,
    ) {
        let offset = self.signal_end();
        self.channels.push(ChannelParameters {
            identifier: identifier.to_string(),
            num_vectors,
            num_samples,
            signal_array_byte_offset: offset,
            compressed_signal_size: Some(compressed_size),
        });
    }

    pub fn add_tx_sequence(&mut self, identifier: &str, num_pulses: usize) {
        self.tx_sequences.push(TxSequenceParameters {
            identifier: identifier.to_string(),
            num_pulses,
        });
    }

    /// Appends a support array directly after the previous one.
    pub fn add_support_array(
        &mut self,
        identifier: &str,
        num_rows: usize,
        num_cols: usize,
        bytes_per_element: usize,
    ) {
        let offset = self
            .support_arrays
            .last()
            .map_or(0, |a| a.array_byte_offset + a.num_bytes());
        self.support_arrays.push(SupportArrayParameters {
            identifier: identifier.to_string(),
            num_rows,
            num_cols,
            bytes_per_element,
            array_byte_offset: offset,
        });
    }

    /// Bytes of one channel in the signal block.
    pub fn channel_signal_bytes(&self, channel: &ChannelParameters) -> u64 {
        match channel.compressed_signal_size {
            Some(size) => size,
            None => {
                let sample = self.signal_format.map_or(0, SignalArrayFormat::num_bytes);
                (channel.num_vectors * channel.num_samples * sample) as u64
            }
        }
    }

    pub fn channel(&self, identifier: &str) -> Option<&ChannelParameters> {
        self.channels.iter().find(|c| c.identifier == identifier)
    }

    pub fn support_array(&self, identifier: &str) -> Option<&SupportArrayParameters> {
        self.support_arrays.iter().find(|a| a.identifier == identifier)
    }
}

/// Everything the engine needs to write or read one CRSD product.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CrsdMetadata {
    pub product_type: ProductType,
    pub version: String,
    pub classification: String,
    pub release_info: String,
    /// Rendered XML metadata block.
    pub xml: String,
    pub data: DataDescription,
    pub pvp: Option<Pvp>,
    pub ppp: Option<Ppp>,
}

impl CrsdMetadata {
    pub fn new(product_type: ProductType) -> Self {
        Self {
            product_type,
            version: "1.0.0".to_string(),
            ..Self::default()
        }
    }

    /// Record width of the PVP block, or zero without a PVP layout.
    pub fn pvp_record_bytes(&self) -> usize {
        self.pvp.as_ref().map_or(0, |layout| {
            self.data
                .num_bytes_pvp
                .unwrap_or_else(|| layout.min_record_bytes())
        })
    }

    /// Record width of the PPP block, or zero without a PPP layout.
    pub fn ppp_record_bytes(&self) -> usize {
        self.ppp.as_ref().map_or(0, |layout| {
            self.data
                .num_bytes_ppp
                .unwrap_or_else(|| layout.min_record_bytes())
        })
    }

    /// Records per PVP group, one entry per channel.
    pub fn pvp_counts(&self) -> Vec<usize> {
        self.data.channels.iter().map(|c| c.num_vectors).collect()
    }

    /// Records per PPP group, one entry per transmit sequence.
    pub fn ppp_counts(&self) -> Vec<usize> {
        self.data.tx_sequences.iter().map(|s| s.num_pulses).collect()
    }

    pub fn xml_block_size(&self) -> u64 {
        self.xml.len() as u64
    }

    /// Support block size: the end of the last support array.
    pub fn support_block_size(&self) -> u64 {
        self.data
            .support_arrays
            .iter()
            .map(|a| a.array_byte_offset + a.num_bytes())
            .max()
            .unwrap_or(0)
    }

    pub fn pvp_block_size(&self) -> u64 {
        (self.pvp_record_bytes() * self.pvp_counts().iter().sum::<usize>()) as u64
    }

    pub fn ppp_block_size(&self) -> u64 {
        (self.ppp_record_bytes() * self.ppp_counts().iter().sum::<usize>()) as u64
    }

    /// Signal block size: the end of the last channel's signal array.
    pub fn signal_block_size(&self) -> u64 {
        if !self.product_type.has_signal() {
            return 0;
        }
        self.data
            .channels
            .iter()
            .map(|c| c.signal_array_byte_offset + self.data.channel_signal_bytes(c))
            .max()
            .unwrap_or(0)
    }

    /// An empty PVP block shaped by this description.
    pub fn new_pvp_block(&self) -> Result<PvpBlock> {
        let layout = self.pvp.clone().ok_or_else(|| {
            Error::ProductMismatch(format!("{} product has no PVP layout", self.product_type))
        })?;
        PvpBlock::new(layout, &self.pvp_counts(), self.data.num_bytes_pvp)
    }

    /// An empty PPP block shaped by this description.
    pub fn new_ppp_block(&self) -> Result<PppBlock> {
        let layout = self.ppp.clone().ok_or_else(|| {
            Error::ProductMismatch(format!("{} product has no PPP layout", self.product_type))
        })?;
        PppBlock::new(layout, &self.ppp_counts(), self.data.num_bytes_ppp)
    }

    /// Checks that the description is consistent with its product type and
    /// that arrays are laid out back to back in declaration order.
    pub fn validate(&self) -> Result<()> {
        let ty = self.product_type;
        if ty.has_pvp() != self.pvp.is_some() {
            return Err(Error::ProductMismatch(format!(
                "{ty} product {} a PVP layout",
                if ty.has_pvp() { "requires" } else { "does not take" }
            )));
        }
        if ty.has_ppp() != self.ppp.is_some() {
            return Err(Error::ProductMismatch(format!(
                "{ty} product {} a PPP layout",
                if ty.has_ppp() { "requires" } else { "does not take" }
            )));
        }
        if let Some(layout) = &self.pvp {
            layout.validate()?;
        }
        if let Some(layout) = &self.ppp {
            layout.validate()?;
        }
        if ty.has_pvp() && self.data.channels.is_empty() {
            return Err(Error::ProductMismatch(format!("{ty} product has no channels")));
        }
        if ty.has_ppp() && self.data.tx_sequences.is_empty() {
            return Err(Error::ProductMismatch(format!(
                "{ty} product has no transmit sequences"
            )));
        }
        if let Some(ch) = self.data.channels.iter().find(|c| {
            c.num_vectors == 0 || (c.compressed_signal_size.is_none() && c.num_samples == 0)
        }) {
            return Err(Error::ProductMismatch(format!(
                "channel {} has {} vectors of {} samples",
                ch.identifier, ch.num_vectors, ch.num_samples
            )));
        }
        if let Some(seq) = self.data.tx_sequences.iter().find(|s| s.num_pulses == 0) {
            return Err(Error::ProductMismatch(format!(
                "tx sequence {} has no pulses",
                seq.identifier
            )));
        }
        let uncompressed = self
            .data
            .channels
            .iter()
            .any(|c| c.compressed_signal_size.is_none());
        if ty.has_signal() && uncompressed && self.data.signal_format.is_none() {
            return Err(Error::ProductMismatch(format!(
                "{ty} product has no signal array format"
            )));
        }

        let mut expected = 0;
        for ch in &self.data.channels {
            if ch.signal_array_byte_offset != expected {
                return Err(Error::size_mismatch(
                    format!("signal array offset of channel {}", ch.identifier),
                    expected,
                    ch.signal_array_byte_offset,
                ));
            }
            expected += self.data.channel_signal_bytes(ch);
        }
        let mut expected = 0;
        for array in &self.data.support_arrays {
            if array.array_byte_offset != expected {
                return Err(Error::size_mismatch(
                    format!("offset of support array {}", array.identifier),
                    expected,
                    array.array_byte_offset,
                ));
            }
            expected += array.num_bytes();
        }
        Ok(())
    }

    /// Save the description as pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a description saved by [`save_to_file`](Self::save_to_file).
    #[cfg(feature = "serde")]
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
