// blocks/file_header.rs
//! The plain-text file header and block offset resolution.
//!
//! The header is the first section of every CRSD file:
//!
//! ```text
//! CRSDsar/1.0.0
//! XML_BLOCK_SIZE := 1234
//! XML_BLOCK_BYTE_OFFSET := 321
//! ...
//! \f\n
//! ```
//!
//! Because the header's own length decides where the XML block starts, and
//! every later offset follows from that, [`FileHeader::set`] iterates until the
//! rendered length stops changing.

use core::fmt;
use std::collections::HashSet;
use std::io::BufRead;

use super::common::padding_to_align_8;
use crate::{Error, ProductType, Result};

/// Bytes that end the header and XML sections.
pub const SECTION_TERMINATOR: &[u8; 2] = b"\x0c\n";

/// Upper bound on sizing passes in [`FileHeader::set`].
const MAX_SIZING_PASSES: usize = 16;

const DEFAULT_VERSION: &str = "1.0.0";
const KEY_DELIMITER: &str = " := ";

/// Offset and size of one block, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockSpan {
    pub offset: u64,
    pub size: u64,
}

impl BlockSpan {
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    pub fn is_present(&self) -> bool {
        self.size > 0
    }
}

/// The CRSD file header.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileHeader {
    version: String,
    product_type: ProductType,
    xml: BlockSpan,
    support: BlockSpan,
    pvp: BlockSpan,
    ppp: BlockSpan,
    signal: BlockSpan,
    classification: String,
    release_info: String,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self::new(ProductType::default())
    }
}

impl FileHeader {
    /// Creates an unset header: version `1.0.0`, every block empty.
    pub fn new(product_type: ProductType) -> Self {
        Self {
            version: DEFAULT_VERSION.to_string(),
            product_type,
            xml: BlockSpan::default(),
            support: BlockSpan::default(),
            pvp: BlockSpan::default(),
            ppp: BlockSpan::default(),
            signal: BlockSpan::default(),
            classification: String::new(),
            release_info: String::new(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = version.into();
    }

    pub fn product_type(&self) -> ProductType {
        self.product_type
    }

    pub fn classification(&self) -> &str {
        &self.classification
    }

    pub fn set_classification(&mut self, classification: impl Into<String>) {
        self.classification = classification.into();
    }

    pub fn release_info(&self) -> &str {
        &self.release_info
    }

    pub fn set_release_info(&mut self, release_info: impl Into<String>) {
        self.release_info = release_info.into();
    }

    pub fn xml_block_size(&self) -> u64 {
        self.xml.size
    }

    pub fn xml_block_byte_offset(&self) -> u64 {
        self.xml.offset
    }

    pub fn support_block_size(&self) -> u64 {
        self.support.size
    }

    pub fn support_block_byte_offset(&self) -> u64 {
        self.support.offset
    }

    pub fn pvp_block_size(&self) -> u64 {
        self.pvp.size
    }

    pub fn pvp_block_byte_offset(&self) -> u64 {
        self.pvp.offset
    }

    pub fn ppp_block_size(&self) -> u64 {
        self.ppp.size
    }

    pub fn ppp_block_byte_offset(&self) -> u64 {
        self.ppp.offset
    }

    pub fn signal_block_size(&self) -> u64 {
        self.signal.size
    }

    pub fn signal_block_byte_offset(&self) -> u64 {
        self.signal.offset
    }

    /// Records the block sizes and resolves every block offset.
    ///
    /// A size of zero marks a block as absent: it gets no offset and its keys
    /// are left out of the header text. The XML block and every block the
    /// product type requires must be non-empty.
    pub fn set(&mut self, xml: u64, support: u64, pvp: u64, ppp: u64, signal: u64) -> Result<()> {
        let ty = self.product_type;
        let required = [
            ("XML_BLOCK_SIZE", true, xml),
            ("PVP_BLOCK_SIZE", ty.has_pvp(), pvp),
            ("PPP_BLOCK_SIZE", ty.has_ppp(), ppp),
            ("SIGNAL_BLOCK_SIZE", ty.has_signal(), signal),
        ];
        if let Some((key, _, _)) = required.iter().find(|(_, needed, size)| *needed && *size == 0) {
            return Err(Error::IncompleteHeader(key.to_string()));
        }

        self.xml.size = xml;
        self.support.size = support;
        self.pvp.size = pvp;
        self.ppp.size = ppp;
        self.signal.size = signal;

        let mut size = self.size();
        for pass in 1..=MAX_SIZING_PASSES {
            self.place_blocks(size);
            let resized = self.size();
            if resized == size {
                tracing::trace!(passes = pass, header_size = size, "file header sized");
                return Ok(());
            }
            size = resized;
        }
        Err(Error::HeaderNotConverged(MAX_SIZING_PASSES))
    }

    fn place_blocks(&mut self, header_size: u64) {
        let terminator = SECTION_TERMINATOR.len() as u64;
        self.xml.offset = header_size + terminator;

        let mut cursor = self.xml.end() + terminator;
        if self.support.is_present() {
            self.support.offset = cursor;
            cursor = self.support.end();
        } else {
            self.support.offset = 0;
        }
        cursor += padding_to_align_8(cursor);

        for span in [&mut self.pvp, &mut self.ppp, &mut self.signal] {
            span.offset = if span.is_present() { cursor } else { 0 };
            cursor += span.size;
        }
    }

    /// Length in bytes of the header text, terminator excluded.
    pub fn size(&self) -> u64 {
        self.to_string().len() as u64
    }

    /// End of the data preceding the PVP block: the support block if any,
    /// otherwise the XML block and its terminator.
    fn end_before_pvp(&self) -> u64 {
        if self.support.is_present() {
            self.support.end()
        } else {
            self.xml.end() + SECTION_TERMINATOR.len() as u64
        }
    }

    fn gap(span: &BlockSpan, previous_end: u64) -> u64 {
        if span.is_present() {
            span.offset.saturating_sub(previous_end)
        } else {
            0
        }
    }

    /// Zero bytes written between the preceding data and the PVP block.
    pub fn pvp_pad_bytes(&self) -> u64 {
        Self::gap(&self.pvp, self.end_before_pvp())
    }

    /// Zero bytes written between the preceding data and the PPP block.
    pub fn ppp_pad_bytes(&self) -> u64 {
        let previous = if self.pvp.is_present() {
            self.pvp.end()
        } else {
            self.end_before_pvp()
        };
        Self::gap(&self.ppp, previous)
    }

    /// Zero bytes written between the preceding data and the signal block.
    pub fn signal_pad_bytes(&self) -> u64 {
        let previous = [self.ppp, self.pvp]
            .into_iter()
            .find(BlockSpan::is_present)
            .map_or_else(|| self.end_before_pvp(), |span| span.end());
        Self::gap(&self.signal, previous)
    }

    /// Parses a header up to and including its section terminator.
    pub fn read<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self> {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        let first = line.trim_end_matches(['\n', '\r']);
        let (product_type, version) = first
            .strip_prefix("CRSD")
            .and_then(|rest| rest.split_once('/'))
            .filter(|(_, version)| !version.is_empty())
            .and_then(|(tag, version)| Some((tag.parse::<ProductType>().ok()?, version)))
            .ok_or_else(|| Error::InvalidFileType(first.to_string()))?;

        let mut header = Self::new(product_type);
        header.version = version.to_string();

        let mut seen = HashSet::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(Error::IncompleteHeader("section terminator".to_string()));
            }
            if line.as_bytes() == SECTION_TERMINATOR {
                break;
            }
            let entry = line.trim_end_matches(['\n', '\r']);
            let (key, value) = entry
                .split_once(":=")
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| Error::UnknownKey(entry.to_string()))?;
            header.apply(key, value)?;
            if !seen.insert(key.to_string()) {
                return Err(Error::InvalidHeaderValue {
                    key: key.to_string(),
                    value: format!("{value} (repeated key)"),
                });
            }
        }

        header.check_complete()?;
        tracing::debug!(
            product = %header.product_type,
            version = %header.version,
            "read file header"
        );
        Ok(header)
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let number = || {
            value.parse::<u64>().map_err(|_| Error::InvalidHeaderValue {
                key: key.to_string(),
                value: value.to_string(),
            })
        };
        match key {
            "XML_BLOCK_SIZE" => self.xml.size = number()?,
            "XML_BLOCK_BYTE_OFFSET" => self.xml.offset = number()?,
            "SUPPORT_BLOCK_SIZE" => self.support.size = number()?,
            "SUPPORT_BLOCK_BYTE_OFFSET" => self.support.offset = number()?,
            "PVP_BLOCK_SIZE" => self.pvp.size = number()?,
            "PVP_BLOCK_BYTE_OFFSET" => {
                let offset = number()?;
                if offset % 8 != 0 {
                    return Err(Error::InvalidHeaderValue {
                        key: key.to_string(),
                        value: format!("{value} (not 8-byte aligned)"),
                    });
                }
                self.pvp.offset = offset;
            }
            "PPP_BLOCK_SIZE" => self.ppp.size = number()?,
            "PPP_BLOCK_BYTE_OFFSET" => self.ppp.offset = number()?,
            "SIGNAL_BLOCK_SIZE" => self.signal.size = number()?,
            "SIGNAL_BLOCK_BYTE_OFFSET" => self.signal.offset = number()?,
            "CLASSIFICATION" => self.classification = value.to_string(),
            "RELEASE_INFO" => self.release_info = value.to_string(),
            other => return Err(Error::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// Fails with the first key the product type requires that is still
    /// zero or empty.
    fn check_complete(&self) -> Result<()> {
        let ty = self.product_type;
        let required = [
            ("XML_BLOCK_SIZE", true, self.xml.size),
            ("XML_BLOCK_BYTE_OFFSET", true, self.xml.offset),
            ("PVP_BLOCK_SIZE", ty.has_pvp(), self.pvp.size),
            ("PVP_BLOCK_BYTE_OFFSET", ty.has_pvp(), self.pvp.offset),
            ("PPP_BLOCK_SIZE", ty.has_ppp(), self.ppp.size),
            ("PPP_BLOCK_BYTE_OFFSET", ty.has_ppp(), self.ppp.offset),
            ("SIGNAL_BLOCK_SIZE", ty.has_signal(), self.signal.size),
            ("SIGNAL_BLOCK_BYTE_OFFSET", ty.has_signal(), self.signal.offset),
            (
                "SUPPORT_BLOCK_BYTE_OFFSET",
                self.support.is_present(),
                self.support.offset,
            ),
        ];
        if let Some((key, _, _)) = required.iter().find(|(_, needed, v)| *needed && *v == 0) {
            return Err(Error::IncompleteHeader(key.to_string()));
        }
        if self.classification.is_empty() {
            return Err(Error::IncompleteHeader("CLASSIFICATION".to_string()));
        }
        if self.release_info.is_empty() {
            return Err(Error::IncompleteHeader("RELEASE_INFO".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for FileHeader {
    /// Renders the header text. The section terminator is not included.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "CRSD{}/{}", self.product_type, self.version)?;
        let blocks = [
            ("XML", &self.xml),
            ("SUPPORT", &self.support),
            ("PVP", &self.pvp),
            ("PPP", &self.ppp),
            ("SIGNAL", &self.signal),
        ];
        for (name, span) in blocks {
            if span.is_present() || name == "XML" {
                writeln!(f, "{name}_BLOCK_SIZE{KEY_DELIMITER}{}", span.size)?;
                writeln!(f, "{name}_BLOCK_BYTE_OFFSET{KEY_DELIMITER}{}", span.offset)?;
            }
        }
        writeln!(f, "CLASSIFICATION{KEY_DELIMITER}{}", self.classification)?;
        writeln!(f, "RELEASE_INFO{KEY_DELIMITER}{}", self.release_info)
    }
}
