// blocks/block.rs
//! Two-dimensional arrays of PVP/PPP records and their bulk codec.
//!
//! A [`ParamBlock`] holds one group of records per channel (PVP) or per
//! transmit sequence (PPP). Each group occupies `count * num_bytes_per_record`
//! contiguous bytes on disk, groups follow each other in declaration order,
//! and every 8-byte word is big-endian.

use std::io::{Read, Seek, SeekFrom};

use super::WORD_SIZE;
use super::common::{read_fully, u64_to_usize};
use super::layout::{FieldLayout, RequiredParam};
use super::record::RecordSet;
use crate::byte_swap::{convert_big_endian, write_swapped};
use crate::writer::CrsdWrite;
use crate::{AddedValue, Error, IoConfig, Result};

/// Records of one parameter block, indexed `[group][record]`.
#[derive(Debug, Clone)]
pub struct ParamBlock<S: RecordSet> {
    layout: FieldLayout<S::Param>,
    records: Vec<Vec<S>>,
    num_bytes_per_record: usize,
}

impl<S: RecordSet> ParamBlock<S> {
    /// Creates a block of empty records, `counts[g]` records in group `g`.
    ///
    /// `declared` is the record width from the metadata, if any. It must be a
    /// whole number of words and at least the layout's minimum; the excess is
    /// zero padding.
    pub fn new(
        layout: FieldLayout<S::Param>,
        counts: &[usize],
        declared: Option<usize>,
    ) -> Result<Self> {
        layout.validate()?;
        let minimum = layout.min_record_bytes();
        let num_bytes_per_record = match declared {
            Some(width) if width < minimum || width % WORD_SIZE != 0 => {
                return Err(Error::size_mismatch(
                    format!("{} bytes per record", S::Param::BLOCK_NAME),
                    minimum.max(width.next_multiple_of(WORD_SIZE)) as u64,
                    width as u64,
                ));
            }
            Some(width) => width,
            None => minimum,
        };
        let records = counts.iter().map(|&n| vec![S::default(); n]).collect();
        Ok(Self {
            layout,
            records,
            num_bytes_per_record,
        })
    }

    /// Creates a block and decodes every record from host-order group
    /// buffers, one buffer per group.
    pub fn from_buffers(
        layout: FieldLayout<S::Param>,
        counts: &[usize],
        declared: Option<usize>,
        buffers: &[&[u8]],
    ) -> Result<Self> {
        let mut block = Self::new(layout, counts, declared)?;
        if buffers.len() != counts.len() {
            return Err(Error::size_mismatch(
                format!("{} buffers", S::Param::BLOCK_NAME),
                counts.len() as u64,
                buffers.len() as u64,
            ));
        }
        for (group, buf) in buffers.iter().enumerate() {
            block.decode_group(group, buf)?;
        }
        Ok(block)
    }

    fn decode_group(&mut self, group: usize, buf: &[u8]) -> Result<()> {
        let width = self.num_bytes_per_record;
        let count = self.records[group].len();
        if buf.len() < count * width {
            return Err(Error::size_mismatch(
                format!("{} {} {group}", S::Param::BLOCK_NAME, S::Param::GROUP_NAME),
                (count * width) as u64,
                buf.len() as u64,
            ));
        }
        for (index, chunk) in buf.chunks_exact(width).take(count).enumerate() {
            self.records[group][index] = S::from_bytes(&self.layout, chunk)?;
        }
        Ok(())
    }

    pub fn layout(&self) -> &FieldLayout<S::Param> {
        &self.layout
    }

    pub fn num_groups(&self) -> usize {
        self.records.len()
    }

    /// Number of records in `group`, or zero for an unknown group.
    pub fn num_records(&self, group: usize) -> usize {
        self.records.get(group).map_or(0, Vec::len)
    }

    pub fn num_bytes_per_record(&self) -> usize {
        self.num_bytes_per_record
    }

    /// Encoded size of one group.
    pub fn group_bytes(&self, group: usize) -> u64 {
        (self.num_records(group) * self.num_bytes_per_record) as u64
    }

    /// Encoded size of the whole block.
    pub fn total_bytes(&self) -> u64 {
        (0..self.num_groups()).map(|g| self.group_bytes(g)).sum()
    }

    fn check_index(&self, group: usize, index: usize) -> Result<()> {
        let Some(records) = self.records.get(group) else {
            return Err(Error::IndexOutOfRange {
                what: S::Param::GROUP_NAME,
                index: group,
                len: self.records.len(),
            });
        };
        if index >= records.len() {
            return Err(Error::IndexOutOfRange {
                what: S::Param::RECORD_NAME,
                index,
                len: records.len(),
            });
        }
        Ok(())
    }

    pub fn record(&self, group: usize, index: usize) -> Result<&S> {
        self.check_index(group, index)?;
        Ok(&self.records[group][index])
    }

    pub fn record_mut(&mut self, group: usize, index: usize) -> Result<&mut S> {
        self.check_index(group, index)?;
        Ok(&mut self.records[group][index])
    }

    /// Value of the added field `name` of one record.
    pub fn added(&self, group: usize, index: usize, name: &str) -> Result<&AddedValue> {
        self.record(group, index)?
            .added()
            .get(name)
            .ok_or_else(|| Error::NotSet(name.to_string()))
    }

    /// Assigns the added field `name` of one record. A value can be assigned
    /// once; its variant must match the field's declared format.
    pub fn set_added(
        &mut self,
        group: usize,
        index: usize,
        name: &str,
        value: AddedValue,
    ) -> Result<()> {
        self.check_index(group, index)?;
        let field = self
            .layout
            .added_field(name)
            .ok_or_else(|| Error::UndeclaredField(name.to_string()))?;
        let desc = field.descriptor();
        if !desc.parsed_format().accepts(&value, desc.byte_len()) {
            return Err(Error::TypeMismatch {
                name: name.to_string(),
                format: desc.format().to_string(),
            });
        }
        let added = self.records[group][index].added_mut();
        if added.contains_key(name) {
            return Err(Error::DuplicateAssignment(name.to_string()));
        }
        added.insert(name.to_string(), value);
        Ok(())
    }

    /// Encodes every record of `group` into one host-order buffer.
    pub fn get_data(&self, group: usize) -> Result<Vec<u8>> {
        let Some(records) = self.records.get(group) else {
            return Err(Error::IndexOutOfRange {
                what: S::Param::GROUP_NAME,
                index: group,
                len: self.records.len(),
            });
        };
        let width = self.num_bytes_per_record;
        let mut data = vec![0u8; records.len() * width];
        for (record, chunk) in records.iter().zip(data.chunks_exact_mut(width)) {
            record.write_bytes(&self.layout, chunk)?;
        }
        Ok(data)
    }

    /// Writes every group in big-endian order; returns the bytes written.
    pub fn write_to<W: CrsdWrite + ?Sized>(&self, writer: &mut W, config: &IoConfig) -> Result<u64> {
        for group in 0..self.num_groups() {
            let data = self.get_data(group)?;
            write_swapped(writer, &data, WORD_SIZE, config)?;
        }
        Ok(self.total_bytes())
    }

    /// Reads the block from `reader` at `byte_offset` and decodes every record.
    ///
    /// `byte_size` is the size declared in the file header and must equal
    /// [`total_bytes`](Self::total_bytes). Returns the bytes consumed.
    pub fn load<R: Read + Seek + ?Sized>(
        &mut self,
        reader: &mut R,
        byte_offset: u64,
        byte_size: u64,
        num_threads: usize,
    ) -> Result<u64> {
        let expected = self.total_bytes();
        if byte_size != expected {
            return Err(Error::size_mismatch(
                format!("{} block", S::Param::BLOCK_NAME),
                expected,
                byte_size,
            ));
        }
        reader.seek(SeekFrom::Start(byte_offset))?;
        let mut buf = vec![0u8; u64_to_usize(byte_size, S::Param::BLOCK_NAME)?];
        let read = read_fully(reader, &mut buf)?;
        if read < buf.len() {
            return Err(Error::EndOfStream {
                expected: byte_size,
                actual: read as u64,
            });
        }
        convert_big_endian(&mut buf, WORD_SIZE, num_threads)?;

        let mut start = 0;
        for group in 0..self.num_groups() {
            let len = self.records[group].len() * self.num_bytes_per_record;
            self.decode_group(group, &buf[start..start + len])?;
            start += len;
        }
        tracing::debug!(
            block = S::Param::BLOCK_NAME,
            groups = self.num_groups(),
            byte_offset,
            byte_size,
            "loaded parameter block"
        );
        Ok(byte_size)
    }
}

impl<S: RecordSet> PartialEq for ParamBlock<S> {
    fn eq(&self, other: &Self) -> bool {
        self.num_bytes_per_record == other.num_bytes_per_record && self.records == other.records
    }
}

/// Generates typed getters and setters for the required fields of a record
/// type. Getters fail with `NotSet` on an unset value; setters fail with
/// `UndeclaredField` when the layout leaves the field unplaced.
macro_rules! param_accessors {
    ($set:ty { $($field:ident, $setter:ident: $ty:ty => $param:expr;)* }) => {
        impl $crate::blocks::ParamBlock<$set> {
            $(
                #[doc = concat!("The `", stringify!($field), "` value of one record.")]
                pub fn $field(&self, group: usize, index: usize) -> $crate::Result<$ty> {
                    self.record(group, index)?.$field.ok_or_else(|| {
                        $crate::Error::NotSet(
                            $crate::blocks::RequiredParam::name($param).to_string(),
                        )
                    })
                }

                pub fn $setter(&mut self, group: usize, index: usize, value: $ty) -> $crate::Result<()> {
                    if !self.layout().field($param).is_placed() {
                        return Err($crate::Error::UndeclaredField(
                            $crate::blocks::RequiredParam::name($param).to_string(),
                        ));
                    }
                    self.record_mut(group, index)?.$field = Some(value);
                    Ok(())
                }
            )*
        }
    };
}

pub(crate) use param_accessors;
