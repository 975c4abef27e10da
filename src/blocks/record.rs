// blocks/record.rs
//! Encoding and decoding of single PVP/PPP records against a layout.

use core::fmt;
use std::collections::HashMap;

use super::common::{read_f64, read_i64, validate_buffer_size, write_f64, write_i64};
use super::layout::{FieldLayout, ParamKind, RequiredParam};
use crate::{AddedValue, Error, IntFrac, Result, Vector2, Vector3};

/// A required-field value in its typed form.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    Float(f64),
    Int(i64),
    Vec2(Vector2),
    Vec3(Vector3),
    IntFrac(IntFrac),
}

/// One decoded record whose required fields are named by `Param`.
///
/// Implemented by [`PvpSet`](super::PvpSet) and [`PppSet`](super::PppSet).
/// The provided `from_bytes` / `write_bytes` do all the byte work; an
/// implementation only maps enum variants to struct members.
pub trait RecordSet: Clone + Default + PartialEq + fmt::Debug + Send + Sync {
    type Param: RequiredParam;

    fn value(&self, param: Self::Param) -> Option<ParamValue>;

    /// Stores `value` when its shape matches `param`; returns false otherwise.
    fn set_value(&mut self, param: Self::Param, value: ParamValue) -> bool;

    fn added(&self) -> &HashMap<String, AddedValue>;

    fn added_mut(&mut self) -> &mut HashMap<String, AddedValue>;

    /// Decode a record from a host-order buffer laid out by `layout`.
    fn from_bytes(layout: &FieldLayout<Self::Param>, bytes: &[u8]) -> Result<Self> {
        validate_buffer_size(
            bytes,
            layout.min_record_bytes(),
            Self::Param::BLOCK_NAME,
        )?;
        let mut set = Self::default();
        for &param in Self::Param::ALL {
            let Some(off) = layout.field(param).byte_offset() else {
                continue;
            };
            let value = match param.kind() {
                ParamKind::Float => ParamValue::Float(read_f64(bytes, off)),
                ParamKind::Int => ParamValue::Int(read_i64(bytes, off)),
                ParamKind::Vec2 => {
                    ParamValue::Vec2(Vector2::new(read_f64(bytes, off), read_f64(bytes, off + 8)))
                }
                ParamKind::Vec3 => ParamValue::Vec3(Vector3::new(
                    read_f64(bytes, off),
                    read_f64(bytes, off + 8),
                    read_f64(bytes, off + 16),
                )),
                ParamKind::IntFrac => {
                    ParamValue::IntFrac(IntFrac::new(read_i64(bytes, off), read_f64(bytes, off + 8)))
                }
            };
            set.set_value(param, value);
        }
        for field in layout.added_fields() {
            let desc = field.descriptor();
            if let Some(off) = desc.byte_offset() {
                let value = desc.parsed_format().decode(bytes, off, desc.byte_len());
                set.added_mut().insert(field.name().to_string(), value);
            }
        }
        Ok(set)
    }

    /// Encode this record into `out`, which must hold at least the layout's
    /// minimum record width. Bytes not covered by a set field are zeroed.
    fn write_bytes(&self, layout: &FieldLayout<Self::Param>, out: &mut [u8]) -> Result<()> {
        validate_buffer_size(out, layout.min_record_bytes(), Self::Param::BLOCK_NAME)?;
        out.fill(0);
        for &param in Self::Param::ALL {
            let (Some(off), Some(value)) = (layout.field(param).byte_offset(), self.value(param))
            else {
                continue;
            };
            match value {
                ParamValue::Float(v) => write_f64(out, off, v),
                ParamValue::Int(v) => write_i64(out, off, v),
                ParamValue::Vec2(v) => {
                    write_f64(out, off, v.x);
                    write_f64(out, off + 8, v.y);
                }
                ParamValue::Vec3(v) => {
                    write_f64(out, off, v.x);
                    write_f64(out, off + 8, v.y);
                    write_f64(out, off + 16, v.z);
                }
                ParamValue::IntFrac(v) => {
                    write_i64(out, off, v.int_part);
                    write_f64(out, off + 8, v.frac_part);
                }
            }
        }
        for (name, value) in self.added() {
            let field = layout
                .added_field(name)
                .ok_or_else(|| Error::UndeclaredField(name.clone()))?;
            let desc = field.descriptor();
            let off = desc
                .byte_offset()
                .ok_or_else(|| Error::UndeclaredField(name.clone()))?;
            if !desc.parsed_format().encode(value, out, off, desc.byte_len()) {
                return Err(Error::TypeMismatch {
                    name: name.clone(),
                    format: desc.format().to_string(),
                });
            }
        }
        Ok(())
    }
}
