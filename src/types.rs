//! Shared value types used across the library.

use core::fmt;
use core::str::FromStr;

use crate::{Error, Result};

/// A 2-vector stored as two consecutive `F8` words.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A 3-vector stored as three consecutive `F8` words.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Integer plus fractional part sharing one 16-byte slot.
///
/// Used for times and phases that need more precision than one `f64` offers
/// (`RcvStart`, `RefPhi0`, `TxTime`, `PhiX0`). The integer word is stored first
/// and the fraction word immediately after it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntFrac {
    pub int_part: i64,
    pub frac_part: f64,
}

impl IntFrac {
    pub const fn new(int_part: i64, frac_part: f64) -> Self {
        Self {
            int_part,
            frac_part,
        }
    }

    /// Collapses the pair into a single `f64`, losing precision for large
    /// integer parts.
    pub fn as_f64(&self) -> f64 {
        self.int_part as f64 + self.frac_part
    }
}

/// A decoded value of an added (custom) PVP or PPP field.
///
/// The variant is selected by the field's format string. Composite formats
/// such as `X=F8;Y=F8;` have no typed representation and decode to
/// [`AddedValue::Bytes`] in file byte order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddedValue {
    F4(f32),
    F8(f64),
    U1(u8),
    U2(u16),
    U4(u32),
    U8(u64),
    I1(i8),
    I2(i16),
    I4(i32),
    I8(i64),
    CI2(i8, i8),
    CI4(i16, i16),
    CI8(i32, i32),
    CI16(i64, i64),
    CF8(f32, f32),
    CF16(f64, f64),
    /// Raw bytes, `size * 8` long.
    Bytes(Vec<u8>),
}

impl AddedValue {
    /// Returns true if this is a complex pair.
    #[inline]
    pub fn is_complex(&self) -> bool {
        matches!(
            self,
            AddedValue::CI2(..)
                | AddedValue::CI4(..)
                | AddedValue::CI8(..)
                | AddedValue::CI16(..)
                | AddedValue::CF8(..)
                | AddedValue::CF16(..)
        )
    }

    /// Attempts to convert a real scalar to f64.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            AddedValue::F4(v) => Some(v as f64),
            AddedValue::F8(v) => Some(v),
            AddedValue::U1(v) => Some(v as f64),
            AddedValue::U2(v) => Some(v as f64),
            AddedValue::U4(v) => Some(v as f64),
            AddedValue::U8(v) => Some(v as f64),
            AddedValue::I1(v) => Some(v as f64),
            AddedValue::I2(v) => Some(v as f64),
            AddedValue::I4(v) => Some(v as f64),
            AddedValue::I8(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Attempts to convert an integer scalar to i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            AddedValue::U1(v) => Some(v as i64),
            AddedValue::U2(v) => Some(v as i64),
            AddedValue::U4(v) => Some(v as i64),
            AddedValue::U8(v) => i64::try_from(v).ok(),
            AddedValue::I1(v) => Some(v as i64),
            AddedValue::I2(v) => Some(v as i64),
            AddedValue::I4(v) => Some(v as i64),
            AddedValue::I8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AddedValue::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

/// CRSD product variant, from the `CRSD<type>` prefix of the file header.
///
/// The variant decides which binary blocks a file must carry:
///
/// | Type | PVP | PPP | Signal |
/// |------|-----|-----|--------|
/// | `Sar` | yes | yes | yes |
/// | `Rcv` | yes | no  | yes |
/// | `Tx`  | no  | yes | no  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProductType {
    #[default]
    Sar,
    Tx,
    Rcv,
}

impl ProductType {
    pub fn has_pvp(&self) -> bool {
        matches!(self, ProductType::Sar | ProductType::Rcv)
    }

    pub fn has_ppp(&self) -> bool {
        matches!(self, ProductType::Sar | ProductType::Tx)
    }

    pub fn has_signal(&self) -> bool {
        matches!(self, ProductType::Sar | ProductType::Rcv)
    }

    /// Lower-case tag used in the header's first line.
    pub fn tag(&self) -> &'static str {
        match self {
            ProductType::Sar => "sar",
            ProductType::Tx => "tx",
            ProductType::Rcv => "rcv",
        }
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for ProductType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "sar" => Ok(ProductType::Sar),
            "tx" => Ok(ProductType::Tx),
            "rcv" => Ok(ProductType::Rcv),
            other => Err(Error::InvalidFileType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_type_blocks() {
        assert!(ProductType::Sar.has_pvp() && ProductType::Sar.has_ppp());
        assert!(!ProductType::Rcv.has_ppp());
        assert!(!ProductType::Tx.has_pvp());
        assert!(!ProductType::Tx.has_signal());
    }

    #[test]
    fn test_product_type_tag_roundtrip() {
        for ty in [ProductType::Sar, ProductType::Tx, ProductType::Rcv] {
            assert_eq!(ty.tag().parse::<ProductType>().unwrap(), ty);
        }
        assert!("SAR".parse::<ProductType>().is_err());
    }

    #[test]
    fn test_added_value_conversions() {
        assert_eq!(AddedValue::U2(7).as_f64(), Some(7.0));
        assert_eq!(AddedValue::I4(-3).as_i64(), Some(-3));
        assert_eq!(AddedValue::U8(u64::MAX).as_i64(), None);
        assert!(AddedValue::CF8(1.0, 2.0).is_complex());
        assert_eq!(AddedValue::CF8(1.0, 2.0).as_f64(), None);
        assert_eq!(AddedValue::Bytes(vec![1, 2]).as_bytes(), Some(&[1u8, 2][..]));
    }

    #[test]
    fn test_int_frac() {
        let t = IntFrac::new(3, 0.25);
        assert_eq!(t.as_f64(), 3.25);
    }
}
