// blocks/format.rs
//! Field format strings and the added-field codec table.
//!
//! A format is either a single primitive token (`F8`, `U2`, `CI4`, ...) or a
//! composite of `name=primitive;` entries (`X=F8;Y=F8;Z=F8;`). Formats are
//! parsed once when a field is registered in a layout; the parsed form then
//! drives both decoding and encoding through the same match on [`Primitive`],
//! which keeps the two directions symmetric.

use core::fmt;

use super::common::{host_offset, read_array, words_to_file_order};
use crate::{AddedValue, Error, Result};

/// Primitive element types of the format grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    F4,
    F8,
    U1,
    U2,
    U4,
    U8,
    I1,
    I2,
    I4,
    I8,
    CI2,
    CI4,
    CI8,
    CI16,
    CF8,
    CF16,
}

impl Primitive {
    pub const ALL: [Primitive; 16] = [
        Primitive::F4,
        Primitive::F8,
        Primitive::U1,
        Primitive::U2,
        Primitive::U4,
        Primitive::U8,
        Primitive::I1,
        Primitive::I2,
        Primitive::I4,
        Primitive::I8,
        Primitive::CI2,
        Primitive::CI4,
        Primitive::CI8,
        Primitive::CI16,
        Primitive::CF8,
        Primitive::CF16,
    ];

    pub fn token(self) -> &'static str {
        match self {
            Primitive::F4 => "F4",
            Primitive::F8 => "F8",
            Primitive::U1 => "U1",
            Primitive::U2 => "U2",
            Primitive::U4 => "U4",
            Primitive::U8 => "U8",
            Primitive::I1 => "I1",
            Primitive::I2 => "I2",
            Primitive::I4 => "I4",
            Primitive::I8 => "I8",
            Primitive::CI2 => "CI2",
            Primitive::CI4 => "CI4",
            Primitive::CI8 => "CI8",
            Primitive::CI16 => "CI16",
            Primitive::CF8 => "CF8",
            Primitive::CF16 => "CF16",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token)
    }

    /// Total byte width of one element.
    pub fn byte_width(self) -> usize {
        match self {
            Primitive::U1 | Primitive::I1 => 1,
            Primitive::U2 | Primitive::I2 | Primitive::CI2 => 2,
            Primitive::F4 | Primitive::U4 | Primitive::I4 | Primitive::CI4 => 4,
            Primitive::F8 | Primitive::U8 | Primitive::I8 | Primitive::CI8 | Primitive::CF8 => 8,
            Primitive::CI16 | Primitive::CF16 => 16,
        }
    }

    /// Width of one real component; complex types store two of them.
    pub fn component_width(self) -> usize {
        if self.is_complex() {
            self.byte_width() / 2
        } else {
            self.byte_width()
        }
    }

    pub fn is_complex(self) -> bool {
        matches!(
            self,
            Primitive::CI2
                | Primitive::CI4
                | Primitive::CI8
                | Primitive::CI16
                | Primitive::CF8
                | Primitive::CF16
        )
    }

    /// Decode one element stored at file byte `offset` of a host-order record.
    pub(crate) fn decode(self, host: &[u8], offset: usize) -> AddedValue {
        let c = self.component_width();
        match self {
            Primitive::F4 => AddedValue::F4(f32::from_ne_bytes(get(host, offset))),
            Primitive::F8 => AddedValue::F8(f64::from_ne_bytes(get(host, offset))),
            Primitive::U1 => AddedValue::U1(u8::from_ne_bytes(get(host, offset))),
            Primitive::U2 => AddedValue::U2(u16::from_ne_bytes(get(host, offset))),
            Primitive::U4 => AddedValue::U4(u32::from_ne_bytes(get(host, offset))),
            Primitive::U8 => AddedValue::U8(u64::from_ne_bytes(get(host, offset))),
            Primitive::I1 => AddedValue::I1(i8::from_ne_bytes(get(host, offset))),
            Primitive::I2 => AddedValue::I2(i16::from_ne_bytes(get(host, offset))),
            Primitive::I4 => AddedValue::I4(i32::from_ne_bytes(get(host, offset))),
            Primitive::I8 => AddedValue::I8(i64::from_ne_bytes(get(host, offset))),
            Primitive::CI2 => AddedValue::CI2(
                i8::from_ne_bytes(get(host, offset)),
                i8::from_ne_bytes(get(host, offset + c)),
            ),
            Primitive::CI4 => AddedValue::CI4(
                i16::from_ne_bytes(get(host, offset)),
                i16::from_ne_bytes(get(host, offset + c)),
            ),
            Primitive::CI8 => AddedValue::CI8(
                i32::from_ne_bytes(get(host, offset)),
                i32::from_ne_bytes(get(host, offset + c)),
            ),
            Primitive::CI16 => AddedValue::CI16(
                i64::from_ne_bytes(get(host, offset)),
                i64::from_ne_bytes(get(host, offset + c)),
            ),
            Primitive::CF8 => AddedValue::CF8(
                f32::from_ne_bytes(get(host, offset)),
                f32::from_ne_bytes(get(host, offset + c)),
            ),
            Primitive::CF16 => AddedValue::CF16(
                f64::from_ne_bytes(get(host, offset)),
                f64::from_ne_bytes(get(host, offset + c)),
            ),
        }
    }

    /// Encode `value` at file byte `offset` of a host-order record. Returns
    /// false, writing nothing, when the value variant does not match.
    pub(crate) fn encode(self, value: &AddedValue, host: &mut [u8], offset: usize) -> bool {
        let c = self.component_width();
        match (self, value) {
            (Primitive::F4, AddedValue::F4(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::F8, AddedValue::F8(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::U1, AddedValue::U1(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::U2, AddedValue::U2(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::U4, AddedValue::U4(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::U8, AddedValue::U8(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::I1, AddedValue::I1(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::I2, AddedValue::I2(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::I4, AddedValue::I4(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::I8, AddedValue::I8(v)) => put(host, offset, &v.to_ne_bytes()),
            (Primitive::CI2, AddedValue::CI2(re, im)) => {
                put(host, offset, &re.to_ne_bytes());
                put(host, offset + c, &im.to_ne_bytes());
            }
            (Primitive::CI4, AddedValue::CI4(re, im)) => {
                put(host, offset, &re.to_ne_bytes());
                put(host, offset + c, &im.to_ne_bytes());
            }
            (Primitive::CI8, AddedValue::CI8(re, im)) => {
                put(host, offset, &re.to_ne_bytes());
                put(host, offset + c, &im.to_ne_bytes());
            }
            (Primitive::CI16, AddedValue::CI16(re, im)) => {
                put(host, offset, &re.to_ne_bytes());
                put(host, offset + c, &im.to_ne_bytes());
            }
            (Primitive::CF8, AddedValue::CF8(re, im)) => {
                put(host, offset, &re.to_ne_bytes());
                put(host, offset + c, &im.to_ne_bytes());
            }
            (Primitive::CF16, AddedValue::CF16(re, im)) => {
                put(host, offset, &re.to_ne_bytes());
                put(host, offset + c, &im.to_ne_bytes());
            }
            _ => return false,
        }
        true
    }
}

#[inline]
fn get<const N: usize>(host: &[u8], offset: usize) -> [u8; N] {
    read_array(host, host_offset(offset, N))
}

#[inline]
fn put(host: &mut [u8], offset: usize, bytes: &[u8]) {
    let at = host_offset(offset, bytes.len());
    host[at..at + bytes.len()].copy_from_slice(bytes);
}

/// A parsed field format string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldFormat {
    Primitive(Primitive),
    Composite(Vec<(String, Primitive)>),
}

impl FieldFormat {
    /// Parse and validate a format string.
    pub fn parse(format: &str) -> Result<Self> {
        if let Some(p) = Primitive::from_token(format) {
            return Ok(FieldFormat::Primitive(p));
        }
        let Some(body) = format.strip_suffix(';') else {
            return Err(Error::format(
                format,
                "expected a primitive token or `name=primitive;` entries",
            ));
        };
        let mut entries: Vec<(String, Primitive)> = Vec::new();
        for entry in body.split(';') {
            let (name, token) = entry
                .split_once('=')
                .ok_or_else(|| Error::format(format, format!("entry '{entry}' has no '='")))?;
            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(Error::format(format, format!("invalid entry name '{name}'")));
            }
            if entries.iter().any(|(n, _)| n == name) {
                return Err(Error::format(format, format!("entry '{name}' repeats")));
            }
            let p = Primitive::from_token(token).ok_or_else(|| {
                Error::format(format, format!("unknown primitive '{token}'"))
            })?;
            entries.push((name.to_string(), p));
        }
        Ok(FieldFormat::Composite(entries))
    }

    /// Parse `format` and check that it fits in `size` words.
    pub fn parse_for_size(format: &str, size: usize) -> Result<Self> {
        let parsed = Self::parse(format)?;
        if size == 0 {
            return Err(Error::format(format, "field size must be at least one word"));
        }
        if parsed.byte_width() > size * super::WORD_SIZE {
            return Err(Error::format(
                format,
                format!(
                    "needs {} bytes but the field is {} words",
                    parsed.byte_width(),
                    size
                ),
            ));
        }
        Ok(parsed)
    }

    pub fn byte_width(&self) -> usize {
        match self {
            FieldFormat::Primitive(p) => p.byte_width(),
            FieldFormat::Composite(entries) => entries.iter().map(|(_, p)| p.byte_width()).sum(),
        }
    }

    /// Decode an added field occupying `len` bytes at file byte `offset`.
    pub(crate) fn decode(&self, host: &[u8], offset: usize, len: usize) -> AddedValue {
        match self {
            FieldFormat::Primitive(p) => p.decode(host, offset),
            FieldFormat::Composite(_) => {
                AddedValue::Bytes(words_to_file_order(&host[offset..offset + len]))
            }
        }
    }

    /// Whether `value` can be stored in a field of this format and `len` bytes.
    pub(crate) fn accepts(&self, value: &AddedValue, len: usize) -> bool {
        match (self, value) {
            (FieldFormat::Composite(_), AddedValue::Bytes(b)) => b.len() == len,
            (FieldFormat::Composite(_), _) => false,
            (FieldFormat::Primitive(p), v) => {
                let mut scratch = [0u8; 16];
                p.encode(v, &mut scratch, 0)
            }
        }
    }

    /// Encode `value` into the `len` bytes at file byte `offset`.
    pub(crate) fn encode(&self, value: &AddedValue, host: &mut [u8], offset: usize, len: usize) -> bool {
        match (self, value) {
            (FieldFormat::Primitive(p), v) => p.encode(v, host, offset),
            (FieldFormat::Composite(_), AddedValue::Bytes(b)) if b.len() == len => {
                host[offset..offset + len].copy_from_slice(&words_to_file_order(b));
                true
            }
            _ => false,
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFormat::Primitive(p) => f.write_str(p.token()),
            FieldFormat::Composite(entries) => {
                for (name, p) in entries {
                    write!(f, "{}={};", name, p.token())?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives() {
        for p in Primitive::ALL {
            assert_eq!(FieldFormat::parse(p.token()).unwrap(), FieldFormat::Primitive(p));
        }
    }

    #[test]
    fn test_parse_composite() {
        let f = FieldFormat::parse("X=F8;Y=F8;Z=F8;").unwrap();
        assert_eq!(f.byte_width(), 24);
        assert_eq!(f.to_string(), "X=F8;Y=F8;Z=F8;");

        let f = FieldFormat::parse("Int=I8;Frac=F8;").unwrap();
        assert_eq!(f.byte_width(), 16);
    }

    #[test]
    fn test_parse_rejects_bad_grammar() {
        for bad in ["", "F3", "f8", "X=F8", "X=F8;;", "=F8;", "X=Q8;", "X=F8;X=F8;", "X F8;"] {
            assert!(
                matches!(FieldFormat::parse(bad), Err(Error::Format { .. })),
                "accepted {bad:?}"
            );
        }
    }

    #[test]
    fn test_parse_for_size_checks_width() {
        assert!(FieldFormat::parse_for_size("CF16", 2).is_ok());
        assert!(FieldFormat::parse_for_size("CF16", 1).is_err());
        assert!(FieldFormat::parse_for_size("X=F8;Y=F8;Z=F8;", 2).is_err());
        assert!(FieldFormat::parse_for_size("U1", 0).is_err());
    }

    #[test]
    fn test_primitive_codec_symmetry() {
        let values = [
            AddedValue::F4(1.5),
            AddedValue::F8(-2.25),
            AddedValue::U1(200),
            AddedValue::U2(0xBEEF),
            AddedValue::U4(0xDEAD_BEEF),
            AddedValue::U8(u64::MAX - 1),
            AddedValue::I1(-5),
            AddedValue::I2(-300),
            AddedValue::I4(-70_000),
            AddedValue::I8(i64::MIN + 3),
            AddedValue::CI2(-1, 2),
            AddedValue::CI4(-300, 301),
            AddedValue::CI8(-70_000, 70_001),
            AddedValue::CI16(i64::MIN, i64::MAX),
            AddedValue::CF8(0.5, -0.5),
            AddedValue::CF16(1e300, -1e-300),
        ];
        for (p, value) in Primitive::ALL.into_iter().zip(values) {
            let mut buf = [0u8; 16];
            assert!(p.encode(&value, &mut buf, 0), "{p:?}");
            assert_eq!(p.decode(&buf, 0), value);
            let copy = buf;
            p.encode(&p.decode(&copy, 0), &mut buf, 0);
            assert_eq!(buf, copy);
        }
    }

    #[test]
    fn test_encode_rejects_wrong_variant() {
        let mut buf = [0u8; 8];
        assert!(!Primitive::F8.encode(&AddedValue::I8(1), &mut buf, 0));
        assert_eq!(buf, [0u8; 8]);
    }

    #[test]
    fn test_composite_bytes_in_file_order() {
        let f = FieldFormat::parse("A=U4;B=U4;").unwrap();
        let raw = vec![1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut host = [0u8; 8];
        assert!(f.encode(&AddedValue::Bytes(raw.clone()), &mut host, 0, 8));
        assert_eq!(f.decode(&host, 0, 8), AddedValue::Bytes(raw));
        assert!(!f.accepts(&AddedValue::Bytes(vec![0; 7]), 8));
    }
}
