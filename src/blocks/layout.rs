// blocks/layout.rs
//! Word-granular field layouts for PVP and PPP records.
//!
//! A [`FieldLayout`] describes where each field of one record lives. Required
//! fields are identified by a [`RequiredParam`] enum variant; added (custom)
//! fields are identified by name. Offsets and sizes count 8-byte words, and an
//! occupancy map guarantees that no two fields share a word.

use core::fmt;
use core::marker::PhantomData;
use std::collections::HashMap;

use super::WORD_SIZE;
use super::format::FieldFormat;
use crate::{Error, Result};

/// Value shape of a required field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// One `F8` word.
    Float,
    /// One `I8` word.
    Int,
    /// Two `F8` words (`DCX`, `DCY`).
    Vec2,
    /// Three `F8` words (`X`, `Y`, `Z`).
    Vec3,
    /// An `I8` word followed by an `F8` word.
    IntFrac,
}

impl ParamKind {
    /// Size in words.
    pub fn size(self) -> usize {
        match self {
            ParamKind::Float | ParamKind::Int => 1,
            ParamKind::Vec2 | ParamKind::IntFrac => 2,
            ParamKind::Vec3 => 3,
        }
    }

    pub fn format(self) -> &'static str {
        match self {
            ParamKind::Float => "F8",
            ParamKind::Int => "I8",
            ParamKind::Vec2 => "DCX=F8;DCY=F8;",
            ParamKind::Vec3 => "X=F8;Y=F8;Z=F8;",
            ParamKind::IntFrac => "Int=I8;Frac=F8;",
        }
    }
}

/// The fixed set of required fields of one record type.
///
/// `ALL` lists every field in default layout order; the last entry is the
/// optional trailing field, which only counts towards the record size once it
/// has an offset.
pub trait RequiredParam: Copy + Eq + fmt::Debug + Send + Sync + 'static {
    const ALL: &'static [Self];
    const OPTIONAL: Self;
    /// Block name used in messages (`"PVP"` or `"PPP"`).
    const BLOCK_NAME: &'static str;
    /// Name of the outer index of a block (`"channel"`, `"tx sequence"`).
    const GROUP_NAME: &'static str;
    /// Name of the inner index of a block (`"vector"`, `"pulse"`).
    const RECORD_NAME: &'static str;

    /// Field tag as written in the XML metadata.
    fn name(self) -> &'static str;
    fn kind(self) -> ParamKind;
    fn index(self) -> usize;

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }
}

/// Size, offset and format of one field.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    size: usize,
    offset: Option<usize>,
    format: String,
    parsed: FieldFormat,
}

impl FieldDescriptor {
    fn new(size: usize, format: &str) -> Result<Self> {
        let parsed = FieldFormat::parse_for_size(format, size)?;
        Ok(Self {
            size,
            offset: None,
            format: format.to_string(),
            parsed,
        })
    }

    /// Size in words.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Offset in words, `None` until the field is placed.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn parsed_format(&self) -> &FieldFormat {
        &self.parsed
    }

    pub fn is_placed(&self) -> bool {
        self.offset.is_some()
    }

    pub fn byte_offset(&self) -> Option<usize> {
        self.offset.map(|o| o * WORD_SIZE)
    }

    pub fn byte_len(&self) -> usize {
        self.size * WORD_SIZE
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.size == other.size && self.offset == other.offset && self.format == other.format
    }
}

/// A named added field.
#[derive(Debug, Clone, PartialEq)]
pub struct AddedField {
    name: String,
    descriptor: FieldDescriptor,
}

impl AddedField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }
}

/// Marks which words of a record are taken.
#[derive(Debug, Clone, Default)]
struct OccupancyMap {
    words: Vec<bool>,
}

impl OccupancyMap {
    fn is_free(&self, offset: usize, size: usize) -> bool {
        (offset..offset + size).all(|w| !self.words.get(w).copied().unwrap_or(false))
    }

    fn mark(&mut self, offset: usize, size: usize) {
        if self.words.len() < offset + size {
            self.words.resize(offset + size, false);
        }
        self.words[offset..offset + size].fill(true);
    }

    /// One past the highest occupied word.
    fn extent(&self) -> usize {
        self.words.len()
    }
}

/// Field layout of one PVP or PPP record.
#[derive(Debug, Clone)]
pub struct FieldLayout<P: RequiredParam> {
    required: Vec<FieldDescriptor>,
    added: HashMap<String, AddedField>,
    occupancy: OccupancyMap,
    _param: PhantomData<P>,
}

impl<P: RequiredParam> Default for FieldLayout<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: RequiredParam> FieldLayout<P> {
    /// Creates a layout with every required field unplaced.
    pub fn new() -> Self {
        let required = P::ALL
            .iter()
            .map(|p| FieldDescriptor {
                size: p.kind().size(),
                offset: None,
                format: p.kind().format().to_string(),
                parsed: FieldFormat::parse(p.kind().format())
                    .unwrap_or(FieldFormat::Composite(Vec::new())),
            })
            .collect();
        Self {
            required,
            added: HashMap::new(),
            occupancy: OccupancyMap::default(),
            _param: PhantomData,
        }
    }

    /// Creates a layout with the required fields appended in default order.
    pub fn with_default_layout(include_optional: bool) -> Self {
        let mut layout = Self::new();
        for &p in P::ALL {
            if p == P::OPTIONAL && !include_optional {
                continue;
            }
            // Appending to a fresh layout cannot collide.
            let offset = layout.occupancy.extent();
            layout.place_required(p, offset);
        }
        layout
    }

    /// Places `param` at the first free word after all occupied words.
    pub fn append(&mut self, param: P) -> Result<()> {
        let offset = self.occupancy.extent();
        self.set_offset(param, offset)
    }

    /// Places `param` at word `offset`.
    pub fn set_offset(&mut self, param: P, offset: usize) -> Result<()> {
        let desc = &self.required[param.index()];
        FieldFormat::parse_for_size(&desc.format, desc.size)?;
        if desc.is_placed() {
            return Err(Error::DuplicateName(param.name().to_string()));
        }
        if !self.occupancy.is_free(offset, desc.size) {
            return Err(Error::Overlap {
                name: param.name().to_string(),
                offset,
                size: desc.size,
            });
        }
        self.place_required(param, offset);
        Ok(())
    }

    fn place_required(&mut self, param: P, offset: usize) {
        let desc = &mut self.required[param.index()];
        desc.offset = Some(offset);
        let size = desc.size;
        self.occupancy.mark(offset, size);
    }

    /// Declares an added field at word `offset`.
    pub fn set_custom_parameter(
        &mut self,
        size: usize,
        offset: usize,
        format: &str,
        name: &str,
    ) -> Result<()> {
        let mut descriptor = FieldDescriptor::new(size, format)?;
        if self.added.contains_key(name) || P::from_name(name).is_some() {
            return Err(Error::DuplicateName(name.to_string()));
        }
        if !self.occupancy.is_free(offset, size) {
            return Err(Error::Overlap {
                name: name.to_string(),
                offset,
                size,
            });
        }
        descriptor.offset = Some(offset);
        self.occupancy.mark(offset, size);
        self.added.insert(
            name.to_string(),
            AddedField {
                name: name.to_string(),
                descriptor,
            },
        );
        Ok(())
    }

    /// Declares an added field at the first free word after all occupied words.
    pub fn append_custom_parameter(&mut self, size: usize, format: &str, name: &str) -> Result<()> {
        let offset = self.occupancy.extent();
        self.set_custom_parameter(size, offset, format, name)
    }

    pub fn field(&self, param: P) -> &FieldDescriptor {
        &self.required[param.index()]
    }

    pub fn added_field(&self, name: &str) -> Option<&AddedField> {
        self.added.get(name)
    }

    pub fn added_fields(&self) -> impl Iterator<Item = &AddedField> {
        self.added.values()
    }

    pub fn num_added_fields(&self) -> usize {
        self.added.len()
    }

    /// Minimum record width in words: required fields, the optional field if
    /// placed, and every added field.
    pub fn req_set_size(&self) -> usize {
        let required: usize = P::ALL
            .iter()
            .filter(|&&p| p != P::OPTIONAL || self.field(p).is_placed())
            .map(|&p| self.field(p).size())
            .sum();
        let added: usize = self.added.values().map(|f| f.descriptor.size).sum();
        required + added
    }

    pub fn size_in_bytes(&self) -> usize {
        self.req_set_size() * WORD_SIZE
    }

    /// One past the highest occupied word.
    pub fn extent_words(&self) -> usize {
        self.occupancy.extent()
    }

    /// Smallest record width in bytes able to hold every placed field.
    pub fn min_record_bytes(&self) -> usize {
        self.req_set_size().max(self.extent_words()) * WORD_SIZE
    }

    /// Checks that every required field has an offset.
    pub fn validate(&self) -> Result<()> {
        match P::ALL
            .iter()
            .find(|&&p| p != P::OPTIONAL && !self.field(p).is_placed())
        {
            Some(p) => Err(Error::UnplacedField(p.name())),
            None => Ok(()),
        }
    }
}

impl<P: RequiredParam> PartialEq for FieldLayout<P> {
    fn eq(&self, other: &Self) -> bool {
        self.required == other.required && self.added == other.added
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::{FieldLayout, RequiredParam};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct PlacedRepr {
        name: String,
        offset: usize,
    }

    #[derive(Serialize, Deserialize)]
    struct AddedRepr {
        name: String,
        size: usize,
        offset: usize,
        format: String,
    }

    #[derive(Serialize, Deserialize)]
    struct LayoutRepr {
        required: Vec<PlacedRepr>,
        #[serde(default)]
        added: Vec<AddedRepr>,
    }

    impl<P: RequiredParam> Serialize for FieldLayout<P> {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            let required = P::ALL
                .iter()
                .filter_map(|&p| {
                    self.field(p).offset().map(|offset| PlacedRepr {
                        name: p.name().to_string(),
                        offset,
                    })
                })
                .collect();
            let mut added: Vec<AddedRepr> = self
                .added_fields()
                .filter_map(|f| {
                    let d = f.descriptor();
                    d.offset().map(|offset| AddedRepr {
                        name: f.name().to_string(),
                        size: d.size(),
                        offset,
                        format: d.format().to_string(),
                    })
                })
                .collect();
            added.sort_by_key(|a| a.offset);
            LayoutRepr { required, added }.serialize(serializer)
        }
    }

    impl<'de, P: RequiredParam> Deserialize<'de> for FieldLayout<P> {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let repr = LayoutRepr::deserialize(deserializer)?;
            let mut layout = FieldLayout::<P>::new();
            for placed in repr.required {
                let param = P::from_name(&placed.name).ok_or_else(|| {
                    D::Error::custom(format!(
                        "unknown {} field '{}'",
                        P::BLOCK_NAME,
                        placed.name
                    ))
                })?;
                layout
                    .set_offset(param, placed.offset)
                    .map_err(D::Error::custom)?;
            }
            for added in repr.added {
                layout
                    .set_custom_parameter(added.size, added.offset, &added.format, &added.name)
                    .map_err(D::Error::custom)?;
            }
            Ok(layout)
        }
    }
}
