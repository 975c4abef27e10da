// src/blocks/mod.rs
//! Binary block structures: record layouts, the PVP/PPP block codec and the
//! file header.

// ============================================================================
// Submodules
// ============================================================================

mod block;
mod common;
mod file_header;
mod format;
mod layout;
mod ppp;
mod ppp_block;
mod pvp;
mod pvp_block;
mod record;

// Re-export common helpers
pub use common::{WORD_SIZE, padding_to_align_8, u64_to_usize, validate_buffer_size};
pub(crate) use common::read_fully;

// Re-export layout and record types
pub use format::{FieldFormat, Primitive};
pub use layout::{AddedField, FieldDescriptor, FieldLayout, ParamKind, RequiredParam};
pub use record::{ParamValue, RecordSet};

pub use ppp::{Ppp, PppParam, PppSet};
pub use pvp::{Pvp, PvpParam, PvpSet};

// Re-export block types
pub use block::ParamBlock;
pub use file_header::{BlockSpan, FileHeader, SECTION_TERMINATOR};
pub use ppp_block::PppBlock;
pub use pvp_block::PvpBlock;
