#![forbid(unsafe_code)]

//! # crsd
//!
//! A Rust library for reading and writing CRSD (Compensated Radar Signal
//! Data) files.
//!
//! A CRSD file is a plain-text header followed by an XML metadata block and
//! large big-endian binary blocks: optional support arrays, per-vector
//! parameters (PVP), per-pulse parameters (PPP) and the wideband signal. This
//! crate implements the binary side of the format: the PVP/PPP record layouts
//! and block codec, the header offset resolution, and the byte-order aware
//! streaming of every block. XML is carried as opaque text.
//!
//! ## Features
//!
//! - **Layouts**: required PVP/PPP fields plus custom fields of any primitive
//!   or composite format, with overlap-free word placement
//! - **Blocks**: typed per-record accessors, bulk encode and decode
//! - **Writing**: header sizing and padding, streamed big-endian conversion
//! - **Reading**: header parsing and random access into the signal block
//! - **Parallel swapping** (`parallel` feature): bulk conversion on a rayon
//!   pool, with output identical for any worker count
//! - **JSON sidecars** (`serde` feature): persist a [`CrsdMetadata`]
//!
//! ## Quick Start
//!
//! ### Writing a product
//!
//! ```no_run
//! use crsd::{CrsdMetadata, CrsdWriter, IntFrac, ProductType, Ppp, Pvp, Result, SignalArrayFormat};
//!
//! fn main() -> Result<()> {
//!     let mut meta = CrsdMetadata::new(ProductType::Sar);
//!     meta.classification = "UNCLASSIFIED".into();
//!     meta.release_info = "Unrestricted".into();
//!     meta.xml = std::fs::read_to_string("product.xml")?;
//!     meta.pvp = Some(Pvp::with_default_layout(false));
//!     meta.ppp = Some(Ppp::with_default_layout(false));
//!     meta.data.signal_format = Some(SignalArrayFormat::CI4);
//!     meta.data.add_channel("CHAN1", 128, 1024);
//!     meta.data.add_tx_sequence("SEQ1", 128);
//!
//!     let mut pvp = meta.new_pvp_block()?;
//!     let mut ppp = meta.new_ppp_block()?;
//!     for v in 0..128 {
//!         pvp.set_rcv_start(0, v, IntFrac::new(v as i64, 0.0))?;
//!         ppp.set_tx_time(0, v, IntFrac::new(v as i64, 0.0))?;
//!     }
//!     let signal = vec![0u8; 128 * 1024 * 4];
//!
//!     let mut writer = CrsdWriter::new("product.crsd", meta)?;
//!     writer.write(Some(&pvp), Some(&ppp), &[signal.as_slice()], &[])?;
//!     Ok(())
//! }
//! ```
//!
//! ### Reading it back
//!
//! ```no_run
//! use crsd::{CrsdMetadata, CrsdReader, Result};
//!
//! fn main() -> Result<()> {
//!     let meta = CrsdMetadata::load_from_file("product.json")?;
//!     let mut reader = CrsdReader::open("product.crsd", meta)?;
//!
//!     let pvp = reader.read_pvp_block()?;
//!     println!("first vector: {:?}", pvp.rcv_start(0, 0)?);
//!
//!     let samples = reader.wideband().read(0, 0..16, 0..1024)?;
//!     println!("read {} bytes of samples", samples.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocks`] | Record layouts, the PVP/PPP block codec and the file header |
//! | [`byte_swap`] | Bulk big-endian conversion |
//! | [`metadata`] | The data description driving reads and writes |
//! | [`writer`] | File creation with [`CrsdWriter`] |
//! | [`reader`] | File access with [`CrsdReader`] |
//! | [`config`] | [`IoConfig`] tuning knobs |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], which is an alias for
//! `std::result::Result<T, Error>`. Nothing in this crate retries: a failure
//! is reported to the caller with the field, index or byte counts involved.

pub mod blocks;
pub mod byte_swap;
pub mod config;
pub mod error;
pub mod metadata;
pub mod reader;
pub mod types;
pub mod writer;

// Re-export commonly used types at the crate root
pub use blocks::{
    FieldLayout, FileHeader, ParamBlock, Ppp, PppBlock, PppParam, PppSet, Pvp, PvpBlock, PvpParam,
    PvpSet,
};
pub use config::IoConfig;
pub use error::{Error, Result};
pub use metadata::{
    ChannelParameters, CrsdMetadata, DataDescription, SignalArrayFormat, SupportArrayParameters,
    TxSequenceParameters,
};
pub use reader::{CrsdReader, Wideband};
pub use types::{AddedValue, IntFrac, ProductType, Vector2, Vector3};
pub use writer::{CrsdWrite, CrsdWriter, FileWriter, VecWriter};
