// Construction and low level stream handling for CrsdWriter
use std::path::Path;

use super::{CrsdWrite, CrsdWriter, FileWriter, Stage};
use crate::blocks::FileHeader;
use crate::{CrsdMetadata, Error, IoConfig, Result};

impl CrsdWriter<FileWriter> {
    /// Creates a writer for the file at `path` with the default
    /// [`IoConfig`].
    pub fn new(path: impl AsRef<Path>, metadata: CrsdMetadata) -> Result<Self> {
        Self::with_config(path, metadata, IoConfig::default())
    }

    /// Creates a writer for the file at `path`.
    ///
    /// # Example
    /// ```no_run
    /// use crsd::{CrsdMetadata, CrsdWriter, IoConfig};
    ///
    /// # fn run(metadata: CrsdMetadata) -> crsd::Result<()> {
    /// // 4 MB output buffer, swapping on two threads
    /// let config = IoConfig::new()
    ///     .with_buffer_capacity(4 * 1024 * 1024)
    ///     .with_num_threads(2);
    /// let writer = CrsdWriter::with_config("product.crsd", metadata, config)?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config(
        path: impl AsRef<Path>,
        metadata: CrsdMetadata,
        config: IoConfig,
    ) -> Result<Self> {
        let file_writer = FileWriter::with_capacity(path, config.buffer_capacity)?;
        Self::from_writer(file_writer, metadata, config)
    }
}

impl<W: CrsdWrite> CrsdWriter<W> {
    /// Creates a writer over any [`CrsdWrite`] sink. The metadata is
    /// validated and the file header is sized here.
    pub fn from_writer(writer: W, metadata: CrsdMetadata, config: IoConfig) -> Result<Self> {
        metadata.validate()?;
        let mut header = FileHeader::new(metadata.product_type);
        header.set_version(metadata.version.clone());
        header.set_classification(metadata.classification.clone());
        header.set_release_info(metadata.release_info.clone());
        header.set(
            metadata.xml_block_size(),
            metadata.support_block_size(),
            metadata.pvp_block_size(),
            metadata.ppp_block_size(),
            metadata.signal_block_size(),
        )?;
        Ok(Self {
            writer,
            metadata,
            header,
            config,
            stage: Stage::Start,
        })
    }

    /// Whether the metadata obliges the file to carry `stage`.
    fn is_required(&self, stage: Stage) -> bool {
        let ty = self.metadata.product_type;
        match stage {
            Stage::Start | Stage::End => false,
            Stage::Metadata => true,
            Stage::Support => !self.metadata.data.support_arrays.is_empty(),
            Stage::Pvp => ty.has_pvp(),
            Stage::Ppp => ty.has_ppp(),
            Stage::Signal => ty.has_signal(),
        }
    }

    /// First required stage after the current one and before `stage`.
    pub(super) fn skipped(&self, stage: Stage) -> Option<Stage> {
        Stage::ALL
            .into_iter()
            .find(|&s| s > self.stage && s < stage && self.is_required(s))
    }

    /// Moves to `stage`, zero-filling up to `offset`. Fails if `stage` was
    /// already passed, a required block before it was skipped, or the stream
    /// is beyond `offset`.
    pub(super) fn advance(&mut self, stage: Stage, offset: u64) -> Result<()> {
        let position = self.writer.position();
        if self.stage >= stage || position > offset {
            return Err(Error::BlockOrder {
                block: stage.block_name(),
                offset,
                position,
            });
        }
        if let Some(missing) = self.skipped(stage) {
            return Err(Error::MissingBlock(missing.block_name()));
        }
        self.writer.write_zeros(offset - position)?;
        self.stage = stage;
        Ok(())
    }

    /// Current position in the output stream.
    pub fn position(&self) -> u64 {
        self.writer.position()
    }

    /// Flushes all data to the sink. Fails if a block the product requires
    /// has not been written.
    pub fn finalize(&mut self) -> Result<()> {
        if let Some(missing) = self.skipped(Stage::End) {
            return Err(Error::MissingBlock(missing.block_name()));
        }
        self.writer.flush()?;
        tracing::debug!(bytes = self.writer.position(), "finalized CRSD file");
        Ok(())
    }

    /// Returns the sink, e.g. the bytes of a [`VecWriter`](super::VecWriter).
    pub fn into_inner(self) -> W {
        self.writer
    }
}
