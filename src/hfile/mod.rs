//! Immutable sorted store files
//!
//! Serializes sorted row batches into a self-describing, block-structured
//! binary file and reads them back. A file is a sequence of data blocks,
//! followed by a block index, followed by a fixed-size trailer carrying the
//! magic, format version, index offset and total row count. Files are
//! fsynced before the writer reports success and never mutated afterwards.
//!
//! # Layout
//!
//! ```text
//! ┌────────────┬────────────┬─────┬─────────────┬─────────┐
//! │ data block │ data block │ ... │ block index │ trailer │
//! └────────────┴────────────┴─────┴─────────────┴─────────┘
//! ```
//!
//! The trailer sits at a fixed distance from the end of the file, so a
//! reader needs nothing but the file itself.

mod reader;
mod writer;

pub use reader::HFileReader;
pub use writer::{write_batch, HFileWriter, HFileWriterConfig};

use crate::batch::Batch;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Magic bytes closing every store file
pub const MAGIC: &[u8; 4] = b"HFB1";

/// Current format version
pub const FORMAT_VERSION: u8 = 1;

/// Trailer byte length: index offset (8) + block count (4) + row count (8)
/// + version (1) + magic (4)
pub const TRAILER_LEN: usize = 25;

/// Default target encoded size of one data block
pub const DEFAULT_BLOCK_SIZE: usize = 64 * 1024;

/// File extension for produced files
pub const FILE_EXTENSION: &str = "hfile";

// ============================================================================
// OutputFile
// ============================================================================

/// Descriptor of one produced store file
///
/// Immutable once the writer returns it; the underlying file is closed and
/// synced by then.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    /// Path of the file under the base folder
    pub path: PathBuf,
    /// Number of rows stored
    pub row_count: usize,
    /// Smallest row key in the file
    pub min_key: Vec<u8>,
    /// Largest row key in the file
    pub max_key: Vec<u8>,
}

// ============================================================================
// FileNameAllocator
// ============================================================================

/// Allocates collision-free sequential file names
///
/// The counter is atomic so one allocator can be shared (via `Arc`) across
/// concurrent runs writing into the same destination directory. Paths that
/// already exist are skipped, never reused.
#[derive(Debug, Default)]
pub struct FileNameAllocator {
    counter: AtomicU64,
}

impl FileNameAllocator {
    /// Create an allocator starting at sequence zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve the next free path under `dir` with the given prefix
    pub fn next_path(&self, dir: &Path, prefix: &str) -> PathBuf {
        loop {
            let seq = self.counter.fetch_add(1, Ordering::SeqCst);
            let path = dir.join(format!("{prefix}-{seq:05}.{FILE_EXTENSION}"));
            if !path.exists() {
                return path;
            }
        }
    }
}

// ============================================================================
// BatchWriter seam
// ============================================================================

/// The writer seam the orchestrator drives
///
/// The production implementation is [`HFileDirectoryWriter`]; tests inject
/// failing writers through the same trait.
pub trait BatchWriter: Send {
    /// Serialize one sorted batch into a fresh immutable file
    fn write(&self, batch: &Batch) -> Result<OutputFile>;
}

/// Writes batches into sequentially named files under a base folder
pub struct HFileDirectoryWriter {
    base_folder: PathBuf,
    file_prefix: String,
    names: std::sync::Arc<FileNameAllocator>,
    writer: HFileWriter,
}

impl HFileDirectoryWriter {
    /// Create a directory writer with its own name allocator
    pub fn new(base_folder: impl Into<PathBuf>, file_prefix: impl Into<String>) -> Self {
        Self::with_allocator(
            base_folder,
            file_prefix,
            std::sync::Arc::new(FileNameAllocator::new()),
        )
    }

    /// Create a directory writer sharing a name allocator with other runs
    pub fn with_allocator(
        base_folder: impl Into<PathBuf>,
        file_prefix: impl Into<String>,
        names: std::sync::Arc<FileNameAllocator>,
    ) -> Self {
        Self {
            base_folder: base_folder.into(),
            file_prefix: file_prefix.into(),
            names,
            writer: HFileWriter::new(HFileWriterConfig::default()),
        }
    }

    /// Override the file writer configuration
    #[must_use]
    pub fn with_writer_config(mut self, config: HFileWriterConfig) -> Self {
        self.writer = HFileWriter::new(config);
        self
    }

    fn ensure_base_folder(&self) -> Result<()> {
        if !self.base_folder.exists() {
            std::fs::create_dir_all(&self.base_folder)?;
        }
        if !self.base_folder.is_dir() {
            return Err(Error::config(format!(
                "base folder '{}' is not a directory",
                self.base_folder.display()
            )));
        }
        Ok(())
    }
}

impl BatchWriter for HFileDirectoryWriter {
    fn write(&self, batch: &Batch) -> Result<OutputFile> {
        self.ensure_base_folder()?;
        let path = self.names.next_path(&self.base_folder, &self.file_prefix);
        self.writer.write(batch, &path)
    }
}
