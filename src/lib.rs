// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # bulkfile
//!
//! Converts an incoming stream of structured records into sorted, immutable
//! key-value store files suitable for bulk loading, rotating output at a
//! bounded number of rows per file.
//!
//! ## Features
//!
//! - **Record normalization**: flat rows (key + cells) from JSON records,
//!   with stringify/ignore/error handling of nested fields
//! - **Sorted rotation**: rows buffered, sorted by key, and flushed every
//!   `records_per_file` rows
//! - **Self-describing files**: block-structured output readable with
//!   nothing but the file itself, fsynced before being reported
//! - **Bounded memory**: one open batch at a time, one in-flight write
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bulkfile::{convert, ConvertConfig, JsonLinesSource, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = ConvertConfig::builder("/data/hfiles", ["id"])
//!         .records_per_file(10_000)
//!         .build()?;
//!
//!     let mut source = JsonLinesSource::open("records.jsonl")?;
//!     let result = convert(config, &mut source).await?;
//!
//!     for file in &result.output_files {
//!         println!("{} ({} rows)", file.path.display(), file.row_count);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Converter                            │
//! │  convert(source) → ConversionResult { files, counts, err }   │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//! ┌──────────────┬──────────────┴──────────┬────────────────────┐
//! │  Normalizer  │      Sorter/Batcher     │       Writer       │
//! ├──────────────┼─────────────────────────┼────────────────────┤
//! │ key derive   │ buffer ≤ recordsPerFile │ data blocks        │
//! │ cell mapping │ sort by row key         │ block index        │
//! │ strategies   │ rotate on full          │ trailer + fsync    │
//! └──────────────┴─────────────────────────┴────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the crate
pub mod error;

/// Common types and type aliases
pub mod types;

/// Conversion configuration
pub mod config;

/// Record sources
pub mod source;

/// Record-to-row normalization
pub mod normalize;

/// Row batching and sorting
pub mod batch;

/// Immutable sorted store files
pub mod hfile;

/// Conversion orchestration
pub mod convert;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::{ConvertConfig, ConvertConfigBuilder};
pub use convert::{convert, CancelToken, ConversionResult, Converter, ConvertEvent};
pub use error::{Error, Result};
pub use hfile::{HFileReader, OutputFile};
pub use source::{JsonLinesSource, RecordSource, StreamSource, VecSource};
pub use types::{ComplexRecordStrategy, Record};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
