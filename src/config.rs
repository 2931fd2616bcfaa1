//! Conversion configuration
//!
//! This module contains the configuration structure driving a conversion
//! run, its builder, and YAML loading. All values are validated eagerly at
//! construction time: an invalid `records_per_file` or a blank `base_folder`
//! is rejected before any record is processed.

use crate::error::{Error, Result};
use crate::types::ComplexRecordStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of rows written to a file before rotating to a new one
pub const DEFAULT_RECORDS_PER_FILE: usize = 10_000;

/// Default column family for cells
pub const DEFAULT_COLUMN_FAMILY: &str = "d";

/// Default delimiter between composite key fields
pub const DEFAULT_KEY_DELIMITER: &str = ":";

/// Default output file name prefix
pub const DEFAULT_FILE_PREFIX: &str = "part";

// ============================================================================
// ConvertConfig
// ============================================================================

/// Configuration for a conversion run, loadable from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// How many rows to write to a file before starting a new one
    #[serde(default = "default_records_per_file")]
    pub records_per_file: usize,

    /// Destination directory for produced files
    pub base_folder: PathBuf,

    /// Record field(s) the row key is derived from, in order
    pub key_fields: Vec<String>,

    /// Delimiter joining composite key fields
    #[serde(default = "default_key_delimiter")]
    pub key_delimiter: String,

    /// Column family assigned to every cell
    #[serde(default = "default_column_family")]
    pub column_family: String,

    /// How to handle nested/complex field values
    #[serde(default)]
    pub complex_record_strategy: ComplexRecordStrategy,

    /// Record field carrying the cell timestamp (epoch millis);
    /// falls back to wall clock when absent or non-numeric
    #[serde(default)]
    pub timestamp_field: Option<String>,

    /// Output file name prefix
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,
}

fn default_records_per_file() -> usize {
    DEFAULT_RECORDS_PER_FILE
}

fn default_key_delimiter() -> String {
    DEFAULT_KEY_DELIMITER.to_string()
}

fn default_column_family() -> String {
    DEFAULT_COLUMN_FAMILY.to_string()
}

fn default_file_prefix() -> String {
    DEFAULT_FILE_PREFIX.to_string()
}

impl ConvertConfig {
    /// Start building a config with the required fields
    pub fn builder(
        base_folder: impl Into<PathBuf>,
        key_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> ConvertConfigBuilder {
        ConvertConfigBuilder::new(base_folder, key_fields)
    }

    /// Load and validate a config from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_yaml_str(&content)
    }

    /// Load and validate a config from a YAML string
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all recognized options, rejecting bad values up front
    pub fn validate(&self) -> Result<()> {
        if self.records_per_file == 0 {
            return Err(Error::invalid_config(
                "records_per_file",
                "must be a positive integer",
            ));
        }
        if self.base_folder.as_os_str().is_empty()
            || self.base_folder.to_string_lossy().trim().is_empty()
        {
            return Err(Error::invalid_config("base_folder", "must not be blank"));
        }
        if self.key_fields.is_empty() {
            return Err(Error::invalid_config(
                "key_fields",
                "at least one key field is required",
            ));
        }
        if self.key_fields.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::invalid_config(
                "key_fields",
                "key field names must not be blank",
            ));
        }
        if self.column_family.trim().is_empty() {
            return Err(Error::invalid_config(
                "column_family",
                "must not be blank",
            ));
        }
        if self.file_prefix.trim().is_empty() {
            return Err(Error::invalid_config("file_prefix", "must not be blank"));
        }
        Ok(())
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`ConvertConfig`]; `build()` validates eagerly
#[derive(Debug, Clone)]
pub struct ConvertConfigBuilder {
    config: ConvertConfig,
}

impl ConvertConfigBuilder {
    /// Create a builder with the required fields and defaults elsewhere
    pub fn new(
        base_folder: impl Into<PathBuf>,
        key_fields: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            config: ConvertConfig {
                records_per_file: DEFAULT_RECORDS_PER_FILE,
                base_folder: base_folder.into(),
                key_fields: key_fields.into_iter().map(Into::into).collect(),
                key_delimiter: default_key_delimiter(),
                column_family: default_column_family(),
                complex_record_strategy: ComplexRecordStrategy::default(),
                timestamp_field: None,
                file_prefix: default_file_prefix(),
            },
        }
    }

    /// Set rows per output file
    #[must_use]
    pub fn records_per_file(mut self, n: usize) -> Self {
        self.config.records_per_file = n;
        self
    }

    /// Set the composite key delimiter
    #[must_use]
    pub fn key_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.config.key_delimiter = delimiter.into();
        self
    }

    /// Set the column family
    #[must_use]
    pub fn column_family(mut self, family: impl Into<String>) -> Self {
        self.config.column_family = family.into();
        self
    }

    /// Set the complex record strategy
    #[must_use]
    pub fn complex_record_strategy(mut self, strategy: ComplexRecordStrategy) -> Self {
        self.config.complex_record_strategy = strategy;
        self
    }

    /// Take cell timestamps from this record field (epoch millis)
    #[must_use]
    pub fn timestamp_field(mut self, field: impl Into<String>) -> Self {
        self.config.timestamp_field = Some(field.into());
        self
    }

    /// Set the output file name prefix
    #[must_use]
    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.file_prefix = prefix.into();
        self
    }

    /// Validate and produce the config
    pub fn build(self) -> Result<ConvertConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
