//! Error types for bulkfile
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for bulkfile
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Invalid configuration detected at construction time
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A recognized config option holds a rejected value
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    /// YAML config parsing failed
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON record parsing failed
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Record Errors (per-record, non-fatal under lenient strategies)
    // ============================================================================
    /// The derived row key was missing or empty
    #[error("Missing or empty row key field '{field}'")]
    MissingKey { field: String },

    /// A nested/complex field was rejected by the `error` strategy
    #[error("Complex value in field '{field}' not allowed by strategy")]
    ComplexField { field: String },

    // ============================================================================
    // File Format Errors
    // ============================================================================
    /// The batcher handed the writer an empty batch (invariant violation)
    #[error("Empty batch handed to writer")]
    EmptyBatch,

    /// A store file failed trailer or block validation
    #[error("Malformed store file '{path}': {message}")]
    Format { path: String, message: String },

    // ============================================================================
    // Run Control Errors
    // ============================================================================
    /// The run was cancelled cooperatively
    #[error("Conversion cancelled")]
    Cancelled,

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// Filesystem or write failure; fatal to the run, never retried
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A referenced input or config file does not exist
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Uncategorized error with a plain message
    #[error("{0}")]
    Other(String),

    /// Opaque error passed through from a host collaborator
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing key error
    pub fn missing_key(field: impl Into<String>) -> Self {
        Self::MissingKey {
            field: field.into(),
        }
    }

    /// Create a complex field error
    pub fn complex_field(field: impl Into<String>) -> Self {
        Self::ComplexField {
            field: field.into(),
        }
    }

    /// Create a format error
    pub fn format(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error is scoped to a single record.
    ///
    /// Record-scoped errors skip the offending record and let the run
    /// continue; everything else is fatal to the run.
    pub fn is_record_error(&self) -> bool {
        matches!(self, Error::MissingKey { .. } | Error::ComplexField { .. })
    }
}

/// Result type alias for bulkfile
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}
