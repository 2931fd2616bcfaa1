//! Common types used throughout bulkfile
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// An input record: an ordered mapping of field name to typed value.
///
/// Values may be primitives (null, bool, number, string) or complex
/// (object, array); complex values are subject to the configured
/// [`ComplexRecordStrategy`].
pub type Record = JsonObject;

// ============================================================================
// Complex Record Strategy
// ============================================================================

/// Strategy for handling nested or multi-valued record fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexRecordStrategy {
    /// Flatten complex values to their JSON text and store as a single cell
    #[default]
    Stringify,
    /// Drop any record that contains a complex field
    Ignore,
    /// Raise an error when a complex field is encountered
    Error,
}

impl ComplexRecordStrategy {
    /// Under this strategy, does a per-record error abort the whole run?
    pub fn is_strict(self) -> bool {
        matches!(self, Self::Error)
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
