//! Record normalization
//!
//! Maps an input record into the flat row representation: a row key derived
//! from the configured key field(s) plus one cell per remaining field.
//! Complex (nested or multi-valued) fields are handled per the configured
//! [`ComplexRecordStrategy`].
//!
//! Key fields and the timestamp field are consumed by the row rather than
//! emitted as cells, and are exempt from the strategy: a complex key value
//! is a missing key, and a non-numeric timestamp value falls back to the
//! wall clock without touching the record's fate.

mod types;

pub use types::{Cell, Normalized, Row};

use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::types::{ComplexRecordStrategy, JsonValue, Record};
use chrono::Utc;

/// Normalizes records into rows under a fixed configuration
pub struct RowNormalizer {
    key_fields: Vec<String>,
    key_delimiter: String,
    column_family: String,
    strategy: ComplexRecordStrategy,
    timestamp_field: Option<String>,
}

impl RowNormalizer {
    /// Create a normalizer from a validated config
    pub fn new(config: &ConvertConfig) -> Self {
        Self {
            key_fields: config.key_fields.clone(),
            key_delimiter: config.key_delimiter.clone(),
            column_family: config.column_family.clone(),
            strategy: config.complex_record_strategy,
            timestamp_field: config.timestamp_field.clone(),
        }
    }

    /// Normalize one record into a row, a skip, or a per-record error
    pub fn normalize(&self, record: &Record) -> Result<Normalized> {
        let key = self.derive_key(record)?;
        let timestamp = self.derive_timestamp(record);

        let mut cells = Vec::with_capacity(record.len());
        for (field, value) in record {
            if self.key_fields.iter().any(|k| k == field) {
                continue;
            }
            if let Some(ts_field) = &self.timestamp_field {
                if ts_field == field {
                    continue;
                }
            }
            match self.cell_value(field, value)? {
                Some(bytes) => {
                    cells.push(Cell::new(&self.column_family, field, bytes, timestamp));
                }
                None => {
                    if matches!(value, JsonValue::Object(_) | JsonValue::Array(_))
                        && self.strategy == ComplexRecordStrategy::Ignore
                    {
                        // One complex field drops the whole record
                        return Ok(Normalized::Skip);
                    }
                    // Null field: no cell
                }
            }
        }

        Ok(Normalized::Row(Row::new(key, cells)))
    }

    /// Derive the row key by joining the configured key fields
    fn derive_key(&self, record: &Record) -> Result<Vec<u8>> {
        let mut parts = Vec::with_capacity(self.key_fields.len());
        for field in &self.key_fields {
            let part = match record.get(field) {
                Some(value) => scalar_text(value),
                None => None,
            };
            match part {
                Some(text) if !text.is_empty() => parts.push(text),
                _ => return Err(Error::missing_key(field)),
            }
        }
        Ok(parts.join(&self.key_delimiter).into_bytes())
    }

    /// Cell timestamp: configured field when numeric, else wall clock
    fn derive_timestamp(&self, record: &Record) -> i64 {
        if let Some(field) = &self.timestamp_field {
            if let Some(JsonValue::Number(n)) = record.get(field) {
                if let Some(millis) = n.as_i64() {
                    return millis;
                }
            }
        }
        Utc::now().timestamp_millis()
    }

    /// Encode one field value into cell bytes.
    ///
    /// Returns `Ok(None)` for null fields and for complex fields under the
    /// `ignore` strategy; the caller decides whether that drops the record.
    fn cell_value(&self, field: &str, value: &JsonValue) -> Result<Option<Vec<u8>>> {
        match value {
            JsonValue::Null => Ok(None),
            JsonValue::String(s) => Ok(Some(s.clone().into_bytes())),
            JsonValue::Bool(_) | JsonValue::Number(_) => {
                Ok(Some(value.to_string().into_bytes()))
            }
            JsonValue::Object(_) | JsonValue::Array(_) => match self.strategy {
                ComplexRecordStrategy::Stringify => Ok(Some(value.to_string().into_bytes())),
                ComplexRecordStrategy::Ignore => Ok(None),
                ComplexRecordStrategy::Error => Err(Error::complex_field(field)),
            },
        }
    }
}

/// Textual form of a scalar value, `None` for null and complex values
fn scalar_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Bool(_) | JsonValue::Number(_) => Some(value.to_string()),
        JsonValue::Null | JsonValue::Object(_) | JsonValue::Array(_) => None,
    }
}

#[cfg(test)]
mod tests;
