//! Row and cell types
//!
//! The flat representation a record is normalized into before sorting and
//! serialization.

/// A single (family, qualifier, value, timestamp) unit attached to a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Column family
    pub family: String,
    /// Column qualifier (the source field name)
    pub qualifier: String,
    /// Cell value bytes
    pub value: Vec<u8>,
    /// Cell timestamp, epoch milliseconds
    pub timestamp: i64,
}

impl Cell {
    /// Create a cell
    pub fn new(
        family: impl Into<String>,
        qualifier: impl Into<String>,
        value: impl Into<Vec<u8>>,
        timestamp: i64,
    ) -> Self {
        Self {
            family: family.into(),
            qualifier: qualifier.into(),
            value: value.into(),
            timestamp,
        }
    }
}

/// A flat row: a non-empty key plus cells ordered by (family, qualifier)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    /// Row key bytes; determines file ordering
    pub key: Vec<u8>,
    /// Cells, ordered by (family, qualifier)
    pub cells: Vec<Cell>,
}

impl Row {
    /// Create a row, sorting cells into (family, qualifier) order
    pub fn new(key: impl Into<Vec<u8>>, mut cells: Vec<Cell>) -> Self {
        cells.sort_by(|a, b| {
            a.family
                .cmp(&b.family)
                .then_with(|| a.qualifier.cmp(&b.qualifier))
        });
        Self {
            key: key.into(),
            cells,
        }
    }

    /// Row key as lossy UTF-8, for logs and error messages
    pub fn key_display(&self) -> String {
        String::from_utf8_lossy(&self.key).into_owned()
    }
}

/// Outcome of normalizing one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The record mapped to a row
    Row(Row),
    /// The record was dropped by the configured strategy
    Skip,
}

impl Normalized {
    /// Check if this outcome carries a row
    pub fn is_row(&self) -> bool {
        matches!(self, Self::Row(_))
    }
}
