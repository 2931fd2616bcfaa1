//! Row batching and sorting
//!
//! Accumulates normalized rows and yields sorted batches of at most
//! `records_per_file` rows. The target file format stores rows ascending by
//! key, so every batch is sorted before it closes. Duplicate keys are
//! preserved as separate entries (append-only semantics, no overwrite).

use crate::normalize::Row;

/// A closed, sorted batch of rows
#[derive(Debug, Clone)]
pub struct Batch {
    rows: Vec<Row>,
}

impl Batch {
    pub(crate) fn from_sorted(rows: Vec<Row>) -> Self {
        debug_assert!(rows.windows(2).all(|w| w[0].key <= w[1].key));
        Self { rows }
    }

    /// Rows in non-decreasing key order
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows in the batch
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Smallest row key, if any
    pub fn min_key(&self) -> Option<&[u8]> {
        self.rows.first().map(|r| r.key.as_slice())
    }

    /// Largest row key, if any
    pub fn max_key(&self) -> Option<&[u8]> {
        self.rows.last().map(|r| r.key.as_slice())
    }
}

/// Accumulates rows and rotates full sorted batches
///
/// At most one batch is open at a time; `accept` hands back a closed batch
/// exactly when the buffer reaches capacity, and `finish` flushes the final
/// partial batch.
pub struct RowBatcher {
    buffer: Vec<Row>,
    records_per_file: usize,
}

impl RowBatcher {
    /// Create a batcher rotating every `records_per_file` rows
    ///
    /// Capacity must be positive; config validation enforces this before a
    /// batcher is ever built.
    pub fn new(records_per_file: usize) -> Self {
        assert!(records_per_file > 0, "records_per_file must be positive");
        Self {
            buffer: Vec::with_capacity(records_per_file.min(64 * 1024)),
            records_per_file,
        }
    }

    /// Accept one row; returns a closed sorted batch when the buffer fills
    pub fn accept(&mut self, row: Row) -> Option<Batch> {
        self.buffer.push(row);
        if self.buffer.len() >= self.records_per_file {
            Some(self.close())
        } else {
            None
        }
    }

    /// Flush the final partial batch, if any rows are buffered
    pub fn finish(&mut self) -> Option<Batch> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.close())
        }
    }

    /// Number of rows currently buffered
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn close(&mut self) -> Batch {
        let mut rows = std::mem::take(&mut self.buffer);
        rows.sort_by(|a, b| a.key.cmp(&b.key));
        Batch::from_sorted(rows)
    }
}
