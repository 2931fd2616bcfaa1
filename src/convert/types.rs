//! Conversion result, events and cancellation
//!
//! Types crossing the boundary between the converter and its host.

use crate::error::Error;
use crate::hfile::OutputFile;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ============================================================================
// ConversionResult
// ============================================================================

/// Outcome of one conversion run
///
/// Returned to the host and never mutated afterwards. Already-written files
/// are listed even when `failure` is set; the host decides whether partial
/// output is resumable or garbage.
#[derive(Debug, Default)]
pub struct ConversionResult {
    /// Files produced, in batch-close order
    pub output_files: Vec<OutputFile>,
    /// Records pulled from the source
    pub records_processed: usize,
    /// Records dropped by the `ignore` strategy
    pub records_skipped: usize,
    /// Records dropped by per-record errors under lenient strategies
    pub record_errors: usize,
    /// Terminal failure, if the run did not complete
    pub failure: Option<Error>,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl ConversionResult {
    /// Check if the run completed without a terminal failure
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Total rows across all produced files
    pub fn rows_written(&self) -> usize {
        self.output_files.iter().map(|f| f.row_count).sum()
    }
}

// ============================================================================
// ConvertEvent
// ============================================================================

/// Events delivered to host observers during a run
///
/// Observers are for provenance and reporting; they carry no control-flow
/// significance to the converter.
#[derive(Debug, Clone)]
pub enum ConvertEvent {
    /// An output file was closed and synced
    FileClosed {
        /// Descriptor of the closed file
        file: OutputFile,
    },
    /// The run finished, successfully or not
    Completed {
        /// Number of files produced
        files: usize,
        /// Records pulled from the source
        records_processed: usize,
        /// Whether a terminal failure occurred
        failed: bool,
    },
}

/// Observer callback invoked for every [`ConvertEvent`]
pub type EventObserver = Box<dyn FnMut(&ConvertEvent) + Send>;

// ============================================================================
// CancelToken
// ============================================================================

/// Cooperative cancellation signal
///
/// Cloneable handle over a shared flag; the converter checks it between
/// records and between batches. An in-flight batch write always finishes,
/// so already-written files stay valid and closed.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Check if cancellation was signalled
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
