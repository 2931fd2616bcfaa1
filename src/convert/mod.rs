//! Conversion orchestration
//!
//! The converter drives the pipeline: pull one record at a time from the
//! source, normalize it, feed the batcher, and write each batch the moment
//! it closes. Back-pressure is inherent: at most one batch is in flight,
//! and nothing is buffered beyond `records_per_file` rows.
//!
//! Per run the converter moves through
//! `Reading -> WritingBatch -> Reading -> ... -> Completed | Failed`;
//! `WritingBatch` is entered only when the batcher closes a batch. A
//! terminal failure stops the run without flushing the open partial batch;
//! files already written stay on disk (the host decides cleanup, since
//! partial bulk-load progress may be resumable).

mod types;

pub use types::{CancelToken, ConversionResult, ConvertEvent, EventObserver};

use crate::batch::{Batch, RowBatcher};
use crate::config::ConvertConfig;
use crate::error::{Error, Result};
use crate::hfile::{BatchWriter, FileNameAllocator, HFileDirectoryWriter};
use crate::normalize::{Normalized, RowNormalizer};
use crate::source::RecordSource;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Converts a record stream into sorted immutable files
pub struct Converter {
    config: ConvertConfig,
    writer: Box<dyn BatchWriter>,
    cancel: CancelToken,
    observers: Vec<EventObserver>,
}

impl Converter {
    /// Create a converter writing into the configured base folder
    pub fn new(config: ConvertConfig) -> Result<Self> {
        config.validate()?;
        let writer = HFileDirectoryWriter::new(&config.base_folder, &config.file_prefix);
        Ok(Self::with_writer(config, Box::new(writer)))
    }

    /// Create a converter sharing a file name allocator with other runs
    ///
    /// Concurrent runs into one destination directory must share the
    /// allocator (or use distinct prefixes) to keep names collision-free.
    pub fn with_shared_names(config: ConvertConfig, names: Arc<FileNameAllocator>) -> Result<Self> {
        config.validate()?;
        let writer =
            HFileDirectoryWriter::with_allocator(&config.base_folder, &config.file_prefix, names);
        Ok(Self::with_writer(config, Box::new(writer)))
    }

    /// Create a converter over an explicit batch writer
    pub fn with_writer(config: ConvertConfig, writer: Box<dyn BatchWriter>) -> Self {
        Self {
            config,
            writer,
            cancel: CancelToken::new(),
            observers: Vec::new(),
        }
    }

    /// Handle for cancelling this run cooperatively
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Register an observer for file-closed and run-completed events
    #[must_use]
    pub fn on_event(mut self, observer: impl FnMut(&ConvertEvent) + Send + 'static) -> Self {
        self.observers.push(Box::new(observer));
        self
    }

    /// Drive one conversion run to completion
    ///
    /// Terminal failures are reported through `ConversionResult::failure`,
    /// never as a silent drop; the result is not mutated after return.
    pub async fn convert(&mut self, source: &mut dyn RecordSource) -> ConversionResult {
        let start = Instant::now();
        let normalizer = RowNormalizer::new(&self.config);
        let mut batcher = RowBatcher::new(self.config.records_per_file);
        let mut result = ConversionResult::default();
        let strict = self.config.complex_record_strategy.is_strict();

        info!(
            base_folder = %self.config.base_folder.display(),
            records_per_file = self.config.records_per_file,
            "starting conversion run"
        );

        loop {
            if self.cancel.is_cancelled() {
                result.failure = Some(Error::Cancelled);
                break;
            }

            let record = match source.next().await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    // Clean exhaustion: the final partial batch still flushes
                    if let Some(batch) = batcher.finish() {
                        if let Err(e) = self.write_batch(&batch, &mut result) {
                            result.failure = Some(e);
                        }
                    }
                    break;
                }
                Err(e) => {
                    result.failure = Some(e);
                    break;
                }
            };
            result.records_processed += 1;

            match normalizer.normalize(&record) {
                Ok(Normalized::Row(row)) => {
                    if let Some(batch) = batcher.accept(row) {
                        if let Err(e) = self.write_batch(&batch, &mut result) {
                            result.failure = Some(e);
                            break;
                        }
                    }
                }
                Ok(Normalized::Skip) => {
                    result.records_skipped += 1;
                }
                Err(e) if e.is_record_error() && !strict => {
                    debug!(error = %e, "skipping record");
                    result.record_errors += 1;
                }
                Err(e) => {
                    result.failure = Some(e);
                    break;
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        self.emit(&ConvertEvent::Completed {
            files: result.output_files.len(),
            records_processed: result.records_processed,
            failed: result.failure.is_some(),
        });

        match &result.failure {
            None => info!(
                files = result.output_files.len(),
                records = result.records_processed,
                skipped = result.records_skipped,
                record_errors = result.record_errors,
                duration_ms = result.duration_ms,
                "conversion run completed"
            ),
            Some(e) => warn!(
                error = %e,
                files = result.output_files.len(),
                records = result.records_processed,
                "conversion run failed"
            ),
        }

        result
    }

    /// Write one closed batch and record the produced file
    fn write_batch(&mut self, batch: &Batch, result: &mut ConversionResult) -> Result<()> {
        debug!(rows = batch.len(), "writing batch");
        let file = self.writer.write(batch)?;
        debug!(
            path = %file.path.display(),
            rows = file.row_count,
            "output file closed"
        );
        self.emit(&ConvertEvent::FileClosed { file: file.clone() });
        result.output_files.push(file);
        Ok(())
    }

    fn emit(&mut self, event: &ConvertEvent) {
        for observer in &mut self.observers {
            observer(event);
        }
    }
}

/// Convenience entry point: convert a source with a fresh converter
pub async fn convert(
    config: ConvertConfig,
    source: &mut dyn RecordSource,
) -> Result<ConversionResult> {
    let mut converter = Converter::new(config)?;
    Ok(converter.convert(source).await)
}

#[cfg(test)]
mod tests;
