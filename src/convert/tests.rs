//! Tests for the conversion orchestrator

use super::*;
use crate::hfile::{BatchWriter, HFileReader, OutputFile};
use crate::source::VecSource;
use crate::types::{ComplexRecordStrategy, JsonValue, Record};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::tempdir;

fn rec(value: JsonValue) -> Record {
    match value {
        JsonValue::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| rec(json!({"id": format!("row-{i:05}"), "value": i})))
        .collect()
}

fn config(dir: &std::path::Path, per_file: usize) -> ConvertConfig {
    ConvertConfig::builder(dir, ["id"])
        .records_per_file(per_file)
        .build()
        .unwrap()
}

/// Writer that delegates until the nth call, then fails
struct FailingWriter {
    inner: HFileDirectoryWriter,
    fail_on: usize,
    calls: AtomicUsize,
}

impl FailingWriter {
    fn new(dir: &std::path::Path, fail_on: usize) -> Self {
        Self {
            inner: HFileDirectoryWriter::new(dir, "part"),
            fail_on,
            calls: AtomicUsize::new(0),
        }
    }
}

impl BatchWriter for FailingWriter {
    fn write(&self, batch: &crate::batch::Batch) -> Result<OutputFile> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call == self.fail_on {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.inner.write(batch)
    }
}

// ============================================================================
// Rotation and accounting
// ============================================================================

#[tokio::test]
async fn test_rotation_counts() {
    // Scenario A at unit scale: 25 records, 10 per file -> 10/10/5
    let dir = tempdir().unwrap();
    let mut source = VecSource::new(records(25));

    let result = convert(config(dir.path(), 10), &mut source).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.records_processed, 25);
    let counts: Vec<_> = result.output_files.iter().map(|f| f.row_count).collect();
    assert_eq!(counts, vec![10, 10, 5]);
}

#[tokio::test]
async fn test_empty_source() {
    let dir = tempdir().unwrap();
    let mut source = VecSource::new(Vec::new());

    let result = convert(config(dir.path(), 10), &mut source).await.unwrap();

    assert!(result.is_success());
    assert!(result.output_files.is_empty());
    assert_eq!(result.records_processed, 0);
}

#[tokio::test]
async fn test_accounting_identity() {
    let dir = tempdir().unwrap();
    let mut input = records(8);
    input.push(rec(json!({"no_key": true}))); // record error (missing key)
    input.push(rec(json!({"id": "x", "nested": {"a": 1}}))); // skipped by ignore
    input.extend(records(3));

    let config = ConvertConfig::builder(dir.path(), ["id"])
        .records_per_file(5)
        .complex_record_strategy(ComplexRecordStrategy::Ignore)
        .build()
        .unwrap();
    let mut source = VecSource::new(input);
    let result = convert(config, &mut source).await.unwrap();

    assert!(result.is_success());
    assert_eq!(
        result.rows_written() + result.records_skipped + result.record_errors,
        result.records_processed
    );
    assert_eq!(result.records_skipped, 1);
    assert_eq!(result.record_errors, 1);
}

#[tokio::test]
async fn test_no_file_exceeds_capacity_and_files_are_sorted() {
    let dir = tempdir().unwrap();
    // Reverse order input exercises the sort
    let mut input = records(23);
    input.reverse();
    let mut source = VecSource::new(input);

    let result = convert(config(dir.path(), 10), &mut source).await.unwrap();

    assert!(result.is_success());
    for file in &result.output_files {
        assert!(file.row_count <= 10);
        let rows = HFileReader::open(&file.path).unwrap().rows().unwrap();
        assert_eq!(rows.len(), file.row_count);
        assert!(rows.windows(2).all(|w| w[0].key <= w[1].key));
        assert_eq!(rows.first().unwrap().key, file.min_key);
        assert_eq!(rows.last().unwrap().key, file.max_key);
    }
}

// ============================================================================
// Strategies and per-record errors
// ============================================================================

#[tokio::test]
async fn test_missing_key_fatal_under_error_strategy() {
    let dir = tempdir().unwrap();
    let config = ConvertConfig::builder(dir.path(), ["id"])
        .complex_record_strategy(ComplexRecordStrategy::Error)
        .build()
        .unwrap();
    let mut source = VecSource::new(vec![rec(json!({"name": "keyless"}))]);

    let result = convert(config, &mut source).await.unwrap();

    assert!(matches!(result.failure, Some(Error::MissingKey { .. })));
    assert!(result.output_files.is_empty());
}

#[tokio::test]
async fn test_missing_key_skipped_under_lenient_strategy() {
    let dir = tempdir().unwrap();
    let mut source = VecSource::new(vec![
        rec(json!({"name": "keyless"})),
        rec(json!({"id": "ok", "name": "fine"})),
    ]);

    let result = convert(config(dir.path(), 10), &mut source).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.record_errors, 1);
    assert_eq!(result.rows_written(), 1);
}

#[tokio::test]
async fn test_complex_field_fatal_under_error_strategy() {
    let dir = tempdir().unwrap();
    let config = ConvertConfig::builder(dir.path(), ["id"])
        .complex_record_strategy(ComplexRecordStrategy::Error)
        .build()
        .unwrap();
    let mut source = VecSource::new(vec![rec(json!({"id": "r", "tags": [1, 2]}))]);

    let result = convert(config, &mut source).await.unwrap();
    assert!(matches!(result.failure, Some(Error::ComplexField { .. })));
}

#[tokio::test]
async fn test_ignore_strategy_skips_nested_record() {
    let dir = tempdir().unwrap();
    let config = ConvertConfig::builder(dir.path(), ["id"])
        .complex_record_strategy(ComplexRecordStrategy::Ignore)
        .build()
        .unwrap();
    let mut source = VecSource::new(vec![
        rec(json!({"id": "a", "plain": 1})),
        rec(json!({"id": "b", "nested": {"x": true}})),
    ]);

    let result = convert(config, &mut source).await.unwrap();

    assert!(result.is_success());
    assert_eq!(result.records_skipped, 1);
    assert_eq!(result.rows_written(), 1);
}

// ============================================================================
// Failure handling
// ============================================================================

#[tokio::test]
async fn test_write_failure_on_second_batch() {
    let dir = tempdir().unwrap();
    let writer = FailingWriter::new(dir.path(), 2);
    let mut converter = Converter::with_writer(config(dir.path(), 5), Box::new(writer));
    let mut source = VecSource::new(records(14));

    let result = converter.convert(&mut source).await;

    assert!(matches!(result.failure, Some(Error::Io(_))));
    // Exactly the first, already-closed batch survives on disk
    assert_eq!(result.output_files.len(), 1);
    assert_eq!(result.output_files[0].row_count, 5);
    let on_disk: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .collect();
    assert_eq!(on_disk.len(), 1);
    // The open partial batch is not flushed after a failure
    assert!(result.records_processed >= 10);
}

#[tokio::test]
async fn test_source_error_is_fatal() {
    struct BrokenSource {
        remaining: usize,
    }
    #[async_trait::async_trait]
    impl crate::source::RecordSource for BrokenSource {
        async fn next(&mut self) -> Result<Option<Record>> {
            if self.remaining == 0 {
                Err(Error::Other("reader exploded".into()))
            } else {
                self.remaining -= 1;
                Ok(Some(rec(json!({"id": "k", "v": 1}))))
            }
        }
    }

    let dir = tempdir().unwrap();
    let mut source = BrokenSource { remaining: 3 };
    let result = convert(config(dir.path(), 100), &mut source).await.unwrap();

    assert!(matches!(result.failure, Some(Error::Other(_))));
    assert_eq!(result.records_processed, 3);
    assert!(result.output_files.is_empty());
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_before_run() {
    let dir = tempdir().unwrap();
    let mut converter = Converter::new(config(dir.path(), 10)).unwrap();
    converter.cancel_token().cancel();

    let mut source = VecSource::new(records(5));
    let result = converter.convert(&mut source).await;

    assert!(matches!(result.failure, Some(Error::Cancelled)));
    assert_eq!(result.records_processed, 0);
    assert!(result.output_files.is_empty());
}

#[tokio::test]
async fn test_cancel_after_first_file() {
    let dir = tempdir().unwrap();
    let mut converter = Converter::new(config(dir.path(), 5)).unwrap();
    let token = converter.cancel_token();
    // Cancel from the observer: the in-flight write has finished by then
    let mut converter = converter.on_event(move |event| {
        if matches!(event, ConvertEvent::FileClosed { .. }) {
            token.cancel();
        }
    });

    let mut source = VecSource::new(records(20));
    let result = converter.convert(&mut source).await;

    assert!(matches!(result.failure, Some(Error::Cancelled)));
    assert_eq!(result.output_files.len(), 1);
    // The already-written file is valid and closed
    let rows = HFileReader::open(&result.output_files[0].path)
        .unwrap()
        .rows()
        .unwrap();
    assert_eq!(rows.len(), 5);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_events_emitted() {
    let dir = tempdir().unwrap();
    let events = std::sync::Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let mut converter = Converter::new(config(dir.path(), 4))
        .unwrap()
        .on_event(move |event| sink.lock().unwrap().push(event.clone()));

    let mut source = VecSource::new(records(10));
    let result = converter.convert(&mut source).await;
    assert!(result.is_success());

    let events = events.lock().unwrap();
    let closed = events
        .iter()
        .filter(|e| matches!(e, ConvertEvent::FileClosed { .. }))
        .count();
    assert_eq!(closed, 3); // 4 + 4 + 2
    match events.last().unwrap() {
        ConvertEvent::Completed {
            files,
            records_processed,
            failed,
        } => {
            assert_eq!(*files, 3);
            assert_eq!(*records_processed, 10);
            assert!(!failed);
        }
        other => panic!("expected Completed last, got {other:?}"),
    }
}

#[tokio::test]
async fn test_completed_event_on_failure() {
    let dir = tempdir().unwrap();
    let events = std::sync::Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();

    let writer = FailingWriter::new(dir.path(), 1);
    let mut converter = Converter::with_writer(config(dir.path(), 2), Box::new(writer))
        .on_event(move |event| sink.lock().unwrap().push(event.clone()));

    let mut source = VecSource::new(records(4));
    let result = converter.convert(&mut source).await;
    assert!(!result.is_success());

    let events = events.lock().unwrap();
    assert!(matches!(
        events.last().unwrap(),
        ConvertEvent::Completed { failed: true, .. }
    ));
}
