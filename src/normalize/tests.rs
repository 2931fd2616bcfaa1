//! Tests for record normalization

use super::*;
use crate::config::ConvertConfig;
use serde_json::json;
use test_case::test_case;

fn record(value: serde_json::Value) -> Record {
    match value {
        JsonValue::Object(map) => map,
        _ => panic!("expected object"),
    }
}

fn config(strategy: ComplexRecordStrategy) -> ConvertConfig {
    ConvertConfig::builder("/tmp/out", ["id"])
        .complex_record_strategy(strategy)
        .build()
        .unwrap()
}

#[test]
fn test_simple_record() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Stringify));
    let rec = record(json!({"id": "row1", "name": "Alice", "age": 30}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };

    assert_eq!(row.key, b"row1");
    assert_eq!(row.cells.len(), 2);
    // Key field is consumed by the key, not repeated as a cell
    assert!(row.cells.iter().all(|c| c.qualifier != "id"));
}

#[test]
fn test_cells_ordered_by_family_qualifier() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Stringify));
    let rec = record(json!({"id": "r", "zeta": 1, "alpha": 2, "mid": 3}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };

    let qualifiers: Vec<_> = row.cells.iter().map(|c| c.qualifier.as_str()).collect();
    let mut sorted = qualifiers.clone();
    sorted.sort_unstable();
    assert_eq!(qualifiers, sorted);
}

#[test]
fn test_value_encoding() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Stringify));
    let rec = record(json!({"id": "r", "s": "text", "n": 42, "b": true}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };

    let value_of = |q: &str| {
        row.cells
            .iter()
            .find(|c| c.qualifier == q)
            .map(|c| c.value.clone())
            .unwrap()
    };
    assert_eq!(value_of("s"), b"text");
    assert_eq!(value_of("n"), b"42");
    assert_eq!(value_of("b"), b"true");
}

#[test]
fn test_null_field_produces_no_cell() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Error));
    let rec = record(json!({"id": "r", "gone": null, "kept": "v"}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };
    assert_eq!(row.cells.len(), 1);
    assert_eq!(row.cells[0].qualifier, "kept");
}

#[test]
fn test_missing_key_field() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Stringify));
    let rec = record(json!({"name": "no key here"}));

    let err = normalizer.normalize(&rec).unwrap_err();
    assert!(matches!(err, Error::MissingKey { ref field } if field == "id"));
}

#[test]
fn test_empty_key_value() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Stringify));
    let rec = record(json!({"id": "", "name": "blank key"}));

    assert!(matches!(
        normalizer.normalize(&rec).unwrap_err(),
        Error::MissingKey { .. }
    ));
}

#[test]
fn test_complex_key_value_is_missing_key() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Stringify));
    let rec = record(json!({"id": {"nested": true}}));

    assert!(matches!(
        normalizer.normalize(&rec).unwrap_err(),
        Error::MissingKey { .. }
    ));
}

#[test]
fn test_composite_key() {
    let config = ConvertConfig::builder("/tmp/out", ["tenant", "id"])
        .key_delimiter("|")
        .build()
        .unwrap();
    let normalizer = RowNormalizer::new(&config);
    let rec = record(json!({"tenant": "acme", "id": 7, "v": 1}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };
    assert_eq!(row.key, b"acme|7");
}

#[test_case(ComplexRecordStrategy::Stringify => true; "stringify keeps the record")]
#[test_case(ComplexRecordStrategy::Ignore => false; "ignore drops the record")]
fn test_complex_field_lenient(strategy: ComplexRecordStrategy) -> bool {
    let normalizer = RowNormalizer::new(&config(strategy));
    let rec = record(json!({"id": "r", "nested": {"a": 1}}));
    normalizer.normalize(&rec).unwrap().is_row()
}

#[test]
fn test_complex_field_stringified_value() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Stringify));
    let rec = record(json!({"id": "r", "nested": {"a": 1}}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };
    assert_eq!(row.cells[0].value, br#"{"a":1}"#);
}

#[test]
fn test_complex_field_error_strategy() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Error));
    let rec = record(json!({"id": "r", "tags": ["a", "b"]}));

    let err = normalizer.normalize(&rec).unwrap_err();
    assert!(matches!(err, Error::ComplexField { ref field } if field == "tags"));
}

#[test]
fn test_timestamp_field() {
    let config = ConvertConfig::builder("/tmp/out", ["id"])
        .timestamp_field("ts")
        .build()
        .unwrap();
    let normalizer = RowNormalizer::new(&config);
    let rec = record(json!({"id": "r", "ts": 1_700_000_000_000i64, "v": "x"}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };
    // Timestamp field feeds cell timestamps and is not emitted as a cell
    assert_eq!(row.cells.len(), 1);
    assert_eq!(row.cells[0].timestamp, 1_700_000_000_000);
}

#[test]
fn test_complex_timestamp_field_exempt_from_strategy() {
    // The timestamp field is consumed, not a cell, so a complex value
    // there falls back to the wall clock instead of tripping the strategy
    let config = ConvertConfig::builder("/tmp/out", ["id"])
        .timestamp_field("ts")
        .complex_record_strategy(ComplexRecordStrategy::Error)
        .build()
        .unwrap();
    let normalizer = RowNormalizer::new(&config);
    let before = chrono::Utc::now().timestamp_millis();
    let rec = record(json!({"id": "r", "ts": {"nested": true}, "v": "x"}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };
    let after = chrono::Utc::now().timestamp_millis();
    assert_eq!(row.cells.len(), 1);
    assert_eq!(row.cells[0].qualifier, "v");
    assert!(row.cells[0].timestamp >= before && row.cells[0].timestamp <= after);
}

#[test]
fn test_wall_clock_timestamp_fallback() {
    let normalizer = RowNormalizer::new(&config(ComplexRecordStrategy::Stringify));
    let before = chrono::Utc::now().timestamp_millis();
    let rec = record(json!({"id": "r", "v": "x"}));

    let row = match normalizer.normalize(&rec).unwrap() {
        Normalized::Row(row) => row,
        Normalized::Skip => panic!("expected row"),
    };
    let after = chrono::Utc::now().timestamp_millis();
    assert!(row.cells[0].timestamp >= before && row.cells[0].timestamp <= after);
}
