//! Record sources
//!
//! The converter pulls records through the [`RecordSource`] trait, one at a
//! time. Hosts inject a ready-to-use source; nothing here knows where the
//! records come from.

use crate::error::{Error, Result};
use crate::types::{JsonValue, Record};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::io::BufRead;

/// An abstract record source
///
/// `next` yields the next record, or `None` at end of stream. Sources are
/// pulled from a single task; implementations need not be re-entrant.
#[async_trait]
pub trait RecordSource: Send {
    /// Fetch the next record, or `None` when the stream is exhausted
    async fn next(&mut self) -> Result<Option<Record>>;
}

// ============================================================================
// VecSource
// ============================================================================

/// In-memory record source, mainly for tests and small jobs
pub struct VecSource {
    records: std::vec::IntoIter<Record>,
}

impl VecSource {
    /// Create a source over a vector of records
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter(),
        }
    }

    /// Create a source from JSON values, rejecting non-object values
    pub fn from_values(values: Vec<JsonValue>) -> Result<Self> {
        let records = values
            .into_iter()
            .map(|v| match v {
                JsonValue::Object(map) => Ok(map),
                other => Err(Error::Other(format!(
                    "expected a JSON object record, got: {other}"
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(records))
    }
}

#[async_trait]
impl RecordSource for VecSource {
    async fn next(&mut self) -> Result<Option<Record>> {
        Ok(self.records.next())
    }
}

// ============================================================================
// JsonLinesSource
// ============================================================================

/// Record source reading JSON Lines from any buffered reader
///
/// Blank lines are skipped; a line that is valid JSON but not an object is
/// an error, since records are field maps by definition.
pub struct JsonLinesSource<R: BufRead + Send> {
    reader: R,
    line: String,
    line_no: usize,
}

impl<R: BufRead + Send> JsonLinesSource<R> {
    /// Create a source over a buffered reader
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            line_no: 0,
        }
    }
}

impl JsonLinesSource<std::io::BufReader<std::fs::File>> {
    /// Open a JSON Lines file as a record source
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|_| Error::FileNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self::new(std::io::BufReader::new(file)))
    }
}

#[async_trait]
impl<R: BufRead + Send> RecordSource for JsonLinesSource<R> {
    async fn next(&mut self) -> Result<Option<Record>> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line)?;
            if read == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let trimmed = self.line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let value: JsonValue = serde_json::from_str(trimmed)?;
            return match value {
                JsonValue::Object(map) => Ok(Some(map)),
                _ => Err(Error::Other(format!(
                    "line {}: expected a JSON object record",
                    self.line_no
                ))),
            };
        }
    }
}

// ============================================================================
// StreamSource
// ============================================================================

/// Adapter turning a boxed record stream into a [`RecordSource`]
pub struct StreamSource {
    inner: BoxStream<'static, Result<Record>>,
}

impl StreamSource {
    /// Wrap a boxed stream of records
    pub fn new(stream: BoxStream<'static, Result<Record>>) -> Self {
        Self { inner: stream }
    }
}

#[async_trait]
impl RecordSource for StreamSource {
    async fn next(&mut self) -> Result<Option<Record>> {
        self.inner.next().await.transpose()
    }
}
