//! Store file reader
//!
//! Opens a produced file, validates its trailer, and yields rows in stored
//! order. This is the compatibility half of the round-trip law: a file
//! written by [`HFileWriter`](super::HFileWriter) reads back as the same
//! rows in the same order, with nothing but the file itself.

use super::{FORMAT_VERSION, MAGIC, TRAILER_LEN};
use crate::error::{Error, Result};
use crate::normalize::{Cell, Row};
use bytes::Buf;
use std::path::{Path, PathBuf};

/// Store file reader
#[derive(Debug)]
pub struct HFileReader {
    path: PathBuf,
    data: Vec<u8>,
    index_offset: usize,
    block_count: u32,
    row_count: u64,
}

impl HFileReader {
    /// Open a store file and validate its trailer
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;

        if data.len() < TRAILER_LEN {
            return Err(Self::malformed(path, "file shorter than trailer"));
        }

        let mut trailer = &data[data.len() - TRAILER_LEN..];
        let index_offset = trailer.get_u64() as usize;
        let block_count = trailer.get_u32();
        let row_count = trailer.get_u64();
        let version = trailer.get_u8();
        let magic = trailer.copy_to_bytes(4);

        if magic.as_ref() != MAGIC {
            return Err(Self::malformed(path, "bad magic"));
        }
        if version != FORMAT_VERSION {
            return Err(Self::malformed(
                path,
                format!("unsupported format version {version}"),
            ));
        }
        if index_offset > data.len() - TRAILER_LEN {
            return Err(Self::malformed(path, "index offset out of bounds"));
        }

        Ok(Self {
            path: path.to_path_buf(),
            data,
            index_offset,
            block_count,
            row_count,
        })
    }

    /// Total row count recorded in the trailer
    pub fn row_count(&self) -> u64 {
        self.row_count
    }

    /// Number of data blocks
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Decode all rows in stored (key) order
    pub fn rows(&self) -> Result<Vec<Row>> {
        let index = self.read_index()?;
        // The trailer row count is untrusted until the post-decode
        // cross-check below; clamp the capacity hint
        let mut rows = Vec::with_capacity((self.row_count as usize).min(64 * 1024));
        for entry in &index {
            self.read_block(entry, &mut rows)?;
        }
        if rows.len() as u64 != self.row_count {
            return Err(Self::malformed(
                &self.path,
                format!(
                    "trailer claims {} rows, blocks hold {}",
                    self.row_count,
                    rows.len()
                ),
            ));
        }
        Ok(rows)
    }

    fn read_index(&self) -> Result<Vec<IndexEntry>> {
        let index_end = self.data.len() - TRAILER_LEN;
        let mut buf = &self.data[self.index_offset..index_end];
        if buf.remaining() < 4 {
            return Err(Self::malformed(&self.path, "truncated block index"));
        }
        let count = buf.get_u32();
        if count != self.block_count {
            return Err(Self::malformed(&self.path, "index/trailer block count mismatch"));
        }

        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            if buf.remaining() < 20 {
                return Err(Self::malformed(&self.path, "truncated index entry"));
            }
            let offset = buf.get_u64() as usize;
            let byte_len = buf.get_u32() as usize;
            let row_count = buf.get_u32();
            let key_len = buf.get_u32() as usize;
            if buf.remaining() < key_len {
                return Err(Self::malformed(&self.path, "truncated index key"));
            }
            buf.advance(key_len); // first key is for seeks, not needed for a scan
            entries.push(IndexEntry {
                offset,
                byte_len,
                row_count,
            });
        }
        Ok(entries)
    }

    fn read_block(&self, entry: &IndexEntry, rows: &mut Vec<Row>) -> Result<()> {
        let start = entry.offset;
        let end = start
            .checked_add(entry.byte_len + 4)
            .filter(|&e| e <= self.index_offset)
            .ok_or_else(|| Self::malformed(&self.path, "block extends past index"))?;

        let mut buf = &self.data[start..end];
        let payload_len = buf.get_u32() as usize;
        if payload_len != entry.byte_len {
            return Err(Self::malformed(&self.path, "block length mismatch"));
        }

        for _ in 0..entry.row_count {
            rows.push(self.decode_row(&mut buf)?);
        }
        Ok(())
    }

    fn decode_row(&self, buf: &mut &[u8]) -> Result<Row> {
        let key = self.take_bytes_u32(buf)?;
        if buf.remaining() < 4 {
            return Err(Self::malformed(&self.path, "truncated row"));
        }
        let cell_count = buf.get_u32();

        // Untrusted count; the per-cell bounds checks reject overruns
        let mut cells = Vec::with_capacity((cell_count as usize).min(1024));
        for _ in 0..cell_count {
            let family = self.take_string_u16(buf)?;
            let qualifier = self.take_string_u16(buf)?;
            let value = self.take_bytes_u32(buf)?;
            if buf.remaining() < 8 {
                return Err(Self::malformed(&self.path, "truncated cell timestamp"));
            }
            let timestamp = buf.get_i64();
            cells.push(Cell {
                family,
                qualifier,
                value,
                timestamp,
            });
        }
        Ok(Row { key, cells })
    }

    fn take_bytes_u32(&self, buf: &mut &[u8]) -> Result<Vec<u8>> {
        if buf.remaining() < 4 {
            return Err(Self::malformed(&self.path, "truncated length prefix"));
        }
        let len = buf.get_u32() as usize;
        if buf.remaining() < len {
            return Err(Self::malformed(&self.path, "truncated field"));
        }
        let bytes = buf[..len].to_vec();
        buf.advance(len);
        Ok(bytes)
    }

    fn take_string_u16(&self, buf: &mut &[u8]) -> Result<String> {
        if buf.remaining() < 2 {
            return Err(Self::malformed(&self.path, "truncated length prefix"));
        }
        let len = buf.get_u16() as usize;
        if buf.remaining() < len {
            return Err(Self::malformed(&self.path, "truncated field"));
        }
        let s = String::from_utf8(buf[..len].to_vec())
            .map_err(|_| Self::malformed(&self.path, "non-UTF-8 name"))?;
        buf.advance(len);
        Ok(s)
    }

    fn malformed(path: &Path, message: impl Into<String>) -> Error {
        Error::format(path.display().to_string(), message)
    }
}

struct IndexEntry {
    offset: usize,
    byte_len: usize,
    row_count: u32,
}
