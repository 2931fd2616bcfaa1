//! Store file writer
//!
//! Serializes one sorted batch into one immutable file. Rows are packed
//! into data blocks of a bounded encoded size; the block index records the
//! offset, length, row count and first key of every block.

use super::{OutputFile, FORMAT_VERSION, MAGIC, TRAILER_LEN};
use crate::batch::Batch;
use crate::error::{Error, Result};
use crate::normalize::Row;
use bytes::{BufMut, BytesMut};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Configuration for the store file writer
#[derive(Debug, Clone)]
pub struct HFileWriterConfig {
    block_size: usize,
}

impl Default for HFileWriterConfig {
    fn default() -> Self {
        Self {
            block_size: super::DEFAULT_BLOCK_SIZE,
        }
    }
}

impl HFileWriterConfig {
    /// Create a new config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target encoded size of one data block
    #[must_use]
    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size.max(1);
        self
    }

    /// Get the block size
    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}

/// Index entry accumulated while blocks are written
struct BlockMeta {
    offset: u64,
    byte_len: u32,
    row_count: u32,
    first_key: Vec<u8>,
}

/// Store file writer
pub struct HFileWriter {
    config: HFileWriterConfig,
}

impl HFileWriter {
    /// Create a writer with the given configuration
    pub fn new(config: HFileWriterConfig) -> Self {
        Self { config }
    }

    /// Serialize a sorted batch into a new file at `path`
    ///
    /// The file is flushed and fsynced before the descriptor is returned,
    /// and must not be mutated afterwards. An empty batch is an invariant
    /// violation on the batcher side and is rejected defensively here.
    pub fn write(&self, batch: &Batch, path: &Path) -> Result<OutputFile> {
        if batch.is_empty() {
            return Err(Error::EmptyBatch);
        }

        let file = File::create(path)?;
        let mut out = BufWriter::new(file);

        let mut blocks: Vec<BlockMeta> = Vec::new();
        let mut block = BytesMut::with_capacity(self.config.block_size);
        let mut block_rows: u32 = 0;
        let mut block_first_key: Vec<u8> = Vec::new();
        let mut offset: u64 = 0;

        for row in batch.rows() {
            if block_rows == 0 {
                block_first_key = row.key.clone();
            }
            encode_row(&mut block, row);
            block_rows += 1;

            if block.len() >= self.config.block_size {
                offset += flush_block(
                    &mut out,
                    &mut blocks,
                    offset,
                    &mut block,
                    block_rows,
                    &block_first_key,
                )?;
                block_rows = 0;
            }
        }
        if block_rows > 0 {
            flush_block(
                &mut out,
                &mut blocks,
                offset,
                &mut block,
                block_rows,
                &block_first_key,
            )?;
        }

        let index_offset = blocks.iter().map(|b| u64::from(b.byte_len) + 4).sum::<u64>();
        let mut tail = BytesMut::new();
        encode_index(&mut tail, &blocks);
        encode_trailer(&mut tail, index_offset, &blocks, batch.len() as u64);
        out.write_all(&tail)?;

        out.flush()?;
        out.into_inner().map_err(|e| Error::Io(e.into_error()))?.sync_all()?;

        Ok(OutputFile {
            path: path.to_path_buf(),
            row_count: batch.len(),
            // Safe: the batch is non-empty
            min_key: batch.min_key().unwrap_or_default().to_vec(),
            max_key: batch.max_key().unwrap_or_default().to_vec(),
        })
    }
}

/// Write one batch with default writer settings
pub fn write_batch(batch: &Batch, path: impl AsRef<Path>) -> Result<OutputFile> {
    HFileWriter::new(HFileWriterConfig::default()).write(batch, path.as_ref())
}

/// Encode one row into the current block buffer
fn encode_row(buf: &mut BytesMut, row: &Row) {
    buf.put_u32(row.key.len() as u32);
    buf.put_slice(&row.key);
    buf.put_u32(row.cells.len() as u32);
    for cell in &row.cells {
        buf.put_u16(cell.family.len() as u16);
        buf.put_slice(cell.family.as_bytes());
        buf.put_u16(cell.qualifier.len() as u16);
        buf.put_slice(cell.qualifier.as_bytes());
        buf.put_u32(cell.value.len() as u32);
        buf.put_slice(&cell.value);
        buf.put_i64(cell.timestamp);
    }
}

/// Flush the current block: length-prefixed payload, indexed by offset
fn flush_block(
    out: &mut BufWriter<File>,
    blocks: &mut Vec<BlockMeta>,
    offset: u64,
    block: &mut BytesMut,
    row_count: u32,
    first_key: &[u8],
) -> Result<u64> {
    let payload = block.split();
    let byte_len = payload.len() as u32;

    let mut header = [0u8; 4];
    header.copy_from_slice(&byte_len.to_be_bytes());
    out.write_all(&header)?;
    out.write_all(&payload)?;

    blocks.push(BlockMeta {
        offset,
        byte_len,
        row_count,
        first_key: first_key.to_vec(),
    });
    Ok(u64::from(byte_len) + 4)
}

fn encode_index(buf: &mut BytesMut, blocks: &[BlockMeta]) {
    buf.put_u32(blocks.len() as u32);
    for block in blocks {
        buf.put_u64(block.offset);
        buf.put_u32(block.byte_len);
        buf.put_u32(block.row_count);
        buf.put_u32(block.first_key.len() as u32);
        buf.put_slice(&block.first_key);
    }
}

fn encode_trailer(buf: &mut BytesMut, index_offset: u64, blocks: &[BlockMeta], rows: u64) {
    let start = buf.len();
    buf.put_u64(index_offset);
    buf.put_u32(blocks.len() as u32);
    buf.put_u64(rows);
    buf.put_u8(FORMAT_VERSION);
    buf.put_slice(MAGIC);
    debug_assert_eq!(buf.len() - start, TRAILER_LEN);
}
