//! Stream format detection and header inspection.
//!
//! Inspection parses the envelope and every embedded Huffman header
//! without decoding any payload.

use super::block::read_block_table;
use super::constants::BITDIET_FORMAT;
use crate::error::{Error, Result};
use crate::huffman::format::{read_u16_be, truncated};
use crate::huffman::{HuffmanHeader, HUFFMAN_FORMAT};

/// Top-level stream kind, identified by the leading 16-bit tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamFormat {
    /// A single plain Huffman stream
    Huffman,
    /// A block-partitioned envelope
    Bitdiet,
}

/// Identify the stream kind from its tag
pub fn detect_format(data: &[u8]) -> Result<StreamFormat> {
    match read_u16_be(data, 0) {
        Some(HUFFMAN_FORMAT) => Ok(StreamFormat::Huffman),
        Some(BITDIET_FORMAT) => Ok(StreamFormat::Bitdiet),
        Some(tag) => Err(Error::BadFormat(tag)),
        None => Err(truncated(2, data.len())),
    }
}

/// Quick check whether `data` starts with a known tag
pub fn is_bitdiet(data: &[u8]) -> bool {
    detect_format(data).is_ok()
}

/// Header summary of one embedded Huffman stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockInfo {
    /// Byte offset of the stream within the inspected buffer
    pub offset: usize,
    /// Compressed size in bytes
    pub compressed_len: usize,
    /// Declared decoded size in bytes
    pub original_len: u64,
    /// Number of distinct symbols in the block
    pub symbol_count: usize,
}

/// Result of inspecting a stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StreamInfo {
    pub format: StreamFormat,
    pub blocks: Vec<BlockInfo>,
}

impl StreamInfo {
    /// Declared decoded size over all blocks, `None` on overflow
    pub fn total_original_len(&self) -> Option<u64> {
        self.blocks.iter().try_fold(0u64, |acc, b| acc.checked_add(b.original_len))
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

/// Parse every header in `data` without decoding payloads
///
/// Fails on the first malformed header, with the same errors decoding
/// would report for it.
pub fn inspect(data: &[u8]) -> Result<StreamInfo> {
    let format = detect_format(data)?;
    let ranges = match format {
        StreamFormat::Huffman => vec![(0, data.len())],
        StreamFormat::Bitdiet => {
            read_block_table(data)?.iter().map(|b| (b.input_offset, b.input_len)).collect()
        }
    };

    let mut blocks = Vec::with_capacity(ranges.len());
    for (offset, len) in ranges {
        let header = HuffmanHeader::parse(&data[offset..offset + len])?;
        blocks.push(BlockInfo {
            offset,
            compressed_len: len,
            original_len: header.original_len,
            symbol_count: header.symbol_count(),
        });
    }

    Ok(StreamInfo { format, blocks })
}
