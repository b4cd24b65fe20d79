//! Block-partitioned envelope.
//!
//! Input is split into fixed-size blocks, each coded as an independent
//! plain Huffman stream on a worker pool. Placement is sequential: offsets
//! are computed only after every block has been processed.

pub mod block;
pub mod constants;
pub mod detector;
pub mod parallel;

pub use block::BlockDescriptor;
pub use constants::{BITDIET_FORMAT, DEFAULT_BLOCK_SIZE};
pub use detector::{detect_format, inspect, is_bitdiet, BlockInfo, StreamFormat, StreamInfo};

use crate::error::{Error, Result};
use crate::huffman;
use block::{place_outputs, read_block_table, split_blocks, write_envelope_header};
use constants::{envelope_header_len, MAX_THREADS};
use parallel::{map_blocks, scatter};

/// Configuration for block partitioning
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PartitionConfig {
    /// Uncompressed bytes per block (default: 32 KiB)
    pub block_size: usize,
    /// Number of worker threads (0 = auto, 1 = calling thread only)
    pub num_threads: usize,
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self { block_size: DEFAULT_BLOCK_SIZE, num_threads: 0 }
    }
}

/// Statistics from a compress or decompress call
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PartitionStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    /// Blocks processed (1 for a plain Huffman stream)
    pub blocks: u64,
}

/// Compresses and decompresses block-partitioned streams
#[derive(Clone, Debug, Default)]
pub struct BlockPartitioner {
    config: PartitionConfig,
}

impl BlockPartitioner {
    pub fn new(config: PartitionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PartitionConfig {
        &self.config
    }

    fn effective_threads(&self) -> usize {
        match self.config.num_threads {
            0 => num_cpus::get().clamp(1, MAX_THREADS),
            n => n.clamp(1, MAX_THREADS),
        }
    }

    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.compress_with_stats(data).map(|(out, _)| out)
    }

    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        self.decompress_with_stats(data).map(|(out, _)| out)
    }

    /// Compress `data` into an envelope of independently coded blocks
    ///
    /// Fails with [`Error::NoSymbols`] on empty input. If any block fails,
    /// nothing is returned but the error.
    pub fn compress_with_stats(&self, data: &[u8]) -> Result<(Vec<u8>, PartitionStats)> {
        if self.config.block_size == 0 {
            return Err(Error::InvalidConfig("block size must be non-zero".to_string()));
        }
        if data.is_empty() {
            return Err(Error::NoSymbols);
        }

        let num_threads = self.effective_threads();
        let mut blocks = split_blocks(data.len(), self.config.block_size);
        log::debug!(
            "compressing {} bytes as {} blocks on {} threads",
            data.len(),
            blocks.len(),
            num_threads
        );

        let inputs: Vec<&[u8]> = blocks.iter().map(|b| &data[b.input_range()]).collect();
        let outputs = map_blocks(&inputs, num_threads, huffman::encode)?;

        let header_len = envelope_header_len(blocks.len());
        let total = place_outputs(&mut blocks, outputs, header_len)?;

        let mut out = vec![0u8; total];
        write_envelope_header(&mut out, &blocks)?;
        scatter(&mut out, &blocks, num_threads)?;

        let stats = PartitionStats {
            input_bytes: data.len() as u64,
            output_bytes: out.len() as u64,
            blocks: blocks.len() as u64,
        };
        Ok((out, stats))
    }

    /// Decompress an envelope or a plain Huffman stream
    ///
    /// A buffer starting with the plain Huffman tag is decoded as a single
    /// unpartitioned stream.
    pub fn decompress_with_stats(&self, data: &[u8]) -> Result<(Vec<u8>, PartitionStats)> {
        match detect_format(data)? {
            StreamFormat::Huffman => {
                let out = huffman::decode(data)?;
                let stats = PartitionStats {
                    input_bytes: data.len() as u64,
                    output_bytes: out.len() as u64,
                    blocks: 1,
                };
                Ok((out, stats))
            }
            StreamFormat::Bitdiet => self.decompress_blocks(data),
        }
    }

    fn decompress_blocks(&self, data: &[u8]) -> Result<(Vec<u8>, PartitionStats)> {
        let num_threads = self.effective_threads();
        let mut blocks = read_block_table(data)?;
        log::debug!("decompressing {} blocks on {} threads", blocks.len(), num_threads);

        let inputs: Vec<&[u8]> = blocks.iter().map(|b| &data[b.input_range()]).collect();
        let outputs = map_blocks(&inputs, num_threads, huffman::decode)?;

        let total = place_outputs(&mut blocks, outputs, 0)?;
        let mut out = vec![0u8; total];
        scatter(&mut out, &blocks, num_threads)?;

        let stats = PartitionStats {
            input_bytes: data.len() as u64,
            output_bytes: out.len() as u64,
            blocks: blocks.len() as u64,
        };
        Ok((out, stats))
    }
}
