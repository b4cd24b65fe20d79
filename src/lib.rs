pub mod bits;
pub mod error;
pub mod huffman;
pub mod partition;
pub mod queue;

pub use error::{Error, Result};
pub use partition::{
    detect_format, inspect, is_bitdiet, BlockPartitioner, PartitionConfig, PartitionStats,
    StreamFormat, StreamInfo,
};
pub use queue::{HeapContext, IndexedPriorityQueue};

/// Compress `data` into a block-partitioned stream with the default configuration
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    BlockPartitioner::default().compress(data)
}

/// Decompress a block-partitioned or plain Huffman stream
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    BlockPartitioner::default().decompress(data)
}
