/// Format tag of a block-partitioned stream
pub const BITDIET_FORMAT: u16 = 0x1005;

/// Default uncompressed block size
pub const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

/// Envelope header size before the offset table (tag + block count)
pub const ENVELOPE_FIXED_SIZE: usize = 2 + 8;

/// Size of one block offset entry
pub const OFFSET_ENTRY_SIZE: usize = 8;

/// Upper bound on worker threads
pub const MAX_THREADS: usize = 32;

/// Envelope header size for `block_count` blocks
pub fn envelope_header_len(block_count: usize) -> usize {
    ENVELOPE_FIXED_SIZE + block_count * OFFSET_ENTRY_SIZE
}
