//! Block descriptors and the envelope offset table.
//!
//! Envelope layout (all integers big-endian):
//! - format tag: u16 (`0x1005`)
//! - block count M: u64
//! - M block offsets: u64, each the start of a plain Huffman stream
//! - M concatenated plain Huffman streams

use std::ops::Range;

use super::constants::{
    envelope_header_len, BITDIET_FORMAT, ENVELOPE_FIXED_SIZE, OFFSET_ENTRY_SIZE,
};
use crate::error::{Error, Result};
use crate::huffman::format::{read_u16_be, read_u64_be, truncated};

/// One independently coded block
///
/// The input range is known before the block is processed; the output
/// range and data are filled in once every block has finished, because
/// each block's position depends on the sizes of the blocks before it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub input_offset: usize,
    pub input_len: usize,
    pub output_offset: usize,
    pub output_len: usize,
    /// Processed bytes awaiting placement in the final buffer
    pub data: Option<Vec<u8>>,
}

impl BlockDescriptor {
    pub fn new(input_offset: usize, input_len: usize) -> Self {
        Self { input_offset, input_len, ..Default::default() }
    }

    pub fn input_range(&self) -> Range<usize> {
        self.input_offset..self.input_offset + self.input_len
    }

    pub fn output_range(&self) -> Range<usize> {
        self.output_offset..self.output_offset + self.output_len
    }
}

/// Split `len` input bytes into blocks of `block_size` (last one shorter)
pub fn split_blocks(len: usize, block_size: usize) -> Vec<BlockDescriptor> {
    debug_assert!(block_size > 0);
    (0..len)
        .step_by(block_size)
        .map(|start| BlockDescriptor::new(start, block_size.min(len - start)))
        .collect()
}

/// Attach processed outputs and lay them out back to back from `base`
///
/// Returns the end offset of the last block.
pub fn place_outputs(
    blocks: &mut [BlockDescriptor],
    outputs: Vec<Vec<u8>>,
    base: usize,
) -> Result<usize> {
    if blocks.len() != outputs.len() {
        return Err(Error::Internal(format!(
            "{} outputs for {} blocks",
            outputs.len(),
            blocks.len()
        )));
    }

    let mut offset = base;
    for (block, output) in blocks.iter_mut().zip(outputs) {
        block.output_offset = offset;
        block.output_len = output.len();
        block.data = Some(output);
        offset = offset
            .checked_add(block.output_len)
            .ok_or_else(|| Error::Internal("output size overflows usize".to_string()))?;
    }
    Ok(offset)
}

/// Write the envelope header for already-placed blocks into `out`
pub fn write_envelope_header(out: &mut [u8], blocks: &[BlockDescriptor]) -> Result<()> {
    let header_len = envelope_header_len(blocks.len());
    if out.len() < header_len {
        return Err(Error::Overflow { capacity: out.len() });
    }

    out[..2].copy_from_slice(&BITDIET_FORMAT.to_be_bytes());
    out[2..ENVELOPE_FIXED_SIZE].copy_from_slice(&(blocks.len() as u64).to_be_bytes());
    let entries = out[ENVELOPE_FIXED_SIZE..header_len].chunks_exact_mut(OFFSET_ENTRY_SIZE);
    for (entry, block) in entries.zip(blocks) {
        entry.copy_from_slice(&(block.output_offset as u64).to_be_bytes());
    }
    Ok(())
}

/// Parse the envelope offset table into blocks whose input ranges are the
/// embedded Huffman streams
///
/// Each block runs from its offset to the next block's offset; the last
/// one runs to the end of `data`.
pub fn read_block_table(data: &[u8]) -> Result<Vec<BlockDescriptor>> {
    let tag = read_u16_be(data, 0).ok_or_else(|| truncated(2, data.len()))?;
    if tag != BITDIET_FORMAT {
        return Err(Error::BadFormat(tag));
    }
    let count =
        read_u64_be(data, 2).ok_or_else(|| truncated(ENVELOPE_FIXED_SIZE as u64, data.len()))?;
    if count == 0 {
        return Err(Error::Corrupt("envelope has no blocks"));
    }

    let available_entries = (data.len() - ENVELOPE_FIXED_SIZE) / OFFSET_ENTRY_SIZE;
    if count > available_entries as u64 {
        let needed = count
            .saturating_mul(OFFSET_ENTRY_SIZE as u64)
            .saturating_add(ENVELOPE_FIXED_SIZE as u64);
        return Err(truncated(needed, data.len()));
    }
    let count = count as usize;
    let header_len = envelope_header_len(count);

    let mut offsets = Vec::with_capacity(count);
    for entry in data[ENVELOPE_FIXED_SIZE..header_len].chunks_exact(OFFSET_ENTRY_SIZE) {
        let offset = read_u64_be(entry, 0).ok_or_else(|| truncated(header_len as u64, data.len()))?;
        let offset =
            usize::try_from(offset).map_err(|_| Error::Corrupt("block offset out of range"))?;
        if offset < header_len || offset > data.len() {
            return Err(Error::Corrupt("block offset out of range"));
        }
        if offsets.last().is_some_and(|&prev| offset < prev) {
            return Err(Error::Corrupt("block offsets are not ascending"));
        }
        offsets.push(offset);
    }

    let ends = offsets.iter().skip(1).copied().chain(std::iter::once(data.len()));
    Ok(offsets
        .iter()
        .zip(ends)
        .map(|(&start, end)| BlockDescriptor::new(start, end - start))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_exact_multiple() {
        let blocks = split_blocks(4 * 100, 100);
        assert_eq!(blocks.len(), 4);
        assert!(blocks.iter().all(|b| b.input_len == 100));
        assert_eq!(blocks[3].input_range(), 300..400);
    }

    #[test]
    fn test_split_remainder() {
        let blocks = split_blocks(401, 100);
        assert_eq!(blocks.len(), 5);
        assert_eq!(blocks[4].input_range(), 400..401);
    }

    #[test]
    fn test_split_small_and_empty() {
        assert_eq!(split_blocks(7, 100).len(), 1);
        assert!(split_blocks(0, 100).is_empty());
    }

    #[test]
    fn test_place_outputs() {
        let mut blocks = split_blocks(30, 10);
        let end = place_outputs(&mut blocks, vec![vec![1; 4], vec![2; 6], vec![3; 1]], 34).unwrap();
        assert_eq!(end, 45);
        assert_eq!(blocks[0].output_range(), 34..38);
        assert_eq!(blocks[1].output_range(), 38..44);
        assert_eq!(blocks[2].output_range(), 44..45);
        assert_eq!(blocks[2].data.as_deref(), Some(&[3u8][..]));
    }

    #[test]
    fn test_place_outputs_count_mismatch() {
        let mut blocks = split_blocks(30, 10);
        assert!(place_outputs(&mut blocks, vec![vec![1]], 0).is_err());
    }

    #[test]
    fn test_header_and_table_roundtrip() {
        let mut blocks = split_blocks(20, 10);
        let header_len = envelope_header_len(2);
        let outputs = vec![vec![0xAA; 3], vec![0xBB; 5]];
        let end = place_outputs(&mut blocks, outputs, header_len).unwrap();

        let mut out = vec![0u8; end];
        write_envelope_header(&mut out, &blocks).unwrap();
        assert_eq!(&out[..2], &[0x10, 0x05]);

        let table = read_block_table(&out).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].input_range(), header_len..header_len + 3);
        assert_eq!(table[1].input_range(), header_len + 3..header_len + 8);
    }

    fn envelope(count: u64, offsets: &[u64], total: usize) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&BITDIET_FORMAT.to_be_bytes());
        out.extend_from_slice(&count.to_be_bytes());
        for off in offsets {
            out.extend_from_slice(&off.to_be_bytes());
        }
        out.resize(total.max(out.len()), 0);
        out
    }

    #[test]
    fn test_table_errors() {
        assert!(matches!(read_block_table(&[0x10]), Err(Error::Truncated { .. })));
        assert!(matches!(read_block_table(&[0x10, 0x05, 0]), Err(Error::Truncated { .. })));
        assert!(matches!(read_block_table(&[0x01, 0x50]), Err(Error::BadFormat(0x0150))));
        assert!(matches!(read_block_table(&envelope(0, &[], 10)), Err(Error::Corrupt(_))));

        // Declared count needs more offset entries than present
        let short = envelope(u64::MAX, &[18], 18);
        assert!(matches!(read_block_table(&short), Err(Error::Truncated { .. })));

        // Offset inside the header
        assert!(matches!(read_block_table(&envelope(1, &[4], 30)), Err(Error::Corrupt(_))));
        // Offset past the end
        assert!(matches!(read_block_table(&envelope(1, &[31], 30)), Err(Error::Corrupt(_))));
        // Descending offsets
        assert!(matches!(read_block_table(&envelope(2, &[28, 26], 40)), Err(Error::Corrupt(_))));
    }
}
