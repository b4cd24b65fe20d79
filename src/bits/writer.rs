use crate::error::{Error, Result};

/// Bit-level writer over a fixed-capacity, zero-filled byte buffer
///
/// Bits are written MSB-first within each byte: stream bit `i` lands in
/// byte `i / 8` under mask `0x80 >> (i % 8)`. Patterns passed to
/// [`BitWriter::write_bits`] use the same layout, so a byte-aligned write
/// is a plain copy.
pub struct BitWriter {
    /// Destination buffer, always `capacity` bytes long
    output: Vec<u8>,
    /// Next bit to be written
    bit_pos: u64,
}

impl BitWriter {
    pub fn with_capacity(capacity: usize) -> Self {
        Self { output: vec![0; capacity], bit_pos: 0 }
    }

    /// Write the first `length` bits of `pattern`
    ///
    /// Bits of `pattern` past `length` are ignored. Fails with
    /// [`Error::Overflow`] if the write would run past the buffer end; in
    /// that case nothing is written.
    pub fn write_bits(&mut self, pattern: &[u8], length: usize) -> Result<()> {
        if length == 0 {
            return Ok(());
        }

        let nbytes = length.div_ceil(8);
        debug_assert!(pattern.len() >= nbytes, "pattern shorter than length");

        let end_bit = self.bit_pos + length as u64;
        if end_bit.div_ceil(8) > self.output.len() as u64 {
            return Err(Error::Overflow { capacity: self.output.len() });
        }

        let start = (self.bit_pos / 8) as usize;
        let shift = (self.bit_pos % 8) as u32;
        let tail_mask = match length % 8 {
            0 => 0xFF,
            tail => 0xFFu8 << (8 - tail),
        };

        if shift == 0 {
            // Aligned fast path: whole-byte copy, then clear bits past `length`
            self.output[start..start + nbytes].copy_from_slice(&pattern[..nbytes]);
            self.output[start + nbytes - 1] &= tail_mask;
        } else {
            for (i, &byte) in pattern[..nbytes].iter().enumerate() {
                let byte = if i == nbytes - 1 { byte & tail_mask } else { byte };
                self.output[start + i] |= byte >> shift;
                // Only bits inside `length` can be set here, so a non-zero
                // spill is always within the bounds checked above
                let spill = byte << (8 - shift);
                if spill != 0 {
                    self.output[start + i + 1] |= spill;
                }
            }
        }

        self.bit_pos = end_bit;
        Ok(())
    }

    /// Write a single bit
    #[inline]
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.write_bits(&[if bit { 0x80 } else { 0 }], 1)
    }

    /// Write raw bytes at the current bit position
    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_bits(bytes, bytes.len() * 8)
    }

    pub fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    /// Write a 16-bit value in big-endian
    pub fn write_u16_be(&mut self, value: u16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Write a 64-bit value in big-endian
    pub fn write_u64_be(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Overwrite an already-written, byte-aligned 64-bit big-endian field
    pub fn patch_u64_be(&mut self, byte_offset: usize, value: u64) -> Result<()> {
        let end = byte_offset + 8;
        if end > self.len() {
            return Err(Error::Internal(format!(
                "patch at {byte_offset} outside written range {}",
                self.len()
            )));
        }
        self.output[byte_offset..end].copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    /// Number of bits written so far
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }

    /// Whether the cursor sits on a byte boundary
    pub fn is_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Total buffer capacity in bytes
    pub fn capacity(&self) -> usize {
        self.output.len()
    }

    /// Get current output length in bytes (including partial byte)
    pub fn len(&self) -> usize {
        self.bit_pos.div_ceil(8) as usize
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bit_pos == 0
    }

    /// Peek at the written bytes (including partial byte)
    pub fn as_bytes(&self) -> &[u8] {
        &self.output[..self.len()]
    }

    /// Finish and return the output truncated to its logical length
    pub fn finish(mut self) -> Vec<u8> {
        let len = self.len();
        self.output.truncate(len);
        self.output.shrink_to_fit();
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_aligned_bytes() {
        let mut writer = BitWriter::with_capacity(4);
        writer.write_u16_be(0x1234).unwrap();
        assert!(writer.is_aligned());
        assert_eq!(writer.finish(), vec![0x12, 0x34]);
    }

    #[test]
    fn test_write_bits_msb_first() {
        let mut writer = BitWriter::with_capacity(1);
        writer.write_bits(&[0b1100_0000], 3).unwrap(); // 110
        writer.write_bits(&[0b1010_0000], 5).unwrap(); // 10100
        assert_eq!(writer.finish(), vec![0b1101_0100]);
    }

    #[test]
    fn test_write_cross_byte() {
        let mut writer = BitWriter::with_capacity(2);
        writer.write_bits(&[0b1000_0000], 1).unwrap();
        writer.write_bits(&[0xFF, 0xF0], 12).unwrap(); // 12 ones
        assert_eq!(writer.bit_position(), 13);
        assert_eq!(writer.finish(), vec![0xFF, 0xF8]);
    }

    #[test]
    fn test_pattern_bits_past_length_ignored() {
        let mut writer = BitWriter::with_capacity(2);
        writer.write_bits(&[0xFF], 2).unwrap();
        writer.write_bits(&[0xFF], 1).unwrap();
        writer.write_bits(&[0x00], 5).unwrap();
        assert_eq!(writer.finish(), vec![0b1110_0000]);
    }

    #[test]
    fn test_write_up_to_final_byte() {
        let mut writer = BitWriter::with_capacity(1);
        writer.write_bits(&[0b1010_0000], 3).unwrap();
        writer.write_bits(&[0b1111_1000], 5).unwrap();
        assert_eq!(writer.len(), 1);
        assert_eq!(writer.as_bytes(), &[0b1011_1111]);
    }

    #[test]
    fn test_overflow() {
        let mut writer = BitWriter::with_capacity(1);
        writer.write_bits(&[0xFF], 7).unwrap();
        let err = writer.write_bits(&[0xC0], 2).unwrap_err();
        assert!(matches!(err, Error::Overflow { capacity: 1 }));
        // Failed write leaves the cursor untouched
        assert_eq!(writer.bit_position(), 7);
    }

    #[test]
    fn test_patch_u64_be() {
        let mut writer = BitWriter::with_capacity(16);
        writer.write_u64_be(0).unwrap();
        writer.write_u8(0xAA).unwrap();
        writer.patch_u64_be(0, 0x0102030405060708).unwrap();
        assert_eq!(writer.finish(), vec![1, 2, 3, 4, 5, 6, 7, 8, 0xAA]);
    }

    #[test]
    fn test_patch_outside_written_range() {
        let mut writer = BitWriter::with_capacity(16);
        writer.write_u8(0).unwrap();
        assert!(writer.patch_u64_be(0, 1).is_err());
    }
}
