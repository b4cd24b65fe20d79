use crate::error::{Error, Result};

/// Bit-level reader over a byte slice
///
/// Reads MSB-first within each byte, matching [`super::BitWriter`]. The
/// readable range can be limited to fewer bits than the slice holds, so the
/// padding in the final byte is never interpreted as data.
pub struct BitReader<'a> {
    data: &'a [u8],
    /// Next bit to be read
    bit_pos: u64,
    /// One past the last readable bit
    bit_end: u64,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0, bit_end: data.len() as u64 * 8 }
    }

    /// Create a reader limited to the first `bit_len` bits of `data`
    ///
    /// Fails with [`Error::Corrupt`] if `data` holds fewer than `bit_len` bits.
    pub fn with_bit_len(data: &'a [u8], bit_len: u64) -> Result<Self> {
        if bit_len > data.len() as u64 * 8 {
            return Err(Error::Corrupt("payload bit length exceeds available bytes"));
        }
        Ok(Self { data, bit_pos: 0, bit_end: bit_len })
    }

    /// Read a single bit
    #[inline]
    pub fn read_bit(&mut self) -> Result<bool> {
        if self.bit_pos >= self.bit_end {
            return Err(Error::Corrupt("bitstream exhausted"));
        }
        let byte = self.data[(self.bit_pos / 8) as usize];
        let bit = byte & (0x80 >> (self.bit_pos % 8)) != 0;
        self.bit_pos += 1;
        Ok(bit)
    }

    /// Bits consumed so far
    pub fn bit_position(&self) -> u64 {
        self.bit_pos
    }

    /// Bits left before the limit
    pub fn remaining_bits(&self) -> u64 {
        self.bit_end - self.bit_pos
    }

    /// Check whether every readable bit has been consumed
    pub fn is_exhausted(&self) -> bool {
        self.bit_pos >= self.bit_end
    }
}
