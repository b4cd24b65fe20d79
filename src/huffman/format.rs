//! Plain Huffman stream (`.hff`) header.
//!
//! Layout (all integers big-endian):
//! - format tag: u16 (`0x0150`)
//! - original length in bytes: u64
//! - payload length in bits: u64
//! - used-symbol count N: u16
//! - N entries of { symbol: u8, frequency: u64 }, ascending by symbol
//! - bit-packed payload, zero-padded to a byte boundary

use super::frequency::FrequencyTable;
use crate::bits::BitWriter;
use crate::error::{Error, Result};

/// Format tag of a plain Huffman stream
pub const HUFFMAN_FORMAT: u16 = 0x0150;

/// Size of the fields preceding the symbol table
pub const FIXED_HEADER_SIZE: usize = 2 + 8 + 8 + 2;

/// Size of one { symbol, frequency } table entry
pub const SYMBOL_ENTRY_SIZE: usize = 1 + 8;

/// Byte offset of the payload bit-length field
pub const PAYLOAD_BITS_OFFSET: usize = 10;

/// Read a big-endian u16 at `offset`
pub(crate) fn read_u16_be(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

/// Read a big-endian u64 at `offset`
pub(crate) fn read_u64_be(data: &[u8], offset: usize) -> Option<u64> {
    let bytes = data.get(offset..offset.checked_add(8)?)?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    Some(u64::from_be_bytes(buf))
}

/// Error for a stream shorter than a declared structure
pub(crate) fn truncated(needed: u64, available: usize) -> Error {
    Error::Truncated { needed, available }
}

/// Parsed header of a plain Huffman stream
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HuffmanHeader {
    /// Decoded size in bytes
    pub original_len: u64,
    /// Number of meaningful payload bits
    pub payload_bits: u64,
    /// Symbol frequencies, the sole input to tree reconstruction
    pub frequencies: FrequencyTable,
}

impl HuffmanHeader {
    pub fn new(original_len: u64, frequencies: FrequencyTable) -> Self {
        Self { original_len, payload_bits: 0, frequencies }
    }

    /// Header size in bytes, including the symbol table
    pub fn header_len(&self) -> usize {
        encoded_header_len(self.frequencies.used_count())
    }

    /// Payload size in bytes
    pub fn payload_len(&self) -> u64 {
        self.payload_bits.div_ceil(8)
    }

    /// Total stream size in bytes
    pub fn stream_len(&self) -> u64 {
        self.header_len() as u64 + self.payload_len()
    }

    pub fn symbol_count(&self) -> usize {
        self.frequencies.used_count()
    }

    /// Write the header, with the current `payload_bits`, at the writer's position
    pub fn write(&self, writer: &mut BitWriter) -> Result<()> {
        let count = u16::try_from(self.symbol_count())
            .map_err(|_| Error::Internal("symbol count exceeds u16".to_string()))?;
        writer.write_u16_be(HUFFMAN_FORMAT)?;
        writer.write_u64_be(self.original_len)?;
        writer.write_u64_be(self.payload_bits)?;
        writer.write_u16_be(count)?;
        for (symbol, frequency) in self.frequencies.used() {
            writer.write_u8(symbol)?;
            writer.write_u64_be(frequency)?;
        }
        Ok(())
    }

    /// Parse and validate a header from the start of `data`
    pub fn parse(data: &[u8]) -> Result<Self> {
        let tag = read_u16_be(data, 0).ok_or_else(|| truncated(2, data.len()))?;
        if tag != HUFFMAN_FORMAT {
            return Err(Error::BadFormat(tag));
        }
        if data.len() < FIXED_HEADER_SIZE {
            return Err(truncated(FIXED_HEADER_SIZE as u64, data.len()));
        }

        let field = |offset: usize| {
            read_u64_be(data, offset).ok_or_else(|| truncated(offset as u64 + 8, data.len()))
        };
        let original_len = field(2)?;
        let payload_bits = field(PAYLOAD_BITS_OFFSET)?;
        let count = read_u16_be(data, 18).ok_or_else(|| truncated(20, data.len()))? as usize;

        if count == 0 {
            return Err(Error::Corrupt("symbol table is empty"));
        }
        if count > 256 {
            return Err(Error::Corrupt("symbol table has more than 256 entries"));
        }

        let needed = encoded_header_len(count);
        if data.len() < needed {
            return Err(truncated(needed as u64, data.len()));
        }

        let mut frequencies = FrequencyTable::new();
        for entry in data[FIXED_HEADER_SIZE..needed].chunks_exact(SYMBOL_ENTRY_SIZE) {
            let symbol = entry[0];
            let frequency =
                read_u64_be(entry, 1).ok_or_else(|| truncated(needed as u64, data.len()))?;
            if frequency == 0 {
                return Err(Error::Corrupt("symbol table entry with zero frequency"));
            }
            if frequencies.get(symbol) != 0 {
                return Err(Error::Corrupt("duplicate symbol in table"));
            }
            frequencies.set(symbol, frequency);
        }

        if frequencies.total() != Some(original_len) {
            return Err(Error::Corrupt("symbol frequencies do not sum to original length"));
        }

        Ok(Self { original_len, payload_bits, frequencies })
    }
}

/// Header size for a table with `symbol_count` entries
pub fn encoded_header_len(symbol_count: usize) -> usize {
    FIXED_HEADER_SIZE + symbol_count * SYMBOL_ENTRY_SIZE
}
