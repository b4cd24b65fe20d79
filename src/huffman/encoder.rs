use super::format::{HuffmanHeader, PAYLOAD_BITS_OFFSET};
use super::frequency::FrequencyTable;
use super::tree::HuffmanTree;
use crate::bits::BitWriter;
use crate::error::Result;

/// Output capacity for encoding `input_len` bytes behind a header of `header_len` bytes
pub fn max_encoded_len(header_len: usize, input_len: usize) -> usize {
    header_len + 2 * input_len + 512
}

/// Encode `data` as a plain Huffman stream
///
/// Fails with [`crate::Error::NoSymbols`] on empty input and with
/// [`crate::Error::Overflow`] if the payload outgrows the output bound.
pub fn encode(data: &[u8]) -> Result<Vec<u8>> {
    let frequencies = FrequencyTable::from_bytes(data);
    let tree = HuffmanTree::build(&frequencies)?;
    let codes = tree.code_table();

    let header = HuffmanHeader::new(data.len() as u64, frequencies);
    let header_len = header.header_len();
    let mut writer = BitWriter::with_capacity(max_encoded_len(header_len, data.len()));

    // Payload bit length is patched once the payload is written
    header.write(&mut writer)?;
    debug_assert_eq!(writer.len(), header_len);

    for &byte in data {
        let code = codes.get(byte);
        debug_assert!(!code.is_empty(), "used symbol without a code");
        writer.write_bits(code.as_bytes(), code.len())?;
    }

    let payload_bits = writer.bit_position() - header_len as u64 * 8;
    writer.patch_u64_be(PAYLOAD_BITS_OFFSET, payload_bits)?;

    Ok(writer.finish())
}
