use super::format::HuffmanHeader;
use super::tree::{HuffmanTree, NodeKind};
use crate::bits::BitReader;
use crate::error::{Error, Result};

/// Decode a plain Huffman stream
///
/// The tree is rebuilt from the transmitted frequencies, then the payload
/// is walked one bit at a time until the declared bit length is consumed.
/// Bytes after the payload are ignored.
pub fn decode(data: &[u8]) -> Result<Vec<u8>> {
    let header = HuffmanHeader::parse(data)?;
    let tree = HuffmanTree::build(&header.frequencies)?;

    let expected = usize::try_from(header.original_len)
        .map_err(|_| Error::Corrupt("original length exceeds address space"))?;
    let payload = &data[header.header_len()..];
    let mut reader = BitReader::with_bit_len(payload, header.payload_bits)?;

    // Every symbol costs at least one bit, which bounds the allocation
    let capacity = expected.min(usize::try_from(header.payload_bits).unwrap_or(usize::MAX));
    let mut out = Vec::with_capacity(capacity);

    let root = tree.root();
    while !reader.is_exhausted() {
        let symbol = match tree.node(root).kind {
            NodeKind::Leaf(symbol) => {
                // Single-symbol stream: every code is the one bit `0`
                if reader.read_bit()? {
                    return Err(Error::Corrupt("invalid code in single-symbol stream"));
                }
                symbol
            }
            NodeKind::Internal { .. } => walk(&tree, &mut reader)?,
        };

        if out.len() >= expected {
            return Err(Error::Corrupt("more symbols than declared length"));
        }
        out.push(symbol);
    }

    if out.len() != expected {
        return Err(Error::Corrupt("decoded length does not match header"));
    }

    Ok(out)
}

/// Descend from the root to a leaf, one payload bit per edge
#[inline]
fn walk(tree: &HuffmanTree, reader: &mut BitReader<'_>) -> Result<u8> {
    let mut node = tree.root();
    loop {
        match tree.node(node).kind {
            NodeKind::Leaf(symbol) => return Ok(symbol),
            NodeKind::Internal { left, right } => {
                let bit = reader
                    .read_bit()
                    .map_err(|_| Error::Corrupt("bitstream ends inside a code"))?;
                node = if bit { right } else { left };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::huffman::encode;
    use crate::huffman::format::PAYLOAD_BITS_OFFSET;

    fn set_payload_bits(stream: &mut [u8], bits: u64) {
        stream[PAYLOAD_BITS_OFFSET..PAYLOAD_BITS_OFFSET + 8].copy_from_slice(&bits.to_be_bytes());
    }

    #[test]
    fn test_roundtrip_example() {
        let data = b"AAAABBBCCD";
        assert_eq!(decode(&encode(data).unwrap()).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_single_symbol() {
        let data = vec![0x41; 1000];
        assert_eq!(decode(&encode(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn test_roundtrip_single_byte() {
        assert_eq!(decode(&encode(&[0]).unwrap()).unwrap(), vec![0]);
    }

    #[test]
    fn test_roundtrip_all_bytes() {
        let data: Vec<u8> = (0..20_000u32).map(|i| ((i * 31) ^ (i >> 3)) as u8).collect();
        assert_eq!(decode(&encode(&data).unwrap()).unwrap(), data);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let data = b"trailing garbage is fine";
        let mut stream = encode(data).unwrap();
        stream.extend_from_slice(&[0xFF; 7]);
        assert_eq!(decode(&stream).unwrap(), data);
    }

    #[test]
    fn test_truncated_payload_is_corrupt() {
        let stream = encode(b"AAAABBBCCD").unwrap();
        let err = decode(&stream[..stream.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::Corrupt(_)), "{err}");
    }

    #[test]
    fn test_truncated_header() {
        let stream = encode(b"AAAABBBCCD").unwrap();
        let err = decode(&stream[..30]).unwrap_err();
        assert!(matches!(err, Error::Truncated { .. }), "{err}");
    }

    #[test]
    fn test_payload_ends_inside_code() {
        // Drop the final bit of D's code (110)
        let mut stream = encode(b"AAAABBBCCD").unwrap();
        set_payload_bits(&mut stream, 18);
        assert!(matches!(decode(&stream), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_extra_symbols_detected() {
        // Claim one more bit: the padding decodes as an extra 'A'
        let mut stream = encode(b"AAAABBBCCD").unwrap();
        set_payload_bits(&mut stream, 20);
        assert!(matches!(decode(&stream), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_missing_symbols_detected() {
        let mut stream = encode(b"AAAABBBCCD").unwrap();
        set_payload_bits(&mut stream, 16);
        assert!(matches!(decode(&stream), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_single_symbol_rejects_one_bits() {
        let mut stream = encode(&[7, 7, 7]).unwrap();
        let last = stream.len() - 1;
        stream[last] = 0x20;
        assert!(matches!(decode(&stream), Err(Error::Corrupt(_))));
    }

    #[test]
    fn test_bad_format() {
        let mut stream = encode(b"hello").unwrap();
        stream[0] ^= 0xFF;
        assert!(matches!(decode(&stream), Err(Error::BadFormat(_))));
    }
}
