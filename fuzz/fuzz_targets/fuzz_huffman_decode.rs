#![no_main]

use bitdiet::huffman::{decode, HUFFMAN_FORMAT};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Prefix the plain tag so the fuzzer spends its time past the tag check
    let mut stream = HUFFMAN_FORMAT.to_be_bytes().to_vec();
    stream.extend_from_slice(data);

    if let Ok(output) = decode(&stream) {
        // A successful decode yields exactly the declared length
        let declared = u64::from_be_bytes(stream[2..10].try_into().unwrap());
        assert_eq!(output.len() as u64, declared);
    }
});
