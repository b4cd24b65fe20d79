#![no_main]

use bitdiet::{decompress, inspect};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Malformed input must be rejected with an error, never a panic
    let inspected = inspect(data);
    let decoded = decompress(data);

    // Anything that decodes must also have parseable headers
    if decoded.is_ok() {
        assert!(inspected.is_ok());
    }
});
