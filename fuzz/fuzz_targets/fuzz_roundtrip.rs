#![no_main]

use bitdiet::{BlockPartitioner, PartitionConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the block size so small inputs still span several blocks
    let Some((&selector, input)) = data.split_first() else {
        return;
    };
    if input.is_empty() {
        return;
    }

    let config = PartitionConfig { block_size: selector as usize + 1, num_threads: 2 };
    let partitioner = BlockPartitioner::new(config);
    let stream = partitioner.compress(input).expect("non-empty input must compress");
    let output = partitioner.decompress(&stream).expect("own output must decompress");
    assert_eq!(output, input);
});
