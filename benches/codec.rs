//! Benchmarks for bitdiet compression and decompression throughput.
//!
//! Tests various data patterns, sizes and thread counts.

use bitdiet::{huffman, inspect, BlockPartitioner, PartitionConfig};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Generate random (incompressible) data
fn generate_random_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state = 0x9E37_79B9_7F4A_7C15u64;
    for _ in 0..size {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        data.push((state & 0xFF) as u8);
    }
    data
}

/// Generate DNA-like data (4 character alphabet, some patterns)
fn generate_dna_data(size: usize) -> Vec<u8> {
    let bases = [b'A', b'C', b'G', b'T'];
    let mut data = Vec::with_capacity(size);
    let mut state = 0x2545_F491_4F6C_DD1Du64;

    // Mix of random and repetitive regions
    let mut i = 0;
    while data.len() < size {
        if i % 1000 == 0 {
            for _ in 0..5 {
                data.extend_from_slice(b"ATATATATAT");
            }
        } else {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            data.push(bases[(state % 4) as usize]);
        }
        i += 1;
    }
    data.truncate(size);
    data
}

/// Generate FASTQ-like data
fn generate_fastq_data(num_reads: usize, read_length: usize) -> Vec<u8> {
    let sequence = generate_dna_data(num_reads * read_length);
    let mut data = Vec::new();
    for (i, read) in sequence.chunks(read_length).enumerate() {
        data.extend_from_slice(format!("@read_{}\n", i).as_bytes());
        data.extend_from_slice(read);
        data.extend_from_slice(b"\n+\n");
        data.extend(read.iter().map(|b| b"I?5+"[(*b as usize) % 4]));
        data.push(b'\n');
    }
    data
}

fn partitioner(num_threads: usize) -> BlockPartitioner {
    BlockPartitioner::new(PartitionConfig { num_threads, ..Default::default() })
}

fn bench_plain(c: &mut Criterion) {
    let mut group = c.benchmark_group("plain");

    for size in [1024, 64 * 1024, 256 * 1024].iter() {
        let data = generate_dna_data(*size);
        let stream = huffman::encode(&data).unwrap();

        group.throughput(Throughput::Bytes(*size as u64));
        group.bench_with_input(BenchmarkId::new("encode", size), &data, |b, data| {
            b.iter(|| huffman::encode(data).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decode", size), &stream, |b, stream| {
            b.iter(|| huffman::decode(stream).unwrap());
        });
    }

    group.finish();
}

fn bench_parallel(c: &mut Criterion) {
    let mut group = c.benchmark_group("parallel");

    // Test with 4MB of data at different thread counts
    let size = 4 * 1024 * 1024;
    let data = generate_dna_data(size);
    let stream = partitioner(1).compress(&data).unwrap();

    group.throughput(Throughput::Bytes(size as u64));

    for threads in [1, 2, 4, 8].iter() {
        let p = partitioner(*threads);
        group.bench_with_input(BenchmarkId::new("compress", threads), &data, |b, data| {
            b.iter(|| p.compress(data).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("decompress", threads), &stream, |b, stream| {
            b.iter(|| p.decompress(stream).unwrap());
        });
    }

    group.finish();
}

fn bench_data_patterns(c: &mut Criterion) {
    let mut group = c.benchmark_group("data_patterns");
    let size = 256 * 1024;
    let p = partitioner(0);

    let patterns = [
        ("random", generate_random_data(size)),
        ("dna", generate_dna_data(size)),
        ("fastq", generate_fastq_data(size / 150, 150)),
    ];

    for (name, data) in patterns.iter() {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(*name, |b| {
            b.iter(|| p.compress(data).unwrap());
        });
    }

    group.finish();
}

fn bench_inspect(c: &mut Criterion) {
    let mut group = c.benchmark_group("inspect");

    let data = generate_dna_data(1024 * 1024);
    let stream = partitioner(0).compress(&data).unwrap();

    group.bench_function("headers_only", |b| {
        b.iter(|| inspect(&stream).unwrap());
    });

    group.finish();
}

criterion_group!(benches, bench_plain, bench_parallel, bench_data_patterns, bench_inspect,);
criterion_main!(benches);
