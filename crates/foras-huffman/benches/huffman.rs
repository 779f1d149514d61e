//! Huffman codec benchmarks.
//!
//! Compares the histogram ladder, the three span encoders, and the table
//! decoder across payloads with different entropy profiles.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use foras_huffman::{
    code_lengths, compressed_size_in_bits, decode_span, dict_from_lengths, encode_span,
    encode_span_chunked, encode_span_two_pass, histogram, histogram_fast, histogram_parallel,
    histogram_parallel_wide, huffman_dict, huffman_tree, limit_code_lengths, Dict, MAX_CODE_BITS,
};

// ============================================================================
// Test Data Generators
// ============================================================================

fn generate_text_data(size: usize) -> Vec<u8> {
    let pattern = b"The quick brown fox jumps over the lazy dog. ";
    let mut result = Vec::with_capacity(size);
    while result.len() < size {
        result.extend_from_slice(pattern);
    }
    result.truncate(size);
    result
}

fn generate_binary_data(size: usize) -> Vec<u8> {
    let pattern: Vec<u8> = (0..=255).collect();
    let mut result = Vec::with_capacity(size);
    while result.len() < size {
        result.extend_from_slice(&pattern);
    }
    result.truncate(size);
    result
}

fn generate_skewed_data(size: usize) -> Vec<u8> {
    // 90% one symbol, the rest spread over a small alphabet.
    (0..size)
        .map(|i| if i % 10 == 0 { (i % 7) as u8 + 1 } else { 0 })
        .collect()
}

fn build_dict(data: &[u8]) -> Dict {
    let raw = huffman_dict(&huffman_tree(&histogram(data)));
    let mut lengths = code_lengths(&raw);
    limit_code_lengths(&mut lengths, MAX_CODE_BITS);
    dict_from_lengths(&lengths)
}

// ============================================================================
// Histogram Benchmarks
// ============================================================================

fn bench_histogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram");

    for size in [64 * 1024, 1024 * 1024, 16 * 1024 * 1024] {
        let data = generate_binary_data(size);
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(BenchmarkId::new("scalar", size), &data, |b, data| {
            b.iter(|| histogram(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &data, |b, data| {
            b.iter(|| histogram_parallel(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("parallel_wide", size), &data, |b, data| {
            b.iter(|| histogram_parallel_wide(black_box(data)))
        });
        group.bench_with_input(BenchmarkId::new("fast", size), &data, |b, data| {
            b.iter(|| histogram_fast(black_box(data)))
        });
    }

    group.finish();
}

// ============================================================================
// Encoder Benchmarks
// ============================================================================

fn bench_encoders(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_span");

    for (name, data) in [
        ("text", generate_text_data(4 * 1024 * 1024)),
        ("skewed", generate_skewed_data(4 * 1024 * 1024)),
    ] {
        let dict = build_dict(&data);
        let bits = compressed_size_in_bits(&histogram(&data), &dict);
        let dst_len = bits.div_ceil(8) as usize;
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_with_input(BenchmarkId::new("scalar", name), &data, |b, data| {
            b.iter(|| {
                let mut dst = vec![0u8; dst_len];
                encode_span(black_box(data), &mut dst, &dict).unwrap();
                dst
            })
        });
        group.bench_with_input(BenchmarkId::new("chunked", name), &data, |b, data| {
            b.iter(|| {
                let mut dst = vec![0u8; dst_len];
                encode_span_chunked(black_box(data), &mut dst, &dict).unwrap();
                dst
            })
        });
        group.bench_with_input(BenchmarkId::new("two_pass", name), &data, |b, data| {
            b.iter(|| {
                let mut dst = vec![0u8; dst_len];
                encode_span_two_pass(black_box(data), &mut dst, &dict).unwrap();
                dst
            })
        });
    }

    group.finish();
}

// ============================================================================
// Decoder Benchmarks
// ============================================================================

fn bench_decoder(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_span");

    for (name, data) in [
        ("text", generate_text_data(4 * 1024 * 1024)),
        ("skewed", generate_skewed_data(4 * 1024 * 1024)),
    ] {
        let dict = build_dict(&data);
        let bits = compressed_size_in_bits(&histogram(&data), &dict);
        let mut compressed = vec![0u8; bits.div_ceil(8) as usize];
        encode_span(&data, &mut compressed, &dict).unwrap();
        group.throughput(Throughput::Bytes(data.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("table", name),
            &compressed,
            |b, compressed| {
                b.iter(|| {
                    let mut dst = vec![0u8; data.len()];
                    decode_span(black_box(compressed), bits, &mut dst, &dict).unwrap();
                    dst
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_histogram, bench_encoders, bench_decoder);
criterion_main!(benches);
