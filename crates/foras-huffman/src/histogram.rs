//! Byte-frequency histograms.
//!
//! Four variants with identical results and different optimization levels:
//!
//! | Function                  | Parallelism | 64-bit loading | Vectorized merge |
//! |---------------------------|-------------|----------------|------------------|
//! | `histogram`               | no          | no             | no               |
//! | `histogram_parallel`      | yes         | no             | no               |
//! | `histogram_parallel_wide` | yes         | yes            | no               |
//! | `histogram_fast`          | yes         | yes            | yes              |
//!
//! The parallel variants partition the input into one contiguous chunk per
//! worker; each chunk is counted into a private 256-bin vector and the
//! vectors are reduced bin-wise on the calling thread after the join. The
//! partition points are a pure function of input length and team size, so
//! the result is deterministic.

use rayon::prelude::*;

/// Number of bins: one per byte value.
pub const NUM_BINS: usize = 256;

/// A 256-bin byte-frequency vector. The sum of all bins equals the length
/// of the counted input.
pub type Histogram = [u64; NUM_BINS];

/// Size of the worker team used by the parallel variants.
#[inline]
pub fn max_threads() -> usize {
    rayon::current_num_threads()
}

/// One pass, one counter per byte.
pub fn histogram(data: &[u8]) -> Histogram {
    count_bytes(data)
}

/// Partition across the worker team, count privately, reduce bin-wise.
pub fn histogram_parallel(data: &[u8]) -> Histogram {
    let partials: Vec<Histogram> = data
        .par_chunks(chunk_size(data.len()))
        .map(count_bytes)
        .collect();

    let mut freqs = [0u64; NUM_BINS];
    for partial in &partials {
        for bin in 0..NUM_BINS {
            freqs[bin] += partial[bin];
        }
    }
    freqs
}

/// Like [`histogram_parallel`], but each worker consumes 8-byte words and
/// extracts the byte fields by shift-and-mask.
pub fn histogram_parallel_wide(data: &[u8]) -> Histogram {
    let partials: Vec<Histogram> = data
        .par_chunks(chunk_size(data.len()))
        .map(count_words)
        .collect();

    let mut freqs = [0u64; NUM_BINS];
    for partial in &partials {
        for bin in 0..NUM_BINS {
            freqs[bin] += partial[bin];
        }
    }
    freqs
}

/// Like [`histogram_parallel_wide`], with the bin-wise reduction written as
/// a zip over fixed-size arrays so the compiler vectorizes it.
pub fn histogram_fast(data: &[u8]) -> Histogram {
    let partials: Vec<Histogram> = data
        .par_chunks(chunk_size(data.len()))
        .map(count_words)
        .collect();

    let mut freqs = [0u64; NUM_BINS];
    for partial in &partials {
        for (acc, &count) in freqs.iter_mut().zip(partial.iter()) {
            *acc += count;
        }
    }
    freqs
}

/// Chunk length for one worker: `ceil(N / T)`, never zero.
fn chunk_size(len: usize) -> usize {
    len.div_ceil(max_threads()).max(1)
}

fn count_bytes(chunk: &[u8]) -> Histogram {
    let mut freqs = [0u64; NUM_BINS];
    for &b in chunk {
        freqs[b as usize] += 1;
    }
    freqs
}

/// Count 8 bytes at a time through an unaligned 64-bit load, with a scalar
/// tail for the remainder.
fn count_words(chunk: &[u8]) -> Histogram {
    let mut freqs = [0u64; NUM_BINS];

    let mut words = chunk.chunks_exact(8);
    for word in &mut words {
        let mut w = 0u64;
        for (i, &byte) in word.iter().enumerate() {
            w |= (byte as u64) << (8 * i);
        }

        freqs[(w & 0xFF) as usize] += 1;
        freqs[((w >> 8) & 0xFF) as usize] += 1;
        freqs[((w >> 16) & 0xFF) as usize] += 1;
        freqs[((w >> 24) & 0xFF) as usize] += 1;
        freqs[((w >> 32) & 0xFF) as usize] += 1;
        freqs[((w >> 40) & 0xFF) as usize] += 1;
        freqs[((w >> 48) & 0xFF) as usize] += 1;
        freqs[(w >> 56) as usize] += 1;
    }

    for &b in words.remainder() {
        freqs[b as usize] += 1;
    }

    freqs
}
