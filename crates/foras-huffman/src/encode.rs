//! Span encoders: pack a source byte span into a pre-zeroed destination
//! bitstream, MSB-first.
//!
//! Three variants produce the identical bitstream:
//!
//! - [`encode_span`] — sequential, one bit cursor.
//! - [`encode_span_chunked`] — one compressed buffer per worker, merged
//!   sequentially after the join.
//! - [`encode_span_two_pass`] — bit offsets by prefix sum, then direct
//!   writes into the shared destination; only chunk-boundary bytes are
//!   contended and those are OR-updated atomically.
//!
//! Because the destination is zero-initialized and bits are only ever set,
//! OR-ing is safe everywhere.

use std::sync::atomic::{AtomicU8, Ordering};

use rayon::prelude::*;

use foras_core::{Error, Result};

use crate::dict::Dict;
use crate::histogram::{max_threads, Histogram};

/// Exact payload size in bits for `hist` under `dict`.
pub fn compressed_size_in_bits(hist: &Histogram, dict: &Dict) -> u64 {
    hist.iter()
        .zip(dict.iter())
        .map(|(&freq, code)| freq * code.len() as u64)
        .sum()
}

/// Sequential encoder: one pass, one bit cursor.
pub fn encode_span(src: &[u8], dst: &mut [u8], dict: &Dict) -> Result<()> {
    let total_bits = span_bits(src, dict)?;
    check_dst(total_bits, dst.len())?;
    write_bits(src, dst, 0, dict);
    Ok(())
}

/// Parallel encoder with a sequential merge.
///
/// Each worker compresses its chunk into a private zero-initialized buffer
/// starting at bit 0; after the join the buffers are copied into the
/// destination at their running bit offsets. Byte-aligned offsets take a
/// block-copy fast path; unaligned offsets shift each byte into two
/// neighbouring destination bytes.
pub fn encode_span_chunked(src: &[u8], dst: &mut [u8], dict: &Dict) -> Result<()> {
    let parts: Vec<(u64, Vec<u8>)> = src
        .par_chunks(chunk_size(src.len()))
        .map(|chunk| {
            let bits = span_bits(chunk, dict)?;
            let mut buf = vec![0u8; bits.div_ceil(8) as usize];
            write_bits(chunk, &mut buf, 0, dict);
            Ok((bits, buf))
        })
        .collect::<Result<Vec<_>>>()?;

    let total_bits: u64 = parts.iter().map(|(bits, _)| bits).sum();
    check_dst(total_bits, dst.len())?;

    let mut offset = 0u64;
    for (bits, buf) in &parts {
        merge_into(dst, offset as usize, buf, *bits as usize);
        offset += bits;
    }
    Ok(())
}

/// Parallel two-pass encoder writing directly into the destination.
///
/// Pass 1 sums each chunk's code lengths; a sequential prefix sum turns the
/// sums into destination bit offsets. Pass 2 packs every chunk in place
/// through an atomic view of the destination: a chunk's first and last
/// bytes may straddle a neighbour's bit range and are OR-updated
/// atomically, interior bytes are owned by exactly one worker and stored
/// directly. A final sequential mask clears any bits past the payload.
pub fn encode_span_two_pass(src: &[u8], dst: &mut [u8], dict: &Dict) -> Result<()> {
    let chunks: Vec<&[u8]> = src.chunks(chunk_size(src.len())).collect();

    let chunk_bits: Vec<u64> = chunks
        .par_iter()
        .map(|chunk| span_bits(chunk, dict))
        .collect::<Result<Vec<_>>>()?;

    let mut offsets = Vec::with_capacity(chunk_bits.len());
    let mut total_bits = 0u64;
    for &bits in &chunk_bits {
        offsets.push(total_bits);
        total_bits += bits;
    }
    check_dst(total_bits, dst.len())?;

    let atomic_dst = as_atomic_bytes(dst);
    chunks
        .par_iter()
        .zip(offsets.par_iter())
        .for_each(|(chunk, &start)| write_bits_atomic(chunk, atomic_dst, start as usize, dict));

    if total_bits % 8 != 0 {
        dst[(total_bits / 8) as usize] &= tail_mask((total_bits % 8) as usize);
    }
    Ok(())
}

/// Chunk length for one worker: `ceil(N / T)`, never zero.
fn chunk_size(len: usize) -> usize {
    len.div_ceil(max_threads()).max(1)
}

/// Sum of code lengths over `src`. Fails when a source byte has no code,
/// which means the dictionary was built for different data.
fn span_bits(src: &[u8], dict: &Dict) -> Result<u64> {
    let mut lens = [0u64; 256];
    for (symbol, code) in dict.iter().enumerate() {
        lens[symbol] = code.len() as u64;
    }

    let mut bits = 0u64;
    for &byte in src {
        let len = lens[byte as usize];
        if len == 0 {
            return Err(Error::invalid_argument(format!(
                "symbol {byte:#04x} has no code in the dictionary"
            )));
        }
        bits += len;
    }
    Ok(bits)
}

fn check_dst(total_bits: u64, dst_len: usize) -> Result<()> {
    let needed = total_bits.div_ceil(8) as usize;
    if dst_len < needed {
        return Err(Error::invalid_argument(format!(
            "destination of {dst_len} bytes cannot hold {total_bits} bits"
        )));
    }
    Ok(())
}

/// Mask keeping the top `bits` (1..=7) of a byte.
fn tail_mask(bits: usize) -> u8 {
    0xFFu8 << (8 - bits)
}

/// OR the codes for `src` into `dst` starting at `start_bit`. The caller
/// has verified capacity and code presence.
fn write_bits(src: &[u8], dst: &mut [u8], start_bit: usize, dict: &Dict) {
    let mut bit_pos = start_bit;
    for &byte in src {
        for &bit in &dict[byte as usize] {
            if bit {
                dst[bit_pos / 8] |= 1 << (7 - bit_pos % 8);
            }
            bit_pos += 1;
        }
    }
}

/// Copy a chunk bitstream of `bits` bits into `dst` at `bit_offset`.
fn merge_into(dst: &mut [u8], bit_offset: usize, src: &[u8], bits: usize) {
    if bits == 0 {
        return;
    }

    let base = bit_offset / 8;
    let shift = bit_offset % 8;
    let nbytes = bits.div_ceil(8);
    let tail_bits = bits % 8;

    if shift == 0 {
        // Byte-aligned: block copy the whole bytes, OR the masked tail.
        let full = bits / 8;
        dst[base..base + full].copy_from_slice(&src[..full]);
        if tail_bits > 0 {
            dst[base + full] |= src[full] & tail_mask(tail_bits);
        }
        return;
    }

    for (i, &raw) in src[..nbytes].iter().enumerate() {
        let byte = if i == nbytes - 1 && tail_bits > 0 {
            raw & tail_mask(tail_bits)
        } else {
            raw
        };
        dst[base + i] |= byte >> shift;
        let spill = byte << (8 - shift);
        if spill != 0 {
            dst[base + i + 1] |= spill;
        }
    }
}

/// Atomic view of the shared destination for the two-pass encoder.
fn as_atomic_bytes(dst: &mut [u8]) -> &[AtomicU8] {
    // SAFETY: AtomicU8 has the same size, alignment, and representation as
    // u8, and the exclusive borrow rules out non-atomic access for the
    // lifetime of the returned view.
    unsafe { &*(dst as *mut [u8] as *const [AtomicU8]) }
}

/// Pack one chunk into the shared destination starting at `start_bit`,
/// buffering eight bits at a time in a local accumulator.
fn write_bits_atomic(src: &[u8], dst: &[AtomicU8], start_bit: usize, dict: &Dict) {
    let mut byte_index = start_bit / 8;
    let lead = start_bit % 8;
    let mut acc: u8 = 0;
    // Leading zero bits stand in for the neighbour's share of the first byte.
    let mut acc_bits = lead;
    let mut boundary = lead != 0;

    for &byte in src {
        for &bit in &dict[byte as usize] {
            acc = (acc << 1) | bit as u8;
            acc_bits += 1;
            if acc_bits == 8 {
                if boundary {
                    dst[byte_index].fetch_or(acc, Ordering::Relaxed);
                    boundary = false;
                } else {
                    dst[byte_index].store(acc, Ordering::Relaxed);
                }
                byte_index += 1;
                acc = 0;
                acc_bits = 0;
            }
        }
    }

    if acc_bits > 0 {
        // Trailing partial byte, possibly shared with the next chunk.
        dst[byte_index].fetch_or(acc << (8 - acc_bits), Ordering::Relaxed);
    }
}
