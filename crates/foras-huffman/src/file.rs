//! File-level encoder and decoder over memory-mapped I/O.
//!
//! Every compressed file starts with a fixed 528-byte little-endian header:
//! 8 bytes of original size, 8 bytes of payload size in bits, and 256
//! 16-bit canonical code lengths. Because the codes are canonical, the
//! lengths alone reconstruct the whole dictionary; no tree shape is ever
//! persisted. The packed payload follows immediately, and bits past the
//! declared payload size in the final byte are unspecified.

use std::fs::{File, OpenOptions};
use std::path::Path;

use memmap2::{Mmap, MmapMut};
use tracing::debug;

use foras_core::{CompressionRatio, Error, Result};

use crate::decode::decode_span;
use crate::dict::{
    code_lengths, dict_from_lengths, huffman_dict, limit_code_lengths, Dict, MAX_CODE_BITS,
};
use crate::encode::{compressed_size_in_bits, encode_span, encode_span_two_pass};
use crate::histogram::histogram_fast;
use crate::tree::huffman_tree;

/// Size of the persisted header in bytes.
pub const HEADER_SIZE: usize = 8 + 8 + 256 * 2;

/// Fixed header at the start of every compressed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Original file size in bytes.
    pub original_size: u64,
    /// Compressed payload size in bits.
    pub compressed_bits: u64,
    /// Canonical code length per symbol, indexed by byte value; zero means
    /// the symbol is absent.
    pub code_lengths: [u16; 256],
}

impl Header {
    /// Number of payload bytes following the header.
    #[inline]
    pub fn payload_bytes(&self) -> usize {
        self.compressed_bits.div_ceil(8) as usize
    }

    /// Serialize into the first [`HEADER_SIZE`] bytes of `out`.
    pub fn write_to(&self, out: &mut [u8]) -> Result<()> {
        if out.len() < HEADER_SIZE {
            return Err(Error::invalid_argument(format!(
                "header needs {HEADER_SIZE} bytes, destination has {}",
                out.len()
            )));
        }

        out[..8].copy_from_slice(&self.original_size.to_le_bytes());
        out[8..16].copy_from_slice(&self.compressed_bits.to_le_bytes());
        for (symbol, &len) in self.code_lengths.iter().enumerate() {
            let at = 16 + symbol * 2;
            out[at..at + 2].copy_from_slice(&len.to_le_bytes());
        }
        Ok(())
    }

    /// Parse the header from the start of a compressed span.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::malformed(format!(
                "compressed input is {} bytes, smaller than the {HEADER_SIZE}-byte header",
                data.len()
            )));
        }

        let original_size = Self::read_le_uint(&data[..8], 8)?;
        let compressed_bits = Self::read_le_uint(&data[8..16], 8)?;

        let mut lengths = [0u16; 256];
        for (symbol, len) in lengths.iter_mut().enumerate() {
            let at = 16 + symbol * 2;
            *len = Self::read_le_uint(&data[at..at + 2], 2)? as u16;
        }

        Ok(Self {
            original_size,
            compressed_bits,
            code_lengths: lengths,
        })
    }

    /// Read a little-endian unsigned integer of the given size.
    fn read_le_uint(data: &[u8], size: usize) -> Result<u64> {
        if data.len() < size {
            return Err(Error::malformed("insufficient data for integer"));
        }

        let mut result = 0u64;
        for (i, &byte) in data.iter().enumerate().take(size) {
            result |= (byte as u64) << (8 * i);
        }
        Ok(result)
    }

    /// Check the declared sizes against the actual payload length and the
    /// fixed-table decode ceiling.
    pub fn validate(&self, payload_len: usize) -> Result<()> {
        if self.payload_bytes() != payload_len {
            return Err(Error::malformed(format!(
                "header declares {} payload bytes but {payload_len} follow",
                self.payload_bytes()
            )));
        }
        if self.original_size == 0 && self.compressed_bits != 0 {
            return Err(Error::malformed(
                "empty original with a non-empty payload".to_string(),
            ));
        }
        for (symbol, &len) in self.code_lengths.iter().enumerate() {
            if len as usize > MAX_CODE_BITS {
                return Err(Error::malformed(format!(
                    "code length {len} for symbol {symbol} exceeds the {MAX_CODE_BITS}-bit ceiling"
                )));
            }
        }

        // Lengths violating the Kraft inequality cannot come from a prefix
        // code; canonical reconstruction would overflow on them.
        let kraft: u64 = self
            .code_lengths
            .iter()
            .filter(|&&len| len > 0)
            .map(|&len| 1u64 << (MAX_CODE_BITS - len as usize))
            .sum();
        if kraft > 1 << MAX_CODE_BITS {
            return Err(Error::malformed(format!(
                "code lengths overfill the code space ({kraft} > {})",
                1u64 << MAX_CODE_BITS
            )));
        }
        Ok(())
    }
}

/// Run the encode pipeline up to (but not including) bit packing.
///
/// Tree code lengths are rebalanced to the fixed-table ceiling before the
/// canonical codes are assigned, so every emitted file is decodable by the
/// [`MAX_CODE_BITS`]-bit reverse table.
fn plan(data: &[u8]) -> (Header, Dict) {
    let hist = histogram_fast(data);
    let raw = huffman_dict(&huffman_tree(&hist));

    let mut lengths = code_lengths(&raw);
    limit_code_lengths(&mut lengths, MAX_CODE_BITS);
    let dict = dict_from_lengths(&lengths);

    let header = Header {
        original_size: data.len() as u64,
        compressed_bits: compressed_size_in_bits(&hist, &dict),
        code_lengths: lengths,
    };
    (header, dict)
}

/// Compress `input` into `output`, returning the total output size in
/// bytes (header included). An existing output file is overwritten.
pub fn encode_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<u64> {
    let input = input.as_ref();
    let output = output.as_ref();

    let in_file = File::open(input).map_err(|source| Error::Open {
        path: input.to_path_buf(),
        source,
    })?;
    let in_len = in_file
        .metadata()
        .map_err(|source| Error::Stat {
            path: input.to_path_buf(),
            source,
        })?
        .len();

    // Zero-length files cannot be mapped; an empty slice stands in.
    let in_map = if in_len == 0 {
        None
    } else {
        // SAFETY: the mapping is read-only and dropped before this call
        // returns; the codec never writes through it.
        Some(unsafe { Mmap::map(&in_file) }.map_err(|source| Error::Map {
            path: input.to_path_buf(),
            source,
        })?)
    };
    drop(in_file);
    let data: &[u8] = in_map.as_deref().unwrap_or(&[]);

    let (header, dict) = plan(data);
    let total = HEADER_SIZE + header.payload_bytes();

    let out_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(output)
        .map_err(|source| Error::Open {
            path: output.to_path_buf(),
            source,
        })?;
    out_file
        .set_len(total as u64)
        .map_err(|source| Error::Truncate {
            path: output.to_path_buf(),
            len: total as u64,
            source,
        })?;

    // SAFETY: the file was just created with this exact length and the
    // handle is exclusively owned; the mapping is dropped before return.
    let mut out_map = unsafe { MmapMut::map_mut(&out_file) }.map_err(|source| Error::Map {
        path: output.to_path_buf(),
        source,
    })?;
    drop(out_file);

    let (head, payload) = out_map.split_at_mut(HEADER_SIZE);
    header.write_to(head)?;
    encode_span_two_pass(data, payload, &dict)?;
    out_map.flush().map_err(Error::Write)?;

    let ratio = CompressionRatio::new(data.len(), total);
    debug!(
        original_size = header.original_size,
        compressed_bits = header.compressed_bits,
        output_size = total,
        savings_percent = ratio.savings_percent(),
        "encoded {}",
        input.display()
    );
    Ok(total as u64)
}

/// Decompress `input` into `output`, returning the original size in bytes.
/// An existing output file is overwritten.
pub fn decode_file(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Result<u64> {
    let input = input.as_ref();
    let output = output.as_ref();

    let in_file = File::open(input).map_err(|source| Error::Open {
        path: input.to_path_buf(),
        source,
    })?;
    let in_len = in_file
        .metadata()
        .map_err(|source| Error::Stat {
            path: input.to_path_buf(),
            source,
        })?
        .len();
    if (in_len as usize) < HEADER_SIZE {
        return Err(Error::malformed(format!(
            "compressed file is {in_len} bytes, smaller than the {HEADER_SIZE}-byte header"
        )));
    }

    // SAFETY: read-only mapping, dropped before return.
    let in_map = unsafe { Mmap::map(&in_file) }.map_err(|source| Error::Map {
        path: input.to_path_buf(),
        source,
    })?;
    drop(in_file);

    let header = Header::parse(&in_map)?;
    let payload = &in_map[HEADER_SIZE..];
    header.validate(payload.len())?;
    let dict = dict_from_lengths(&header.code_lengths);

    let out_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(output)
        .map_err(|source| Error::Open {
            path: output.to_path_buf(),
            source,
        })?;
    out_file
        .set_len(header.original_size)
        .map_err(|source| Error::Truncate {
            path: output.to_path_buf(),
            len: header.original_size,
            source,
        })?;

    if header.original_size == 0 {
        debug!(original_size = 0u64, "decoded {}", input.display());
        return Ok(0);
    }

    // SAFETY: freshly truncated to the exact output length, exclusively
    // owned, and dropped before return.
    let mut out_map = unsafe { MmapMut::map_mut(&out_file) }.map_err(|source| Error::Map {
        path: output.to_path_buf(),
        source,
    })?;
    drop(out_file);

    decode_span(payload, header.compressed_bits, &mut out_map, &dict)?;
    out_map.flush().map_err(Error::Write)?;

    debug!(
        original_size = header.original_size,
        "decoded {}",
        input.display()
    );
    Ok(header.original_size)
}

/// One-shot in-memory compression producing the file format (header plus
/// payload).
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let (header, dict) = plan(data);
    let mut out = vec![0u8; HEADER_SIZE + header.payload_bytes()];

    let (head, payload) = out.split_at_mut(HEADER_SIZE);
    header.write_to(head)?;
    encode_span(data, payload, &dict)?;
    Ok(out)
}

/// One-shot in-memory decompression of the file format.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let header = Header::parse(data)?;
    let payload = &data[HEADER_SIZE..];
    header.validate(payload.len())?;
    let dict = dict_from_lengths(&header.code_lengths);

    let mut out = vec![0u8; header.original_size as usize];
    decode_span(payload, header.compressed_bits, &mut out, &dict)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size_constant() {
        assert_eq!(HEADER_SIZE, 528);
    }

    #[test]
    fn test_header_write_parse_roundtrip() {
        let mut lengths = [0u16; 256];
        lengths[b'a' as usize] = 1;
        lengths[b'z' as usize] = 9;
        let header = Header {
            original_size: 0x0123_4567_89AB_CDEF,
            compressed_bits: 42,
            code_lengths: lengths,
        };

        let mut buf = vec![0u8; HEADER_SIZE];
        header.write_to(&mut buf).unwrap();
        assert_eq!(Header::parse(&buf).unwrap(), header);

        // Little-endian layout of the leading size fields.
        assert_eq!(buf[0], 0xEF);
        assert_eq!(buf[7], 0x01);
        assert_eq!(buf[8], 42);
    }

    #[test]
    fn test_header_parse_short_input() {
        let err = Header::parse(&[0u8; HEADER_SIZE - 1]).unwrap_err();
        assert_eq!(err.category(), "malformed_input");
    }

    #[test]
    fn test_header_validate_payload_mismatch() {
        let header = Header {
            original_size: 10,
            compressed_bits: 16,
            code_lengths: [0u16; 256],
        };
        assert!(header.validate(2).is_ok());
        assert!(header.validate(3).is_err());
    }

    #[test]
    fn test_header_validate_overlong_code() {
        let mut lengths = [0u16; 256];
        lengths[0] = (MAX_CODE_BITS + 1) as u16;
        let header = Header {
            original_size: 1,
            compressed_bits: 10,
            code_lengths: lengths,
        };
        let err = header.validate(2).unwrap_err();
        assert_eq!(err.category(), "malformed_input");
    }

    #[test]
    fn test_header_validate_kraft_violation() {
        // Three one-bit codes cannot form a prefix code.
        let mut lengths = [0u16; 256];
        lengths[0] = 1;
        lengths[1] = 1;
        lengths[2] = 1;
        let header = Header {
            original_size: 3,
            compressed_bits: 3,
            code_lengths: lengths,
        };
        let err = header.validate(1).unwrap_err();
        assert_eq!(err.category(), "malformed_input");
    }

    #[test]
    fn test_compress_decompress_roundtrip() {
        let data = b"abracadabra".repeat(100);
        let compressed = compress(&data).unwrap();
        assert_eq!(decompress(&compressed).unwrap(), data);
        assert!(compressed.len() < data.len() + HEADER_SIZE);
    }

    #[test]
    fn test_compress_empty() {
        let compressed = compress(&[]).unwrap();
        assert_eq!(compressed.len(), HEADER_SIZE);

        let header = Header::parse(&compressed).unwrap();
        assert_eq!(header.original_size, 0);
        assert_eq!(header.compressed_bits, 0);
        assert!(header.code_lengths.iter().all(|&len| len == 0));

        assert!(decompress(&compressed).unwrap().is_empty());
    }

    #[test]
    fn test_compress_single_symbol() {
        let compressed = compress(b"AAAAA").unwrap();
        let header = Header::parse(&compressed).unwrap();

        assert_eq!(header.original_size, 5);
        assert_eq!(header.compressed_bits, 5);
        assert_eq!(header.code_lengths[b'A' as usize], 1);
        assert_eq!(compressed[HEADER_SIZE], 0b0000_0000);
        assert_eq!(decompress(&compressed).unwrap(), b"AAAAA");
    }

    #[test]
    fn test_header_records_dictionary_lengths() {
        let compressed = compress(b"abracadabra").unwrap();
        let header = Header::parse(&compressed).unwrap();

        assert_eq!(header.original_size, 11);
        assert_eq!(header.compressed_bits, 23);
        assert_eq!(header.code_lengths[b'a' as usize], 1);
        for symbol in [b'b', b'c', b'd', b'r'] {
            assert_eq!(header.code_lengths[symbol as usize], 3);
        }
    }

    #[test]
    fn test_decompress_truncated_payload() {
        let mut compressed = compress(b"abracadabra").unwrap();
        compressed.pop();
        let err = decompress(&compressed).unwrap_err();
        assert_eq!(err.category(), "malformed_input");
    }

    #[test]
    fn test_decompress_inconsistent_sizes() {
        let compressed = compress(&[]).unwrap();
        let mut forged = compressed.clone();
        // Claim a non-empty payload on an empty original.
        forged[8..16].copy_from_slice(&8u64.to_le_bytes());
        assert!(decompress(&forged).is_err());
    }
}
