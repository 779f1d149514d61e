//! # Foras Huffman
//!
//! Byte-level entropy coder for the foras storage toolkit: compresses and
//! decompresses arbitrary binary files with canonical Huffman codes.
//!
//! ## Pipeline
//!
//! ```text
//! encode: bytes -> histogram -> tree -> dictionary (canonical)
//!                -> header + packed bitstream
//! decode: header -> dictionary (from code lengths) -> reverse table
//!                -> bytes
//! ```
//!
//! Canonical codes make the dictionary a pure function of its code lengths,
//! so the persisted header stores 256 lengths instead of a serialized tree.
//! The histogram and both parallel encoders are fork-join over rayon's
//! worker team; file I/O is memory-mapped.
//!
//! ## Example
//!
//! ```no_run
//! use foras_huffman::{decode_file, encode_file};
//!
//! # fn main() -> foras_core::Result<()> {
//! let compressed_size = encode_file("input.bin", "input.huff")?;
//! let original_size = decode_file("input.huff", "restored.bin")?;
//! # Ok(())
//! # }
//! ```

pub mod decode;
pub mod dict;
pub mod encode;
pub mod file;
pub mod histogram;
pub mod tree;

pub use decode::decode_span;
pub use dict::{
    build_reverse_dict, canonicalize, code_lengths, dict_from_lengths, empty_dict, huffman_dict,
    limit_code_lengths, next_canonical, Dict, MAX_CODE_BITS,
};
pub use encode::{
    compressed_size_in_bits, encode_span, encode_span_chunked, encode_span_two_pass,
};
pub use file::{compress, decode_file, decompress, encode_file, Header, HEADER_SIZE};
pub use histogram::{
    histogram, histogram_fast, histogram_parallel, histogram_parallel_wide, max_threads,
    Histogram, NUM_BINS,
};
pub use tree::{huffman_tree, HuffmanNode, NodeKind};
