//! Table-driven span decoder.
//!
//! Decoding peeks a fixed `MAX_CODE_BITS`-wide window, maps it through the
//! reverse-lookup table to a symbol in one step, then advances the reader
//! by that symbol's true code length. The loop terminates on the reader's
//! declared bit length, never on a short read: near end-of-stream the peek
//! is zero-padded, which prefix-freedom makes unambiguous.

use foras_core::{BitReader, Error, Result};

use crate::dict::{build_reverse_dict, Dict, MAX_CODE_BITS};

/// Decode `src_bits` bits of `src` into `dst`.
///
/// `dst` must be sized to the original input length (known from the file
/// header). Fails with `MalformedInput` when the bitstream does not decode
/// to exactly `dst.len()` symbols.
pub fn decode_span(src: &[u8], src_bits: u64, dst: &mut [u8], dict: &Dict) -> Result<()> {
    let table = build_reverse_dict(dict, MAX_CODE_BITS)?;

    let mut lens = [0u8; 256];
    for (symbol, code) in dict.iter().enumerate() {
        lens[symbol] = code.len() as u8;
    }

    let mut reader = BitReader::new(src, src_bits as usize)?;
    let mut written = 0usize;

    while !reader.done() {
        let window = reader.peek_padded(MAX_CODE_BITS)? as usize;
        let symbol = table[window];
        let len = lens[symbol as usize];

        if len == 0 {
            return Err(Error::malformed(format!(
                "bit pattern {window:#05x} maps to no code at bit {}",
                src_bits - reader.remaining() as u64
            )));
        }
        if written >= dst.len() {
            return Err(Error::malformed(format!(
                "bitstream decodes past the declared {} bytes",
                dst.len()
            )));
        }

        dst[written] = symbol as u8;
        written += 1;
        reader.advance(len as usize)?;
    }

    if written != dst.len() {
        return Err(Error::malformed(format!(
            "bitstream decoded {written} bytes, expected {}",
            dst.len()
        )));
    }
    Ok(())
}
