//! Huffman dictionaries: per-symbol bit codes, canonicalization, and the
//! reverse-lookup table used for decoding.
//!
//! Codes are stored as ordered bit sequences (`Vec<bool>`, MSB at index 0)
//! because the algorithms append and compare by length independently of
//! numeric value. After canonicalization the whole table is reconstructible
//! from the 256 code lengths alone, which is why the persisted header never
//! stores tree shape.

use foras_core::{Error, Result};

use crate::tree::{HuffmanNode, NodeKind};

/// Maximum code length supported by fixed-table decode: the ceiling implied
/// by the 2 * 256 - 1 possible tree nodes.
pub const MAX_CODE_BITS: usize = 9;

/// Mapping from byte value to its variable-length bit code. An empty code
/// means the symbol does not appear in the input.
pub type Dict = [Vec<bool>; 256];

/// Create an all-empty dictionary.
pub fn empty_dict() -> Dict {
    std::array::from_fn(|_| Vec::new())
}

/// Derive the raw (non-canonical) dictionary from a node arena.
///
/// Walks the tree from the root with an explicit stack; every frame carries
/// the node index and the bit path taken to reach it. A one-leaf arena maps
/// its symbol to the one-bit code `0` so that the symbol still occupies
/// payload bits.
pub fn huffman_dict(nodes: &[HuffmanNode]) -> Dict {
    let mut dict = empty_dict();

    if nodes.is_empty() {
        return dict;
    }

    if nodes.len() == 1 {
        if let NodeKind::Leaf(symbol) = nodes[0].kind {
            dict[symbol as usize] = vec![false];
        }
        return dict;
    }

    struct Frame {
        index: usize,
        path: Vec<bool>,
    }

    let mut stack = vec![Frame {
        index: nodes.len() - 1,
        path: Vec::new(),
    }];

    while let Some(Frame { index, path }) = stack.pop() {
        match nodes[index].kind {
            NodeKind::Leaf(symbol) => {
                dict[symbol as usize] = path;
            }
            NodeKind::Internal { left, right } => {
                let mut right_path = path.clone();
                right_path.push(true);
                stack.push(Frame {
                    index: right,
                    path: right_path,
                });

                let mut left_path = path;
                left_path.push(false);
                stack.push(Frame {
                    index: left,
                    path: left_path,
                });
            }
        }
    }

    dict
}

/// Successor of `code` in canonical order: the code incremented as a
/// big-endian unsigned integer. A carry out of the top bit prepends a `1`,
/// growing the code by one bit (unreachable for a valid set of lengths).
pub fn next_canonical(code: &[bool]) -> Vec<bool> {
    let mut next = code.to_vec();

    for bit in next.iter_mut().rev() {
        if *bit {
            *bit = false;
        } else {
            *bit = true;
            return next;
        }
    }

    next.insert(0, true);
    next
}

/// Replace the codes in `dict` with canonical ones of the same lengths.
///
/// Present symbols are ordered by `(length asc, symbol asc)`; the first gets
/// the all-zeros code of its length, and each subsequent symbol gets the
/// successor of the previous code, extended with trailing zeros when its
/// length is greater.
pub fn canonicalize(dict: &mut Dict) {
    let order = symbols_by_length(&code_lengths(dict));
    assign_canonical(dict, &order);
}

/// Reconstruct the canonical dictionary from persisted code lengths.
pub fn dict_from_lengths(lengths: &[u16; 256]) -> Dict {
    let mut dict = empty_dict();
    let order: Vec<(u16, u8)> = symbols_by_length(lengths);
    assign_canonical(&mut dict, &order);
    dict
}

/// Per-symbol code lengths of a dictionary; zero means absent.
pub fn code_lengths(dict: &Dict) -> [u16; 256] {
    let mut lengths = [0u16; 256];
    for (symbol, code) in dict.iter().enumerate() {
        lengths[symbol] = code.len() as u16;
    }
    lengths
}

/// Present symbols sorted by `(length asc, symbol asc)`.
fn symbols_by_length(lengths: &[u16; 256]) -> Vec<(u16, u8)> {
    let mut order: Vec<(u16, u8)> = lengths
        .iter()
        .enumerate()
        .filter(|&(_, &len)| len > 0)
        .map(|(symbol, &len)| (len, symbol as u8))
        .collect();
    order.sort_unstable();
    order
}

/// Walk the canonical recurrence over `order` and write each code into the
/// dictionary.
fn assign_canonical(dict: &mut Dict, order: &[(u16, u8)]) {
    let mut prev: Option<Vec<bool>> = None;

    for &(len, symbol) in order {
        let code = match prev {
            None => vec![false; len as usize],
            Some(ref previous) => {
                let mut next = next_canonical(previous);
                while next.len() < len as usize {
                    next.push(false);
                }
                next
            }
        };
        debug_assert_eq!(code.len(), len as usize);
        dict[symbol as usize] = code.clone();
        prev = Some(code);
    }
}

/// Rebalance code lengths so none exceeds `max_len`, preserving the Kraft
/// inequality so that canonical assignment stays prefix-free.
///
/// A raw Huffman tree over skewed frequencies can run deeper than the
/// fixed decode table; clamping the deep codes over-fills the code space,
/// so the shortest codes are pushed deeper one step at a time until the
/// lengths fit again. Lengths within the ceiling pass through untouched,
/// which keeps this a no-op for well-behaved inputs. The caller re-derives
/// the actual codes from the adjusted lengths (see [`dict_from_lengths`]).
pub fn limit_code_lengths(lengths: &mut [u16; 256], max_len: usize) {
    if lengths.iter().all(|&len| len as usize <= max_len) {
        return;
    }

    for len in lengths.iter_mut() {
        if *len as usize > max_len {
            *len = max_len as u16;
        }
    }

    // Kraft sum in units of 2^-max_len: must not exceed 2^max_len.
    let target = 1u64 << max_len;
    let mut sum: u64 = lengths
        .iter()
        .filter(|&&len| len > 0)
        .map(|&len| 1u64 << (max_len - len as usize))
        .sum();

    while sum > target {
        // Deepen the shortest code; it frees the most code space per step.
        let candidate = (0..256)
            .filter(|&s| lengths[s] > 0 && (lengths[s] as usize) < max_len)
            .min_by_key(|&s| (lengths[s], s));
        let Some(symbol) = candidate else {
            break;
        };
        sum -= 1u64 << (max_len - lengths[symbol] as usize - 1);
        lengths[symbol] += 1;
    }
}

/// Build the reverse-lookup table for fixed-table decoding.
///
/// The table has `2^max_code_len` entries; entry `i` is the symbol whose
/// code, left-aligned in a `max_code_len`-bit window, covers `i`. Shorter
/// codes fill `2^(L - len)` consecutive entries; prefix-freedom guarantees
/// the ranges never overlap.
pub fn build_reverse_dict(dict: &Dict, max_code_len: usize) -> Result<Vec<u16>> {
    if max_code_len == 0 || max_code_len > 16 {
        return Err(Error::invalid_argument(format!(
            "reverse table of {max_code_len} bits is outside the supported 1..=16"
        )));
    }

    let mut table = vec![0u16; 1 << max_code_len];

    for (symbol, code) in dict.iter().enumerate() {
        if code.is_empty() {
            continue;
        }
        if code.len() > max_code_len {
            return Err(Error::invalid_argument(format!(
                "code for symbol {symbol} is {} bits, exceeding the {max_code_len}-bit table",
                code.len()
            )));
        }

        let mut value = 0usize;
        for &bit in code {
            value = (value << 1) | bit as usize;
        }

        let span = 1usize << (max_code_len - code.len());
        let base = value << (max_code_len - code.len());
        for entry in &mut table[base..base + span] {
            *entry = symbol as u16;
        }
    }

    Ok(table)
}
