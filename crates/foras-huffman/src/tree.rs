//! Huffman tree construction over an index-addressed node arena.
//!
//! The tree is a flat `Vec` of nodes rather than a linked structure: the
//! priority queue holds small indices, the layout is cache-friendly, and no
//! parent back-edges are needed. Ordering discipline replaces pointers:
//! leaves are appended first (one per nonzero histogram bin, in ascending
//! symbol order), every internal node is appended after both of its
//! children, and the root is the last node.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::histogram::Histogram;

/// Payload of a tree node: a leaf carries its byte symbol, an internal node
/// carries the arena indices of its two children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Terminal node for one byte value.
    Leaf(u8),
    /// Interior node joining two subtrees by arena index.
    Internal { left: usize, right: usize },
}

/// A single node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HuffmanNode {
    /// Combined frequency of all symbols below this node.
    pub frequency: u64,
    /// Leaf or internal payload.
    pub kind: NodeKind,
}

impl HuffmanNode {
    /// Create a leaf node.
    pub const fn leaf(frequency: u64, symbol: u8) -> Self {
        Self {
            frequency,
            kind: NodeKind::Leaf(symbol),
        }
    }

    /// Create an internal node from two child indices.
    pub const fn internal(frequency: u64, left: usize, right: usize) -> Self {
        Self {
            frequency,
            kind: NodeKind::Internal { left, right },
        }
    }

    /// True when this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

/// Build the Huffman tree for a histogram.
///
/// Returns the node arena; the root is the last element. An all-zero
/// histogram yields an empty arena. The queue orders strictly by frequency
/// with arena index as tie-break, which keeps construction deterministic;
/// the resulting raw tree shape is absorbed by canonicalization anyway.
pub fn huffman_tree(hist: &Histogram) -> Vec<HuffmanNode> {
    let num_symbols = hist.iter().filter(|&&f| f > 0).count();
    let mut nodes = Vec::with_capacity((2 * num_symbols).saturating_sub(1));
    let mut heap: BinaryHeap<Reverse<(u64, usize)>> = BinaryHeap::with_capacity(num_symbols);

    for (symbol, &freq) in hist.iter().enumerate() {
        if freq > 0 {
            let index = nodes.len();
            nodes.push(HuffmanNode::leaf(freq, symbol as u8));
            heap.push(Reverse((freq, index)));
        }
    }

    while let Some(Reverse((freq_a, a))) = heap.pop() {
        let Some(Reverse((freq_b, b))) = heap.pop() else {
            // The lone remaining index is the root, already last in the arena.
            break;
        };

        let index = nodes.len();
        let frequency = freq_a + freq_b;
        nodes.push(HuffmanNode::internal(frequency, a, b));
        heap.push(Reverse((frequency, index)));
    }

    nodes
}
