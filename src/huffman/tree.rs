//! Huffman tree construction and code assignment.
//!
//! The tree lives in a call-local arena: nodes refer to their children by
//! index, and the arena is dropped with the tree.

use super::frequency::FrequencyTable;
use crate::error::{Error, Result};
use crate::queue::{HeapContext, IndexedPriorityQueue};

/// Index of a node in the tree arena
pub type NodeId = usize;

/// Worst-case node count: 256 leaves + 255 internal nodes, rounded up
pub const MAX_NODES: usize = 512;

/// Capacity of a code pattern in bits
///
/// The longest code over a 256-symbol alphabet has 255 bits.
pub const MAX_CODE_BITS: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Leaf(u8),
    /// Children reached by bit 0 and bit 1
    Internal { left: NodeId, right: NodeId },
}

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// Sum of descendant leaf frequencies
    pub weight: u64,
    /// Heap position while the node is queued during construction
    heap_pos: usize,
}

/// Node arena used while building; orders nodes by weight
struct NodeArena {
    nodes: Vec<TreeNode>,
}

impl NodeArena {
    fn alloc(&mut self, kind: NodeKind, weight: u64) -> NodeId {
        debug_assert!(self.nodes.len() < MAX_NODES);
        self.nodes.push(TreeNode { kind, weight, heap_pos: 0 });
        self.nodes.len() - 1
    }
}

impl HeapContext<NodeId> for NodeArena {
    fn lower_priority(&self, a: NodeId, b: NodeId) -> bool {
        self.nodes[a].weight > self.nodes[b].weight
    }

    fn position(&self, item: NodeId) -> usize {
        self.nodes[item].heap_pos
    }

    fn set_position(&mut self, item: NodeId, pos: usize) {
        self.nodes[item].heap_pos = pos;
    }
}

/// Binary prefix tree over the byte alphabet
#[derive(Clone, Debug)]
pub struct HuffmanTree {
    nodes: Vec<TreeNode>,
    root: NodeId,
}

impl HuffmanTree {
    /// Build the Huffman tree for a frequency table
    ///
    /// Leaves are queued in ascending symbol order and each merge makes the
    /// first popped node the left child, so the same table always yields the
    /// same tree. Fails with [`Error::NoSymbols`] if no symbol is used.
    pub fn build(frequencies: &FrequencyTable) -> Result<Self> {
        let mut arena = NodeArena { nodes: Vec::with_capacity(MAX_NODES) };
        let mut queue = IndexedPriorityQueue::with_capacity(256);

        for (symbol, count) in frequencies.used() {
            let leaf = arena.alloc(NodeKind::Leaf(symbol), count);
            queue.push(&mut arena, leaf);
        }

        let mut root = queue.pop(&mut arena).ok_or(Error::NoSymbols)?;
        while let Some(second) = queue.pop(&mut arena) {
            let weight = arena.nodes[root]
                .weight
                .checked_add(arena.nodes[second].weight)
                .ok_or(Error::Corrupt("symbol frequencies overflow"))?;
            let merged = arena.alloc(NodeKind::Internal { left: root, right: second }, weight);
            queue.push(&mut arena, merged);
            // Queue is non-empty right after a push
            root = match queue.pop(&mut arena) {
                Some(node) => node,
                None => return Err(Error::Internal("priority queue lost a node".to_string())),
            };
        }

        Ok(Self { nodes: arena.nodes, root })
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    /// Child of an internal node along `bit`, `None` for a leaf
    #[inline]
    pub fn child(&self, id: NodeId, bit: bool) -> Option<NodeId> {
        match self.nodes[id].kind {
            NodeKind::Leaf(_) => None,
            NodeKind::Internal { left, right } => Some(if bit { right } else { left }),
        }
    }

    /// Number of nodes in the tree
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Derive the per-symbol code table
    ///
    /// Left edges append a 0 bit, right edges a 1 bit. A tree made of a
    /// single leaf gets the one-bit code `0`.
    pub fn code_table(&self) -> CodeTable {
        let mut table = CodeTable::new();

        if let NodeKind::Leaf(symbol) = self.nodes[self.root].kind {
            table.codes[symbol as usize] = Code::EMPTY.with_bit(false);
            return table;
        }

        let mut stack = vec![(self.root, Code::EMPTY)];
        while let Some((id, code)) = stack.pop() {
            match self.nodes[id].kind {
                NodeKind::Leaf(symbol) => table.codes[symbol as usize] = code,
                NodeKind::Internal { left, right } => {
                    stack.push((right, code.with_bit(true)));
                    stack.push((left, code.with_bit(false)));
                }
            }
        }
        table
    }
}

/// A prefix code: up to [`MAX_CODE_BITS`] bits stored MSB-first
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Code {
    bits: [u8; MAX_CODE_BITS / 8],
    len: u16,
}

impl Code {
    pub const EMPTY: Code = Code { bits: [0; MAX_CODE_BITS / 8], len: 0 };

    /// This code extended by one bit
    pub fn with_bit(mut self, bit: bool) -> Self {
        debug_assert!((self.len as usize) < MAX_CODE_BITS, "code length overflow");
        if bit {
            self.bits[self.len as usize / 8] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
        self
    }

    /// Length in bits
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn bit(&self, i: usize) -> bool {
        debug_assert!(i < self.len());
        self.bits[i / 8] & (0x80 >> (i % 8)) != 0
    }

    /// Pattern bytes covering the code; bits past `len` are zero
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits[..self.len().div_ceil(8)]
    }

    /// Whether `self` is a prefix of `other` (a code is a prefix of itself)
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len && (0..self.len()).all(|i| self.bit(i) == other.bit(i))
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.len() {
            f.write_str(if self.bit(i) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Code for every byte value; unused symbols have an empty code
#[derive(Clone, Debug)]
pub struct CodeTable {
    codes: [Code; 256],
}

impl CodeTable {
    fn new() -> Self {
        Self { codes: [Code::EMPTY; 256] }
    }

    #[inline]
    pub fn get(&self, symbol: u8) -> &Code {
        &self.codes[symbol as usize]
    }

    /// Symbols that have a code, with their codes
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Code)> + '_ {
        self.codes.iter().enumerate().filter(|(_, c)| !c.is_empty()).map(|(s, c)| (s as u8, c))
    }

    /// Payload size in bits for a unit with the given frequencies
    pub fn encoded_bits(&self, frequencies: &FrequencyTable) -> u64 {
        self.iter().map(|(s, c)| frequencies.get(s) * c.len() as u64).sum()
    }
}
