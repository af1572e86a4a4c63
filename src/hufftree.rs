use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::bit_vec::BitVec;
use crate::encoding_table::EncodingTable;
use crate::error::{HuffmanError, Result};
use crate::min_heap::MinHeap;

/// Deepest root-to-leaf path accepted. 257 distinct leaves can never need more.
pub const MAX_TREE_DEPTH: usize = 256;

/// Value carried by a leaf: a byte, or the end-of-stream sentinel that sits
/// outside the byte domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
    Byte(u8),
    EndOfStream,
}

impl From<u8> for Symbol {
    fn from(byte: u8) -> Self {
        Symbol::Byte(byte)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Byte(b) => f.pad(&format!("0x{b:02x}")),
            Symbol::EndOfStream => f.pad("<eos>"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HuffNode {
    Leaf(Symbol),
    Internal {
        left: Box<HuffNode>,
        right: Box<HuffNode>,
    },
}

impl HuffNode {
    pub fn leaf(symbol: impl Into<Symbol>) -> Self {
        HuffNode::Leaf(symbol.into())
    }

    pub fn merge(left: Self, right: Self) -> Self {
        HuffNode::Internal {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, HuffNode::Leaf(_))
    }

    pub fn symbol(&self) -> Option<Symbol> {
        match self {
            HuffNode::Leaf(symbol) => Some(*symbol),
            HuffNode::Internal { .. } => None,
        }
    }

    /// Follow the edge for `bit`: `false` is left, `true` is right.
    pub fn child(&self, bit: bool) -> Option<&HuffNode> {
        match self {
            HuffNode::Leaf(_) => None,
            HuffNode::Internal { left, right } => Some(if bit { right } else { left }),
        }
    }

    fn generate_table(&self, table: &mut BTreeMap<Symbol, BitVec>, path: &mut BitVec) {
        match self {
            HuffNode::Leaf(symbol) => {
                table.insert(*symbol, path.clone());
            }
            HuffNode::Internal { left, right } => {
                // Left = 0, Right = 1, codes run root to leaf
                path.push_bit(false);
                left.generate_table(table, path);
                path.pop_bit();

                path.push_bit(true);
                right.generate_table(table, path);
                path.pop_bit();
            }
        }
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, depth: usize, label: &str) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            HuffNode::Leaf(Symbol::Byte(b)) if b.is_ascii_graphic() => {
                writeln!(f, "{indent}{label}-> Leaf: '{}' (0x{b:02x})", *b as char)
            }
            HuffNode::Leaf(symbol) => writeln!(f, "{indent}{label}-> Leaf: {symbol}"),
            HuffNode::Internal { left, right } => {
                writeln!(f, "{indent}{label}-> Internal")?;
                left.fmt_node(f, depth + 1, "L")?;
                right.fmt_node(f, depth + 1, "R")
            }
        }
    }
}

/// A validated prefix-code tree: unique leaf values, exactly one sentinel
/// leaf, and no path longer than [`MAX_TREE_DEPTH`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: HuffNode,
}

impl HuffmanTree {
    pub fn new(root: HuffNode) -> Result<Self> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![(&root, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            if depth > MAX_TREE_DEPTH {
                return Err(HuffmanError::malformed(format!(
                    "tree deeper than {MAX_TREE_DEPTH} levels"
                )));
            }
            match node {
                HuffNode::Leaf(symbol) => {
                    if !seen.insert(*symbol) {
                        return Err(HuffmanError::malformed(format!(
                            "symbol {symbol} appears in more than one leaf"
                        )));
                    }
                }
                HuffNode::Internal { left, right } => {
                    stack.push((&**right, depth + 1));
                    stack.push((&**left, depth + 1));
                }
            }
        }

        if !seen.contains(&Symbol::EndOfStream) {
            return Err(HuffmanError::malformed("tree has no end-of-stream leaf"));
        }
        Ok(HuffmanTree { root })
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let counts = bytes.iter().fold(BTreeMap::new(), |mut acc, &byte| {
            *acc.entry(byte).or_insert(0u64) += 1;
            acc
        });

        HuffmanTree::from_frequencies(&counts)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let mut f = File::open(path)?;
        let mut data = Vec::new();
        f.read_to_end(&mut data)?;
        HuffmanTree::from_bytes(&data)
    }

    /// Build a tree from byte counts. The sentinel is added with weight 1;
    /// bytes with a zero count get no leaf.
    pub fn from_frequencies(frequencies: &BTreeMap<u8, u64>) -> Result<Self> {
        let mut seq = 0usize;
        let mut nodes: Vec<WeightedNode> = frequencies
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&byte, &count)| (Symbol::Byte(byte), count))
            .chain(std::iter::once((Symbol::EndOfStream, 1)))
            .map(|(symbol, weight)| {
                seq += 1;
                WeightedNode {
                    weight,
                    seq,
                    node: HuffNode::Leaf(symbol),
                }
            })
            .collect();
        nodes.sort();

        let mut heap = MinHeap::build(nodes)?;
        while heap.heap_size() > 1 {
            let x = heap.extract_min()?;
            let y = heap.extract_min()?;
            seq += 1;
            // weights saturate at u64::MAX
            heap.insert(WeightedNode {
                weight: x.weight.saturating_add(y.weight),
                seq,
                node: HuffNode::merge(x.node, y.node),
            });
        }
        let root = heap.extract_min()?.node;

        HuffmanTree::new(root)
    }

    pub fn root(&self) -> &HuffNode {
        &self.root
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            match node {
                HuffNode::Leaf(_) => count += 1,
                HuffNode::Internal { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
        count
    }

    /// Length of the longest code in the tree.
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(&self.root, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                HuffNode::Leaf(_) => max = max.max(depth),
                HuffNode::Internal { left, right } => {
                    stack.push((&**left, depth + 1));
                    stack.push((&**right, depth + 1));
                }
            }
        }
        max
    }

    pub fn generate_table(&self) -> EncodingTable {
        let mut table = BTreeMap::new();
        self.root.generate_table(&mut table, &mut BitVec::new());
        EncodingTable::new(table)
    }
}

impl fmt::Display for HuffmanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Huffman Tree Structure:")?;
        self.root.fmt_node(f, 0, "root")
    }
}

// Heap entry for tree construction. `seq` breaks weight ties so that equal
// inputs always produce the same tree.
#[derive(Debug)]
struct WeightedNode {
    weight: u64,
    seq: usize,
    node: HuffNode,
}

impl PartialEq for WeightedNode {
    fn eq(&self, other: &Self) -> bool {
        self.weight == other.weight && self.seq == other.seq
    }
}

impl Eq for WeightedNode {}

impl PartialOrd for WeightedNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WeightedNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .cmp(&other.weight)
            .then(self.seq.cmp(&other.seq))
    }
}
