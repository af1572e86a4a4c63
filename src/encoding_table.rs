//! Symbol to code lookup derived from a tree.

use std::collections::BTreeMap;
use std::fmt;

use crate::bit_vec::BitVec;
use crate::error::{HuffmanError, Result};
use crate::hufftree::Symbol;

/// Root-to-leaf bit path for every leaf of a tree, sentinel included.
///
/// Built once per run with [`HuffmanTree::generate_table`](crate::HuffmanTree::generate_table)
/// and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodingTable {
    codes: BTreeMap<Symbol, BitVec>,
}

impl EncodingTable {
    pub(crate) fn new(codes: BTreeMap<Symbol, BitVec>) -> Self {
        EncodingTable { codes }
    }

    /// Code for `symbol`, or `UnencodableSymbol` when the tree has no such leaf.
    pub fn get(&self, symbol: Symbol) -> Result<&BitVec> {
        self.codes
            .get(&symbol)
            .ok_or(HuffmanError::UnencodableSymbol(symbol))
    }

    pub fn end_of_stream(&self) -> Result<&BitVec> {
        self.get(Symbol::EndOfStream)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Symbol, &BitVec)> + '_ {
        self.codes.iter().map(|(s, c)| (*s, c))
    }
}

impl fmt::Display for EncodingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (symbol, code) in self.iter() {
            writeln!(f, "{symbol:>6}  {:>3}  {code}", code.len())?;
        }
        Ok(())
    }
}
