//! Error types for compression and decompression

use thiserror::Error;

use crate::hufftree::Symbol;
use crate::min_heap::HeapErr;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, HuffmanError>;

/// Errors that can occur while building trees or running the codec
#[derive(Error, Debug)]
pub enum HuffmanError {
    /// Tree description unreadable or inconsistent
    #[error("malformed tree description: {0}")]
    MalformedTree(String),

    /// Payload ended before the end-of-stream code was decoded
    #[error("compressed stream truncated after {decoded} decoded bytes")]
    TruncatedStream { decoded: u64 },

    /// Input byte has no code in the encoding table
    #[error("symbol {0} has no code in the encoding table")]
    UnencodableSymbol(Symbol),

    /// Tree construction failure
    #[error("tree construction failed: {0}")]
    Heap(#[from] HeapErr),

    /// Underlying reader/writer failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl HuffmanError {
    /// Create a malformed tree error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedTree(msg.into())
    }

    /// True for errors that mean the compressed input is corrupt rather than
    /// an I/O or programming failure.
    pub fn is_corrupt_input(&self) -> bool {
        matches!(
            self,
            HuffmanError::MalformedTree(_) | HuffmanError::TruncatedStream { .. }
        )
    }
}
