//! # huffstream
//!
//! Byte-oriented Huffman compression with a self-terminating container:
//! a tree description followed by a bit-packed payload that ends with an
//! explicit end-of-stream code and zero padding to a byte boundary.
//!
//! ## Quick Start
//!
//! ```rust
//! use huffstream::{compress, decompress, Decompressed, HuffmanTree};
//!
//! let data = b"abracadabra";
//! let tree = HuffmanTree::from_bytes(data)?;
//!
//! let mut packed = Vec::new();
//! compress(&tree, &data[..], &mut packed)?;
//!
//! let mut unpacked = Vec::new();
//! let outcome = decompress(&packed[..], &mut unpacked)?;
//! assert_eq!(outcome, Decompressed::Complete { bytes_written: 11 });
//! assert_eq!(unpacked, data);
//! # Ok::<(), huffstream::HuffmanError>(())
//! ```

pub mod encoding_table;
pub mod error;
pub mod huffman_codec;
pub mod hufftree;
pub mod tree_format;

// Internal modules - not part of public API
mod bit_vec;
mod min_heap;

pub use bit_vec::BitVec;
pub use encoding_table::EncodingTable;
pub use error::{HuffmanError, Result};
pub use huffman_codec::{
    compress, compress_with, decode_symbol, decompress, decompress_with, CodecConfig,
    CompressStats, Decompressed, HuffmanCodec,
};
pub use hufftree::{HuffNode, HuffmanTree, Symbol};
pub use min_heap::HeapErr;
pub use tree_format::{PreorderFormat, TreeFormat};
