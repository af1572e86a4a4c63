//! Self-delimiting tree descriptions.
//!
//! The description is written ahead of the payload in every container. The
//! codec only needs "write one tree" and "read one tree", so the encoding
//! sits behind [`TreeFormat`] and can be swapped without touching the stream
//! engine.

use std::io;

use bitstream_io::{BitRead, BitWrite};

use crate::error::{HuffmanError, Result};
use crate::hufftree::{HuffNode, HuffmanTree, Symbol, MAX_TREE_DEPTH};

/// Reads and writes a tree description at the current stream position.
pub trait TreeFormat {
    /// Write `tree` and return the number of bytes the description occupies.
    fn write_tree<W: BitWrite>(&self, tree: &HuffmanTree, writer: &mut W) -> Result<usize>;

    /// Read one description, leaving the reader just past it.
    ///
    /// Returns `Ok(None)` when the stream holds no data at all. A stream that
    /// ends part way through a description is `MalformedTree`.
    fn read_tree<R: BitRead>(&self, reader: &mut R) -> Result<Option<HuffmanTree>>;
}

const TAG_INTERNAL: u8 = 0x00;
const TAG_BYTE_LEAF: u8 = 0x01;
const TAG_END_LEAF: u8 = 0x02;

/// Byte-aligned pre-order encoding.
///
/// Each node starts with a tag byte:
///
/// | tag    | node                | followed by                |
/// |--------|---------------------|----------------------------|
/// | `0x00` | internal            | left subtree, right subtree |
/// | `0x01` | byte leaf           | the symbol byte             |
/// | `0x02` | end-of-stream leaf  | nothing                     |
///
/// Other tag values are reserved and rejected on read.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreorderFormat;

impl PreorderFormat {
    fn write_node<W: BitWrite>(node: &HuffNode, writer: &mut W) -> io::Result<usize> {
        match node {
            HuffNode::Leaf(Symbol::Byte(b)) => {
                writer.write(8, TAG_BYTE_LEAF)?;
                writer.write(8, *b)?;
                Ok(2)
            }
            HuffNode::Leaf(Symbol::EndOfStream) => {
                writer.write(8, TAG_END_LEAF)?;
                Ok(1)
            }
            HuffNode::Internal { left, right } => {
                writer.write(8, TAG_INTERNAL)?;
                let l = Self::write_node(left, writer)?;
                let r = Self::write_node(right, writer)?;
                Ok(1 + l + r)
            }
        }
    }

    fn read_node<R: BitRead>(reader: &mut R, tag: u8, depth: usize) -> Result<HuffNode> {
        if depth > MAX_TREE_DEPTH {
            return Err(HuffmanError::malformed(format!(
                "tree description nests deeper than {MAX_TREE_DEPTH} levels"
            )));
        }
        match tag {
            TAG_INTERNAL => {
                let tag = read_byte(reader)?;
                let left = Self::read_node(reader, tag, depth + 1)?;
                let tag = read_byte(reader)?;
                let right = Self::read_node(reader, tag, depth + 1)?;
                Ok(HuffNode::merge(left, right))
            }
            TAG_BYTE_LEAF => Ok(HuffNode::Leaf(Symbol::Byte(read_byte(reader)?))),
            TAG_END_LEAF => Ok(HuffNode::Leaf(Symbol::EndOfStream)),
            other => Err(HuffmanError::malformed(format!(
                "unknown node tag 0x{other:02x}"
            ))),
        }
    }
}

impl TreeFormat for PreorderFormat {
    fn write_tree<W: BitWrite>(&self, tree: &HuffmanTree, writer: &mut W) -> Result<usize> {
        Ok(Self::write_node(tree.root(), writer)?)
    }

    fn read_tree<R: BitRead>(&self, reader: &mut R) -> Result<Option<HuffmanTree>> {
        let tag = match reader.read::<u8>(8) {
            Ok(tag) => tag,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let root = Self::read_node(reader, tag, 0)?;
        HuffmanTree::new(root).map(Some)
    }
}

fn read_byte<R: BitRead>(reader: &mut R) -> Result<u8> {
    reader.read::<u8>(8).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            HuffmanError::malformed("stream ended inside tree description")
        } else {
            e.into()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream_io::{BigEndian, BitReader, BitWriter};
    use std::io::Cursor;

    fn encode(tree: &HuffmanTree) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = BitWriter::endian(&mut out, BigEndian);
        let n = PreorderFormat.write_tree(tree, &mut writer).unwrap();
        assert!(writer.byte_aligned());
        drop(writer);
        assert_eq!(n, out.len());
        out
    }

    fn decode(bytes: &[u8]) -> Result<Option<HuffmanTree>> {
        let mut reader = BitReader::endian(Cursor::new(bytes), BigEndian);
        PreorderFormat.read_tree(&mut reader)
    }

    #[test]
    fn known_layout() {
        let tree = HuffmanTree::new(HuffNode::merge(
            HuffNode::leaf(b'a'),
            HuffNode::merge(HuffNode::leaf(b'b'), HuffNode::Leaf(Symbol::EndOfStream)),
        ))
        .unwrap();
        assert_eq!(
            encode(&tree),
            vec![0x00, 0x01, b'a', 0x00, 0x01, b'b', 0x02]
        );
    }

    #[test]
    fn reads_back_built_tree() {
        let tree = HuffmanTree::from_bytes(b"she sells sea shells by the sea shore").unwrap();
        let bytes = encode(&tree);
        assert_eq!(decode(&bytes).unwrap(), Some(tree));
    }

    #[test]
    fn leaves_reader_after_description() {
        let tree = HuffmanTree::from_bytes(b"aab").unwrap();
        let mut bytes = encode(&tree);
        let tree_len = bytes.len();
        bytes.extend_from_slice(&[0xA5, 0x5A]);

        let mut reader = BitReader::endian(Cursor::new(&bytes[..]), BigEndian);
        let read = PreorderFormat.read_tree(&mut reader).unwrap();
        assert_eq!(read, Some(tree));
        assert_eq!(reader.read::<u8>(8).unwrap(), 0xA5);
        assert_eq!(reader.read::<u8>(8).unwrap(), 0x5A);
        assert_eq!(bytes.len(), tree_len + 2);
    }

    #[test]
    fn empty_stream_has_no_tree() {
        assert!(decode(&[]).unwrap().is_none());
    }

    #[test]
    fn truncated_description_is_malformed() {
        let tree = HuffmanTree::from_bytes(b"hello world").unwrap();
        let bytes = encode(&tree);
        for cut in 1..bytes.len() {
            assert!(
                matches!(decode(&bytes[..cut]), Err(HuffmanError::MalformedTree(_))),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn unknown_tag_is_malformed() {
        assert!(matches!(
            decode(&[0x00, 0x07, 0x02]),
            Err(HuffmanError::MalformedTree(_))
        ));
    }

    #[test]
    fn structurally_invalid_trees_are_malformed() {
        // no sentinel leaf
        assert!(matches!(
            decode(&[0x00, 0x01, b'a', 0x01, b'b']),
            Err(HuffmanError::MalformedTree(_))
        ));
        // duplicate sentinel
        assert!(matches!(
            decode(&[0x00, 0x02, 0x02]),
            Err(HuffmanError::MalformedTree(_))
        ));
    }

    #[test]
    fn runaway_nesting_is_rejected() {
        let bytes = vec![TAG_INTERNAL; 10_000];
        assert!(matches!(
            decode(&bytes),
            Err(HuffmanError::MalformedTree(_))
        ));
    }
}
