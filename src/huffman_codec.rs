use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use tracing::{debug, warn};

use crate::encoding_table::EncodingTable;
use crate::error::{HuffmanError, Result};
use crate::hufftree::{HuffNode, HuffmanTree, Symbol};
use crate::tree_format::{PreorderFormat, TreeFormat};

/// Decoder behaviour knobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodecConfig {
    /// Accept a payload that runs out at a symbol boundary without an
    /// end-of-stream code. Off by default: such a stream is reported as
    /// `TruncatedStream`.
    pub allow_missing_end_marker: bool,
}

impl CodecConfig {
    pub fn lenient() -> Self {
        CodecConfig {
            allow_missing_end_marker: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressStats {
    pub input_bytes: u64,
    pub tree_bytes: u64,
    pub payload_bits: u64,
}

impl CompressStats {
    /// Total container size, payload padded to a whole byte.
    pub fn output_bytes(&self) -> u64 {
        self.tree_bytes + self.payload_bits.div_ceil(8)
    }
}

/// Outcome of a successful decompression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decompressed {
    /// The input held no tree description; nothing was written.
    NoTree,
    /// The payload decoded up to its end-of-stream code.
    Complete { bytes_written: u64 },
}

/// Walk from `root` one bit at a time until a leaf is reached.
///
/// Returns `Ok(None)` if the reader is exhausted before any bit of the
/// symbol was read, and `TruncatedStream` if it runs dry mid-symbol. A root
/// that is itself a leaf returns immediately without reading.
pub fn decode_symbol<R: BitRead>(root: &HuffNode, reader: &mut R) -> Result<Option<Symbol>> {
    let mut node = root;
    let mut consumed = 0u32;
    loop {
        match node {
            HuffNode::Leaf(symbol) => return Ok(Some(*symbol)),
            HuffNode::Internal { left, right } => {
                let bit = match reader.read_bit() {
                    Ok(bit) => bit,
                    Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                        return if consumed == 0 {
                            Ok(None)
                        } else {
                            Err(HuffmanError::TruncatedStream { decoded: 0 })
                        };
                    }
                    Err(e) => return Err(e.into()),
                };
                consumed += 1;
                node = if bit { right } else { left };
            }
        }
    }
}

/// Decode symbols into `output` until the end-of-stream code.
///
/// Returns the number of bytes written.
pub fn decode_payload<R: BitRead, W: Write>(
    tree: &HuffmanTree,
    reader: &mut R,
    output: &mut W,
    config: &CodecConfig,
) -> Result<u64> {
    let mut written = 0u64;
    loop {
        let symbol = decode_symbol(tree.root(), reader).map_err(|e| match e {
            HuffmanError::TruncatedStream { .. } => {
                HuffmanError::TruncatedStream { decoded: written }
            }
            other => other,
        })?;

        match symbol {
            Some(Symbol::Byte(b)) => {
                output.write_all(&[b])?;
                written += 1;
            }
            Some(Symbol::EndOfStream) => break,
            None if config.allow_missing_end_marker => {
                warn!(written, "payload ended without end-of-stream code");
                break;
            }
            None => return Err(HuffmanError::TruncatedStream { decoded: written }),
        }
    }
    Ok(written)
}

/// Encode every byte of `input`, then the end-of-stream code, and pad the
/// final byte with zero bits.
///
/// Returns `(input_bytes, payload_bits)`.
pub fn encode_payload<R: Read, W: BitWrite>(
    table: &EncodingTable,
    input: R,
    writer: &mut W,
) -> Result<(u64, u64)> {
    let mut reader = BitReader::endian(input, BigEndian);
    let mut input_bytes = 0u64;
    let mut bits = 0u64;

    loop {
        let byte = match reader.read::<u8>(8) {
            Ok(byte) => byte,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e.into()),
        };
        let code = table.get(Symbol::Byte(byte))?;
        for bit in code.iter() {
            writer.write_bit(bit)?;
        }
        input_bytes += 1;
        bits += code.len() as u64;
    }

    let end = table.end_of_stream()?;
    for bit in end.iter() {
        writer.write_bit(bit)?;
    }
    bits += end.len() as u64;
    writer.byte_align()?;

    Ok((input_bytes, bits))
}

/// Write `tree` followed by the encoded contents of `input` to `output`.
///
/// On error `output` may already hold the tree description and part of the
/// payload. That prefix is not a valid container.
pub fn compress<R: Read, W: Write>(tree: &HuffmanTree, input: R, output: W) -> Result<CompressStats> {
    compress_with(&PreorderFormat, tree, input, output)
}

pub fn compress_with<F: TreeFormat, R: Read, W: Write>(
    format: &F,
    tree: &HuffmanTree,
    input: R,
    output: W,
) -> Result<CompressStats> {
    let table = tree.generate_table();
    encode_with_table(format, tree, &table, input, output)
}

fn encode_with_table<F: TreeFormat, R: Read, W: Write>(
    format: &F,
    tree: &HuffmanTree,
    table: &EncodingTable,
    input: R,
    output: W,
) -> Result<CompressStats> {
    let mut writer = BitWriter::endian(BufWriter::new(output), BigEndian);

    let tree_bytes = format.write_tree(tree, &mut writer)? as u64;
    debug!(tree_bytes, leaves = table.len(), "tree description written");

    let (input_bytes, payload_bits) = encode_payload(table, BufReader::new(input), &mut writer)?;
    writer.into_writer().flush()?;

    let stats = CompressStats {
        input_bytes,
        tree_bytes,
        payload_bits,
    };
    debug!(
        input_bytes,
        payload_bits,
        output_bytes = stats.output_bytes(),
        "compression finished"
    );
    Ok(stats)
}

/// Read a tree description from `input` and decode the payload after it.
///
/// An input with no data yields [`Decompressed::NoTree`] and leaves `output`
/// untouched. On error the bytes already written to `output` are an
/// incomplete prefix and must not be treated as a result.
pub fn decompress<R: Read, W: Write>(input: R, output: W) -> Result<Decompressed> {
    decompress_with(&PreorderFormat, &CodecConfig::default(), input, output)
}

pub fn decompress_with<F: TreeFormat, R: Read, W: Write>(
    format: &F,
    config: &CodecConfig,
    input: R,
    output: W,
) -> Result<Decompressed> {
    let mut reader = BitReader::endian(BufReader::new(input), BigEndian);

    let tree = match format.read_tree(&mut reader)? {
        Some(tree) => tree,
        None => {
            debug!("input holds no tree description");
            return Ok(Decompressed::NoTree);
        }
    };
    debug!(leaves = tree.leaf_count(), depth = tree.depth(), "tree description read");

    let mut output = BufWriter::new(output);
    let bytes_written = decode_payload(&tree, &mut reader, &mut output, config)?;
    output.flush()?;

    debug!(bytes_written, "decompression finished");
    Ok(Decompressed::Complete { bytes_written })
}

/// A tree and its encoding table, ready to compress many inputs.
pub struct HuffmanCodec {
    tree: HuffmanTree,
    encode_table: EncodingTable,
    config: CodecConfig,
}

impl HuffmanCodec {
    pub fn new(tree: HuffmanTree) -> Self {
        let encode_table = tree.generate_table();
        HuffmanCodec {
            tree,
            encode_table,
            config: CodecConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    /// Build a codec whose tree fits the byte frequencies of the file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(HuffmanTree::from_file(path)?))
    }

    pub fn tree(&self) -> &HuffmanTree {
        &self.tree
    }

    pub fn table(&self) -> &EncodingTable {
        &self.encode_table
    }

    pub fn compress<R: Read, W: Write>(&self, input: R, output: W) -> Result<CompressStats> {
        encode_with_table(&PreorderFormat, &self.tree, &self.encode_table, input, output)
    }

    pub fn encode(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.compress(data, &mut out)?;
        Ok(out)
    }

    /// Decode a whole container held in memory. The container carries its
    /// own tree, so this does not depend on the codec's tree.
    pub fn decode(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        // partial output is dropped with `out` on error
        decompress_with(&PreorderFormat, &self.config, compressed, &mut out)?;
        Ok(out)
    }

    /// Compress `input` into a new file at `output`. The output file is
    /// removed again if compression fails part way.
    pub fn compress_file(&self, input: &Path, output: &Path) -> Result<CompressStats> {
        let src = File::open(input)?;
        let dst = File::create(output)?;
        self.compress(src, dst).inspect_err(|_| {
            let _ = std::fs::remove_file(output);
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    fn eos() -> HuffNode {
        HuffNode::Leaf(Symbol::EndOfStream)
    }

    fn roundtrip(tree: &HuffmanTree, data: &[u8]) -> Vec<u8> {
        let mut packed = Vec::new();
        compress(tree, data, &mut packed).unwrap();
        let mut unpacked = Vec::new();
        let outcome = decompress(&packed[..], &mut unpacked).unwrap();
        assert_eq!(
            outcome,
            Decompressed::Complete {
                bytes_written: data.len() as u64
            }
        );
        unpacked
    }

    #[test]
    fn test_text_roundtrip() {
        let text = b"It was the best of times, it was the worst of times.";
        let tree = HuffmanTree::from_bytes(text).unwrap();
        assert_eq!(roundtrip(&tree, text), text);
    }

    #[test]
    fn test_roundtrip_with_wider_tree_than_input() {
        let all: Vec<u8> = (0..=255u8).collect();
        let tree = HuffmanTree::from_bytes(&all).unwrap();
        assert_eq!(roundtrip(&tree, b"only a few symbols"), b"only a few symbols");
        assert_eq!(roundtrip(&tree, &all), all);
    }

    #[test]
    fn test_empty_input() {
        let tree = HuffmanTree::from_bytes(b"abc").unwrap();
        assert_eq!(roundtrip(&tree, b""), b"");

        let lone = HuffmanTree::from_bytes(b"").unwrap();
        let mut packed = Vec::new();
        let stats = compress(&lone, &b""[..], &mut packed).unwrap();
        // one tag byte for the sentinel leaf, empty payload
        assert_eq!(packed, vec![0x02]);
        assert_eq!(stats.payload_bits, 0);
        assert_eq!(roundtrip(&lone, b""), b"");
    }

    #[test]
    fn test_degenerate_two_leaf_tree() {
        let tree = HuffmanTree::new(HuffNode::merge(HuffNode::leaf(b'q'), eos())).unwrap();
        assert_eq!(roundtrip(&tree, b""), b"");
        assert_eq!(roundtrip(&tree, b"q"), b"q");
        assert_eq!(roundtrip(&tree, &[b'q'; 100]), vec![b'q'; 100]);
    }

    #[test]
    fn test_output_is_zero_padded() {
        // q = 0, eos = 1
        let tree = HuffmanTree::new(HuffNode::merge(HuffNode::leaf(b'q'), eos())).unwrap();
        let mut packed = Vec::new();
        let stats = compress(&tree, &b"qqq"[..], &mut packed).unwrap();

        assert_eq!(stats.tree_bytes, 4);
        assert_eq!(stats.payload_bits, 4);
        assert_eq!(stats.output_bytes(), packed.len() as u64);
        assert_eq!(&packed[..4], &[0x00, 0x01, b'q', 0x02]);
        assert_eq!(packed[4], 0b0001_0000);
    }

    #[test]
    fn test_decode_symbol_from_leaf_root_reads_nothing() {
        let mut reader = BitReader::endian(Cursor::new(&[0xFFu8][..]), BigEndian);
        let symbol = decode_symbol(&eos(), &mut reader).unwrap();
        assert_eq!(symbol, Some(Symbol::EndOfStream));
        assert_eq!(reader.read::<u8>(8).unwrap(), 0xFF);
    }

    #[test]
    fn test_decode_symbol_exhaustion() {
        let root = HuffNode::merge(
            HuffNode::leaf(b'a'),
            HuffNode::merge(HuffNode::leaf(b'b'), eos()),
        );
        let mut empty = BitReader::endian(Cursor::new(&[0u8; 0][..]), BigEndian);
        assert_eq!(decode_symbol(&root, &mut empty).unwrap(), None);

        // 0xFF is four eos codes followed by a clean end
        let mut reader = BitReader::endian(Cursor::new(&[0xFFu8][..]), BigEndian);
        for _ in 0..4 {
            assert_eq!(
                decode_symbol(&root, &mut reader).unwrap(),
                Some(Symbol::EndOfStream)
            );
        }
        assert_eq!(decode_symbol(&root, &mut reader).unwrap(), None);

        // 10 10 11 0 then a lone 1 before EOF
        let mut reader = BitReader::endian(Cursor::new(&[0b1010_1101u8][..]), BigEndian);
        let mut seen = Vec::new();
        let err = loop {
            match decode_symbol(&root, &mut reader) {
                Ok(Some(s)) => seen.push(s),
                Ok(None) => panic!("expected truncation"),
                Err(e) => break e,
            }
        };
        assert_eq!(
            seen,
            vec![
                Symbol::Byte(b'b'),
                Symbol::Byte(b'b'),
                Symbol::EndOfStream,
                Symbol::Byte(b'a')
            ]
        );
        assert!(matches!(err, HuffmanError::TruncatedStream { .. }));
    }

    #[test]
    fn test_truncated_container() {
        let text = b"a moderately long sentence so the payload spans bytes";
        let tree = HuffmanTree::from_bytes(text).unwrap();
        let mut packed = Vec::new();
        compress(&tree, &text[..], &mut packed).unwrap();
        packed.pop();

        let mut out = Vec::new();
        let err = decompress(&packed[..], &mut out).unwrap_err();
        assert!(matches!(err, HuffmanError::TruncatedStream { .. }));
        assert!(err.is_corrupt_input());
    }

    #[test]
    fn test_lenient_accepts_missing_end_marker() {
        // q = 0, eos = 1; payload 0x00 decodes as eight q then clean EOF
        let tree = HuffmanTree::new(HuffNode::merge(HuffNode::leaf(b'q'), eos())).unwrap();
        let container = [0x00, 0x01, b'q', 0x02, 0x00];

        let mut out = Vec::new();
        let strict = decompress(&container[..], &mut out);
        assert!(matches!(
            strict,
            Err(HuffmanError::TruncatedStream { decoded: 8 })
        ));

        let codec = HuffmanCodec::new(tree).with_config(CodecConfig::lenient());
        assert_eq!(codec.decode(&container).unwrap(), vec![b'q'; 8]);
    }

    #[test]
    fn test_unencodable_symbol() {
        let tree = HuffmanTree::from_bytes(b"abc").unwrap();
        let mut packed = Vec::new();
        let err = compress(&tree, &b"abcd"[..], &mut packed).unwrap_err();
        assert!(matches!(
            err,
            HuffmanError::UnencodableSymbol(Symbol::Byte(b'd'))
        ));
    }

    #[test]
    fn test_roundtrip_with_saturated_weights() {
        let freqs = std::collections::BTreeMap::from([(b'a', u64::MAX), (b'b', 3)]);
        let tree = HuffmanTree::from_frequencies(&freqs).unwrap();
        assert_eq!(roundtrip(&tree, b"abbaaab"), b"abbaaab");
        assert_eq!(roundtrip(&tree, b""), b"");
    }

    #[test]
    fn test_no_tree_is_empty_output() {
        let mut out = Vec::new();
        assert_eq!(decompress(&b""[..], &mut out).unwrap(), Decompressed::NoTree);
        assert!(out.is_empty());
    }

    #[test]
    fn test_garbage_tree_never_panics() {
        let samples: [&[u8]; 5] = [
            &[0xFF],
            &[0x00],
            &[0x01],
            &[0x00, 0x01, b'a'],
            &[0x00, 0x01, b'a', 0x01, b'a', 0x02],
        ];
        for sample in samples {
            let mut out = Vec::new();
            let res = decompress(sample, &mut out);
            assert!(
                matches!(res, Err(HuffmanError::MalformedTree(_))),
                "{sample:?} -> {res:?}"
            );
            assert!(out.is_empty());
        }
    }

    #[test]
    fn test_sentinel_is_not_emitted() {
        // sentinel code is all ones here, followed by bytes that would decode
        // to more data if decoding did not stop
        let tree = HuffmanTree::new(HuffNode::merge(
            HuffNode::leaf(0xFFu8),
            HuffNode::merge(HuffNode::leaf(0x00u8), eos()),
        ))
        .unwrap();
        let mut packed = Vec::new();
        compress(&tree, &[0xFFu8, 0x00][..], &mut packed).unwrap();
        packed.push(0x00);

        let mut out = Vec::new();
        decompress(&packed[..], &mut out).unwrap();
        assert_eq!(out, vec![0xFF, 0x00]);
    }

    #[test]
    fn test_codec_encode_decode() {
        let codec = HuffmanCodec::new(HuffmanTree::from_bytes(b"banana bandana").unwrap());
        let packed = codec.encode(b"banana").unwrap();
        assert_eq!(codec.decode(&packed).unwrap(), b"banana");
        assert!(codec.table().get(Symbol::Byte(b'd')).is_ok());
    }
}
