use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "huffstream", about = "Huffman file compressor", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Log progress to stderr (honours RUST_LOG)
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress all logging
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compress a file with a tree fitted to its byte frequencies
    Compress {
        /// File to compress
        input: PathBuf,

        /// Output path (defaults to <input>.huf)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Decompress a file produced by `compress`
    Decompress {
        /// Compressed file
        input: PathBuf,

        /// Output path (defaults to <input> without .huf, else <input>.decomp)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Accept a payload that ends cleanly without an end-of-stream code
        #[arg(long)]
        lenient: bool,
    },

    /// Print the tree and code table stored in a compressed file
    Inspect {
        /// Compressed file
        input: PathBuf,
    },
}

pub fn compressed_path(input: &std::path::Path) -> PathBuf {
    let mut name = input.as_os_str().to_owned();
    name.push(".huf");
    PathBuf::from(name)
}

pub fn decompressed_path(input: &std::path::Path) -> PathBuf {
    match input.extension() {
        Some(ext) if ext == "huf" => input.with_extension(""),
        _ => {
            let mut name = input.as_os_str().to_owned();
            name.push(".decomp");
            PathBuf::from(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn default_output_paths() {
        assert_eq!(compressed_path(Path::new("a/b.txt")), Path::new("a/b.txt.huf"));
        assert_eq!(decompressed_path(Path::new("a/b.txt.huf")), Path::new("a/b.txt"));
        assert_eq!(decompressed_path(Path::new("blob")), Path::new("blob.decomp"));
    }
}
