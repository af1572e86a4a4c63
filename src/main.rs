mod cli;

use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;

use anyhow::{Context, Result};
use bitstream_io::{BigEndian, BitReader};
use clap::Parser;
use cli::{Cli, Commands};
use huffstream::{
    decompress_with, CodecConfig, Decompressed, HuffmanCodec, PreorderFormat, TreeFormat,
};
use tracing::info;

fn init_tracing(cli: &Cli) {
    // --quiet  → off
    // --verbose → RUST_LOG if set, otherwise debug
    // default  → RUST_LOG if set, otherwise warn
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        let fallback = if cli.verbose { "debug" } else { "warn" };
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| fallback.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Compress { input, output } => {
            let output = output.unwrap_or_else(|| cli::compressed_path(&input));
            let codec = HuffmanCodec::from_file(&input)
                .with_context(|| format!("building tree from {}", input.display()))?;
            let stats = codec
                .compress_file(&input, &output)
                .with_context(|| format!("compressing {}", input.display()))?;
            info!(
                input = %input.display(),
                output = %output.display(),
                input_bytes = stats.input_bytes,
                output_bytes = stats.output_bytes(),
                "compressed"
            );
        }

        Commands::Decompress {
            input,
            output,
            lenient,
        } => {
            let output = output.unwrap_or_else(|| cli::decompressed_path(&input));
            let config = if lenient {
                CodecConfig::lenient()
            } else {
                CodecConfig::default()
            };
            let src = File::open(&input)
                .with_context(|| format!("opening {}", input.display()))?;
            let dst = File::create(&output)
                .with_context(|| format!("creating {}", output.display()))?;

            let outcome = decompress_with(&PreorderFormat, &config, src, dst);
            match outcome {
                Ok(Decompressed::NoTree) => {
                    eprintln!("{}: no Huffman tree found, wrote empty output", input.display());
                }
                Ok(Decompressed::Complete { bytes_written }) => {
                    info!(output = %output.display(), bytes_written, "decompressed");
                }
                Err(e) => {
                    // never leave a partial file looking like a result
                    let _ = std::fs::remove_file(&output);
                    return Err(e).with_context(|| format!("decompressing {}", input.display()));
                }
            }
        }

        Commands::Inspect { input } => {
            let src = File::open(&input)
                .with_context(|| format!("opening {}", input.display()))?;
            let mut reader = BitReader::endian(BufReader::new(src), BigEndian);
            match PreorderFormat
                .read_tree(&mut reader)
                .with_context(|| format!("reading tree from {}", input.display()))?
            {
                Some(tree) => {
                    let table = tree.generate_table();
                    print!("{tree}");
                    println!(
                        "{} leaves, longest code {} bits",
                        tree.leaf_count(),
                        tree.depth()
                    );
                    print!("{table}");
                }
                None => println!("{}: empty, no tree", input.display()),
            }
        }
    }
    Ok(())
}
