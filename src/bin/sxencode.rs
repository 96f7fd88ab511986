//! sxencode CLI - convert JSON documents to S-expressions and normalize S-expression text

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use sxencode::{Encoder, EncoderConfig, Sexpr};

#[derive(Parser)]
#[command(name = "sxencode")]
#[command(about = "Encode structured data as S-expressions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a JSON document as an S-expression
    Encode {
        /// Input file (default: stdin)
        file: Option<PathBuf>,

        /// Encoder configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Token that opens a vector
        #[arg(long)]
        vector_open: Option<String>,
    },

    /// Read S-expressions and print them back in normalized form
    Fmt {
        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            file,
            config,
            vector_open,
        } => {
            let mut config = match config {
                Some(path) => EncoderConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => EncoderConfig::default(),
            };
            if let Some(marker) = vector_open {
                config.vector_open = marker;
            }

            let input = read_input(file.as_deref())?;
            let document: serde_json::Value =
                serde_json::from_str(&input).context("Input is not valid JSON")?;

            let stdout = io::stdout();
            let mut out = stdout.lock();
            Encoder::new(config)
                .encode(&document, &mut out)
                .context("Failed to encode document")?;
            writeln!(out)?;
        }

        Commands::Fmt { file } => {
            let input = read_input(file.as_deref())?;
            let forms: Vec<Sexpr> =
                sxencode::parse(&input).context("Failed to read S-expressions")?;
            for form in forms {
                println!("{}", form);
            }
        }
    }

    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}
