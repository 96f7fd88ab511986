//! sxencode – S-expression encoding for structured Rust values
//!
//! This crate provides:
//! - An encoder that renders records, sequences, maps and primitives as
//!   S-expression text, dropping record fields and map entries whose value
//!   has no encoding
//! - A custom-rendering hook and a fallback handler for values the encoder
//!   cannot classify
//! - A passive S-expression AST model and the constructor callbacks a reader
//!   uses to build it
//! - A reader for the common Lisp lexicon that drives those callbacks

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

/// Error types shared by the encoder, reader and config loader
pub mod error;
/// Value-to-S-expression encoder
pub mod encoder;
/// Lisp string escaping
pub mod escape;
/// Reader that builds nodes from S-expression text
pub mod reader;
/// S-expression AST model and constructor callbacks
pub mod sexpr;

// Re-export key types for convenience
pub use encoder::{
    Encode, Encoder, EncoderConfig, FallbackHandler, FieldDef, Opaque, Record, RecordSchema, Shape,
    Unsupported, Verbatim, to_string, to_vec, to_writer,
};
pub use error::{ConfigError, EncodeError, ReadError};
pub use reader::{parse, read_all, read_all_with_limit, read_one, read_one_with_limit};
pub use sexpr::{Construct, Sexpr, SexprBuilder};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
