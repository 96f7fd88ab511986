//! Error types for the encoder, the reader and configuration loading
//!
//! Domain errors use thiserror; the CLI converts them into `anyhow` at the
//! process boundary.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while encoding a value into S-expression text
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Writing to the sink failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The caller-supplied fallback handler rejected an unsupported value
    #[error("fallback handler failed for value of type {type_name}")]
    Fallback {
        /// Type name of the value handed to the fallback
        type_name: &'static str,
        /// Error returned by the handler
        #[source]
        source: anyhow::Error,
    },

    /// Nesting went deeper than the configured limit
    #[error("value nesting exceeds the configured depth limit of {limit}")]
    DepthExceeded {
        /// Configured maximum depth
        limit: usize,
    },
}

/// Convenience result alias for encoding operations
pub type EncodeResult<T> = std::result::Result<T, EncodeError>;

/// Errors raised while reading S-expression text
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReadError {
    /// Malformed input
    #[error("invalid S-expression syntax: {message} at byte {offset}")]
    Syntax {
        /// Error description
        message: String,
        /// Byte offset where the problem was detected
        offset: usize,
    },

    /// Input ended inside a form
    #[error("unexpected end of input at byte {offset}")]
    UnexpectedEof {
        /// Byte offset of the end of input
        offset: usize,
    },

    /// Forms nest deeper than the reader's limit
    #[error("nesting exceeds the depth limit of {limit} at byte {offset}")]
    DepthExceeded {
        /// Maximum nesting depth
        limit: usize,
        /// Byte offset where the limit was hit
        offset: usize,
    },
}

/// Convenience result alias for reader operations
pub type ReadResult<T> = std::result::Result<T, ReadError>;

/// Errors raised while loading an encoder configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config {path}: {source}")]
    Io {
        /// Path of the config file
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: io::Error,
    },

    /// Config file is not valid JSON for [`crate::EncoderConfig`]
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
