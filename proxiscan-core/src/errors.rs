//! errors.rs - Custom error types for the proxiscan-core library.
//!
//! This module defines a structured error enum for the library, providing
//! specific, actionable error types that can be handled programmatically.
//!
//! License: MIT OR APACHE 2.0

use thiserror::Error;

/// This enum represents all possible error types in the `proxiscan-core` library.
///
/// Marked `#[non_exhaustive]` so new variants can be added without breaking
/// downstream matches.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ProxiscanError {
    /// A required configuration field is missing or malformed, or the requested
    /// mode combination is not allowed. Always raised before any external effect.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Checksum algorithm '{name}' not found")]
    AlgorithmNotFound { name: String },

    #[error("Failed to compile pattern '{pattern}': {source}")]
    PatternCompile {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A document handed to the local script interpreter does not have the shape
    /// the generated script expects.
    #[error("Document error: {0}")]
    Document(String),

    #[error("An unexpected I/O error occurred: {0}")]
    Io(#[from] std::io::Error),
}

impl ProxiscanError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ProxiscanError::Configuration(msg.into())
    }
}
