//! Error types for manifest decoding.

use thiserror::Error;

/// Errors that can occur while decoding an upstream manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A required field is missing or has the wrong shape.
    #[error("malformed manifest at line {line}, column {column}: {source}")]
    Malformed {
        /// Line of the offending input (1-based, 0 when unknown).
        line: usize,
        /// Column of the offending input (1-based, 0 when unknown).
        column: usize,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },
}

impl ManifestError {
    /// Wraps a serde decode error, keeping its position.
    #[must_use]
    pub fn malformed(source: serde_json::Error) -> Self {
        Self::Malformed {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}
