//! Error types for the Warrant transport layer.

use thiserror::Error;

use warrant_core::{BuildError, CodecError, ViewError};

/// Errors from the archive container codec.
#[derive(Debug, Error)]
pub enum CarError {
    #[error("malformed archive header: {0}")]
    Header(String),

    #[error("unsupported archive version: {0}")]
    Version(u64),

    #[error("truncated archive")]
    Truncated,

    #[error("block bytes do not match their content identifier")]
    DigestMismatch,

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors from payload codecs and connections.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("only 'content-type: application/car' is supported, instead got {found:?}")]
    ContentType { found: Option<String> },

    #[error(transparent)]
    Car(#[from] CarError),

    #[error(transparent)]
    View(#[from] ViewError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error("channel error: {0}")]
    Channel(String),
}

/// Result type for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;
