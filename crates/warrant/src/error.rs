//! Error types for the umbrella crate.

use thiserror::Error;

use warrant_core::{BuildError, CodecError, SignatureError, ViewError};
use warrant_transport::{CarError, TransportError};

/// Any error a Warrant operation can surface.
#[derive(Debug, Error)]
pub enum Error {
    /// Canonical encoding or decoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// A required block was missing or undecodable.
    #[error("view error: {0}")]
    View(#[from] ViewError),

    /// A builder-path invariant was violated.
    #[error("build error: {0}")]
    Build(#[from] BuildError),

    /// Signing failed or verification did not match.
    #[error("signature error: {0}")]
    Signature(#[from] SignatureError),

    /// Archive container error.
    #[error("archive error: {0}")]
    Car(#[from] CarError),

    /// Payload codec or channel error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Result type for Warrant operations.
pub type Result<T> = std::result::Result<T, Error>;
