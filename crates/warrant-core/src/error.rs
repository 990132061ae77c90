//! Error types for the Warrant core.

use thiserror::Error;

use crate::cid::Cid;

/// Errors from canonical encoding and decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("encoding error: {0}")]
    Encode(String),

    #[error("decoding error: {0}")]
    Decode(String),

    #[error("floats are not permitted in canonical encoding")]
    Float,

    #[error("unsupported value in canonical encoding")]
    Unsupported,

    #[error("malformed varint")]
    Varint,

    #[error("invalid content identifier: {0}")]
    Cid(String),
}

/// Errors from constructing a view over a block graph.
///
/// `BlockNotFound` marks the absent-and-required case; the tolerated case is
/// expressed as [`crate::dag::MaybeResolved::Unresolved`] instead of an error.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("block not found: {0}")]
    BlockNotFound(Cid),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Errors from the token builder paths.
///
/// Builders enforce the shape invariants; decode paths trust their input.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("a delegation requires at least one capability")]
    NoCapabilities,

    #[error("an invocation requires exactly one capability, found {found}")]
    SingleCapability { found: usize },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Signature(#[from] SignatureError),
}

/// Errors from signing and verification.
#[derive(Debug, Error)]
pub enum SignatureError {
    #[error("signature verification failed")]
    Mismatch,

    #[error("invalid public key")]
    InvalidKey,

    #[error("signer unavailable: {0}")]
    Signer(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}
