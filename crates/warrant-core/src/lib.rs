//! # Warrant Core
//!
//! Core primitives for Warrant: delegations, invocations, receipts, and the
//! content-addressed block graphs they live in.
//!
//! This crate contains no I/O and no networking. Signing and verification go
//! through the [`crypto::Signer`]/[`crypto::Verifier`] seams; everything
//! else is pure computation over cryptographic data structures.
//!
//! ## Key Types
//!
//! - [`Delegation`] - a signed token granting capabilities from issuer to audience
//! - [`Invocation`] - a single-capability delegation meant to be executed
//! - [`Receipt`] - a signed record of an invocation's outcome
//! - [`Cid`] / [`Block`] - content addressing (Blake3) and immutable blocks
//!
//! ## Canonicalization
//!
//! All root blocks are encoded with deterministic CBOR so signatures and
//! content identifiers are stable across platforms. See the [`codec`]
//! module.

pub mod block;
pub mod capability;
pub mod cid;
pub mod codec;
pub mod crypto;
pub mod dag;
pub mod delegation;
pub mod error;
pub mod invocation;
pub mod receipt;

pub use block::{Block, ContentAddressed};
pub use capability::{Capability, Fact, Meta};
pub use cid::Cid;
pub use crypto::{
    Blake3Hash, Did, Ed25519PublicKey, Ed25519Signature, Keypair, Signer, Verifier,
};
pub use dag::{BlockStore, MaybeResolved};
pub use delegation::{Delegation, DelegationBuilder, DelegationModel};
pub use error::{BuildError, CodecError, SignatureError, ViewError};
pub use invocation::{invoke, Invocation, IssuedInvocation};
pub use receipt::{Effects, Outcome, OutcomeModel, Receipt, ReceiptBuilder, ReceiptModel};
