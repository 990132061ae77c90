//! # Warrant
//!
//! The unified API for Warrant — a capability-based authorization and
//! remote-invocation token model built on signed, content-addressed blocks.
//!
//! ## Overview
//!
//! - **Delegations**: signed tokens granting capabilities from an issuer to
//!   an audience, backed by chains of proof delegations
//! - **Invocations**: single-capability delegations meant to be executed
//!   rather than merely held
//! - **Receipts**: signed records of an invocation's outcome, including
//!   forked/joined side effects and proof copies
//! - **Archives**: portable containers bundling roots with every block they
//!   transitively reach
//!
//! ## Key Concepts
//!
//! - Tokens are immutable. Building one always produces a new root block.
//! - Signatures cover canonical CBOR, so verification is re-encoding.
//! - Views resolve references lazily and degrade to bare links when blocks
//!   are missing, so partial graphs stay inspectable.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use warrant::{Capability, Delegation, Keypair};
//!
//! async fn example() {
//!     // Two principals.
//!     let alice = Keypair::generate();
//!     let bob = Keypair::generate();
//!
//!     // Alice grants Bob `store/add` on her space.
//!     let delegation = Delegation::delegate(bob.did())
//!         .capability(Capability::new("store/add", alice.did().as_str()))
//!         .expiration(1736870400)
//!         .issue(&alice)
//!         .await
//!         .unwrap();
//!
//!     assert!(delegation.verify_signature(&alice).is_ok());
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `warrant::core` - token model (Delegation, Invocation, Receipt)
//! - `warrant::transport` - archive codec and connections

pub mod error;

// Re-export component crates
pub use warrant_core as core;
pub use warrant_transport as transport;

// Re-export main types for convenience
pub use error::{Error, Result};

pub use warrant_core::{
    invoke, Block, BlockStore, BuildError, Capability, Cid, CodecError, ContentAddressed,
    Delegation, DelegationBuilder, Did, Ed25519PublicKey, Ed25519Signature, Effects, Fact,
    Invocation, IssuedInvocation, Keypair, MaybeResolved, Meta, Outcome, Receipt, ReceiptBuilder,
    SignatureError, Signer, Verifier, ViewError,
};
pub use warrant_transport::{
    Archive, CarError, Channel, Connection, Execute, MemoryChannel, Payload, Service,
    TransportError,
};
