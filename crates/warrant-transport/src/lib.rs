//! # Warrant Transport
//!
//! Batch transport for Warrant tokens: the content-addressable archive
//! container, invocation/receipt batch codecs over `{headers, body}`
//! payloads, the legacy bridge seam, and connections for executing
//! invocations against a service.
//!
//! Network carriers (HTTP etc.) live outside this crate behind the
//! [`Channel`] trait; this crate only produces and consumes bytes.

pub mod car;
pub mod connection;
pub mod error;
pub mod legacy;
pub mod payload;
pub mod request;
pub mod response;

pub use car::Archive;
pub use connection::{Channel, Connection, Execute, MemoryChannel, Service};
pub use error::{CarError, TransportError};
pub use legacy::{legacy_outcome, CarCodec, RequestCodec, ResponseCodec};
pub use payload::{Payload, CONTENT_TYPE};
