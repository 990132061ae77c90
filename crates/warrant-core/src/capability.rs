//! Capabilities: the opaque payloads tokens carry.
//!
//! A capability names an action (`can`) on a resource (`with`) plus optional
//! caveats (`nb`). This core stores and transports capabilities as data; it
//! never evaluates what they authorize.

use ciborium::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An opaque fact attached to a delegation.
pub type Fact = BTreeMap<String, Value>;

/// Opaque metadata attached to a receipt outcome.
pub type Meta = BTreeMap<String, Value>;

/// A single capability: action, resource, and optional caveats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    /// Action tag, e.g. `"store/add"`.
    pub can: String,

    /// Resource subject, usually a DID or URI.
    pub with: String,

    /// Optional caveats, carried verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nb: Option<Value>,
}

impl Capability {
    /// Create a capability with no caveats.
    pub fn new(can: impl Into<String>, with: impl Into<String>) -> Self {
        Self {
            can: can.into(),
            with: with.into(),
            nb: None,
        }
    }

    /// Attach caveats.
    pub fn with_caveats(mut self, nb: Value) -> Self {
        self.nb = Some(nb);
        self
    }
}
