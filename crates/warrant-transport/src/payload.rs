//! HTTP-shaped payloads: headers plus a body.
//!
//! The transport layer never talks to a network itself; it produces and
//! consumes `{headers, body}` pairs that any byte-oriented channel can
//! carry.

use bytes::Bytes;
use std::collections::HashMap;

use crate::error::TransportError;

/// The only content type the archive codecs accept.
pub const CONTENT_TYPE: &str = "application/car";

const HEADER_NAME: &str = "content-type";
const HEADER_NAME_CAPITALIZED: &str = "Content-Type";

/// A transport payload: header map and opaque body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl Payload {
    /// Wrap archive bytes with the `application/car` content type.
    pub fn car(body: Bytes) -> Self {
        let mut headers = HashMap::new();
        headers.insert(HEADER_NAME.to_string(), CONTENT_TYPE.to_string());
        Self { headers, body }
    }

    /// The declared content type. The header name is matched under its
    /// canonical and capitalized spellings first, then case-insensitively.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(HEADER_NAME)
            .or_else(|| self.headers.get(HEADER_NAME_CAPITALIZED))
            .or_else(|| {
                self.headers
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(HEADER_NAME))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Require the `application/car` content type, rejecting anything else
    /// with a typed error. The format is never guessed from the body.
    pub fn expect_car(&self) -> Result<(), TransportError> {
        match self.content_type() {
            Some(CONTENT_TYPE) => Ok(()),
            found => Err(TransportError::ContentType {
                found: found.map(str::to_string),
            }),
        }
    }
}
