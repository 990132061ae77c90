//! The legacy bridge seam.
//!
//! An external bridge may negotiate, from an inbound payload's headers,
//! that the peer speaks an older wire format and supply its own
//! encoder/decoder pair. This core only defines the seam — codec traits
//! over `{headers, body}` payloads — and the historic outcome rendering
//! old peers expect: a success is returned bare, an error as
//! `{error: true, ...errorFields}`.

use ciborium::value::Value;

use warrant_core::{Invocation, Outcome, Receipt};

use crate::error::Result;
use crate::payload::Payload;
use crate::{request, response};

/// Encoder/decoder pair for invocation batches.
pub trait RequestCodec: Send + Sync {
    fn encode(&self, invocations: &[Invocation]) -> Result<Payload>;
    fn decode(&self, payload: &Payload) -> Result<Vec<Invocation>>;
}

/// Encoder/decoder pair for receipt batches.
pub trait ResponseCodec: Send + Sync {
    fn encode(&self, receipts: &[Receipt]) -> Result<Payload>;
    fn decode(&self, payload: &Payload) -> Result<Vec<Receipt>>;
}

/// The current archive codec, usable wherever a bridge-supplied codec is
/// accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct CarCodec;

impl RequestCodec for CarCodec {
    fn encode(&self, invocations: &[Invocation]) -> Result<Payload> {
        request::encode(invocations)
    }

    fn decode(&self, payload: &Payload) -> Result<Vec<Invocation>> {
        request::decode(payload)
    }
}

impl ResponseCodec for CarCodec {
    fn encode(&self, receipts: &[Receipt]) -> Result<Payload> {
        response::encode(receipts)
    }

    fn decode(&self, payload: &Payload) -> Result<Vec<Receipt>> {
        response::decode(payload)
    }
}

/// Render an outcome in the historic response shape.
///
/// Success outcomes are returned bare. Error outcomes become a map with
/// `error: true` followed by the error's own fields; a non-map error value
/// is carried under a `value` key.
pub fn legacy_outcome(out: &Outcome) -> Value {
    match out {
        Outcome::Ok(value) => value.clone(),
        Outcome::Error(value) => {
            let mut entries = vec![(Value::Text("error".into()), Value::Bool(true))];
            match value {
                Value::Map(fields) => entries.extend(fields.clone()),
                other => entries.push((Value::Text("value".into()), other.clone())),
            }
            Value::Map(entries)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_renders_bare() {
        let out = Outcome::ok(Value::Map(vec![(
            Value::Text("hello".into()),
            Value::Text("message".into()),
        )]));
        let rendered = legacy_outcome(&out);
        assert_eq!(
            rendered,
            Value::Map(vec![(
                Value::Text("hello".into()),
                Value::Text("message".into()),
            )])
        );
    }

    #[test]
    fn test_error_renders_with_error_flag() {
        let out = Outcome::error(Value::Map(vec![(
            Value::Text("message".into()),
            Value::Text("Boom".into()),
        )]));
        let rendered = legacy_outcome(&out);
        assert_eq!(
            rendered,
            Value::Map(vec![
                (Value::Text("error".into()), Value::Bool(true)),
                (Value::Text("message".into()), Value::Text("Boom".into())),
            ])
        );
    }

    #[test]
    fn test_non_map_error_kept_under_value_key() {
        let out = Outcome::error(Value::Text("Boom".into()));
        let rendered = legacy_outcome(&out);
        assert_eq!(
            rendered,
            Value::Map(vec![
                (Value::Text("error".into()), Value::Bool(true)),
                (Value::Text("value".into()), Value::Text("Boom".into())),
            ])
        );
    }
}
