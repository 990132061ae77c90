//! Proptest generators for Warrant types.

use ciborium::value::Value;
use proptest::prelude::*;

use warrant_core::{cid, Capability, Cid, Did, Effects, Outcome};

/// Arbitrary 32-byte digests.
pub fn arb_digest() -> impl Strategy<Value = [u8; 32]> {
    any::<[u8; 32]>()
}

/// Arbitrary content identifiers over the CBOR and raw codecs.
pub fn arb_cid() -> impl Strategy<Value = Cid> {
    (prop_oneof![Just(cid::CBOR), Just(cid::RAW)], arb_digest())
        .prop_map(|(codec, digest)| Cid::new(codec, digest))
}

/// Arbitrary opaque DIDs.
pub fn arb_did() -> impl Strategy<Value = Did> {
    "[a-z0-9]{8,24}".prop_map(|suffix| Did::new(format!("did:key:{suffix}")))
}

/// Arbitrary CBOR leaf values (no floats: canonical encoding rejects them).
pub fn arb_leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Integer(n.into())),
        "[ -~]{0,16}".prop_map(Value::Text),
        proptest::collection::vec(any::<u8>(), 0..16).prop_map(Value::Bytes),
        Just(Value::Null),
    ]
}

/// Arbitrary shallow CBOR map values.
pub fn arb_map_value() -> impl Strategy<Value = Value> {
    proptest::collection::btree_map("[a-z]{1,8}", arb_leaf_value(), 0..4).prop_map(|map| {
        Value::Map(
            map.into_iter()
                .map(|(k, v)| (Value::Text(k), v))
                .collect(),
        )
    })
}

/// Arbitrary capabilities with optional caveats.
pub fn arb_capability() -> impl Strategy<Value = Capability> {
    (
        "[a-z]{2,8}/[a-z]{2,8}",
        arb_did(),
        proptest::option::of(arb_map_value()),
    )
        .prop_map(|(can, with, nb)| {
            let capability = Capability::new(can, with.as_str());
            match nb {
                Some(nb) => capability.with_caveats(nb),
                None => capability,
            }
        })
}

/// Arbitrary outcomes: exactly one of ok or error.
pub fn arb_outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        arb_map_value().prop_map(Outcome::Ok),
        arb_map_value().prop_map(Outcome::Error),
    ]
}

/// Arbitrary effects: fork lists with an optional join.
pub fn arb_effects() -> impl Strategy<Value = Effects> {
    (
        proptest::collection::vec(arb_cid(), 0..4),
        proptest::option::of(arb_cid()),
    )
        .prop_map(|(fork, join)| Effects { fork, join })
}
