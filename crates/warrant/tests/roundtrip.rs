//! Round-trip properties: tokens survive archive encode/decode with every
//! field intact.

use std::sync::Arc;

use warrant::core::codec;
use warrant::transport::{car, request, response};
use warrant::{Archive, Capability, Cid, Delegation, Outcome, SignatureError};
use warrant_testkit::TestFixture;

fn hello() -> ciborium::value::Value {
    ciborium::value::Value::Map(vec![(
        ciborium::value::Value::Text("hello".into()),
        ciborium::value::Value::Text("message".into()),
    )])
}

#[tokio::test]
async fn delegation_roundtrip_through_archive() -> anyhow::Result<()> {
    let alice = TestFixture::with_seed([0x01; 32]);
    let bob = TestFixture::with_seed([0x02; 32]);
    let carol = TestFixture::with_seed([0x03; 32]);

    let root_grant = alice.delegate_to(bob.did(), "store/add").await;
    let delegation = Delegation::delegate(carol.did())
        .capability(Capability::new("store/add", alice.did().as_str()))
        .proof(root_grant.clone())
        .expiration(1736870400)
        .not_before(1700000000)
        .nonce("n-1")
        .issue(&bob.keypair)
        .await?;

    // Pack the delegation graph into an archive and unpack it.
    let mut archive = Archive::new();
    archive.roots.push(*delegation.cid());
    archive.blocks.extend(delegation.blocks().cloned());
    let bytes = car::encode(&archive)?;
    let decoded = car::decode(&bytes)?;

    let view = Delegation::view(&decoded.roots[0], Arc::new(decoded.blocks))?;

    assert_eq!(view, delegation);
    assert_eq!(view.issuer(), delegation.issuer());
    assert_eq!(view.audience(), delegation.audience());
    assert_eq!(view.capabilities(), delegation.capabilities());
    assert_eq!(view.expiration(), delegation.expiration());
    assert_eq!(view.not_before(), delegation.not_before());
    assert_eq!(view.nonce(), delegation.nonce());

    // Proofs match by CID and resolve from the carried blocks.
    let proof_cids: Vec<&Cid> = view.proofs().iter().map(|p| p.cid()).collect();
    assert_eq!(proof_cids, vec![root_grant.cid()]);
    assert!(view.proofs()[0].is_resolved());

    // Signature still verifies after the round trip.
    assert!(view.verify_signature(&bob.keypair).is_ok());
    Ok(())
}

#[tokio::test]
async fn invocation_batch_roundtrip() -> anyhow::Result<()> {
    let alice = TestFixture::with_seed([0x01; 32]);
    let service = TestFixture::with_seed([0x02; 32]);

    let first = alice.invocation(service.did(), "store/add").await;
    let second = alice.invocation(service.did(), "store/list").await;

    let payload = request::encode(&[first.clone(), second.clone()])?;
    let decoded = request::decode(&payload)?;

    assert_eq!(decoded, vec![first, second]);
    Ok(())
}

#[tokio::test]
async fn receipt_roundtrip_preserves_outcome_and_signature() -> anyhow::Result<()> {
    let alice = TestFixture::with_seed([0x01; 32]);
    let service = TestFixture::with_seed([0x02; 32]);

    let invocation = alice.invocation(service.did(), "store/add").await;
    let receipt = service
        .receipt(invocation.clone(), Outcome::ok(hello()))
        .await;

    let payload = response::encode(&[receipt.clone()])?;
    let decoded = response::decode(&payload)?;
    let view = &decoded[0];

    assert_eq!(*view, receipt);
    assert_eq!(view.out(), receipt.out());
    assert_eq!(view.issuer(), receipt.issuer());
    assert_eq!(view.signature(), receipt.signature());
    assert!(view.ran().is_resolved());
    assert!(view.verify_signature(&service.keypair).is_ok());
    Ok(())
}

#[tokio::test]
async fn outcome_encoding_is_deterministic_and_key_bound() -> anyhow::Result<()> {
    let alice = TestFixture::with_seed([0x01; 32]);
    let service = TestFixture::with_seed([0x02; 32]);
    let stranger = TestFixture::with_seed([0x03; 32]);

    let invocation = alice.invocation(service.did(), "store/add").await;
    let receipt = service
        .receipt(invocation, Outcome::ok(hello()))
        .await;

    // Re-encoding the outcome record twice yields identical bytes.
    let a = codec::encode(&receipt.data().ocm)?;
    let b = codec::encode(&receipt.data().ocm)?;
    assert_eq!(a, b);

    // The signature binds to the issuing key and no other.
    assert!(receipt.verify_signature(&service.keypair).is_ok());
    assert!(matches!(
        receipt.verify_signature(&stranger.keypair),
        Err(SignatureError::Mismatch)
    ));
    Ok(())
}
