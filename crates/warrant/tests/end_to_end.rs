//! End-to-end scenarios: delegate, invoke, execute, receipt, archive both
//! ways, and render legacy outcome shapes.

use async_trait::async_trait;
use ciborium::value::Value;
use std::sync::Arc;

use warrant::transport::legacy::legacy_outcome;
use warrant::transport::{car, TransportError};
use warrant::{
    Archive, Capability, Connection, Delegation, Execute, Invocation, MaybeResolved,
    MemoryChannel, Outcome, Receipt, Service,
};
use warrant_testkit::TestFixture;

fn hello() -> Value {
    Value::Map(vec![(
        Value::Text("hello".into()),
        Value::Text("message".into()),
    )])
}

#[tokio::test]
async fn delegate_invoke_receipt_through_one_archive() -> warrant::Result<()> {
    let alice = TestFixture::with_seed([0x01; 32]);
    let bob = TestFixture::with_seed([0x02; 32]);
    let expiration = 1736870400;

    // Alice grants Bob `store/add` on her own space, no proofs.
    let delegation = Delegation::delegate(bob.did())
        .capability(Capability::new("store/add", alice.did().as_str()))
        .expiration(expiration)
        .issue(&alice.keypair)
        .await?;

    // Bob runs it and reports the outcome.
    let invocation = bob
        .invoke(alice.did(), "store/add")
        .proof(delegation.clone())
        .build()
        .await?;
    let receipt = Receipt::issue(invocation.clone(), Outcome::ok(hello()))
        .sign(&bob.keypair)
        .await?;

    // One archive carrying both entities, in caller order.
    let mut archive = Archive::new();
    archive.roots.push(*delegation.cid());
    archive.roots.push(*receipt.cid());
    archive.blocks.extend(delegation.blocks().cloned());
    archive.blocks.extend(receipt.blocks().cloned());

    let decoded = car::decode(&car::encode(&archive)?)?;
    assert_eq!(decoded.roots, vec![*delegation.cid(), *receipt.cid()]);
    let blocks = Arc::new(decoded.blocks);

    // The delegation comes back equal by value.
    let delegation_view = Delegation::view(&decoded.roots[0], Arc::clone(&blocks))?;
    assert_eq!(delegation_view, delegation);
    assert_eq!(*delegation_view.issuer(), alice.did());
    assert_eq!(*delegation_view.audience(), bob.did());
    assert_eq!(delegation_view.expiration(), Some(expiration));
    assert_eq!(delegation_view.capabilities()[0].can, "store/add");
    assert_eq!(
        delegation_view.capabilities()[0].with,
        alice.did().as_str()
    );

    // The receipt's outcome survives with its message intact.
    let receipt_view = Receipt::view(&decoded.roots[1], Arc::clone(&blocks))?;
    let ok = receipt_view.out().as_ok().expect("success outcome");
    match ok {
        Value::Map(entries) => {
            let hello_entry = entries
                .iter()
                .find(|(key, _)| *key == Value::Text("hello".into()))
                .expect("hello key");
            assert_eq!(hello_entry.1, Value::Text("message".into()));
        }
        other => panic!("expected map outcome, got {other:?}"),
    }

    // Its causal chain resolves from the same shared block set.
    assert!(receipt_view.ran().is_resolved());
    let ran = receipt_view.ran().resolved().unwrap();
    assert_eq!(ran, &invocation);
    assert!(ran.proofs()[0].is_resolved());
    assert!(receipt_view.verify_signature(&bob.keypair).is_ok());
    Ok(())
}

struct StoreService {
    executor: TestFixture,
}

#[async_trait]
impl Service for StoreService {
    async fn handle(
        &self,
        invocation: Invocation,
    ) -> Result<Receipt, TransportError> {
        let out = match invocation.capability().can.as_str() {
            "store/add" => Outcome::ok(hello()),
            other => Outcome::error(Value::Map(vec![(
                Value::Text("message".into()),
                Value::Text(format!("unknown capability: {other}")),
            )])),
        };
        Receipt::issue(invocation, out)
            .sign(&self.executor.keypair)
            .await
            .map_err(TransportError::from)
    }
}

#[tokio::test]
async fn execute_over_memory_channel() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let service = TestFixture::with_seed([0x10; 32]);
    let service_did = service.did();
    let alice = TestFixture::with_seed([0x01; 32]);

    let connection = Connection::new(MemoryChannel::new(StoreService { executor: service }));

    // A batch of exactly one: the draft's execute path.
    let receipt = alice
        .invoke(service_did.clone(), "store/add")
        .execute(&connection)
        .await?;

    assert!(receipt.out().is_ok());
    assert!(receipt.ran().is_resolved());

    // Unknown capabilities come back as error outcomes, not failures.
    let receipt = alice
        .invoke(service_did, "store/unknown")
        .execute(&connection)
        .await?;
    assert!(!receipt.out().is_ok());
    Ok(())
}

#[tokio::test]
async fn legacy_outcome_shapes() -> anyhow::Result<()> {
    let alice = TestFixture::with_seed([0x01; 32]);
    let service = TestFixture::with_seed([0x02; 32]);

    let ran = alice.invocation(service.did(), "store/add").await;

    // Errors gain the `error: true` flag with their fields spread beside it.
    let failed = service
        .receipt(
            ran.clone(),
            Outcome::error(Value::Map(vec![(
                Value::Text("message".into()),
                Value::Text("Boom".into()),
            )])),
        )
        .await;
    assert_eq!(
        legacy_outcome(failed.out()),
        Value::Map(vec![
            (Value::Text("error".into()), Value::Bool(true)),
            (Value::Text("message".into()), Value::Text("Boom".into())),
        ])
    );

    // Successes are returned bare.
    let succeeded = service.receipt(ran, Outcome::ok(hello())).await;
    assert_eq!(legacy_outcome(succeeded.out()), hello());
    Ok(())
}

#[tokio::test]
async fn partial_archive_degrades_not_fails() -> anyhow::Result<()> {
    let alice = TestFixture::with_seed([0x01; 32]);
    let service = TestFixture::with_seed([0x02; 32]);

    let invocation = alice.invocation(service.did(), "store/add").await;
    let receipt = service
        .receipt(invocation.clone(), Outcome::ok(hello()))
        .await;

    // An archive carrying only the receipt's root block: decode succeeds,
    // and the view degrades instead of failing.
    let mut archive = Archive::new();
    archive.roots.push(*receipt.cid());
    archive.blocks.insert(receipt.root().clone());

    let decoded = car::decode(&car::encode(&archive)?)?;
    let view = Receipt::view(&decoded.roots[0], Arc::new(decoded.blocks))?;

    assert_eq!(
        *view.ran(),
        MaybeResolved::Unresolved(*invocation.cid())
    );
    assert_eq!(view.out(), receipt.out());
    assert_eq!(view.signature(), receipt.signature());
    assert!(view.verify_signature(&service.keypair).is_ok());
    Ok(())
}
