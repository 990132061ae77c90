//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: seeded principals and shorthand
//! constructors for tokens.

use std::sync::Arc;

use warrant_core::{
    invoke, Capability, Delegation, Did, Invocation, IssuedInvocation, Keypair, Outcome, Receipt,
};

/// A test principal with a keypair.
pub struct TestFixture {
    pub keypair: Keypair,
}

impl TestFixture {
    /// Create a fixture with a random keypair.
    pub fn new() -> Self {
        Self {
            keypair: Keypair::generate(),
        }
    }

    /// Create with a deterministic keypair from seed.
    pub fn with_seed(seed: [u8; 32]) -> Self {
        Self {
            keypair: Keypair::from_seed(&seed),
        }
    }

    /// The fixture's identity.
    pub fn did(&self) -> Did {
        self.keypair.did()
    }

    /// A capability on this fixture's own resource.
    pub fn capability(&self, can: &str) -> Capability {
        Capability::new(can, self.did().as_str())
    }

    /// Delegate `can` over this fixture's resource to `audience`.
    pub async fn delegate_to(&self, audience: Did, can: &str) -> Delegation {
        Delegation::delegate(audience)
            .capability(self.capability(can))
            .issue(&self.keypair)
            .await
            .expect("fixture delegation should build")
    }

    /// Draft an invocation of `can` against `audience`.
    pub fn invoke(&self, audience: Did, can: &str) -> IssuedInvocation {
        invoke(Arc::new(self.keypair.clone()), audience, self.capability(can))
    }

    /// Build a signed invocation of `can` against `audience`.
    pub async fn invocation(&self, audience: Did, can: &str) -> Invocation {
        self.invoke(audience, can)
            .build()
            .await
            .expect("fixture invocation should build")
    }

    /// Issue a receipt for `ran` with the given outcome.
    pub async fn receipt(&self, ran: Invocation, out: Outcome) -> Receipt {
        Receipt::issue(ran, out)
            .sign(&self.keypair)
            .await
            .expect("fixture receipt should build")
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Create multiple test fixtures with distinct deterministic keys.
pub fn multi_party_fixtures(count: usize) -> Vec<TestFixture> {
    (0..count)
        .map(|i| {
            let mut seed = [0u8; 32];
            seed[0] = i as u8;
            seed[1] = 0xf1;
            TestFixture::with_seed(seed)
        })
        .collect()
}
