//! Golden test vectors for cross-implementation verification.
//!
//! Every implementation of the token format must produce identical
//! canonical bytes, signatures, and content identifiers for these inputs.

use serde::{Deserialize, Serialize};

use warrant_core::{Capability, Delegation, Keypair};

/// A single golden test vector.
#[derive(Debug, Serialize, Deserialize)]
pub struct GoldenVector {
    pub name: String,
    pub description: String,

    // Inputs
    pub issuer_seed: String,
    pub audience: String,
    pub can: String,
    pub with: String,
    pub expiration: Option<i64>,
    pub nonce: Option<String>,

    // Derived outputs (hex)
    pub signed_message: String,
    pub signature: String,
    pub root_bytes: String,
    pub cid_digest: String,
}

/// Generate a golden vector from inputs.
async fn generate_vector(
    name: &str,
    description: &str,
    seed: [u8; 32],
    audience: &str,
    can: &str,
    with: &str,
    expiration: Option<i64>,
    nonce: Option<&str>,
) -> GoldenVector {
    let issuer = Keypair::from_seed(&seed);

    let mut builder = Delegation::delegate(audience.into()).capability(Capability::new(can, with));
    if let Some(exp) = expiration {
        builder = builder.expiration(exp);
    }
    if let Some(nonce) = nonce {
        builder = builder.nonce(nonce);
    }
    let delegation = builder.issue(&issuer).await.unwrap();

    GoldenVector {
        name: name.to_string(),
        description: description.to_string(),
        issuer_seed: hex::encode(seed),
        audience: audience.to_string(),
        can: can.to_string(),
        with: with.to_string(),
        expiration,
        nonce: nonce.map(str::to_string),
        signed_message: hex::encode(delegation.data().signing_bytes().unwrap()),
        signature: delegation.signature().to_hex(),
        root_bytes: hex::encode(delegation.root().bytes()),
        cid_digest: delegation.cid().to_hex(),
    }
}

/// Generate the golden vector set.
pub async fn generate_all_vectors() -> Vec<GoldenVector> {
    vec![
        generate_vector(
            "minimal",
            "Single capability, no bounds",
            [0x01; 32],
            "did:key:aud",
            "store/add",
            "did:key:space",
            None,
            None,
        )
        .await,
        generate_vector(
            "expiring",
            "Single capability with expiration",
            [0x02; 32],
            "did:key:aud",
            "store/add",
            "did:key:space",
            Some(1736870400),
            None,
        )
        .await,
        generate_vector(
            "nonced",
            "Single capability with nonce",
            [0x03; 32],
            "did:key:aud",
            "upload/list",
            "did:key:space",
            None,
            Some("once"),
        )
        .await,
    ]
}
