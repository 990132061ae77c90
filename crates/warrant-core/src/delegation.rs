//! Delegation: a signed token granting capabilities from issuer to audience.
//!
//! A delegation is immutable once its root block exists; building one always
//! produces a brand-new root. The signature covers the canonical encoding of
//! every field except the signature itself, and proofs are links to other
//! delegations whose blocks travel in the same graph.

use ciborium::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::block::{Block, ContentAddressed};
use crate::capability::{Capability, Fact};
use crate::cid::Cid;
use crate::codec;
use crate::crypto::{Did, Ed25519Signature, Signer, Verifier};
use crate::dag::{self, BlockStore, MaybeResolved};
use crate::error::{BuildError, CodecError, SignatureError, ViewError};

/// The wire shape of a delegation root block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelegationModel {
    /// Issuer identity.
    pub iss: Did,

    /// Audience identity.
    pub aud: Did,

    /// Granted capabilities. Non-empty on the builder path.
    pub att: Vec<Capability>,

    /// Links to proof delegations backing this grant.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prf: Vec<Cid>,

    /// Expiration, Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Not valid before, Unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Nonce distinguishing otherwise-identical grants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nnc: Option<String>,

    /// Opaque facts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fct: Vec<Fact>,

    /// Signature over the canonical encoding of all other fields.
    pub sig: Ed25519Signature,
}

impl DelegationModel {
    /// Canonical bytes of every field except `sig` — the signed message.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut value = codec::to_value(self)?;
        if let Value::Map(entries) = &mut value {
            entries.retain(|(key, _)| !matches!(key, Value::Text(k) if k.as_str() == "sig"));
        }
        codec::encode_value(&value)
    }
}

/// An immutable view over an encoded delegation and the block graph it
/// lives in.
#[derive(Debug, Clone)]
pub struct Delegation {
    root: Block,
    data: DelegationModel,
    blocks: Arc<BlockStore>,
    proofs: OnceLock<Vec<MaybeResolved<Delegation>>>,
}

impl Delegation {
    /// Start building a new delegation for `audience`.
    pub fn delegate(audience: Did) -> DelegationBuilder {
        DelegationBuilder::new(audience)
    }

    /// View the delegation rooted at `root` over an externally supplied
    /// block store.
    ///
    /// Fails with [`ViewError::BlockNotFound`] when the root block is
    /// absent; callers wanting fallback behavior match on the error.
    pub fn view(root: &Cid, blocks: Arc<BlockStore>) -> Result<Self, ViewError> {
        let block = dag::require(root, &blocks)?.clone();
        let data: DelegationModel = codec::decode(block.bytes())?;
        Ok(Self {
            root: block,
            data,
            blocks,
            proofs: OnceLock::new(),
        })
    }

    pub(crate) fn from_parts(root: Block, data: DelegationModel, blocks: Arc<BlockStore>) -> Self {
        Self {
            root,
            data,
            blocks,
            proofs: OnceLock::new(),
        }
    }

    /// The root content identifier. Always equals the CID the root block was
    /// stored under.
    pub fn cid(&self) -> &Cid {
        self.root.cid()
    }

    /// The root block.
    pub fn root(&self) -> &Block {
        &self.root
    }

    /// The decoded wire model.
    pub fn data(&self) -> &DelegationModel {
        &self.data
    }

    /// The shared block store this view reads from.
    pub fn store(&self) -> &Arc<BlockStore> {
        &self.blocks
    }

    pub fn issuer(&self) -> &Did {
        &self.data.iss
    }

    pub fn audience(&self) -> &Did {
        &self.data.aud
    }

    pub fn capabilities(&self) -> &[Capability] {
        &self.data.att
    }

    pub fn expiration(&self) -> Option<i64> {
        self.data.exp
    }

    pub fn not_before(&self) -> Option<i64> {
        self.data.nbf
    }

    pub fn nonce(&self) -> Option<&str> {
        self.data.nnc.as_deref()
    }

    pub fn facts(&self) -> &[Fact] {
        &self.data.fct
    }

    pub fn signature(&self) -> &Ed25519Signature {
        &self.data.sig
    }

    /// The proof chain, resolved lazily against the shared store.
    ///
    /// Each entry degrades independently to the bare link when that proof's
    /// root block is missing; one absent proof does not hide the others.
    pub fn proofs(&self) -> &[MaybeResolved<Delegation>] {
        self.proofs.get_or_init(|| {
            self.data
                .prf
                .iter()
                .map(
                    |link| match Delegation::view(link, Arc::clone(&self.blocks)) {
                        Ok(proof) => MaybeResolved::Resolved(proof),
                        Err(_) => MaybeResolved::Unresolved(*link),
                    },
                )
                .collect()
        })
    }

    /// Re-encode the payload and verify the stored signature against the
    /// given principal. A mismatch is a normal reported outcome.
    pub fn verify_signature(&self, principal: &dyn Verifier) -> Result<(), SignatureError> {
        let message = self.data.signing_bytes()?;
        principal.verify(&message, &self.data.sig)
    }

    /// Every block needed to reconstruct this delegation and all of its
    /// proofs, transitively, dependencies first and the root last. Each
    /// block appears once; shared proofs collapse by content identifier.
    pub fn blocks(&self) -> dag::Blocks<'_> {
        dag::iterate(self.root.cid(), &self.blocks)
    }
}

impl ContentAddressed for Delegation {
    fn cid(&self) -> &Cid {
        self.root.cid()
    }
}

// Content addressing makes root equality value equality.
impl PartialEq for Delegation {
    fn eq(&self, other: &Self) -> bool {
        self.root.cid() == other.root.cid()
    }
}

impl Eq for Delegation {}

/// Chained-option builder for [`Delegation`].
#[derive(Debug)]
pub struct DelegationBuilder {
    audience: Did,
    capabilities: Vec<Capability>,
    proofs: Vec<Delegation>,
    expiration: Option<i64>,
    not_before: Option<i64>,
    nonce: Option<String>,
    facts: Vec<Fact>,
}

impl DelegationBuilder {
    /// Start building a delegation for `audience`.
    pub fn new(audience: Did) -> Self {
        Self {
            audience,
            capabilities: Vec::new(),
            proofs: Vec::new(),
            expiration: None,
            not_before: None,
            nonce: None,
            facts: Vec::new(),
        }
    }

    /// Grant a capability.
    pub fn capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Back the grant with a proof delegation. The proof's blocks are copied
    /// into the new token's graph.
    pub fn proof(mut self, proof: Delegation) -> Self {
        self.proofs.push(proof);
        self
    }

    /// Set the expiration (Unix seconds).
    pub fn expiration(mut self, exp: i64) -> Self {
        self.expiration = Some(exp);
        self
    }

    /// Set the not-before bound (Unix seconds).
    pub fn not_before(mut self, nbf: i64) -> Self {
        self.not_before = Some(nbf);
        self
    }

    /// Set a nonce.
    pub fn nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Attach a fact.
    pub fn fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }

    /// Canonicalize, sign with `issuer`, and store.
    ///
    /// Rejects an empty capability set before any block is written. Awaiting
    /// the signature is the only suspension point; the store stays private
    /// until the root write completes.
    pub async fn issue(self, issuer: &dyn Signer) -> Result<Delegation, BuildError> {
        if self.capabilities.is_empty() {
            return Err(BuildError::NoCapabilities);
        }

        let mut store = BlockStore::new();
        for proof in &self.proofs {
            store.extend(proof.blocks().cloned());
        }

        let mut model = DelegationModel {
            iss: issuer.did(),
            aud: self.audience,
            att: self.capabilities,
            prf: self.proofs.iter().map(|p| *p.cid()).collect(),
            exp: self.expiration,
            nbf: self.not_before,
            nnc: self.nonce,
            fct: self.facts,
            sig: Ed25519Signature::ZERO,
        };

        let message = model.signing_bytes()?;
        model.sig = issuer.sign(&message).await?;

        let root = dag::write_into(&model, &mut store)?;
        let delegation = Delegation::from_parts(root, model, Arc::new(store));
        let _ = delegation
            .proofs
            .set(self.proofs.into_iter().map(MaybeResolved::Resolved).collect());
        Ok(delegation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::Keypair;

    fn capability() -> Capability {
        Capability::new("store/add", "did:key:resource")
    }

    #[tokio::test]
    async fn test_delegate_basic() {
        let issuer = Keypair::from_seed(&[0x01; 32]);
        let audience = Keypair::from_seed(&[0x02; 32]);

        let delegation = Delegation::delegate(audience.did())
            .capability(capability())
            .expiration(1736870400)
            .issue(&issuer)
            .await
            .unwrap();

        assert_eq!(*delegation.issuer(), issuer.did());
        assert_eq!(*delegation.audience(), audience.did());
        assert_eq!(delegation.capabilities().len(), 1);
        assert_eq!(delegation.expiration(), Some(1736870400));
        assert!(delegation.proofs().is_empty());
    }

    #[tokio::test]
    async fn test_delegate_rejects_empty_capabilities() {
        let issuer = Keypair::generate();
        let result = Delegation::delegate(Did::from("did:key:aud"))
            .issue(&issuer)
            .await;
        assert!(matches!(result, Err(BuildError::NoCapabilities)));
    }

    #[tokio::test]
    async fn test_view_roundtrip() {
        let issuer = Keypair::from_seed(&[0x01; 32]);

        let delegation = Delegation::delegate(Did::from("did:key:aud"))
            .capability(capability())
            .nonce("once")
            .not_before(100)
            .issue(&issuer)
            .await
            .unwrap();

        let view = Delegation::view(delegation.cid(), Arc::clone(delegation.store())).unwrap();
        assert_eq!(view, delegation);
        assert_eq!(view.issuer(), delegation.issuer());
        assert_eq!(view.capabilities(), delegation.capabilities());
        assert_eq!(view.nonce(), Some("once"));
        assert_eq!(view.not_before(), Some(100));
        assert_eq!(view.signature(), delegation.signature());
    }

    #[tokio::test]
    async fn test_view_missing_root() {
        let store = Arc::new(BlockStore::new());
        let phantom = Cid::of(crate::cid::CBOR, b"not a delegation");
        let result = Delegation::view(&phantom, store);
        assert!(matches!(result, Err(ViewError::BlockNotFound(_))));
    }

    #[tokio::test]
    async fn test_signature_verifies_for_issuer_only() {
        let issuer = Keypair::from_seed(&[0x01; 32]);
        let other = Keypair::from_seed(&[0x02; 32]);

        let delegation = Delegation::delegate(Did::from("did:key:aud"))
            .capability(capability())
            .issue(&issuer)
            .await
            .unwrap();

        assert!(delegation.verify_signature(&issuer).is_ok());
        assert!(matches!(
            delegation.verify_signature(&other),
            Err(SignatureError::Mismatch)
        ));
    }

    #[tokio::test]
    async fn test_proof_chain_blocks_carried() {
        let root_issuer = Keypair::from_seed(&[0x01; 32]);
        let middle = Keypair::from_seed(&[0x02; 32]);
        let leaf = Keypair::from_seed(&[0x03; 32]);

        let root_grant = Delegation::delegate(middle.did())
            .capability(capability())
            .issue(&root_issuer)
            .await
            .unwrap();

        let chained = Delegation::delegate(leaf.did())
            .capability(capability())
            .proof(root_grant.clone())
            .issue(&middle)
            .await
            .unwrap();

        // The chained token's graph contains the proof's blocks.
        assert!(chained.store().contains(root_grant.cid()));

        let proofs = chained.proofs();
        assert_eq!(proofs.len(), 1);
        assert_eq!(proofs[0].resolved().unwrap(), &root_grant);

        // Iteration yields the proof before the root, each once.
        let order: Vec<Cid> = chained.blocks().map(|b| *b.cid()).collect();
        assert_eq!(order, vec![*root_grant.cid(), *chained.cid()]);
    }

    #[tokio::test]
    async fn test_shared_proofs_collapse() {
        let issuer = Keypair::from_seed(&[0x01; 32]);
        let middle = Keypair::from_seed(&[0x02; 32]);

        let shared = Delegation::delegate(middle.did())
            .capability(capability())
            .issue(&issuer)
            .await
            .unwrap();

        let delegation = Delegation::delegate(Did::from("did:key:aud"))
            .capability(capability())
            .proof(shared.clone())
            .proof(shared.clone())
            .issue(&middle)
            .await
            .unwrap();

        let shared_count = delegation
            .blocks()
            .filter(|b| b.cid() == shared.cid())
            .count();
        assert_eq!(shared_count, 1);
    }

    #[tokio::test]
    async fn test_proof_degrades_to_bare_link() {
        let issuer = Keypair::from_seed(&[0x01; 32]);
        let middle = Keypair::from_seed(&[0x02; 32]);

        let proof = Delegation::delegate(middle.did())
            .capability(capability())
            .issue(&issuer)
            .await
            .unwrap();

        let delegation = Delegation::delegate(Did::from("did:key:aud"))
            .capability(capability())
            .proof(proof.clone())
            .issue(&middle)
            .await
            .unwrap();

        // Rebuild a store holding only the delegation's own root block.
        let mut partial = BlockStore::new();
        partial.insert(delegation.root().clone());
        let view = Delegation::view(delegation.cid(), Arc::new(partial)).unwrap();

        let proofs = view.proofs();
        assert_eq!(proofs.len(), 1);
        assert_eq!(proofs[0], MaybeResolved::Unresolved(*proof.cid()));

        // The rest of the view stays usable.
        assert_eq!(view.capabilities(), delegation.capabilities());
        assert!(view.verify_signature(&middle).is_ok());
    }

    #[tokio::test]
    async fn test_signing_bytes_deterministic() {
        let issuer = Keypair::from_seed(&[0x01; 32]);
        let delegation = Delegation::delegate(Did::from("did:key:aud"))
            .capability(capability())
            .issue(&issuer)
            .await
            .unwrap();

        let a = delegation.data().signing_bytes().unwrap();
        let b = delegation.data().signing_bytes().unwrap();
        assert_eq!(a, b);

        // And the signature key is not part of the signed message.
        let mut tampered = delegation.data().clone();
        tampered.sig = Ed25519Signature::ZERO;
        assert_eq!(tampered.signing_bytes().unwrap(), a);
    }
}
