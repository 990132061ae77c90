//! Receipt: a signed record of an invocation's outcome.
//!
//! A receipt names the invocation it ran (`ran`), carries exactly one of a
//! success or error value (`out`), the further invocations running it caused
//! (`fx`), opaque metadata, and copies of the proof chain needed to audit
//! it. The signature covers the canonical encoding of the outcome record
//! only; the envelope adds nothing else but the signature.
//!
//! Receipts are immutable once built. Derived references (`ran`, `proofs`)
//! are resolved against the shared block graph on first access and memoized
//! for the life of the view.

use ciborium::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use crate::block::{Block, ContentAddressed};
use crate::capability::Meta;
use crate::cid::Cid;
use crate::codec;
use crate::crypto::{Did, Ed25519Signature, Signer, Verifier};
use crate::dag::{self, BlockStore, MaybeResolved};
use crate::delegation::Delegation;
use crate::error::{BuildError, CodecError, SignatureError, ViewError};
use crate::invocation::Invocation;

/// The result of running an invocation: exactly one of a success value or
/// an error value.
///
/// Serialized externally tagged, so the wire form is a one-entry map —
/// `{ok: value}` or `{error: value}`. A map carrying both keys, or neither,
/// fails to decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok(Value),
    Error(Value),
}

impl Outcome {
    /// A success outcome.
    pub fn ok(value: Value) -> Self {
        Outcome::Ok(value)
    }

    /// An error outcome.
    pub fn error(value: Value) -> Self {
        Outcome::Error(value)
    }

    /// A success outcome from any serializable value.
    pub fn success<T: Serialize>(value: &T) -> Result<Self, CodecError> {
        Ok(Outcome::Ok(codec::to_value(value)?))
    }

    /// An error outcome from any serializable value.
    pub fn failure<T: Serialize>(value: &T) -> Result<Self, CodecError> {
        Ok(Outcome::Error(codec::to_value(value)?))
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Outcome::Ok(_))
    }

    pub fn as_ok(&self) -> Option<&Value> {
        match self {
            Outcome::Ok(value) => Some(value),
            Outcome::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&Value> {
        match self {
            Outcome::Ok(_) => None,
            Outcome::Error(value) => Some(value),
        }
    }
}

/// Effects caused by running an invocation: an ordered list of forked
/// follow-up invocations, and optionally a single join point where the
/// forks are expected to converge.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Effects {
    #[serde(default)]
    pub fork: Vec<Cid>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join: Option<Cid>,
}

impl Effects {
    /// No effects: an empty fork list and no join.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.fork.is_empty() && self.join.is_none()
    }
}

/// The signed portion of a receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeModel {
    /// Link to the invocation this receipt reports on.
    pub ran: Cid,

    /// The result.
    pub out: Outcome,

    /// Caused effects.
    #[serde(default)]
    pub fx: Effects,

    /// Opaque metadata.
    #[serde(default)]
    pub meta: Meta,

    /// The principal that issued the receipt.
    pub iss: Did,

    /// Links to proof delegations.
    #[serde(default)]
    pub prf: Vec<Cid>,
}

/// The wire shape of a receipt root block: the outcome record plus the
/// signature over its canonical encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptModel {
    pub ocm: OutcomeModel,
    pub sig: Ed25519Signature,
}

/// An immutable receipt view over a shared block graph.
#[derive(Debug, Clone)]
pub struct Receipt {
    root: Block,
    data: ReceiptModel,
    blocks: Arc<BlockStore>,
    ran: OnceLock<MaybeResolved<Invocation>>,
    proofs: OnceLock<Vec<MaybeResolved<Delegation>>>,
}

impl Receipt {
    /// Start building a receipt reporting `out` for `ran`.
    ///
    /// `ran` may be a full invocation view (its blocks are copied into the
    /// receipt's graph) or a bare link when the invocation is not locally
    /// available.
    pub fn issue(ran: impl Into<MaybeResolved<Invocation>>, out: Outcome) -> ReceiptBuilder {
        ReceiptBuilder::new(ran, out)
    }

    /// View the receipt rooted at `root` over an externally supplied block
    /// store. The root block itself is required; everything it references
    /// resolves lazily and degrades to bare links when absent.
    pub fn view(root: &Cid, blocks: Arc<BlockStore>) -> Result<Self, ViewError> {
        let block = dag::require(root, &blocks)?.clone();
        let data: ReceiptModel = codec::decode(block.bytes())?;
        Ok(Self {
            root: block,
            data,
            blocks,
            ran: OnceLock::new(),
            proofs: OnceLock::new(),
        })
    }

    /// The invocation this receipt reports on.
    ///
    /// Resolved on first access: a full view when the invocation's root
    /// block is present in the graph, the bare link otherwise — so a receipt
    /// can be partially inspected even when its causal invocation is not
    /// locally available.
    pub fn ran(&self) -> &MaybeResolved<Invocation> {
        self.ran.get_or_init(|| {
            match Invocation::view(&self.data.ocm.ran, Arc::clone(&self.blocks)) {
                Ok(invocation) => MaybeResolved::Resolved(invocation),
                Err(_) => MaybeResolved::Unresolved(self.data.ocm.ran),
            }
        })
    }

    /// The proof chain, each entry degrading independently to its bare link
    /// when that proof's blocks are missing.
    pub fn proofs(&self) -> &[MaybeResolved<Delegation>] {
        self.proofs.get_or_init(|| {
            self.data
                .ocm
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

    pub fn issuer(&self) -> &Did {
        &self.data.ocm.iss
    }

    pub fn out(&self) -> &Outcome {
        &self.data.ocm.out
    }

    pub fn fx(&self) -> &Effects {
        &self.data.ocm.fx
    }

    pub fn meta(&self) -> &Meta {
        &self.data.ocm.meta
    }

    pub fn signature(&self) -> &Ed25519Signature {
        &self.data.sig
    }

    /// The root content identifier.
    pub fn cid(&self) -> &Cid {
        self.root.cid()
    }

    /// The root block.
    pub fn root(&self) -> &Block {
        &self.root
    }

    /// The decoded wire model.
    pub fn data(&self) -> &ReceiptModel {
        &self.data
    }

    /// The shared block store this view reads from.
    pub fn store(&self) -> &Arc<BlockStore> {
        &self.blocks
    }

    /// Re-encode the outcome record canonically and verify the stored
    /// signature against the given principal. A mismatch is an `Err`, not a
    /// panic; the caller decides whether it is fatal.
    pub fn verify_signature(&self, principal: &dyn Verifier) -> Result<(), SignatureError> {
        let message = codec::encode(&self.data.ocm)?;
        principal.verify(&message, &self.data.sig)
    }

    /// Every block of the receipt graph, in the order a streaming consumer
    /// needs: the ran invocation's blocks, each forked effect's blocks in
    /// fork order, the join effect's blocks if present, each proof's blocks,
    /// and the receipt's own root block last. Subgraphs whose blocks are
    /// absent contribute nothing.
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        let store = self.blocks.as_ref();
        let ocm = &self.data.ocm;

        let ran = dag::iterate(&ocm.ran, store);
        let forks = ocm.fx.fork.iter().flat_map(move |link| dag::iterate(link, store));
        let join = ocm.fx.join.iter().flat_map(move |link| dag::iterate(link, store));
        let proofs = ocm.prf.iter().flat_map(move |link| dag::iterate(link, store));

        ran.chain(forks)
            .chain(join)
            .chain(proofs)
            .chain(std::iter::once(&self.root))
    }
}

impl ContentAddressed for Receipt {
    fn cid(&self) -> &Cid {
        self.root.cid()
    }
}

impl PartialEq for Receipt {
    fn eq(&self, other: &Self) -> bool {
        self.root.cid() == other.root.cid()
    }
}

impl Eq for Receipt {}

/// Builder for [`Receipt`]. Unbuilt options suspend once on the signer, then
/// become an immutable view; a new outcome requires a wholly new receipt.
pub struct ReceiptBuilder {
    ran: MaybeResolved<Invocation>,
    out: Outcome,
    forks: Vec<MaybeResolved<Invocation>>,
    join: Option<MaybeResolved<Invocation>>,
    proofs: Vec<Delegation>,
    meta: Meta,
}

impl ReceiptBuilder {
    /// Start building a receipt reporting `out` for `ran`.
    pub fn new(ran: impl Into<MaybeResolved<Invocation>>, out: Outcome) -> Self {
        Self {
            ran: ran.into(),
            out,
            forks: Vec::new(),
            join: None,
            proofs: Vec::new(),
            meta: Meta::new(),
        }
    }

    /// Record a forked effect. Fork order is preserved on the wire. A full
    /// view contributes its blocks to the receipt graph; a bare link only
    /// the reference.
    pub fn fork(mut self, effect: impl Into<MaybeResolved<Invocation>>) -> Self {
        self.forks.push(effect.into());
        self
    }

    /// Record the join point where forked effects converge.
    pub fn join(mut self, effect: impl Into<MaybeResolved<Invocation>>) -> Self {
        self.join = Some(effect.into());
        self
    }

    /// Attach a proof delegation; its blocks are copied into the receipt
    /// graph.
    pub fn proof(mut self, proof: Delegation) -> Self {
        self.proofs.push(proof);
        self
    }

    /// Attach a metadata entry.
    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Copy referenced blocks, canonically encode the outcome record, sign
    /// it with `issuer`, write the signed envelope as a new root, and return
    /// the immutable view. Awaiting the signature is the single suspension
    /// point; the store stays private until the root write completes.
    pub async fn sign(self, issuer: &dyn Signer) -> Result<Receipt, BuildError> {
        let ReceiptBuilder {
            ran,
            out,
            forks,
            join,
            proofs,
            meta,
        } = self;

        let mut store = BlockStore::new();
        if let MaybeResolved::Resolved(invocation) = &ran {
            store.extend(invocation.blocks().cloned());
        }
        for fork in &forks {
            if let MaybeResolved::Resolved(invocation) = fork {
                store.extend(invocation.blocks().cloned());
            }
        }
        if let Some(MaybeResolved::Resolved(invocation)) = &join {
            store.extend(invocation.blocks().cloned());
        }
        for proof in &proofs {
            store.extend(proof.blocks().cloned());
        }

        let ocm = OutcomeModel {
            ran: *ran.cid(),
            out,
            fx: Effects {
                fork: forks.iter().map(|f| *f.cid()).collect(),
                join: join.as_ref().map(|j| *j.cid()),
            },
            meta,
            iss: issuer.did(),
            prf: proofs.iter().map(|p| *p.cid()).collect(),
        };

        let message = codec::encode(&ocm)?;
        let sig = issuer.sign(&message).await?;
        let data = ReceiptModel { ocm, sig };
        let root = dag::write_into(&data, &mut store)?;

        let receipt = Receipt {
            root,
            data,
            blocks: Arc::new(store),
            ran: OnceLock::new(),
            proofs: OnceLock::new(),
        };
        let _ = receipt.ran.set(ran);
        let _ = receipt
            .proofs
            .set(proofs.into_iter().map(MaybeResolved::Resolved).collect());
        Ok(receipt)
    }
}
