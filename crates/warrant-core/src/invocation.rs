//! Invocation: a single-capability delegation meant to be executed.
//!
//! Invocations exist in two forms. [`IssuedInvocation`] is the unsigned,
//! unencoded draft an application builds up; [`Invocation`] is the encoded
//! view, structurally a delegation whose capability list has exactly one
//! entry. Converting a draft into the encoded form is the only production of
//! a new root — there is no in-place promotion.

use std::sync::Arc;

use crate::block::{Block, ContentAddressed};
use crate::capability::{Capability, Fact};
use crate::cid::Cid;
use crate::crypto::{Did, Ed25519Signature, Signer, Verifier};
use crate::dag::{self, BlockStore, MaybeResolved};
use crate::delegation::{Delegation, DelegationBuilder};
use crate::error::{BuildError, SignatureError, ViewError};

/// Start drafting an invocation: `issuer` asks `audience` to perform
/// `capability` now.
///
/// Exactly one capability is taken by construction; the builder path cannot
/// produce a zero- or multi-capability invocation.
pub fn invoke(issuer: Arc<dyn Signer>, audience: Did, capability: Capability) -> IssuedInvocation {
    IssuedInvocation {
        issuer,
        audience,
        capability,
        proofs: Vec::new(),
        expiration: None,
        not_before: None,
        nonce: None,
        facts: Vec::new(),
    }
}

/// An unsigned, unencoded invocation draft.
pub struct IssuedInvocation {
    issuer: Arc<dyn Signer>,
    audience: Did,
    capability: Capability,
    proofs: Vec<Delegation>,
    expiration: Option<i64>,
    not_before: Option<i64>,
    nonce: Option<String>,
    facts: Vec<Fact>,
}

impl IssuedInvocation {
    /// Back the invocation with a proof delegation.
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

    /// The draft's capability.
    pub fn capability(&self) -> &Capability {
        &self.capability
    }

    /// The draft's audience.
    pub fn audience(&self) -> &Did {
        &self.audience
    }

    /// Canonicalize, sign, and store: the same sequence as delegation
    /// issuance, constrained to a single capability.
    pub async fn build(self) -> Result<Invocation, BuildError> {
        let issuer = Arc::clone(&self.issuer);
        let mut builder = DelegationBuilder::new(self.audience).capability(self.capability);
        for proof in self.proofs {
            builder = builder.proof(proof);
        }
        if let Some(exp) = self.expiration {
            builder = builder.expiration(exp);
        }
        if let Some(nbf) = self.not_before {
            builder = builder.not_before(nbf);
        }
        if let Some(nonce) = self.nonce {
            builder = builder.nonce(nonce);
        }
        for fact in self.facts {
            builder = builder.fact(fact);
        }
        let delegation = builder.issue(issuer.as_ref()).await?;
        Ok(Invocation { delegation })
    }
}

/// An encoded invocation view.
///
/// Contains a generic delegation view and narrows it to the one capability
/// an invocation carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    delegation: Delegation,
}

impl Invocation {
    /// View the invocation rooted at `root` over an externally supplied
    /// block store.
    ///
    /// The single-capability invariant is *not* re-validated here: decoded
    /// views are trusted input, and a root that points at some other block
    /// shape will misbehave on field access rather than fail eagerly.
    pub fn view(root: &Cid, blocks: Arc<BlockStore>) -> Result<Self, ViewError> {
        Ok(Self {
            delegation: Delegation::view(root, blocks)?,
        })
    }

    /// The single capability this invocation executes.
    ///
    /// Panics if the underlying block decoded with an empty capability list;
    /// such a block was never produced by the builder path (see
    /// [`Invocation::view`] on the trust boundary).
    pub fn capability(&self) -> &Capability {
        &self.delegation.capabilities()[0]
    }

    /// The generic delegation representation.
    pub fn delegation(&self) -> &Delegation {
        &self.delegation
    }

    pub fn cid(&self) -> &Cid {
        self.delegation.cid()
    }

    pub fn root(&self) -> &Block {
        self.delegation.root()
    }

    pub fn store(&self) -> &Arc<BlockStore> {
        self.delegation.store()
    }

    pub fn issuer(&self) -> &Did {
        self.delegation.issuer()
    }

    pub fn audience(&self) -> &Did {
        self.delegation.audience()
    }

    pub fn expiration(&self) -> Option<i64> {
        self.delegation.expiration()
    }

    pub fn nonce(&self) -> Option<&str> {
        self.delegation.nonce()
    }

    pub fn proofs(&self) -> &[MaybeResolved<Delegation>] {
        self.delegation.proofs()
    }

    pub fn signature(&self) -> &Ed25519Signature {
        self.delegation.signature()
    }

    pub fn verify_signature(&self, principal: &dyn Verifier) -> Result<(), SignatureError> {
        self.delegation.verify_signature(principal)
    }

    /// Every block of the invocation and its proofs, dependencies first,
    /// root last.
    pub fn blocks(&self) -> dag::Blocks<'_> {
        self.delegation.blocks()
    }
}

impl ContentAddressed for Invocation {
    fn cid(&self) -> &Cid {
        self.delegation.cid()
    }
}

impl TryFrom<Delegation> for Invocation {
    type Error = BuildError;

    /// Narrow a delegation to an invocation, rejecting anything but exactly
    /// one capability. This is the builder-path check; decode paths skip it.
    fn try_from(delegation: Delegation) -> Result<Self, Self::Error> {
        let found = delegation.capabilities().len();
        if found != 1 {
            return Err(BuildError::SingleCapability { found });
        }
        Ok(Self { delegation })
    }
}

impl From<Invocation> for Delegation {
    fn from(invocation: Invocation) -> Self {
        invocation.delegation
    }
}

impl From<Invocation> for MaybeResolved<Invocation> {
    fn from(invocation: Invocation) -> Self {
        MaybeResolved::Resolved(invocation)
    }
}
