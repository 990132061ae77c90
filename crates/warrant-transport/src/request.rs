//! Invocation batch codec: archives on the request side of a connection.

use std::sync::Arc;

use tracing::debug;

use warrant_core::Invocation;

use crate::car::{self, Archive};
use crate::error::Result;
use crate::payload::Payload;

/// Encode a batch of invocations into one archive payload.
///
/// One root per invocation, in input order; all transitively reachable
/// blocks are unioned into a single deduplicated block set.
pub fn encode(invocations: &[Invocation]) -> Result<Payload> {
    let mut archive = Archive::new();
    for invocation in invocations {
        archive.roots.push(*invocation.cid());
        archive.blocks.extend(invocation.blocks().cloned());
    }
    let body = car::encode(&archive)?;
    debug!(
        invocations = invocations.len(),
        bytes = body.len(),
        "encoded invocation batch"
    );
    Ok(Payload::car(body))
}

/// Decode an archive payload into a batch of invocation views, in root
/// order, all sharing one block set.
pub fn decode(payload: &Payload) -> Result<Vec<Invocation>> {
    payload.expect_car()?;
    let Archive { roots, blocks } = car::decode(&payload.body)?;
    let blocks = Arc::new(blocks);

    let mut invocations = Vec::with_capacity(roots.len());
    for root in &roots {
        invocations.push(Invocation::view(root, Arc::clone(&blocks))?);
    }
    Ok(invocations)
}
