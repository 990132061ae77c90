//! Receipt batch codec: archives on the response side of a connection.

use std::sync::Arc;

use tracing::debug;

use warrant_core::Receipt;

use crate::car::{self, Archive};
use crate::error::Result;
use crate::payload::Payload;

/// Encode a batch of receipts into one archive payload.
///
/// One root per receipt, in input order; block iteration puts dependencies
/// before dependents, so a streaming consumer of the archive can validate
/// as it reads.
pub fn encode(receipts: &[Receipt]) -> Result<Payload> {
    let mut archive = Archive::new();
    for receipt in receipts {
        archive.roots.push(*receipt.cid());
        archive.blocks.extend(receipt.blocks().cloned());
    }
    let body = car::encode(&archive)?;
    debug!(
        receipts = receipts.len(),
        bytes = body.len(),
        "encoded receipt batch"
    );
    Ok(Payload::car(body))
}

/// Decode an archive payload into a batch of receipt views, in root order,
/// all sharing one block set. Each view dereferences its `ran` invocation
/// and proofs lazily from that shared set.
pub fn decode(payload: &Payload) -> Result<Vec<Receipt>> {
    payload.expect_car()?;
    let Archive { roots, blocks } = car::decode(&payload.body)?;
    let blocks = Arc::new(blocks);

    let mut receipts = Vec::with_capacity(roots.len());
    for root in &roots {
        receipts.push(Receipt::view(root, Arc::clone(&blocks))?);
    }
    Ok(receipts)
}
