//! Connections: executing invocation batches against a service.
//!
//! A [`Channel`] is one request/response round trip over any byte-oriented
//! carrier (HTTP, a queue, an in-process loopback). A [`Connection`] binds a
//! channel to a request codec and a response codec — by default the archive
//! codec, or whatever pair a legacy bridge supplies.

use async_trait::async_trait;
use tracing::debug;

use warrant_core::{Invocation, IssuedInvocation, Receipt};

use crate::error::{Result, TransportError};
use crate::legacy::{CarCodec, RequestCodec, ResponseCodec};
use crate::payload::Payload;
use crate::{request, response};

/// A byte-oriented request/response carrier.
///
/// Retries for a flaky carrier belong to the implementation; the connection
/// performs exactly one round trip per batch.
#[async_trait]
pub trait Channel: Send + Sync {
    async fn request(&self, payload: Payload) -> Result<Payload>;
}

/// A service endpoint handling one invocation at a time. Used by
/// [`MemoryChannel`] to run a service in-process.
#[async_trait]
pub trait Service: Send + Sync {
    async fn handle(&self, invocation: Invocation) -> Result<Receipt>;
}

/// A connection to a service over some channel.
pub struct Connection<C: Channel> {
    channel: C,
    request: Box<dyn RequestCodec>,
    response: Box<dyn ResponseCodec>,
}

impl<C: Channel> Connection<C> {
    /// Connect over `channel` with the archive codec on both sides.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            request: Box::new(CarCodec),
            response: Box::new(CarCodec),
        }
    }

    /// Connect with a bridge-supplied encoder/decoder pair.
    pub fn with_codecs(
        channel: C,
        request: Box<dyn RequestCodec>,
        response: Box<dyn ResponseCodec>,
    ) -> Self {
        Self {
            channel,
            request,
            response,
        }
    }

    /// Build and execute a batch of invocation drafts, returning the
    /// receipts in request order.
    pub async fn execute(&self, invocations: Vec<IssuedInvocation>) -> Result<Vec<Receipt>> {
        let mut built = Vec::with_capacity(invocations.len());
        for draft in invocations {
            built.push(draft.build().await?);
        }

        let payload = self.request.encode(&built)?;
        debug!(invocations = built.len(), "executing invocation batch");
        let reply = self.channel.request(payload).await?;
        self.response.decode(&reply)
    }
}

/// Execute a single invocation draft against a connection.
#[async_trait]
pub trait Execute: Sized {
    /// Submit a batch of exactly one and return its receipt.
    async fn execute<C: Channel>(self, connection: &Connection<C>) -> Result<Receipt>;
}

#[async_trait]
impl Execute for IssuedInvocation {
    async fn execute<C: Channel>(self, connection: &Connection<C>) -> Result<Receipt> {
        let mut receipts = connection.execute(vec![self]).await?;
        if receipts.len() != 1 {
            return Err(TransportError::Channel(format!(
                "expected one receipt, got {}",
                receipts.len()
            )));
        }
        Ok(receipts.remove(0))
    }
}

/// An in-process loopback channel that decodes each request batch, hands
/// every invocation to a [`Service`], and encodes the receipts back.
pub struct MemoryChannel<S: Service> {
    service: S,
}

impl<S: Service> MemoryChannel<S> {
    pub fn new(service: S) -> Self {
        Self { service }
    }
}

#[async_trait]
impl<S: Service> Channel for MemoryChannel<S> {
    async fn request(&self, payload: Payload) -> Result<Payload> {
        let invocations = request::decode(&payload)?;
        let mut receipts = Vec::with_capacity(invocations.len());
        for invocation in invocations {
            receipts.push(self.service.handle(invocation).await?);
        }
        response::encode(&receipts)
    }
}
