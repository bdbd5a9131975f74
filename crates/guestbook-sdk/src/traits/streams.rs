//! Data-stream service boundary
//!
//! Mirrors the calls the orchestrator makes against the external streams SDK.
//! Optional calls are gated by [`Capabilities`] which the adapter declares up
//! front; the orchestrator checks the flags and never probes.

use crate::chain::ChainConfig;
use crate::error::{CallError, CallResult};
use crate::schema::{DataSchemaRegistration, DataStream, EventPayload, EventSchema};
use alloy_primitives::{Address, Bytes, TxHash, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

/// Optional features an adapter supports
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// `emit` publishes events
    pub emit: bool,
    /// `subscribe` delivers pushed events
    pub subscribe: bool,
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            emit: true,
            subscribe: true,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }
}

/// Live event subscription.
///
/// Yields the raw data of each pushed record. Dropping the handle
/// unsubscribes.
pub struct Subscription {
    events: mpsc::Receiver<Bytes>,
    cancel: Option<oneshot::Sender<()>>,
}

impl Subscription {
    /// Build a handle from the adapter's event channel and a cancel signal
    pub fn new(events: mpsc::Receiver<Bytes>, cancel: oneshot::Sender<()>) -> Self {
        Self {
            events,
            cancel: Some(cancel),
        }
    }

    /// Next pushed record, `None` once the adapter closes the stream
    pub async fn next(&mut self) -> Option<Bytes> {
        self.events.recv().await
    }

    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            // the adapter may already be gone
            let _ = cancel.send(());
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Streams SDK client bound to one account.
///
/// Write calls return `Ok(None)` when the service accepted the request
/// without sending a transaction (for example an idempotent registration).
#[async_trait]
pub trait StreamsService: Send + Sync {
    /// Optional features this adapter offers
    fn capabilities(&self) -> Capabilities {
        Capabilities::none()
    }

    async fn compute_schema_id(&self, schema: &str) -> CallResult<B256>;

    /// Registration lookup. Known to be unreliable on some deployments.
    async fn is_data_schema_registered(&self, schema_id: B256) -> CallResult<bool>;

    /// Register data schemas. With `ignore_registered` an already registered
    /// schema is not an error.
    async fn register_data_schemas(
        &self,
        schemas: &[DataSchemaRegistration],
        ignore_registered: bool,
    ) -> CallResult<Option<TxHash>>;

    /// Existence lookup, one slot per requested id
    async fn get_event_schemas_by_id(&self, ids: &[String]) -> CallResult<Vec<Option<EventSchema>>>;

    async fn register_event_schemas(
        &self,
        ids: &[String],
        schemas: &[EventSchema],
    ) -> CallResult<Option<TxHash>>;

    /// Allow or revoke `emitter` for the event. Granting twice is not an error.
    async fn manage_event_emitters(
        &self,
        event_id: &str,
        emitter: Address,
        allow: bool,
    ) -> CallResult<Option<TxHash>>;

    /// Publish records
    async fn set(&self, records: &[DataStream]) -> CallResult<Option<TxHash>>;

    /// Emit an event. Only called when `capabilities().emit` is set.
    async fn emit(&self, _event_id: &str, _event: &EventPayload) -> CallResult<Option<TxHash>> {
        Err(CallError::unsupported("emit"))
    }

    /// Subscribe to an event. Only called when `capabilities().subscribe` is set.
    async fn subscribe(&self, _event_id: &str) -> CallResult<Subscription> {
        Err(CallError::unsupported("subscribe"))
    }
}

/// Builds a streams client for a connected account
#[async_trait]
pub trait StreamsConnector: Send + Sync {
    async fn connect(
        &self,
        account: Address,
        chain: &ChainConfig,
    ) -> CallResult<Arc<dyn StreamsService>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscription_drop_cancels() {
        let (_tx, rx) = mpsc::channel(4);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let subscription = Subscription::new(rx, cancel_tx);
        drop(subscription);

        assert!(cancel_rx.await.is_ok());
    }

    #[tokio::test]
    async fn test_subscription_yields_events_until_closed() {
        let (tx, rx) = mpsc::channel(4);
        let (cancel_tx, _cancel_rx) = oneshot::channel();
        let mut subscription = Subscription::new(rx, cancel_tx);

        tx.send(Bytes::from_static(b"abc")).await.unwrap();
        drop(tx);

        assert_eq!(subscription.next().await, Some(Bytes::from_static(b"abc")));
        assert_eq!(subscription.next().await, None);
    }
}
