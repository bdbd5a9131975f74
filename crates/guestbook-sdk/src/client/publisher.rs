//! Publish flow
//!
//! Encodes a guestbook entry, submits it under a content id derived from the
//! author and time, and prepends it to the feed once the write succeeded.

use super::session::{Connection, Session};
use crate::error::PublishError;
use crate::feed::GuestbookMessage;
use crate::schema::{data_id, DataStream, EventPayload, GuestbookEntry};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

/// Clears the in-flight flag when the publish ends, however it ends
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl Session {
    /// Publish `message` from the connected account.
    ///
    /// Validation failures return before any remote call. On success the
    /// published message is prepended to the feed and returned.
    pub async fn sign(&self, message: &str) -> Result<GuestbookMessage, PublishError> {
        let text = message.trim();
        if text.is_empty() {
            return Err(PublishError::Validation("Please enter a message.".to_string()));
        }

        let connection = self.connection.read().await.clone();
        let Some(connection) = connection else {
            return Err(PublishError::Validation("Connect your wallet first.".to_string()));
        };

        if self.publishing.swap(true, Ordering::SeqCst) {
            return Err(PublishError::Busy);
        }
        let _in_flight = InFlight(&self.publishing);

        match self.publish(&connection, text).await {
            Ok(published) => Ok(published),
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Failed to send message");
                Err(e)
            }
        }
    }

    async fn publish(&self, connection: &Connection, text: &str) -> Result<GuestbookMessage, PublishError> {
        let Some(schema_id) = connection.schema_id else {
            return Err(PublishError::Validation(
                "The guestbook schema is not ready yet. Retry setup.".to_string(),
            ));
        };
        let streams = connection.streams.as_ref();
        let account = connection.account;

        match streams.is_data_schema_registered(schema_id).await {
            Ok(true) => {}
            Ok(false) => warn!(%schema_id, "Schema reported unregistered, publishing anyway"),
            Err(e) => warn!(%schema_id, error = %e, "Schema check failed, publishing anyway"),
        }

        let millis = self.clock.now_millis();
        let entry = GuestbookEntry {
            author: account,
            message: text.to_string(),
            timestamp: millis / 1000,
        };
        let record = DataStream {
            id: data_id(&account, millis),
            schema_id,
            data: entry.encode(),
        };
        let record_id = record.id;

        let tx_hash = streams.set(&[record]).await?;
        info!(%account, %record_id, ?tx_hash, "Message published");

        if streams.capabilities().emit {
            let event_id = &self.config.streams.event_id;
            if let Err(e) = streams.emit(event_id, &EventPayload::guestbook_update(&account)).await {
                // the record is already stored; the event is only a notification
                debug!(%event_id, error = %e, "Event emit after publish failed");
            }
        }

        let published = GuestbookMessage::from(entry).with_tx_hash(tx_hash);
        if let Err(e) = self.feed.append(published.clone()).await {
            warn!(error = %e, "Published message could not be stored locally");
        }

        Ok(published)
    }
}
