//! Write-through feed state
//!
//! Keeps the in-memory list and the persisted copy equal after every
//! mutation:
//! - newest first, new entries are prepended
//! - duplicates by (author, message, timestamp) are dropped
//! - a failed persist leaves the in-memory list untouched

use super::GuestbookMessage;
use crate::error::{GuestbookError, Result};
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Ordered message feed backed by a key/value store
///
/// # Example
///
/// ```rust,ignore
/// use guestbook_sdk::{Feed, GuestbookMessage, MemoryStore};
///
/// let feed = Feed::new(Arc::new(MemoryStore::new()), "guestbook-messages");
/// feed.load().await?;
///
/// let added = feed.append(GuestbookMessage::new("0xA", "hello", 1_700_000_000)).await?;
/// assert!(added);
/// ```
#[derive(Clone)]
pub struct Feed {
    key: String,
    store: Arc<dyn KeyValueStore>,
    messages: Arc<Mutex<Vec<GuestbookMessage>>>,
}

impl Feed {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            store,
            messages: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Storage key the feed persists under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace the in-memory list with the persisted one.
    ///
    /// An unreadable persisted list is treated as empty and left in place;
    /// the next append overwrites it.
    pub async fn load(&self) -> Result<usize> {
        let mut messages = self.messages.lock().await;

        let loaded = match self.read_persisted().await? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<GuestbookMessage>>(&raw) {
                Ok(list) => list,
                Err(e) => {
                    warn!(key = %self.key, error = %e, "Dropping unreadable persisted feed");
                    Vec::new()
                }
            },
        };

        debug!(key = %self.key, count = loaded.len(), "Feed loaded");
        *messages = loaded;
        Ok(messages.len())
    }

    /// Prepend `message` unless an equal entry exists, persisting first.
    ///
    /// Returns whether the feed changed.
    pub async fn append(&self, message: GuestbookMessage) -> Result<bool> {
        let mut messages = self.messages.lock().await;

        if messages.iter().any(|existing| existing.same_entry(&message)) {
            debug!(author = %message.author, timestamp = message.timestamp, "Duplicate feed entry skipped");
            return Ok(false);
        }

        let mut updated = Vec::with_capacity(messages.len() + 1);
        updated.push(message);
        updated.extend(messages.iter().cloned());

        self.write_persisted(serde_json::to_string(&updated)?).await?;
        *messages = updated;
        Ok(true)
    }

    // store calls run on the blocking pool

    async fn read_persisted(&self) -> Result<Option<String>> {
        let (store, key) = (self.store.clone(), self.key.clone());
        tokio::task::spawn_blocking(move || store.get(&key))
            .await
            .map_err(blocking_failed)?
    }

    async fn write_persisted(&self, value: String) -> Result<()> {
        let (store, key) = (self.store.clone(), self.key.clone());
        tokio::task::spawn_blocking(move || store.set(&key, &value))
            .await
            .map_err(blocking_failed)?
    }

    /// Snapshot of the feed, newest first
    pub async fn messages(&self) -> Vec<GuestbookMessage> {
        self.messages.lock().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }
}

fn blocking_failed(err: tokio::task::JoinError) -> GuestbookError {
    GuestbookError::Storage(format!("store task failed: {}", err))
}

impl std::fmt::Debug for Feed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Feed").field("key", &self.key).finish_non_exhaustive()
    }
}
