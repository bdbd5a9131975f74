//! Guestbook message record

use crate::schema::GuestbookEntry;
use alloy_primitives::TxHash;
use serde::{Deserialize, Serialize};

/// One guestbook message, as shown in the feed and persisted locally.
///
/// There is no formal key; two messages are the same entry when author,
/// text and timestamp all match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuestbookMessage {
    /// Checksummed account address
    pub author: String,
    pub message: String,
    /// Seconds since the Unix epoch
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
}

impl GuestbookMessage {
    pub fn new(author: impl Into<String>, message: impl Into<String>, timestamp: u64) -> Self {
        Self {
            author: author.into(),
            message: message.into(),
            timestamp,
            tx_hash: None,
        }
    }

    pub fn with_tx_hash(mut self, tx_hash: Option<TxHash>) -> Self {
        self.tx_hash = tx_hash;
        self
    }

    /// Dedup comparison on (author, message, timestamp)
    pub fn same_entry(&self, other: &GuestbookMessage) -> bool {
        self.author == other.author
            && self.message == other.message
            && self.timestamp == other.timestamp
    }
}

impl From<GuestbookEntry> for GuestbookMessage {
    fn from(entry: GuestbookEntry) -> Self {
        Self::new(entry.author.to_string(), entry.message, entry.timestamp)
    }
}
