//! Session configuration
//!
//! Every section falls back to the Somnia testnet defaults, so an empty
//! config file is a valid one.

use crate::chain::ChainConfig;
use crate::error::{GuestbookError, Result};
use crate::schema::{GUESTBOOK_EVENT_ID, GUESTBOOK_SCHEMA_NAME};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuestbookConfig {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub streams: StreamsConfig,
}

impl GuestbookConfig {
    /// Reject values the session cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chain.rpc_urls.http.is_empty() {
            return Err(GuestbookError::Config(format!(
                "chain {} has no HTTP RPC endpoint",
                self.chain.name
            )));
        }
        if self.feed.poll_interval_secs == 0 {
            return Err(GuestbookError::Config("feed.poll_interval_secs must be at least 1".into()));
        }
        if self.feed.storage_key.trim().is_empty() {
            return Err(GuestbookError::Config("feed.storage_key must not be empty".into()));
        }
        Ok(())
    }
}

/// Feed persistence and heartbeat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Key the message list is persisted under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Heartbeat interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl FeedConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

fn default_storage_key() -> String {
    "guestbook-messages".to_string()
}

fn default_poll_interval() -> u64 {
    5
}

/// Local storage location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for the file-backed store
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// RPC request timeout in seconds
    #[serde(default = "default_timeout")]
    pub rpc_timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_timeout_secs: default_timeout(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".guestbook")
}

fn default_timeout() -> u64 {
    30
}

/// Names registered with the streams service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamsConfig {
    #[serde(default = "default_schema_name")]
    pub schema_name: String,

    #[serde(default = "default_event_id")]
    pub event_id: String,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            schema_name: default_schema_name(),
            event_id: default_event_id(),
        }
    }
}

fn default_schema_name() -> String {
    GUESTBOOK_SCHEMA_NAME.to_string()
}

fn default_event_id() -> String {
    GUESTBOOK_EVENT_ID.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config: GuestbookConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, GuestbookConfig::default());
        assert_eq!(config.feed.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.streams.event_id, "GLOBAL_GUESTBOOK_UPDATE_V1");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config: GuestbookConfig =
            serde_json::from_str(r#"{"feed": {"poll_interval_secs": 12}}"#).unwrap();
        assert_eq!(config.feed.poll_interval_secs, 12);
        assert_eq!(config.feed.storage_key, "guestbook-messages");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut config = GuestbookConfig::default();
        config.feed.poll_interval_secs = 0;
        assert!(matches!(config.validate(), Err(GuestbookError::Config(_))));
    }
}
