//! Session status and diagnostics
//!
//! [`SessionState`] is the single shared state object of a session. The
//! diagnostics snapshot is a read-only projection of it, assembled on demand.

use crate::error::Result;
use crate::traits::Clipboard;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

/// Status of the connection and of each setup step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Error,
}

impl SetupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Badge text shown in the status panel
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Pending => "Working…",
            Self::Success => "Ready",
            Self::Error => "Needs Attention",
        }
    }
}

impl std::fmt::Display for SetupStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Subscription lifecycle, forward only within one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubscriptionState {
    #[default]
    NotStarted,
    Attempting,
    /// Push delivery accepted by the adapter, unverified
    Subscribed,
    /// Heartbeat only
    PollingOnly,
}

impl SubscriptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Attempting => "attempting",
            Self::Subscribed => "subscribed",
            Self::PollingOnly => "polling-only",
        }
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mutable state of one mounted session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Checksummed account address
    pub account: Option<String>,
    pub schema_id: Option<String>,
    pub connection: SetupStatus,
    pub schema: SetupStatus,
    pub event: SetupStatus,
    pub emitter: SetupStatus,
    pub subscription: SubscriptionState,
    pub last_polling_block: Option<u64>,
    pub last_polling_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl SessionState {
    pub fn snapshot(&self) -> DiagnosticsSnapshot {
        DiagnosticsSnapshot {
            account: self.account.clone(),
            schema_id: self.schema_id.clone(),
            connection_status: self.connection,
            schema_status: self.schema,
            event_status: self.event,
            emitter_status: self.emitter,
            subscription: self.subscription,
            last_polling_block: self.last_polling_block,
            last_polling_at: self.last_polling_at,
            last_error: self.last_error.clone(),
        }
    }
}

/// Read-only diagnostics projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticsSnapshot {
    pub account: Option<String>,
    pub schema_id: Option<String>,
    pub connection_status: SetupStatus,
    pub schema_status: SetupStatus,
    pub event_status: SetupStatus,
    pub emitter_status: SetupStatus,
    pub subscription: SubscriptionState,
    pub last_polling_block: Option<u64>,
    pub last_polling_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl DiagnosticsSnapshot {
    /// Pretty JSON export; missing poll data renders as "N/A"
    pub fn to_text(&self) -> Result<String> {
        let mut value = serde_json::to_value(self)?;
        if let Some(fields) = value.as_object_mut() {
            for key in ["lastPollingBlock", "lastPollingAt"] {
                if fields.get(key).map_or(true, Value::is_null) {
                    fields.insert(key.to_string(), Value::from("N/A"));
                }
            }
        }
        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// One-line poll summary for the status panel
    pub fn poll_summary(&self) -> String {
        match (self.last_polling_block, self.last_polling_at) {
            (Some(block), Some(at)) => format!("Block #{} ({})", block, at.format("%H:%M:%S")),
            (Some(block), None) => format!("Block #{} (time unknown)", block),
            (None, _) => "Waiting…".to_string(),
        }
    }
}

/// Write the snapshot to the clipboard.
///
/// Returns whether the "copied" indicator should be shown. Failures are
/// logged and never become session errors.
pub async fn copy_diagnostics(snapshot: &DiagnosticsSnapshot, clipboard: &dyn Clipboard) -> bool {
    let text = match snapshot.to_text() {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "Failed to serialize diagnostics");
            return false;
        }
    };

    match clipboard.write_text(&text).await {
        Ok(()) => {
            info!(bytes = text.len(), "Diagnostics copied");
            true
        }
        Err(e) => {
            error!(error = %e, "Failed to copy diagnostics");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CallError, CallResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingClipboard {
        text: Mutex<Option<String>>,
    }

    #[async_trait]
    impl Clipboard for RecordingClipboard {
        async fn write_text(&self, text: &str) -> CallResult<()> {
            *self.text.lock().unwrap() = Some(text.to_string());
            Ok(())
        }
    }

    struct BrokenClipboard;

    #[async_trait]
    impl Clipboard for BrokenClipboard {
        async fn write_text(&self, _text: &str) -> CallResult<()> {
            Err(CallError::unsupported("clipboard"))
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(SetupStatus::Pending.label(), "Working…");
        assert_eq!(SetupStatus::Error.label(), "Needs Attention");
        assert_eq!(SubscriptionState::PollingOnly.to_string(), "polling-only");
    }

    #[test]
    fn test_missing_poll_data_renders_na() {
        let text = SessionState::default().snapshot().to_text().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(value["lastPollingBlock"], "N/A");
        assert_eq!(value["lastPollingAt"], "N/A");
        assert_eq!(value["connectionStatus"], "idle");
        assert_eq!(value["subscription"], "not-started");
    }

    #[test]
    fn test_poll_data_is_exported() {
        let state = SessionState {
            last_polling_block: Some(1234),
            last_polling_at: DateTime::from_timestamp(1_700_000_000, 0),
            ..Default::default()
        };
        let snapshot = state.snapshot();
        let value: Value = serde_json::from_str(&snapshot.to_text().unwrap()).unwrap();

        assert_eq!(value["lastPollingBlock"], 1234);
        assert!(value["lastPollingAt"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
        assert!(snapshot.poll_summary().starts_with("Block #1234 ("));
    }

    #[tokio::test]
    async fn test_copy_reports_indicator() {
        let snapshot = SessionState::default().snapshot();

        let clipboard = RecordingClipboard::default();
        assert!(copy_diagnostics(&snapshot, &clipboard).await);
        assert!(clipboard.text.lock().unwrap().as_deref().unwrap().contains("connectionStatus"));

        assert!(!copy_diagnostics(&snapshot, &BrokenClipboard).await);
    }
}
