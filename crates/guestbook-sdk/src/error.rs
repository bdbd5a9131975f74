//! Error types for the guestbook SDK

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, GuestbookError>;

/// Result type for calls that cross the wallet / chain boundary
pub type CallResult<T> = std::result::Result<T, CallError>;

/// SDK error types
#[derive(Error, Debug)]
pub enum GuestbookError {
    /// Input rejected before any remote call
    #[error("Validation error: {0}")]
    Validation(String),

    /// Persisted state could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// Schema encoding or decoding failed
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A wallet or streams call failed
    #[error(transparent)]
    Remote(#[from] CallError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GuestbookError {
    fn from(err: serde_json::Error) -> Self {
        GuestbookError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for GuestbookError {
    fn from(err: std::io::Error) -> Self {
        GuestbookError::Storage(err.to_string())
    }
}

#[cfg(feature = "rpc")]
impl From<reqwest::Error> for GuestbookError {
    fn from(err: reqwest::Error) -> Self {
        GuestbookError::Network(err.to_string())
    }
}

impl From<alloy_sol_types::Error> for GuestbookError {
    fn from(err: alloy_sol_types::Error) -> Self {
        GuestbookError::Encoding(err.to_string())
    }
}

/// Closed set of failure classes for boundary calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The user declined the signature request in the wallet
    UserRejected,
    /// The account cannot pay for gas
    InsufficientFunds,
    /// RPC transport failure or internal node error
    Transport,
    /// The adapter does not offer this capability
    Unsupported,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserRejected => "user_rejected",
            Self::InsufficientFunds => "insufficient_funds",
            Self::Transport => "transport",
            Self::Unsupported => "unsupported",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// EIP-1193 code for a request the user rejected.
const USER_REJECTED_CODE: i64 = 4001;
/// JSON-RPC internal error.
const INTERNAL_ERROR_CODE: i64 = -32603;
/// JSON-RPC reserved server error range.
const SERVER_ERROR_RANGE: std::ops::RangeInclusive<i64> = -32099..=-32000;

/// Error returned by every wallet, streams and chain call.
///
/// Adapters build these through [`CallError::classify`] so the rest of the
/// SDK only ever matches on [`ErrorKind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct CallError {
    pub kind: ErrorKind,
    pub message: String,
}

impl CallError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Classify a raw provider failure from its optional JSON-RPC / EIP-1193
    /// code and its message text.
    pub fn classify(code: Option<i64>, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();

        let kind = if code == Some(USER_REJECTED_CODE)
            || lowered.contains("user rejected")
            || lowered.contains("user denied")
        {
            ErrorKind::UserRejected
        } else if lowered.contains("insufficient funds") || lowered.contains("insufficient balance") {
            ErrorKind::InsufficientFunds
        } else if code == Some(INTERNAL_ERROR_CODE)
            || code.is_some_and(|c| SERVER_ERROR_RANGE.contains(&c))
            || lowered.contains("internal json-rpc error")
            || lowered.contains("timeout")
            || lowered.contains("connection")
        {
            ErrorKind::Transport
        } else {
            ErrorKind::Unknown
        };

        Self { kind, message }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn unsupported(capability: &str) -> Self {
        Self::new(
            ErrorKind::Unsupported,
            format!("{} is not supported by this streams adapter", capability),
        )
    }
}

/// Outcome of a failed publish, rendered to the user as a single alert
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// A publish is already in flight
    #[error("a message is already being published")]
    Busy,

    /// Rejected before any network call
    #[error("{0}")]
    Validation(String),

    /// The submission call failed
    #[error("publish failed ({kind}): {message}")]
    Failed { kind: ErrorKind, message: String },
}

impl PublishError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Alert text for the user
    pub fn user_message(&self) -> String {
        match self {
            Self::Busy => "Already sending a message, please wait.".to_string(),
            Self::Validation(message) => message.clone(),
            Self::Failed { kind, .. } => {
                let reason = match kind {
                    ErrorKind::UserRejected => "Transaction was rejected in your wallet.",
                    ErrorKind::InsufficientFunds => "Insufficient funds for gas.",
                    ErrorKind::Transport => "The network reported an internal error. Please try again.",
                    ErrorKind::Unsupported | ErrorKind::Unknown => "Unknown error. Check the logs for details.",
                };
                format!("Failed to send message. {}", reason)
            }
        }
    }
}

impl From<CallError> for PublishError {
    fn from(err: CallError) -> Self {
        PublishError::Failed {
            kind: err.kind,
            message: err.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_code() {
        assert_eq!(CallError::classify(Some(4001), "nope").kind, ErrorKind::UserRejected);
        assert_eq!(CallError::classify(Some(-32603), "boom").kind, ErrorKind::Transport);
        assert_eq!(CallError::classify(Some(-32005), "limit").kind, ErrorKind::Transport);
        assert_eq!(CallError::classify(Some(3), "execution reverted").kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_classify_by_message() {
        let err = CallError::classify(None, "MetaMask Tx Signature: User rejected the request.");
        assert_eq!(err.kind, ErrorKind::UserRejected);

        // insufficient funds wins over the generic server error code
        let err = CallError::classify(Some(-32000), "insufficient funds for gas * price + value");
        assert_eq!(err.kind, ErrorKind::InsufficientFunds);

        let err = CallError::classify(None, "Internal JSON-RPC error.");
        assert_eq!(err.kind, ErrorKind::Transport);

        assert_eq!(CallError::classify(None, "something odd").kind, ErrorKind::Unknown);
    }

    #[test]
    fn test_publish_error_messages() {
        let rejected = PublishError::from(CallError::classify(Some(4001), "User rejected the request."));
        assert_eq!(rejected.kind(), Some(ErrorKind::UserRejected));
        assert_eq!(
            rejected.user_message(),
            "Failed to send message. Transaction was rejected in your wallet."
        );

        let broke = PublishError::from(CallError::classify(None, "insufficient funds for gas"));
        assert!(broke.user_message().ends_with("Insufficient funds for gas."));

        let invalid = PublishError::Validation("Please enter a message.".to_string());
        assert_eq!(invalid.kind(), None);
        assert_eq!(invalid.user_message(), "Please enter a message.");
    }

    #[test]
    fn test_display_includes_kind() {
        let err = CallError::unsupported("subscribe");
        assert!(err.to_string().starts_with("unsupported: subscribe"));
    }
}
