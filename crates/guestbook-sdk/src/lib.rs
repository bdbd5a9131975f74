//! Guestbook SDK - signed messages on a blockchain data stream
//!
//! Orchestration layer for a guestbook whose entries are published through
//! an external data-stream service and signed by a browser wallet.
//!
//! # Architecture
//!
//! - **Session**: connects the wallet, computes the schema id and runs the
//!   one-time setup (data schema, event schema, emitter permission)
//! - **Publish flow**: encodes an entry, submits it, appends it to the feed
//! - **Feed**: newest-first message list persisted write-through to a
//!   key/value store, plus a block-number heartbeat
//! - **Diagnostics**: read-only snapshot of session state
//!
//! The wallet, the streams service, the chain RPC, storage, clock and
//! clipboard are all traits (see [`traits`]); the SDK never inspects the
//! shape of an external object at runtime.
//!
//! # Example
//!
//! ```rust,ignore
//! use guestbook_sdk::{GuestbookConfig, MemoryStore, RpcClient, Session, SessionDeps, SystemClock};
//!
//! let config = GuestbookConfig::default();
//! let session = Session::new(config.clone(), SessionDeps {
//!     wallet: Some(wallet),
//!     connector,
//!     chain: Arc::new(RpcClient::for_chain(&config.chain, 30)?),
//!     store: Arc::new(MemoryStore::new()),
//!     clock: Arc::new(SystemClock),
//! })?;
//!
//! session.connect().await;
//! let published = session.sign("hello from the guestbook").await?;
//! ```

// Chain description and JSON-RPC reader
pub mod chain;

// Session, setup sequence and publish flow
pub mod client;

// Configuration
pub mod config;

// Error types
pub mod error;

// Message feed and heartbeat
pub mod feed;

// Schema layout and identifiers
pub mod schema;

// Status and diagnostics
pub mod status;

// Key/value persistence
pub mod storage;

// Boundary traits
pub mod traits;

pub use chain::ChainConfig;
#[cfg(feature = "rpc")]
pub use chain::RpcClient;

pub use client::{Session, SessionDeps};

pub use config::{FeedConfig, GuestbookConfig, StorageConfig, StreamsConfig};

pub use error::{CallError, CallResult, ErrorKind, GuestbookError, PublishError, Result};

pub use feed::{Feed, FeedWatcher, GuestbookMessage};

pub use schema::{
    DataSchemaRegistration, DataStream, EventPayload, EventSchema, GuestbookEntry, GUESTBOOK_EVENT_ID,
    GUESTBOOK_SCHEMA, GUESTBOOK_SCHEMA_NAME,
};

pub use status::{DiagnosticsSnapshot, SessionState, SetupStatus, SubscriptionState};

pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub use traits::{
    Capabilities, ChainReader, Clipboard, Clock, StreamsConnector, StreamsService, Subscription,
    SystemClock, WalletProvider,
};
