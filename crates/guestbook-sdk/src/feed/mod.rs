//! Message feed
//!
//! The feed is optimistic-write plus heartbeat: published messages are
//! prepended locally and persisted write-through, while the watcher keeps a
//! "last seen block" liveness marker and forwards any records a working
//! subscription happens to deliver.

mod message;
mod store;
mod watcher;

pub use message::GuestbookMessage;
pub use store::Feed;
pub use watcher::{poll_once, FeedWatcher, WatchContext};
