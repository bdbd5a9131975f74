//! Per-user key/value persistence
//!
//! The native counterpart of browser local storage: string values under
//! string keys, no versioning.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;

/// Synchronous string key/value store.
///
/// The feed calls these from the blocking thread pool, so implementations
/// may do file or other blocking I/O.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
