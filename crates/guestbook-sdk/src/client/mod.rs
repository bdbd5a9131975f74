//! Session orchestration
//!
//! - `session`: wallet connection, schema / event / emitter setup, retry,
//!   feed lifecycle and diagnostics
//! - `publisher`: the sign-and-publish flow

mod publisher;
mod session;

pub use session::{Session, SessionDeps};
