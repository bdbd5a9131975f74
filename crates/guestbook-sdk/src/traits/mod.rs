//! Boundary traits
//!
//! Everything the orchestrator needs from the outside world (wallet,
//! streams SDK, chain RPC, clock, clipboard) is reached through these traits,
//! so a session can be driven by real adapters or by test fakes alike.

mod chain;
mod platform;
mod streams;
mod wallet;

pub use chain::ChainReader;
pub use platform::{Clipboard, Clock, SystemClock};
pub use streams::{Capabilities, StreamsConnector, StreamsService, Subscription};
pub use wallet::{normalize_address, WalletProvider};
