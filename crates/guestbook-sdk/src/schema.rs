//! Guestbook schema layout and identifiers
//!
//! One named tuple schema is used both to compute the schema id and to encode
//! records, so the two can never drift apart.

use crate::error::Result;
use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_sol_types::{sol, SolType, SolValue};
use serde::{Deserialize, Serialize};

/// Tuple schema registered for guestbook records.
pub const GUESTBOOK_SCHEMA: &str = "(address author, string message, uint64 timestamp)";

/// Human readable registration name for the data schema.
pub const GUESTBOOK_SCHEMA_NAME: &str = "GUESTBOOK_SCHEMA_V1";

/// Event schema id that guestbook updates are emitted under.
pub const GUESTBOOK_EVENT_ID: &str = "GLOBAL_GUESTBOOK_UPDATE_V1";

/// Solidity-style signature of the guestbook update event.
pub const GUESTBOOK_EVENT_TOPIC: &str = "GuestbookUpdate(address indexed author)";

/// Prefix of the string hashed into a record's content id.
pub const DATA_ID_PREFIX: &str = "guestbook";

sol! {
    /// On-chain layout of one guestbook record.
    #[derive(Debug, PartialEq, Eq)]
    struct GuestbookEntry {
        address author;
        string message;
        uint64 timestamp;
    }
}

impl GuestbookEntry {
    /// ABI parameter encoding, the layout the streams service stores.
    pub fn encode(&self) -> Bytes {
        Bytes::from(SolValue::abi_encode_params(self))
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        Ok(<GuestbookEntry as SolType>::abi_decode_params(data, true)?)
    }
}

/// Schema id as the streams service derives it: keccak256 of the schema text.
///
/// The orchestrator always asks the service; this is for adapters and
/// cross-checks.
pub fn local_schema_id(schema: &str) -> B256 {
    keccak256(schema.as_bytes())
}

/// Content id for a record published by `author` at `millis`.
pub fn data_id(author: &Address, millis: u64) -> B256 {
    keccak256(format!("{}-{}-{}", DATA_ID_PREFIX, author, millis).as_bytes())
}

/// Data schema registration request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSchemaRegistration {
    /// Registration name (e.g. `GUESTBOOK_SCHEMA_V1`)
    pub id: String,
    /// Tuple schema text
    pub schema: String,
    /// Parent schema id for extended schemas
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_schema_id: Option<B256>,
}

impl DataSchemaRegistration {
    pub fn guestbook() -> Self {
        Self {
            id: GUESTBOOK_SCHEMA_NAME.to_string(),
            schema: GUESTBOOK_SCHEMA.to_string(),
            parent_schema_id: None,
        }
    }
}

/// One parameter of an event schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventParameter {
    pub name: String,
    pub param_type: String,
    pub is_indexed: bool,
}

/// Event schema registered so emitted records can be filtered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSchema {
    pub params: Vec<EventParameter>,
    pub event_topic: String,
}

impl EventSchema {
    pub fn guestbook() -> Self {
        Self {
            params: vec![EventParameter {
                name: "author".to_string(),
                param_type: "address".to_string(),
                is_indexed: true,
            }],
            event_topic: GUESTBOOK_EVENT_TOPIC.to_string(),
        }
    }
}

/// A record submitted to the streams service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataStream {
    pub id: B256,
    pub schema_id: B256,
    pub data: Bytes,
}

/// Payload of an emitted event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// Indexed arguments, one 32-byte topic each
    pub argument_topics: Vec<B256>,
    /// Non-indexed data
    pub data: Bytes,
}

impl EventPayload {
    /// Guestbook update announcing a new record by `author`
    pub fn guestbook_update(author: &Address) -> Self {
        Self {
            argument_topics: vec![author.into_word()],
            data: Bytes::new(),
        }
    }
}
