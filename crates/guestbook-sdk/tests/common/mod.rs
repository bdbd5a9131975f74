//! Test doubles for the session boundaries

#![allow(dead_code)]

use alloy_primitives::{address, Address, Bytes, TxHash, B256};
use async_trait::async_trait;
use guestbook_sdk::error::{CallError, CallResult, GuestbookError, Result};
use guestbook_sdk::schema::{local_schema_id, DataSchemaRegistration, DataStream, EventPayload, EventSchema};
use guestbook_sdk::{
    Capabilities, ChainConfig, ChainReader, Clipboard, Clock, GuestbookConfig, KeyValueStore, MemoryStore,
    Session, SessionDeps, StreamsConnector, StreamsService, Subscription, WalletProvider,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, Notify};

pub const ACCOUNT: Address = address!("5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
pub const OTHER_ACCOUNT: Address = address!("fB6916095ca1df60bB79Ce92cE3Ea74c37c5d359");
pub const NOW_MILLIS: u64 = 1_700_000_123_456;

// =============================================================================
// Wallet
// =============================================================================

pub struct FakeWallet {
    pub response: Mutex<CallResult<Vec<String>>>,
    pub calls: AtomicUsize,
}

impl FakeWallet {
    pub fn with_account() -> Self {
        Self {
            response: Mutex::new(Ok(vec![ACCOUNT.to_string().to_lowercase()])),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: CallError) -> Self {
        Self {
            response: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn switch_to(&self, account: Address) {
        *self.response.lock().unwrap() = Ok(vec![account.to_string()]);
    }
}

#[async_trait]
impl WalletProvider for FakeWallet {
    async fn request_addresses(&self) -> CallResult<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.lock().unwrap().clone()
    }
}

// =============================================================================
// Streams
// =============================================================================

/// Per-call failure switches and counters
#[derive(Default)]
pub struct StreamsScript {
    pub capabilities: Capabilities,
    pub schema_registered: bool,
    pub event_exists: bool,
    pub fail_compute: Option<CallError>,
    pub fail_check: Option<CallError>,
    pub fail_event_lookup: Option<CallError>,
    pub fail_register_schema: Option<CallError>,
    pub fail_register_event: Option<CallError>,
    pub fail_emitters: Option<CallError>,
    pub fail_set: Option<CallError>,
    pub fail_emit: Option<CallError>,
    /// When set, emitter grants wait for a notification before answering
    pub hold_emitters: Option<Arc<Notify>>,
}

#[derive(Default)]
pub struct FakeStreams {
    pub script: Mutex<StreamsScript>,
    pub calls: Mutex<HashMap<&'static str, usize>>,
    pub published: Mutex<Vec<DataStream>>,
    /// `ignore_registered` flag of every schema registration
    pub ignore_registered: Mutex<Vec<bool>>,
    pub emitted: Mutex<Vec<(String, EventPayload)>>,
    /// Sender side of the live subscription, when one was opened
    pub push: Mutex<Option<mpsc::Sender<Bytes>>>,
    pub cancelled: Mutex<Option<oneshot::Receiver<()>>>,
}

impl FakeStreams {
    pub fn new(script: StreamsScript) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            ..Default::default()
        })
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().get(call).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }

    fn record(&self, call: &'static str) {
        *self.calls.lock().unwrap().entry(call).or_insert(0) += 1;
    }

    fn failure(&self, pick: impl FnOnce(&StreamsScript) -> &Option<CallError>) -> CallResult<()> {
        match pick(&self.script.lock().unwrap()) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

fn tx(n: u8) -> Option<TxHash> {
    Some(TxHash::repeat_byte(n))
}

#[async_trait]
impl StreamsService for FakeStreams {
    fn capabilities(&self) -> Capabilities {
        self.script.lock().unwrap().capabilities
    }

    async fn compute_schema_id(&self, schema: &str) -> CallResult<B256> {
        self.record("compute_schema_id");
        self.failure(|s| &s.fail_compute)?;
        Ok(local_schema_id(schema))
    }

    async fn is_data_schema_registered(&self, _schema_id: B256) -> CallResult<bool> {
        self.record("is_data_schema_registered");
        self.failure(|s| &s.fail_check)?;
        Ok(self.script.lock().unwrap().schema_registered)
    }

    async fn register_data_schemas(
        &self,
        _schemas: &[DataSchemaRegistration],
        ignore_registered: bool,
    ) -> CallResult<Option<TxHash>> {
        self.record("register_data_schemas");
        self.ignore_registered.lock().unwrap().push(ignore_registered);
        self.failure(|s| &s.fail_register_schema)?;
        Ok(tx(1))
    }

    async fn get_event_schemas_by_id(&self, ids: &[String]) -> CallResult<Vec<Option<EventSchema>>> {
        self.record("get_event_schemas_by_id");
        self.failure(|s| &s.fail_event_lookup)?;
        let exists = self.script.lock().unwrap().event_exists;
        Ok(ids.iter().map(|_| exists.then(EventSchema::guestbook)).collect())
    }

    async fn register_event_schemas(&self, _ids: &[String], _schemas: &[EventSchema]) -> CallResult<Option<TxHash>> {
        self.record("register_event_schemas");
        self.failure(|s| &s.fail_register_event)?;
        Ok(tx(2))
    }

    async fn manage_event_emitters(
        &self,
        _event_id: &str,
        _emitter: Address,
        _allow: bool,
    ) -> CallResult<Option<TxHash>> {
        self.record("manage_event_emitters");
        let hold = self.script.lock().unwrap().hold_emitters.clone();
        if let Some(hold) = hold {
            hold.notified().await;
        }
        self.failure(|s| &s.fail_emitters)?;
        Ok(tx(3))
    }

    async fn set(&self, records: &[DataStream]) -> CallResult<Option<TxHash>> {
        self.record("set");
        self.failure(|s| &s.fail_set)?;
        self.published.lock().unwrap().extend_from_slice(records);
        Ok(tx(4))
    }

    async fn emit(&self, event_id: &str, event: &EventPayload) -> CallResult<Option<TxHash>> {
        self.record("emit");
        self.failure(|s| &s.fail_emit)?;
        self.emitted.lock().unwrap().push((event_id.to_string(), event.clone()));
        Ok(tx(5))
    }

    async fn subscribe(&self, _event_id: &str) -> CallResult<Subscription> {
        self.record("subscribe");
        let (events_tx, events_rx) = mpsc::channel(8);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        *self.push.lock().unwrap() = Some(events_tx);
        *self.cancelled.lock().unwrap() = Some(cancel_rx);
        Ok(Subscription::new(events_rx, cancel_tx))
    }
}

pub struct FakeConnector {
    pub streams: Arc<FakeStreams>,
    pub fail: Mutex<Option<CallError>>,
}

#[async_trait]
impl StreamsConnector for FakeConnector {
    async fn connect(&self, _account: Address, _chain: &ChainConfig) -> CallResult<Arc<dyn StreamsService>> {
        match self.fail.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(self.streams.clone()),
        }
    }
}

// =============================================================================
// Chain, clock, clipboard, storage
// =============================================================================

/// Block number that grows by one on every read
pub struct FakeChain {
    pub next: AtomicU64,
    pub calls: AtomicUsize,
}

impl FakeChain {
    pub fn starting_at(block: u64) -> Arc<Self> {
        Arc::new(Self {
            next: AtomicU64::new(block),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    async fn block_number(&self) -> CallResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    pub text: Mutex<Option<String>>,
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> CallResult<()> {
        *self.text.lock().unwrap() = Some(text.to_string());
        Ok(())
    }
}

/// Store whose writes can be switched off
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub fail_writes: std::sync::atomic::AtomicBool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GuestbookError::Storage("disk full".to_string()));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

// =============================================================================
// Session harness
// =============================================================================

pub struct Harness {
    pub session: Session,
    pub wallet: Option<Arc<FakeWallet>>,
    pub streams: Arc<FakeStreams>,
    pub connector: Arc<FakeConnector>,
    pub chain: Arc<FakeChain>,
    pub store: Arc<FlakyStore>,
}

pub struct HarnessBuilder {
    config: GuestbookConfig,
    wallet: Option<FakeWallet>,
    script: StreamsScript,
    connector_failure: Option<CallError>,
    store: Arc<FlakyStore>,
}

impl Harness {
    pub fn builder() -> HarnessBuilder {
        HarnessBuilder {
            config: GuestbookConfig::default(),
            wallet: Some(FakeWallet::with_account()),
            script: StreamsScript::default(),
            connector_failure: None,
            store: Arc::new(FlakyStore::default()),
        }
    }
}

impl HarnessBuilder {
    pub fn config(mut self, config: GuestbookConfig) -> Self {
        self.config = config;
        self
    }

    pub fn no_wallet(mut self) -> Self {
        self.wallet = None;
        self
    }

    pub fn wallet(mut self, wallet: FakeWallet) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn script(mut self, script: StreamsScript) -> Self {
        self.script = script;
        self
    }

    pub fn connector_failure(mut self, error: CallError) -> Self {
        self.connector_failure = Some(error);
        self
    }

    pub fn store(mut self, store: Arc<FlakyStore>) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> Harness {
        self.try_build().unwrap()
    }

    pub fn try_build(self) -> Result<Harness> {
        let wallet = self.wallet.map(Arc::new);
        let streams = FakeStreams::new(self.script);
        let connector = Arc::new(FakeConnector {
            streams: streams.clone(),
            fail: Mutex::new(self.connector_failure),
        });
        let chain = FakeChain::starting_at(1_000);

        let session = Session::new(
            self.config,
            SessionDeps {
                wallet: wallet.clone().map(|w| w as Arc<dyn WalletProvider>),
                connector: connector.clone(),
                chain: chain.clone(),
                store: self.store.clone(),
                clock: Arc::new(FixedClock(NOW_MILLIS)),
            },
        )?;

        Ok(Harness {
            session,
            wallet,
            streams,
            connector,
            chain,
            store: self.store,
        })
    }
}
