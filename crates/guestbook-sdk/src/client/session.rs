//! Connection and setup orchestration
//!
//! A [`Session`] is one mounted guestbook: it owns the shared state, the feed
//! and the heartbeat, and drives the wallet connection and the one-time
//! schema / event / emitter setup sequence.

use crate::config::GuestbookConfig;
use crate::error::{CallError, CallResult, Result};
use crate::feed::{Feed, FeedWatcher, WatchContext};
use crate::schema::{DataSchemaRegistration, EventSchema, GUESTBOOK_SCHEMA};
use crate::status::{copy_diagnostics, DiagnosticsSnapshot, SessionState, SetupStatus, SubscriptionState};
use crate::storage::KeyValueStore;
use crate::traits::{
    normalize_address, ChainReader, Clipboard, Clock, StreamsConnector, StreamsService, WalletProvider,
};
use alloy_primitives::{Address, B256};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info, warn};

const NO_WALLET_MESSAGE: &str = "No wallet provider detected. Please install a browser wallet.";
const NOT_CONNECTED_MESSAGE: &str = "Connect a wallet before retrying setup.";

/// External collaborators of a session
#[derive(Clone)]
pub struct SessionDeps {
    /// Injected wallet, `None` when no provider is installed
    pub wallet: Option<Arc<dyn WalletProvider>>,
    pub connector: Arc<dyn StreamsConnector>,
    pub chain: Arc<dyn ChainReader>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
}

/// Account-bound streams client, available once the wallet is connected
#[derive(Clone)]
pub(super) struct Connection {
    pub(super) account: Address,
    pub(super) streams: Arc<dyn StreamsService>,
    pub(super) schema_id: Option<B256>,
}

#[derive(Debug, Clone, Copy)]
enum SetupStep {
    Schema,
    Event,
    Emitter,
}

/// One mounted guestbook session
///
/// # Example
///
/// ```rust,ignore
/// use guestbook_sdk::{GuestbookConfig, Session, SessionDeps, SetupStatus};
///
/// let session = Session::new(GuestbookConfig::default(), deps)?;
/// session.load_feed().await?;
///
/// if session.connect().await == SetupStatus::Success {
///     session.sign("hello").await?;
/// }
///
/// session.teardown().await;
/// ```
pub struct Session {
    pub(super) config: GuestbookConfig,
    wallet: Option<Arc<dyn WalletProvider>>,
    connector: Arc<dyn StreamsConnector>,
    chain: Arc<dyn ChainReader>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) state: Arc<RwLock<SessionState>>,
    pub(super) connection: RwLock<Option<Connection>>,
    pub(super) feed: Feed,
    watcher: Mutex<Option<FeedWatcher>>,
    pub(super) publishing: AtomicBool,
}

impl Session {
    /// Mount a session. Nothing is contacted until [`Session::connect`].
    ///
    /// Fails with a config error when `config` does not validate.
    pub fn new(config: GuestbookConfig, deps: SessionDeps) -> Result<Self> {
        config.validate()?;
        let feed = Feed::new(deps.store, config.feed.storage_key.clone());

        Ok(Self {
            config,
            wallet: deps.wallet,
            connector: deps.connector,
            chain: deps.chain,
            clock: deps.clock,
            state: Arc::new(RwLock::new(SessionState::default())),
            connection: RwLock::new(None),
            feed,
            watcher: Mutex::new(None),
            publishing: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &GuestbookConfig {
        &self.config
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Startup load of the persisted feed
    pub async fn load_feed(&self) -> Result<usize> {
        self.feed.load().await
    }

    /// Connected account, if any
    pub async fn account(&self) -> Option<Address> {
        self.connection.read().await.as_ref().map(|c| c.account)
    }

    pub async fn schema_id(&self) -> Option<B256> {
        self.connection.read().await.as_ref().and_then(|c| c.schema_id)
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.state.read().await.snapshot()
    }

    /// Copy diagnostics to the clipboard; returns the "copied" indicator
    pub async fn copy_diagnostics(&self, clipboard: &dyn Clipboard) -> bool {
        let snapshot = self.diagnostics().await;
        copy_diagnostics(&snapshot, clipboard).await
    }

    /// Connect the wallet, compute the schema id and run the setup sequence.
    ///
    /// Failures never propagate: they end in an `error` connection status with
    /// the reason in `last_error`. Returns the final connection status.
    pub async fn connect(&self) -> SetupStatus {
        let Some(wallet) = self.wallet.clone() else {
            warn!("Connect requested without a wallet provider");
            self.fail_connection(NO_WALLET_MESSAGE.to_string()).await;
            return SetupStatus::Error;
        };

        {
            let mut state = self.state.write().await;
            state.connection = SetupStatus::Pending;
            state.last_error = None;
        }

        let account = match request_account(wallet.as_ref()).await {
            Ok(account) => account,
            Err(e) => {
                error!(error = %e, "Wallet connection failed");
                self.fail_connection(format!("Wallet connection failed: {}", e.message)).await;
                return SetupStatus::Error;
            }
        };
        info!(%account, "Wallet connected");

        let streams = match self.connector.connect(account, &self.config.chain).await {
            Ok(streams) => streams,
            Err(e) => {
                error!(error = %e, "Streams client initialisation failed");
                self.fail_connection(format!("Streams client initialisation failed: {}", e.message)).await;
                return SetupStatus::Error;
            }
        };
        *self.connection.write().await = Some(Connection {
            account,
            streams: streams.clone(),
            schema_id: None,
        });
        {
            let mut state = self.state.write().await;
            state.account = Some(account.to_string());
            state.schema_id = None;
        }

        let schema_id = match streams.compute_schema_id(GUESTBOOK_SCHEMA).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, "Schema id computation failed");
                self.fail_connection(format!("Schema id computation failed: {}", e.message)).await;
                return SetupStatus::Error;
            }
        };
        if let Some(connection) = self.connection.write().await.as_mut() {
            connection.schema_id = Some(schema_id);
        }
        self.state.write().await.schema_id = Some(schema_id.to_string());
        info!(%schema_id, "Schema id computed");

        if let Err(e) = self.feed.load().await {
            warn!(error = %e, "Failed to load persisted feed");
        }

        let ready = self.run_setup(streams.as_ref(), schema_id, account).await;
        let status = self.finish_connection(ready).await;

        self.start_feed().await;
        status
    }

    /// Re-run the setup sequence with the known account and schema id.
    ///
    /// Without a connection every status is left as is and the reason is
    /// recorded. Returns the resulting connection status.
    pub async fn retry_setup(&self) -> SetupStatus {
        let connection = self.connection.read().await.clone();
        let Some(Connection {
            account,
            streams,
            schema_id: Some(schema_id),
        }) = connection
        else {
            warn!("Setup retry requested before connecting");
            let mut state = self.state.write().await;
            state.last_error = Some(NOT_CONNECTED_MESSAGE.to_string());
            return state.connection;
        };

        info!(%account, %schema_id, "Retrying setup");
        {
            let mut state = self.state.write().await;
            state.connection = SetupStatus::Pending;
            state.last_error = None;
        }

        let ready = self.run_setup(streams.as_ref(), schema_id, account).await;
        self.finish_connection(ready).await
    }

    /// Cancel the heartbeat and any live subscription
    pub async fn teardown(&self) {
        if let Some(watcher) = self.watcher.lock().await.take() {
            watcher.stop();
            info!("Session torn down");
        }
    }

    /// Start the subscription attempt and heartbeat, once per session
    async fn start_feed(&self) {
        let mut watcher = self.watcher.lock().await;
        if watcher.is_some() || self.state.read().await.subscription != SubscriptionState::NotStarted {
            return;
        }

        let streams = self.connection.read().await.as_ref().map(|c| c.streams.clone());
        let ctx = WatchContext {
            chain: self.chain.clone(),
            feed: self.feed.clone(),
            state: self.state.clone(),
            clock: self.clock.clone(),
        };

        *watcher = Some(
            FeedWatcher::start(
                streams,
                &self.config.streams.event_id,
                ctx,
                self.config.feed.poll_interval(),
            )
            .await,
        );
    }

    /// Schema, event schema, emitter permission, in order. The first failing
    /// step ends the run; later steps keep whatever status they had.
    async fn run_setup(&self, streams: &dyn StreamsService, schema_id: B256, account: Address) -> bool {
        self.setup_schema(streams, schema_id).await
            && self.setup_event(streams).await
            && self.setup_emitter(streams, account).await
    }

    async fn setup_schema(&self, streams: &dyn StreamsService, schema_id: B256) -> bool {
        self.set_step(SetupStep::Schema, SetupStatus::Pending).await;

        let registered = match streams.is_data_schema_registered(schema_id).await {
            Ok(registered) => registered,
            Err(e) => {
                warn!(error = %e, "Schema registration check failed, treating as unregistered");
                false
            }
        };

        if registered {
            info!(%schema_id, "Schema already registered");
        } else {
            let registration = DataSchemaRegistration {
                id: self.config.streams.schema_name.clone(),
                schema: GUESTBOOK_SCHEMA.to_string(),
                parent_schema_id: None,
            };
            match streams.register_data_schemas(&[registration], true).await {
                Ok(tx_hash) => info!(?tx_hash, "Schema registration submitted"),
                Err(e) => {
                    return self
                        .fail_step(SetupStep::Schema, format!("Schema registration failed: {}", e.message))
                        .await;
                }
            }
        }

        self.set_step(SetupStep::Schema, SetupStatus::Success).await;
        true
    }

    async fn setup_event(&self, streams: &dyn StreamsService) -> bool {
        self.set_step(SetupStep::Event, SetupStatus::Pending).await;
        let event_id = self.config.streams.event_id.clone();
        let ids = [event_id.clone()];

        let exists = match streams.get_event_schemas_by_id(&ids).await {
            Ok(found) => found.first().is_some_and(Option::is_some),
            Err(e) => {
                warn!(%event_id, error = %e, "Event schema lookup failed, treating as absent");
                false
            }
        };

        if exists {
            info!(%event_id, "Event schema already registered");
        } else {
            match streams.register_event_schemas(&ids, &[EventSchema::guestbook()]).await {
                Ok(tx_hash) => info!(%event_id, ?tx_hash, "Event schema registration submitted"),
                Err(e) => {
                    return self
                        .fail_step(SetupStep::Event, format!("Event schema registration failed: {}", e.message))
                        .await;
                }
            }
        }

        self.set_step(SetupStep::Event, SetupStatus::Success).await;
        true
    }

    async fn setup_emitter(&self, streams: &dyn StreamsService, account: Address) -> bool {
        self.set_step(SetupStep::Emitter, SetupStatus::Pending).await;
        let event_id = &self.config.streams.event_id;

        match streams.manage_event_emitters(event_id, account, true).await {
            Ok(tx_hash) => {
                info!(%event_id, %account, ?tx_hash, "Emitter permission granted");
                self.set_step(SetupStep::Emitter, SetupStatus::Success).await;
                true
            }
            Err(e) => {
                self.fail_step(SetupStep::Emitter, format!("Emitter permission failed: {}", e.message))
                    .await
            }
        }
    }

    async fn set_step(&self, step: SetupStep, status: SetupStatus) {
        let mut state = self.state.write().await;
        match step {
            SetupStep::Schema => state.schema = status,
            SetupStep::Event => state.event = status,
            SetupStep::Emitter => state.emitter = status,
        }
    }

    /// Mark the step failed and record the reason. Always returns `false`.
    async fn fail_step(&self, step: SetupStep, message: String) -> bool {
        error!(?step, %message, "Setup step failed");
        self.set_step(step, SetupStatus::Error).await;
        self.state.write().await.last_error = Some(message);
        false
    }

    async fn fail_connection(&self, message: String) {
        let mut state = self.state.write().await;
        state.connection = SetupStatus::Error;
        state.last_error = Some(message);
    }

    async fn finish_connection(&self, ready: bool) -> SetupStatus {
        let status = if ready { SetupStatus::Success } else { SetupStatus::Error };
        self.state.write().await.connection = status;
        if ready {
            info!("Guestbook setup complete");
        }
        status
    }
}

/// First wallet account, checksum-normalized
async fn request_account(wallet: &dyn WalletProvider) -> CallResult<Address> {
    let addresses = wallet.request_addresses().await?;
    let first = addresses
        .first()
        .ok_or_else(|| CallError::classify(None, "wallet returned no accounts"))?;

    normalize_address(first).map_err(|e| CallError::classify(None, e.to_string()))
}
