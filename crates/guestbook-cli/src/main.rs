//! guestbook: operator tooling for the on-chain guestbook
//!
//! - `heartbeat`: poll the chain's block number the way a session does
//! - `feed`: list the locally persisted message feed
//! - `config`: print the effective configuration

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::DateTime;
use clap::{Parser, Subcommand};
use guestbook_sdk::feed::{poll_once, WatchContext};
use guestbook_sdk::{Feed, FileStore, GuestbookConfig, RpcClient, SessionState, SystemClock};
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "guestbook")]
#[command(about = "Operator tooling for the on-chain guestbook")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "guestbook.toml")]
    config: PathBuf,

    /// HTTP RPC endpoint (overrides config file)
    #[arg(long, env = "GUESTBOOK_RPC_URL")]
    rpc_url: Option<String>,

    /// Data directory for the local feed
    #[arg(short, long, env = "GUESTBOOK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the latest block number on the configured interval
    Heartbeat {
        /// Stop after this many polls
        #[arg(short = 'n', long)]
        count: Option<u64>,
    },

    /// Print the locally persisted feed, newest first
    Feed {
        /// Print raw JSON instead of one line per message
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("guestbook=info".parse()?)
                .add_directive("guestbook_sdk=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let config = config::load(
        &cli.config,
        config::Overrides {
            rpc_url: cli.rpc_url,
            data_dir: cli.data_dir,
        },
    )?;

    match cli.command {
        Commands::Heartbeat { count } => heartbeat(&config, count).await,
        Commands::Feed { json } => feed(&config, json).await,
        Commands::Config => {
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn heartbeat(config: &GuestbookConfig, count: Option<u64>) -> anyhow::Result<()> {
    let client = RpcClient::for_chain(&config.chain, config.storage.rpc_timeout_secs)?;
    info!(chain = %config.chain.name, url = client.url(), "Starting heartbeat");

    match client.chain_id().await {
        Ok(id) if id != config.chain.id => {
            warn!(expected = config.chain.id, reported = id, "Endpoint serves a different chain")
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Chain id check failed"),
    }

    let store = Arc::new(FileStore::open(&config.storage.data_dir)?);
    let ctx = WatchContext {
        chain: Arc::new(client),
        feed: Feed::new(store, config.feed.storage_key.clone()),
        state: Arc::new(RwLock::new(SessionState::default())),
        clock: Arc::new(SystemClock),
    };

    let mut ticker = tokio::time::interval(config.feed.poll_interval());
    let mut polls = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }

        poll_once(&ctx).await;
        println!("{}", ctx.state.read().await.snapshot().poll_summary());

        polls += 1;
        if count.is_some_and(|limit| polls >= limit) {
            break;
        }
    }

    Ok(())
}

async fn feed(config: &GuestbookConfig, json: bool) -> anyhow::Result<()> {
    let store = Arc::new(FileStore::open(&config.storage.data_dir)?);
    let feed = Feed::new(store, config.feed.storage_key.clone());
    let count = feed.load().await?;
    let messages = feed.messages().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
        return Ok(());
    }

    if count == 0 {
        println!("No messages in {}", config.storage.data_dir.display());
        return Ok(());
    }

    for message in &messages {
        let when = DateTime::from_timestamp(message.timestamp as i64, 0)
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| message.timestamp.to_string());
        println!("[{}] {}: {}", when, message.author, message.message);

        if let Some(url) = message.tx_hash.and_then(|hash| config.chain.explorer_tx_url(&hash)) {
            println!("    {}", url);
        }
    }

    Ok(())
}
