//! Subscription attempt and polling heartbeat
//!
//! Push subscription is not assumed to work. The watcher tries it once when
//! the adapter advertises it, and always runs the heartbeat, which only
//! advances the last-seen block marker and never produces messages.

use super::Feed;
use crate::schema::GuestbookEntry;
use crate::status::{SessionState, SubscriptionState};
use crate::traits::{ChainReader, Clock, StreamsService, Subscription};
use chrono::DateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Everything the heartbeat touches
#[derive(Clone)]
pub struct WatchContext {
    pub chain: Arc<dyn ChainReader>,
    pub feed: Feed,
    pub state: Arc<RwLock<SessionState>>,
    pub clock: Arc<dyn Clock>,
}

/// Background tasks of one session's feed. Dropping the watcher cancels them.
pub struct FeedWatcher {
    poll_task: JoinHandle<()>,
    listen_task: Option<JoinHandle<()>>,
}

impl FeedWatcher {
    /// Attempt a subscription, then start the heartbeat.
    ///
    /// Moves the subscription state from `attempting` to `subscribed` or
    /// `polling-only`.
    pub async fn start(
        streams: Option<Arc<dyn StreamsService>>,
        event_id: &str,
        ctx: WatchContext,
        interval: Duration,
    ) -> Self {
        ctx.state.write().await.subscription = SubscriptionState::Attempting;

        let subscription = match streams {
            Some(streams) if streams.capabilities().subscribe => {
                match streams.subscribe(event_id).await {
                    Ok(subscription) => Some(subscription),
                    Err(e) => {
                        warn!(event_id, error = %e, "Subscription attempt failed, polling only");
                        None
                    }
                }
            }
            _ => {
                info!(event_id, "Streams adapter has no subscription support, polling only");
                None
            }
        };

        let listen_task = {
            let mut state = ctx.state.write().await;
            match subscription {
                Some(subscription) => {
                    state.subscription = SubscriptionState::Subscribed;
                    Some(tokio::spawn(listen(subscription, ctx.feed.clone())))
                }
                None => {
                    state.subscription = SubscriptionState::PollingOnly;
                    None
                }
            }
        };

        let poll_task = tokio::spawn(heartbeat(ctx, interval));
        info!(interval_secs = interval.as_secs(), "Feed heartbeat started");

        Self {
            poll_task,
            listen_task,
        }
    }

    /// Whether push delivery is running
    pub fn is_listening(&self) -> bool {
        self.listen_task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Cancel the heartbeat and drop any subscription
    pub fn stop(self) {
        debug!("Stopping feed watcher");
    }
}

impl Drop for FeedWatcher {
    fn drop(&mut self) {
        self.poll_task.abort();
        if let Some(task) = &self.listen_task {
            task.abort();
        }
    }
}

/// Floor for the heartbeat period; `interval` rejects zero.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

async fn heartbeat(ctx: WatchContext, interval: Duration) {
    let mut ticker = tokio::time::interval(interval.max(MIN_INTERVAL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        poll_once(&ctx).await;
    }
}

/// One heartbeat: record the latest block and the poll time.
///
/// The recorded block never moves backwards. Read failures are logged and
/// leave the marker as it was.
pub async fn poll_once(ctx: &WatchContext) -> Option<u64> {
    match ctx.chain.block_number().await {
        Ok(block) => {
            let mut state = ctx.state.write().await;
            let latest = state.last_polling_block.map_or(block, |prev| prev.max(block));
            state.last_polling_block = Some(latest);
            state.last_polling_at = DateTime::from_timestamp_millis(ctx.clock.now_millis() as i64);
            debug!(block = latest, "Heartbeat");
            Some(latest)
        }
        Err(e) => {
            warn!(error = %e, "Heartbeat block read failed");
            None
        }
    }
}

async fn listen(mut subscription: Subscription, feed: Feed) {
    while let Some(data) = subscription.next().await {
        match GuestbookEntry::decode(&data) {
            Ok(entry) => {
                if let Err(e) = feed.append(entry.into()).await {
                    warn!(error = %e, "Failed to store pushed message");
                }
            }
            Err(e) => warn!(error = %e, "Ignoring undecodable pushed record"),
        }
    }
    debug!("Subscription stream closed");
}
