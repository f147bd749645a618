//! Background poll timers.
//!
//! Two independent timers run on the tokio runtime:
//!
//! - the thread timer reloads the selected thread and exists only while a
//!   peer is selected. It is restarted on every selection.
//! - the unread timer rebuilds unread counts for the whole session.
//!
//! Both are plain `JoinHandle`s, aborted on teardown or drop.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chat_core::ChatError;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::aggregator::UnreadAggregator;
use crate::config::PollConfig;
use crate::thread_store::{RefreshOutcome, ThreadStore};

/// Shortest period a timer will run at.
const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Drives periodic refreshes of a [`ThreadStore`] and an [`UnreadAggregator`].
pub struct PollScheduler {
    store: Arc<ThreadStore>,
    aggregator: Arc<UnreadAggregator>,
    config: PollConfig,
    thread_timer: Mutex<Option<JoinHandle<()>>>,
    unread_timer: Mutex<Option<JoinHandle<()>>>,
}

impl PollScheduler {
    pub fn new(
        store: Arc<ThreadStore>,
        aggregator: Arc<UnreadAggregator>,
        config: PollConfig,
    ) -> Self {
        Self {
            store,
            aggregator,
            config,
            thread_timer: Mutex::new(None),
            unread_timer: Mutex::new(None),
        }
    }

    /// Start the unread timer. Calling this while it runs does nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_session(&self) {
        let mut slot = lock(&self.unread_timer);
        if slot.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("Unread timer already running");
            return;
        }

        let aggregator = Arc::clone(&self.aggregator);
        let period = self.config.unread_interval.max(MIN_INTERVAL);
        info!(period = ?period, "Starting unread timer");

        *slot = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                match aggregator.refresh().await {
                    Ok(total) => debug!(total, "Unread poll"),
                    Err(e) => warn!("Unread poll failed: {}", e),
                }
            }
        }));
    }

    /// Select a peer, restart the thread timer and load the thread now.
    pub async fn select_peer(&self, peer_id: &str) -> Result<RefreshOutcome, ChatError> {
        self.restart_thread_timer();
        self.store.select_peer(peer_id).await
    }

    /// Drop the selection and stop the thread timer.
    pub fn clear_selection(&self) {
        if let Some(handle) = lock(&self.thread_timer).take() {
            handle.abort();
        }
        self.store.clear_selection();
    }

    /// Stop both timers. Nothing is refreshed afterwards unless restarted.
    pub fn teardown(&self) {
        let thread = lock(&self.thread_timer).take();
        let unread = lock(&self.unread_timer).take();
        if thread.is_some() || unread.is_some() {
            info!("Stopping poll timers");
        }
        for handle in thread.into_iter().chain(unread) {
            handle.abort();
        }
    }

    pub fn is_thread_timer_active(&self) -> bool {
        is_running(&self.thread_timer)
    }

    pub fn is_unread_timer_active(&self) -> bool {
        is_running(&self.unread_timer)
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    fn restart_thread_timer(&self) {
        let mut slot = lock(&self.thread_timer);
        if let Some(previous) = slot.take() {
            previous.abort();
        }

        let store = Arc::clone(&self.store);
        let period = self.config.thread_interval.max(MIN_INTERVAL);

        *slot = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                // The selection is read from the store on every tick.
                match store.refresh().await {
                    Ok(outcome) => debug!(?outcome, "Thread poll"),
                    Err(e) => warn!("Thread poll failed: {}", e),
                }
            }
        }));
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for PollScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollScheduler")
            .field("config", &self.config)
            .field("thread_timer", &self.is_thread_timer_active())
            .field("unread_timer", &self.is_unread_timer_active())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn is_running(slot: &Mutex<Option<JoinHandle<()>>>) -> bool {
    lock(slot)
        .as_ref()
        .is_some_and(|handle| !handle.is_finished())
}
