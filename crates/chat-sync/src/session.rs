//! One signed-in chat session, wired end to end.

use std::sync::Arc;

use chat_core::{ChatApi, ChatError, Message, MessageDraft, Peer, Thread};
use tokio::sync::broadcast;
use tracing::info;

use crate::aggregator::UnreadAggregator;
use crate::config::PollConfig;
use crate::notify::{ChatEvent, NotificationHub};
use crate::scheduler::PollScheduler;
use crate::thread_store::{RefreshOutcome, ThreadStore};

/// Owns the store, aggregator, hub and timers for one authenticated user.
///
/// Dropping the session stops its timers.
pub struct ChatSession {
    api: Arc<dyn ChatApi>,
    me: Peer,
    hub: NotificationHub,
    aggregator: Arc<UnreadAggregator>,
    store: Arc<ThreadStore>,
    scheduler: PollScheduler,
}

impl ChatSession {
    /// Resolve the local user, build every component and start the unread timer.
    ///
    /// Unread counts are loaded once before returning so callers start with
    /// a real total; a failure there is logged, not fatal.
    pub async fn start(api: Arc<dyn ChatApi>, config: PollConfig) -> Result<Self, ChatError> {
        let me = api.me().await?;
        info!(user_id = %me.id, backend = api.name(), "Starting chat session");

        let hub = NotificationHub::new();
        let aggregator = Arc::new(UnreadAggregator::new(Arc::clone(&api), hub.clone()));
        let store = Arc::new(ThreadStore::new(
            Arc::clone(&api),
            Arc::clone(&aggregator),
            hub.clone(),
            me.id.clone(),
        ));
        let scheduler = PollScheduler::new(Arc::clone(&store), Arc::clone(&aggregator), config);

        // Errors are already logged and broadcast by the aggregator.
        let _ = aggregator.refresh().await;
        scheduler.start_session();

        Ok(Self {
            api,
            me,
            hub,
            aggregator,
            store,
            scheduler,
        })
    }

    pub fn me(&self) -> &Peer {
        &self.me
    }

    /// Peers the local user can chat with: agents for super agents and the
    /// other way round. Without a known role, everyone.
    pub async fn peers(&self) -> Result<Vec<Peer>, ChatError> {
        let role = self.me.role.map(|role| role.opposite());
        self.api.list_peers(role).await
    }

    /// Select the first available peer, if any.
    pub async fn select_first_peer(&self) -> Result<Option<Peer>, ChatError> {
        let Some(first) = self.peers().await?.into_iter().next() else {
            return Ok(None);
        };
        self.select_peer(&first.id).await?;
        Ok(Some(first))
    }

    pub async fn select_peer(&self, peer_id: &str) -> Result<RefreshOutcome, ChatError> {
        self.scheduler.select_peer(peer_id).await
    }

    pub fn clear_selection(&self) {
        self.scheduler.clear_selection();
    }

    pub async fn send(&self, draft: MessageDraft) -> Result<Message, ChatError> {
        self.store.send(draft).await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.hub.subscribe()
    }

    pub fn hub(&self) -> &NotificationHub {
        &self.hub
    }

    pub fn thread(&self) -> Option<Arc<Thread>> {
        self.store.thread()
    }

    pub fn store(&self) -> &ThreadStore {
        &self.store
    }

    pub fn aggregator(&self) -> &UnreadAggregator {
        &self.aggregator
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    /// Stop all polling.
    pub fn teardown(&self) {
        info!(user_id = %self.me.id, "Tearing down chat session");
        self.scheduler.teardown();
    }
}

impl std::fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatSession")
            .field("me", &self.me.id)
            .field("backend", &self.api.name())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
