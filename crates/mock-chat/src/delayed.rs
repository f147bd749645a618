//! Delayed backend - wraps another backend with artificial latency.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chat_core::{
    ChatApi, ChatError, ConversationSummary, Message, OutgoingFile, Peer, PeerRole, Thread,
};
use tokio::time::sleep;

/// A backend that wraps another backend and delays its responses.
///
/// Thread loads can be delayed per peer or per call, which is how tests make
/// an older request resolve after a newer one. A thread load takes its
/// answer from the inner backend when issued and delivers it after the delay.
pub struct DelayedChatApi<A: ChatApi> {
    inner: A,
    delay: Duration,
    thread_delays: HashMap<String, Duration>,
    thread_schedules: Mutex<HashMap<String, VecDeque<Duration>>>,
}

impl<A: ChatApi> DelayedChatApi<A> {
    /// Wrap `inner`, delaying every call by `delay`.
    pub fn new(inner: A, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            thread_delays: HashMap::new(),
            thread_schedules: Mutex::new(HashMap::new()),
        }
    }

    /// Wrap `inner` with a delay in milliseconds.
    pub fn with_millis(inner: A, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis))
    }

    /// Override the delay of `get_thread` for one peer.
    pub fn with_thread_delay(mut self, peer_id: impl Into<String>, delay: Duration) -> Self {
        self.thread_delays.insert(peer_id.into(), delay);
        self
    }

    /// Delay successive `get_thread` calls for one peer by `delays`, in order.
    ///
    /// Once the schedule runs out, the per-peer or default delay applies.
    pub fn with_thread_schedule(self, peer_id: impl Into<String>, delays: Vec<Duration>) -> Self {
        self.thread_schedules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(peer_id.into(), delays.into());
        self
    }

    fn thread_delay(&self, peer_id: &str) -> Duration {
        let scheduled = self
            .thread_schedules
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get_mut(peer_id)
            .and_then(VecDeque::pop_front);
        scheduled
            .or_else(|| self.thread_delays.get(peer_id).copied())
            .unwrap_or(self.delay)
    }

    /// Get the wrapped backend.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

#[async_trait]
impl<A: ChatApi> ChatApi for DelayedChatApi<A> {
    async fn me(&self) -> Result<Peer, ChatError> {
        sleep(self.delay).await;
        self.inner.me().await
    }

    async fn list_peers(&self, role: Option<PeerRole>) -> Result<Vec<Peer>, ChatError> {
        sleep(self.delay).await;
        self.inner.list_peers(role).await
    }

    async fn get_thread(&self, peer_id: &str) -> Result<Thread, ChatError> {
        let delay = self.thread_delay(peer_id);
        let result = self.inner.get_thread(peer_id).await;
        sleep(delay).await;
        result
    }

    async fn send_message(&self, peer_id: &str, text: &str) -> Result<Message, ChatError> {
        sleep(self.delay).await;
        self.inner.send_message(peer_id, text).await
    }

    async fn send_message_with_attachments(
        &self,
        peer_id: &str,
        text: Option<&str>,
        files: Vec<OutgoingFile>,
    ) -> Result<Message, ChatError> {
        sleep(self.delay).await;
        self.inner
            .send_message_with_attachments(peer_id, text, files)
            .await
    }

    async fn list_conversation_summaries(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        sleep(self.delay).await;
        self.inner.list_conversation_summaries().await
    }

    fn name(&self) -> &str {
        "DelayedChatApi"
    }
}
