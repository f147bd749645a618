//! Scripted backend - replays queued responses and records calls.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chat_core::{
    ChatApi, ChatError, ConversationSummary, Message, OutgoingFile, Peer, PeerRole, Thread,
    UserRef,
};

use crate::fixtures;

/// A clonable description of a failure to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    Auth(String),
    Request { status: u16, body: String },
    Network(String),
}

impl Failure {
    fn to_error(&self) -> ChatError {
        match self {
            Failure::Auth(msg) => ChatError::Auth(msg.clone()),
            Failure::Request { status, body } => ChatError::Request {
                status: *status,
                body: body.clone(),
            },
            Failure::Network(msg) => ChatError::Network(msg.clone()),
        }
    }
}

/// A message handed to one of the send methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub peer_id: String,
    pub text: Option<String>,
    pub file_names: Vec<String>,
    pub multipart: bool,
}

type Script<T> = VecDeque<Result<T, Failure>>;

/// A backend that answers from per-endpoint scripts.
///
/// Each script is a queue: responses are consumed front to back and the last
/// one repeats forever, so a single entry behaves like a static fixture.
pub struct ScriptedChatApi {
    me: Peer,
    peers: Vec<Peer>,
    threads: Mutex<HashMap<String, Script<Thread>>>,
    summaries: Mutex<Script<Vec<ConversationSummary>>>,
    send_failure: Mutex<Option<Failure>>,
    sent: Mutex<Vec<SentRecord>>,
    thread_calls: Mutex<HashMap<String, usize>>,
    summary_calls: AtomicUsize,
    total_calls: AtomicUsize,
}

impl ScriptedChatApi {
    /// Create a backend for the given local user, with no peers or threads.
    pub fn new(me: Peer) -> Self {
        Self {
            me,
            peers: Vec::new(),
            threads: Mutex::new(HashMap::new()),
            summaries: Mutex::new(VecDeque::new()),
            send_failure: Mutex::new(None),
            sent: Mutex::new(Vec::new()),
            thread_calls: Mutex::new(HashMap::new()),
            summary_calls: AtomicUsize::new(0),
            total_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_peers(mut self, peers: Vec<Peer>) -> Self {
        self.peers = peers;
        self
    }

    /// Queue a thread response, keyed by the thread's peer id.
    pub fn with_thread(self, thread: Thread) -> Self {
        self.push_thread(thread);
        self
    }

    pub fn with_summaries(self, summaries: Vec<ConversationSummary>) -> Self {
        self.push_summaries(summaries);
        self
    }

    pub fn push_thread(&self, thread: Thread) {
        let mut threads = lock(&self.threads);
        threads
            .entry(thread.peer.id.clone())
            .or_default()
            .push_back(Ok(thread));
    }

    pub fn push_thread_failure(&self, peer_id: &str, failure: Failure) {
        let mut threads = lock(&self.threads);
        threads
            .entry(peer_id.to_string())
            .or_default()
            .push_back(Err(failure));
    }

    pub fn push_summaries(&self, summaries: Vec<ConversationSummary>) {
        lock(&self.summaries).push_back(Ok(summaries));
    }

    pub fn push_summaries_failure(&self, failure: Failure) {
        lock(&self.summaries).push_back(Err(failure));
    }

    /// Make every following send fail (None restores success).
    pub fn fail_sends(&self, failure: Option<Failure>) {
        *lock(&self.send_failure) = failure;
    }

    /// Number of `get_thread` calls for one peer.
    pub fn thread_calls(&self, peer_id: &str) -> usize {
        lock(&self.thread_calls).get(peer_id).copied().unwrap_or(0)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }

    /// Number of calls on any endpoint.
    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        lock(&self.sent).clone()
    }

    fn record_send(
        &self,
        peer_id: &str,
        text: Option<&str>,
        files: &[OutgoingFile],
        multipart: bool,
    ) -> Result<Message, ChatError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = lock(&self.send_failure).as_ref() {
            return Err(failure.to_error());
        }

        let mut sent = lock(&self.sent);
        sent.push(SentRecord {
            peer_id: peer_id.to_string(),
            text: text.map(str::to_string),
            file_names: files.iter().map(|f| f.file_name.clone()).collect(),
            multipart,
        });

        let mut message = fixtures::message(
            &format!("sent-{}", sent.len()),
            &self.me.id,
            text.unwrap_or_default(),
            sent.len() as i64,
        );
        message.to = Some(UserRef::new(peer_id));
        Ok(message)
    }
}

fn next<T: Clone>(script: &mut Script<T>) -> Option<Result<T, Failure>> {
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ChatApi for ScriptedChatApi {
    async fn me(&self) -> Result<Peer, ChatError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.me.clone())
    }

    async fn list_peers(&self, role: Option<PeerRole>) -> Result<Vec<Peer>, ChatError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .peers
            .iter()
            .filter(|p| match (role, p.role) {
                (Some(wanted), Some(actual)) => wanted == actual,
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn get_thread(&self, peer_id: &str) -> Result<Thread, ChatError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        *lock(&self.thread_calls)
            .entry(peer_id.to_string())
            .or_insert(0) += 1;

        let scripted = lock(&self.threads).get_mut(peer_id).and_then(next);
        match scripted {
            Some(Ok(thread)) => Ok(thread),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Err(ChatError::Request {
                status: 404,
                body: "Peer not found".to_string(),
            }),
        }
    }

    async fn send_message(&self, peer_id: &str, text: &str) -> Result<Message, ChatError> {
        self.record_send(peer_id, Some(text), &[], false)
    }

    async fn send_message_with_attachments(
        &self,
        peer_id: &str,
        text: Option<&str>,
        files: Vec<OutgoingFile>,
    ) -> Result<Message, ChatError> {
        self.record_send(peer_id, text, &files, true)
    }

    async fn list_conversation_summaries(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        self.summary_calls.fetch_add(1, Ordering::SeqCst);

        let scripted = {
            let mut summaries = lock(&self.summaries);
            next(&mut *summaries)
        };
        match scripted {
            Some(Ok(summaries)) => Ok(summaries),
            Some(Err(failure)) => Err(failure.to_error()),
            None => Ok(Vec::new()),
        }
    }

    fn name(&self) -> &str {
        "ScriptedChatApi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{message, peer, summary, thread};

    fn api() -> ScriptedChatApi {
        ScriptedChatApi::new(peer("me", "Me"))
    }

    #[tokio::test]
    async fn test_last_thread_response_repeats() {
        let ana = peer("p1", "Ana");
        let api = api()
            .with_thread(thread(&ana, vec![message("m1", "p1", "hi", 1)]))
            .with_thread(thread(
                &ana,
                vec![message("m1", "p1", "hi", 1), message("m2", "p1", "there", 2)],
            ));

        assert_eq!(api.get_thread("p1").await.unwrap().len(), 1);
        assert_eq!(api.get_thread("p1").await.unwrap().len(), 2);
        assert_eq!(api.get_thread("p1").await.unwrap().len(), 2);
        assert_eq!(api.thread_calls("p1"), 3);
    }

    #[tokio::test]
    async fn test_unknown_peer_is_not_found() {
        let api = api();
        assert!(matches!(
            api.get_thread("nobody").await,
            Err(ChatError::Request { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let api = api();
        api.push_summaries_failure(Failure::Network("offline".to_string()));
        api.push_summaries(vec![summary(&peer("p1", "Ana"), 1)]);

        assert!(matches!(
            api.list_conversation_summaries().await,
            Err(ChatError::Network(_))
        ));
        assert_eq!(api.list_conversation_summaries().await.unwrap().len(), 1);
        assert_eq!(api.summary_calls(), 2);
    }

    #[tokio::test]
    async fn test_sends_are_recorded() {
        let api = api();
        let msg = api.send_message("p1", "hello").await.unwrap();
        assert_eq!(msg.from.id, "me");

        api.fail_sends(Some(Failure::Request {
            status: 413,
            body: "Too large".to_string(),
        }));
        assert!(api
            .send_message_with_attachments("p1", None, vec![])
            .await
            .is_err());

        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text.as_deref(), Some("hello"));
        assert!(!sent[0].multipart);
    }

    #[tokio::test]
    async fn test_role_filter() {
        let api = api().with_peers(vec![
            peer("a1", "Agent").with_role(PeerRole::Agent),
            peer("s1", "Super").with_role(PeerRole::SuperAgent),
        ]);
        let supers = api.list_peers(Some(PeerRole::SuperAgent)).await.unwrap();
        assert_eq!(supers.len(), 1);
        assert_eq!(supers[0].id, "s1");
        assert_eq!(api.list_peers(None).await.unwrap().len(), 2);
    }
}
