//! The active conversation thread.
//!
//! Every thread fetch is tagged with the selection epoch it was issued in and
//! a request sequence number. A response is applied only if the selection
//! has not changed since and no newer request has been applied already, so
//! a slow response for a previously selected peer can never overwrite the
//! current thread.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chat_core::{ChatApi, ChatError, Message, MessageDraft, Thread};
use tracing::{debug, info, warn};

use crate::aggregator::UnreadAggregator;
use crate::notify::{should_notify, ChatEvent, Notice, NotificationHub};

/// What a call to [`ThreadStore::refresh`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// No peer selected; nothing was fetched.
    Idle,
    /// The response became the active thread.
    Applied { messages: usize, notified: bool },
    /// The response was superseded and ignored.
    Discarded,
}

#[derive(Debug, Default)]
struct StoreState {
    selected: Option<String>,
    epoch: u64,
    next_seq: u64,
    applied_seq: u64,
    thread: Option<Arc<Thread>>,
    last_tail: Option<String>,
    last_error: Option<String>,
}

/// Identifies one in-flight thread fetch.
#[derive(Debug, Clone)]
struct RequestTag {
    peer_id: String,
    epoch: u64,
    seq: u64,
}

/// Holds the selected peer and its thread, and keeps both current.
pub struct ThreadStore {
    api: Arc<dyn ChatApi>,
    aggregator: Arc<UnreadAggregator>,
    hub: NotificationHub,
    local_user_id: String,
    state: Mutex<StoreState>,
}

impl ThreadStore {
    /// Create an empty store for the given local user.
    pub fn new(
        api: Arc<dyn ChatApi>,
        aggregator: Arc<UnreadAggregator>,
        hub: NotificationHub,
        local_user_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            aggregator,
            hub,
            local_user_id: local_user_id.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Select a peer and load its thread.
    ///
    /// Choosing a different peer drops the current thread and tail cursor.
    /// Choosing the same peer again keeps them and acts as a manual reload.
    pub async fn select_peer(&self, peer_id: &str) -> Result<RefreshOutcome, ChatError> {
        {
            let mut state = self.lock();
            if state.selected.as_deref() != Some(peer_id) {
                state.selected = Some(peer_id.to_string());
                state.epoch += 1;
                state.thread = None;
                state.last_tail = None;
                state.last_error = None;
                info!(peer_id = peer_id, epoch = state.epoch, "Peer selected");
            }
        }
        self.refresh().await
    }

    /// Drop the selection along with its thread. In-flight fetches are ignored.
    pub fn clear_selection(&self) {
        let mut state = self.lock();
        if state.selected.take().is_some() {
            state.epoch += 1;
            state.thread = None;
            state.last_tail = None;
            state.last_error = None;
            info!(epoch = state.epoch, "Selection cleared");
        }
    }

    /// Reload the thread of the selected peer.
    ///
    /// Any successful fetch, applied or not, is followed by an unread
    /// refresh because the service marks the fetched thread read.
    pub async fn refresh(&self) -> Result<RefreshOutcome, ChatError> {
        let tag = {
            let mut state = self.lock();
            let Some(peer_id) = state.selected.clone() else {
                return Ok(RefreshOutcome::Idle);
            };
            state.next_seq += 1;
            RequestTag {
                peer_id,
                epoch: state.epoch,
                seq: state.next_seq,
            }
        };

        debug!(peer_id = %tag.peer_id, seq = tag.seq, "Fetching thread");
        match self.api.get_thread(&tag.peer_id).await {
            Ok(thread) => {
                let outcome = self.apply(&tag, thread);
                if let Err(e) = self.aggregator.refresh().await {
                    debug!("Unread refresh after thread fetch failed: {}", e);
                }
                Ok(outcome)
            }
            Err(e) => self.fail(&tag, e),
        }
    }

    fn apply(&self, tag: &RequestTag, thread: Thread) -> RefreshOutcome {
        let (outcome, notice) = {
            let mut state = self.lock();
            if state.epoch != tag.epoch || tag.seq <= state.applied_seq {
                debug!(
                    peer_id = %tag.peer_id,
                    seq = tag.seq,
                    applied = state.applied_seq,
                    "Discarding superseded thread response"
                );
                return RefreshOutcome::Discarded;
            }

            let notified = should_notify(
                state.last_tail.as_deref(),
                thread.tail(),
                &self.local_user_id,
            );
            let notice = if notified {
                thread.tail().map(|tail| Notice::NewMessage {
                    peer_id: tag.peer_id.clone(),
                    peer_name: display_name(&thread, &tag.peer_id),
                    message_id: tail.id.clone(),
                })
            } else {
                None
            };

            let messages = thread.len();
            state.applied_seq = tag.seq;
            state.last_tail = thread.tail_id().map(str::to_string);
            state.last_error = None;
            state.thread = Some(Arc::new(thread));

            (RefreshOutcome::Applied { messages, notified }, notice)
        };

        if let Some(notice) = notice {
            info!(peer_id = %tag.peer_id, "New message");
            self.hub.notice(notice);
        }
        outcome
    }

    fn fail(&self, tag: &RequestTag, error: ChatError) -> Result<RefreshOutcome, ChatError> {
        {
            let mut state = self.lock();
            if state.epoch != tag.epoch {
                debug!(peer_id = %tag.peer_id, "Ignoring failure for previous selection: {}", error);
                return Ok(RefreshOutcome::Discarded);
            }
            if tag.seq <= state.applied_seq {
                debug!(
                    peer_id = %tag.peer_id,
                    seq = tag.seq,
                    applied = state.applied_seq,
                    "Ignoring failure superseded by a newer response: {}",
                    error
                );
                return Ok(RefreshOutcome::Discarded);
            }
            state.last_error = Some(error.to_string());
        }

        warn!(peer_id = %tag.peer_id, "Thread refresh failed: {}", error);
        if error.is_auth() {
            self.hub.publish(ChatEvent::SessionExpired);
        } else {
            self.hub.notice(Notice::RefreshFailed {
                peer_id: tag.peer_id.clone(),
                error: error.to_string(),
            });
        }
        Err(error)
    }

    /// Send a draft to the selected peer, then reload the thread.
    ///
    /// Drafts with attachments go out as multipart, text-only drafts as JSON.
    pub async fn send(&self, draft: MessageDraft) -> Result<Message, ChatError> {
        let peer_id = self.selected_peer().ok_or(ChatError::NoPeerSelected)?;
        draft.validate()?;

        let text = draft.trimmed_text().map(str::to_string);
        let result = if draft.has_attachments() {
            debug!(peer_id = %peer_id, files = draft.files.len(), "Sending multipart message");
            self.api
                .send_message_with_attachments(&peer_id, text.as_deref(), draft.files)
                .await
        } else {
            debug!(peer_id = %peer_id, "Sending text message");
            self.api
                .send_message(&peer_id, text.as_deref().unwrap_or_default())
                .await
        };

        match result {
            Ok(message) => {
                info!(peer_id = %peer_id, message_id = %message.id, "Message sent");
                self.hub.notice(Notice::MessageSent {
                    peer_id: peer_id.clone(),
                });
                if let Err(e) = self.refresh().await {
                    debug!("Reload after send failed: {}", e);
                }
                Ok(message)
            }
            Err(e) => {
                warn!(peer_id = %peer_id, "Send failed: {}", e);
                if e.is_auth() {
                    self.hub.publish(ChatEvent::SessionExpired);
                } else {
                    self.hub.notice(Notice::SendFailed {
                        peer_id,
                        error: e.to_string(),
                    });
                }
                Err(e)
            }
        }
    }

    pub fn selected_peer(&self) -> Option<String> {
        self.lock().selected.clone()
    }

    /// The active thread, if one has been loaded for the current selection.
    pub fn thread(&self) -> Option<Arc<Thread>> {
        self.lock().thread.clone()
    }

    /// Text of the last refresh failure for the current selection.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn local_user_id(&self) -> &str {
        &self.local_user_id
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn display_name(thread: &Thread, peer_id: &str) -> String {
    if thread.peer.name.trim().is_empty() {
        peer_id.to_string()
    } else {
        thread.peer.name.clone()
    }
}

impl std::fmt::Debug for ThreadStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("ThreadStore")
            .field("api", &self.api.name())
            .field("local_user_id", &self.local_user_id)
            .field("selected", &state.selected)
            .field("epoch", &state.epoch)
            .finish()
    }
}
