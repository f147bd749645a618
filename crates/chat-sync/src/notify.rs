//! New-message detection and the notification hub.

use std::fmt;

use chat_core::Message;
use tokio::sync::broadcast;
use tracing::debug;

/// Events buffered per subscriber before it starts lagging.
const DEFAULT_CAPACITY: usize = 64;

/// Decide whether a refreshed thread deserves a "new message" notice.
///
/// True only when both the previous and the new tail exist, they differ, and
/// the new tail was not sent by the local user. A first load (no previous
/// tail) never notifies.
pub fn should_notify(
    previous_tail: Option<&str>,
    new_tail: Option<&Message>,
    local_user_id: &str,
) -> bool {
    match (previous_tail, new_tail) {
        (Some(previous), Some(tail)) => tail.id != previous && !tail.is_from(local_user_id),
        _ => false,
    }
}

/// A transient, dismissible user-facing notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NewMessage {
        peer_id: String,
        peer_name: String,
        message_id: String,
    },
    /// Loading the active thread failed; the next poll retries.
    RefreshFailed { peer_id: String, error: String },
    MessageSent { peer_id: String },
    SendFailed { peer_id: String, error: String },
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(self, Notice::RefreshFailed { .. } | Notice::SendFailed { .. })
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::NewMessage { peer_name, .. } => write!(f, "New message from {}", peer_name),
            Notice::RefreshFailed { error, .. } => write!(f, "Failed to load chat: {}", error),
            Notice::MessageSent { .. } => f.write_str("Message sent"),
            Notice::SendFailed { error, .. } => write!(f, "Failed to send: {}", error),
        }
    }
}

/// Everything the sync layer announces to UI surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    /// Total unread count. Always a full replacement, never a delta.
    UnreadTotal(u32),
    Notice(Notice),
    /// The token was rejected; the session has to be re-established.
    SessionExpired,
}

/// Process-wide publish/subscribe point for [`ChatEvent`]s.
///
/// Any number of subscribers may attach at any time. Publishing never
/// blocks and never fails; events sent with no subscribers are dropped.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    tx: broadcast::Sender<ChatEvent>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Attach a new listener. It receives events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ChatEvent> {
        self.tx.subscribe()
    }

    pub fn publish(&self, event: ChatEvent) {
        if self.tx.send(event).is_err() {
            debug!("No subscribers for chat event");
        }
    }

    pub fn notice(&self, notice: Notice) {
        self.publish(ChatEvent::Notice(notice));
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new()
    }
}
