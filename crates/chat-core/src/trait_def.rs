//! The ChatApi trait definition.

use async_trait::async_trait;

use crate::draft::OutgoingFile;
use crate::error::ChatError;
use crate::types::{ConversationSummary, Message, Peer, PeerRole, Thread};

/// The remote chat service, as seen by the sync layer.
///
/// Implementations range from the HTTP client to scripted test doubles.
/// This trait is object-safe and is normally used as `Arc<dyn ChatApi>`.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// The authenticated agent.
    async fn me(&self) -> Result<Peer, ChatError>;

    /// List chat counterparts, optionally filtered by role.
    async fn list_peers(&self, role: Option<PeerRole>) -> Result<Vec<Peer>, ChatError>;

    /// Load the full thread with a peer, oldest message first.
    ///
    /// The service marks the thread read as a side effect, so callers should
    /// refresh unread counts afterwards.
    async fn get_thread(&self, peer_id: &str) -> Result<Thread, ChatError>;

    /// Send a text-only message.
    async fn send_message(&self, peer_id: &str, text: &str) -> Result<Message, ChatError>;

    /// Send a message with at least one attachment.
    async fn send_message_with_attachments(
        &self,
        peer_id: &str,
        text: Option<&str>,
        files: Vec<OutgoingFile>,
    ) -> Result<Message, ChatError>;

    /// One summary per peer with any history or unread messages.
    async fn list_conversation_summaries(&self) -> Result<Vec<ConversationSummary>, ChatError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;
}
