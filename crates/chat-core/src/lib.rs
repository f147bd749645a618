//! Core trait and types for the agent chat console.
//!
//! This crate provides the shared interface between the HTTP client, the
//! sync layer and the test doubles. It defines:
//!
//! - [`ChatApi`] - The trait every chat backend implements
//! - [`Peer`], [`Message`], [`Attachment`], [`Thread`], [`ConversationSummary`] -
//!   The typed data model, validated at decode time
//! - [`MessageDraft`] / [`OutgoingFile`] - Outgoing message content
//! - [`ChatError`] - Error taxonomy shared by every layer
//!
//! # Example
//!
//! ```rust
//! use chat_core::{async_trait, ChatApi, ChatError, ConversationSummary, Message, OutgoingFile,
//!     Peer, PeerRole, Thread};
//!
//! struct EmptyApi;
//!
//! #[async_trait]
//! impl ChatApi for EmptyApi {
//!     async fn me(&self) -> Result<Peer, ChatError> {
//!         Err(ChatError::Auth("no session".to_string()))
//!     }
//!     async fn list_peers(&self, _role: Option<PeerRole>) -> Result<Vec<Peer>, ChatError> {
//!         Ok(Vec::new())
//!     }
//!     async fn get_thread(&self, peer_id: &str) -> Result<Thread, ChatError> {
//!         Err(ChatError::Request { status: 404, body: format!("no peer {}", peer_id) })
//!     }
//!     async fn send_message(&self, _peer_id: &str, _text: &str) -> Result<Message, ChatError> {
//!         Err(ChatError::NoPeerSelected)
//!     }
//!     async fn send_message_with_attachments(
//!         &self,
//!         _peer_id: &str,
//!         _text: Option<&str>,
//!         _files: Vec<OutgoingFile>,
//!     ) -> Result<Message, ChatError> {
//!         Err(ChatError::NoPeerSelected)
//!     }
//!     async fn list_conversation_summaries(&self) -> Result<Vec<ConversationSummary>, ChatError> {
//!         Ok(Vec::new())
//!     }
//!     fn name(&self) -> &str {
//!         "EmptyApi"
//!     }
//! }
//! ```

mod draft;
mod error;
mod trait_def;
mod types;

pub use draft::{MessageDraft, OutgoingFile};
pub use error::ChatError;
pub use trait_def::ChatApi;
pub use types::{
    Attachment, ConversationSummary, Message, Peer, PeerRole, Thread, UserRef,
    DEFAULT_ATTACHMENT_NAME,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
