//! Agent chat API client library.
//!
//! This crate provides a Rust client for the agent chat REST API. It supports:
//!
//! - Logging in and fetching the authenticated agent
//! - Listing peers and conversation summaries
//! - Loading threads and sending messages, with or without attachments
//!
//! The client implements [`chat_core::ChatApi`], so it can be handed to the
//! sync layer as an `Arc<dyn ChatApi>`.
//!
//! # Example
//!
//! ```no_run
//! use chat_client::{ApiConfig, ChatClient};
//! use chat_core::ChatApi;
//!
//! # async fn example() -> Result<(), chat_core::ChatError> {
//! let config = ApiConfig::new("http://localhost:8800/api/v1");
//! let (client, me) = ChatClient::login(config, "ana@example.com", "secret").await?;
//! println!("Logged in as {}", me.name);
//!
//! for summary in client.list_conversation_summaries().await? {
//!     if let Some(peer) = &summary.peer {
//!         println!("{}: {} unread", peer.name, summary.unread_count);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
mod wire;

pub use client::ChatClient;
pub use config::{ApiConfig, ConfigError, DEFAULT_BASE_URL};
