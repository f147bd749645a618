//! Mock chat backends for testing the sync layer.
//!
//! This crate provides implementations of the `ChatApi` trait for tests:
//! - `ScriptedChatApi` - Replays queued responses and records every call
//! - `DelayedChatApi` - Wraps another backend with artificial per-peer latency
//!
//! For the real service, use the `chat-client` crate instead.
//!
//! # Example
//!
//! ```rust
//! use chat_core::ChatApi;
//! use mock_chat::{fixtures, ScriptedChatApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), chat_core::ChatError> {
//!     let ana = fixtures::peer("p1", "Ana");
//!     let api = ScriptedChatApi::new(fixtures::peer("me", "Me"))
//!         .with_peers(vec![ana.clone()])
//!         .with_thread(fixtures::thread(&ana, vec![fixtures::message("m1", "p1", "hi", 1)]));
//!
//!     let thread = api.get_thread("p1").await?;
//!     assert_eq!(thread.len(), 1);
//!     assert_eq!(api.thread_calls("p1"), 1);
//!     Ok(())
//! }
//! ```

mod delayed;
pub mod fixtures;
mod scripted;

// Re-export chat-core types for convenience
pub use chat_core::{async_trait, ChatApi, ChatError};

pub use delayed::DelayedChatApi;
pub use scripted::{Failure, ScriptedChatApi, SentRecord};
