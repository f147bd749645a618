//! Keeps an agent's chat view in step with the chat service.
//!
//! The service offers no push channel, so everything here is poll driven:
//!
//! - [`ThreadStore`] - The selected peer and its thread, with stale-response rejection
//! - [`UnreadAggregator`] - Per-peer and total unread counts, rebuilt on every refresh
//! - [`PollScheduler`] - The thread and unread timers
//! - [`NotificationHub`] - Broadcasts [`ChatEvent`]s to any number of listeners
//! - [`ChatSession`] - All of the above wired together for one signed-in user
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chat_sync::{ChatEvent, ChatSession, PollConfig};
//!
//! async fn watch(api: Arc<dyn chat_core::ChatApi>) -> Result<(), chat_core::ChatError> {
//!     let session = ChatSession::start(api, PollConfig::default()).await?;
//!     let mut events = session.subscribe();
//!     session.select_first_peer().await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             ChatEvent::UnreadTotal(total) => println!("{} unread", total),
//!             ChatEvent::Notice(notice) => println!("{}", notice),
//!             ChatEvent::SessionExpired => break,
//!         }
//!     }
//!     session.teardown();
//!     Ok(())
//! }
//! ```

mod aggregator;
pub mod config;
mod ledger;
mod notify;
mod scheduler;
mod session;
mod thread_store;

pub use aggregator::UnreadAggregator;
pub use config::{ConfigError, PollConfig, DEFAULT_POLL_INTERVAL};
pub use ledger::UnreadLedger;
pub use notify::{should_notify, ChatEvent, Notice, NotificationHub};
pub use scheduler::PollScheduler;
pub use session::ChatSession;
pub use thread_store::{RefreshOutcome, ThreadStore};
