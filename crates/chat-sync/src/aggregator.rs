//! Unread aggregation across all conversations.

use std::sync::{Arc, PoisonError, RwLock};

use chat_core::{ChatApi, ChatError};
use tracing::{debug, warn};

use crate::ledger::UnreadLedger;
use crate::notify::{ChatEvent, NotificationHub};

/// Owns the [`UnreadLedger`] and keeps it in step with the server.
pub struct UnreadAggregator {
    api: Arc<dyn ChatApi>,
    ledger: RwLock<Arc<UnreadLedger>>,
    hub: NotificationHub,
}

impl UnreadAggregator {
    pub fn new(api: Arc<dyn ChatApi>, hub: NotificationHub) -> Self {
        Self {
            api,
            ledger: RwLock::new(Arc::new(UnreadLedger::default())),
            hub,
        }
    }

    /// Fetch all summaries, rebuild the ledger and broadcast the total.
    ///
    /// Best effort: on failure the previous ledger stays in place and nothing
    /// is broadcast except [`ChatEvent::SessionExpired`] for auth failures.
    /// The error is still returned so direct callers can inspect it.
    pub async fn refresh(&self) -> Result<u32, ChatError> {
        match self.api.list_conversation_summaries().await {
            Ok(summaries) => {
                let ledger = UnreadLedger::rebuild(&summaries);
                let total = ledger.total();
                *self.ledger.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(ledger);

                debug!(total, peers = summaries.len(), "Unread ledger rebuilt");
                self.hub.publish(ChatEvent::UnreadTotal(total));
                Ok(total)
            }
            Err(e) => {
                if e.is_auth() {
                    self.hub.publish(ChatEvent::SessionExpired);
                }
                warn!("Unread refresh failed, keeping last ledger: {}", e);
                Err(e)
            }
        }
    }

    /// Snapshot of the last successfully built ledger.
    pub fn ledger(&self) -> Arc<UnreadLedger> {
        self.ledger
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn unread_for(&self, peer_id: &str) -> u32 {
        self.ledger().count_for(peer_id)
    }

    pub fn total(&self) -> u32 {
        self.ledger().total()
    }
}

impl std::fmt::Debug for UnreadAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnreadAggregator")
            .field("api", &self.api.name())
            .field("total", &self.total())
            .finish()
    }
}
