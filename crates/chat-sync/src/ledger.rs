//! Per-peer unread counts.

use std::collections::HashMap;

use chat_core::ConversationSummary;
use tracing::debug;

/// Unread counts keyed by peer id, with their total.
///
/// Always rebuilt from a complete set of summaries; there is no merge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnreadLedger {
    counts: HashMap<String, u32>,
    total: u32,
}

impl UnreadLedger {
    /// Build a ledger from one summaries response.
    ///
    /// Summaries without a peer are skipped. Repeated peers are summed, so
    /// the total is always the sum of the per-peer counts.
    pub fn rebuild(summaries: &[ConversationSummary]) -> Self {
        let mut counts: HashMap<String, u32> = HashMap::with_capacity(summaries.len());
        for summary in summaries {
            match summary.peer_id() {
                Some(peer_id) => {
                    let count = counts.entry(peer_id.to_string()).or_insert(0);
                    *count = count.saturating_add(summary.unread_count);
                }
                None => debug!(
                    unread = summary.unread_count,
                    "Skipping conversation summary without peer"
                ),
            }
        }

        let total = counts
            .values()
            .fold(0u32, |acc, count| acc.saturating_add(*count));
        Self { counts, total }
    }

    /// Unread count for one peer (0 if unknown).
    pub fn count_for(&self, peer_id: &str) -> u32 {
        self.counts.get(peer_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of peers in the ledger.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(id, count)| (id.as_str(), *count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::Peer;

    fn summary(peer_id: &str, unread: u32) -> ConversationSummary {
        ConversationSummary::new(Peer::new(peer_id, peer_id), unread)
    }

    #[test]
    fn test_total_is_sum_of_counts() {
        let ledger = UnreadLedger::rebuild(&[summary("p1", 2), summary("p2", 0), summary("p3", 5)]);
        assert_eq!(ledger.total(), 7);
        assert_eq!(ledger.count_for("p1"), 2);
        assert_eq!(ledger.count_for("p2"), 0);
        assert_eq!(ledger.count_for("unknown"), 0);
        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger.iter().map(|(_, c)| c).sum::<u32>(), ledger.total());
    }

    #[test]
    fn test_peerless_summary_is_ignored() {
        let orphan = ConversationSummary {
            peer: None,
            last_message: None,
            unread_count: 4,
        };
        let ledger = UnreadLedger::rebuild(&[summary("p1", 1), orphan]);
        assert_eq!(ledger.total(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_repeated_peer_is_summed() {
        let ledger = UnreadLedger::rebuild(&[summary("p1", 1), summary("p1", 2)]);
        assert_eq!(ledger.count_for("p1"), 3);
        assert_eq!(ledger.total(), 3);
    }

    #[test]
    fn test_empty_response_gives_empty_ledger() {
        let ledger = UnreadLedger::rebuild(&[]);
        assert!(ledger.is_empty());
        assert_eq!(ledger, UnreadLedger::default());
    }
}
