//! Builders for test data.

use chat_core::{ConversationSummary, Message, Peer, Thread, UserRef};
use chrono::{DateTime, TimeZone, Utc};

/// Base instant for fixture timestamps (2024-05-01T10:00:00Z).
const BASE_SECS: i64 = 1_714_557_600;

/// Timestamp `offset_secs` after the fixture base instant.
pub fn at(offset_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(BASE_SECS + offset_secs, 0)
        .single()
        .unwrap_or_default()
}

pub fn peer(id: &str, name: &str) -> Peer {
    Peer::new(id, name).with_email(format!("{}@example.com", id))
}

/// A text message from `from`, sent `offset_secs` after the base instant.
pub fn message(id: &str, from: &str, text: &str, offset_secs: i64) -> Message {
    Message {
        id: id.to_string(),
        from: UserRef::new(from),
        body: text.to_string(),
        attachments: Vec::new(),
        timestamp: at(offset_secs),
        to: None,
    }
}

pub fn thread(peer: &Peer, messages: Vec<Message>) -> Thread {
    Thread {
        peer: peer.clone(),
        messages,
    }
}

pub fn summary(peer: &Peer, unread_count: u32) -> ConversationSummary {
    ConversationSummary::new(peer.clone(), unread_count)
}
