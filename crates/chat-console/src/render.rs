//! Plain-text rendering of chat data for the terminal.

use chat_core::{Message, Peer, Thread};
use chat_sync::UnreadLedger;

/// One line per message: time, sender, text and attachment names.
pub fn message_line(message: &Message, peer: &Peer, local_user_id: &str) -> String {
    let sender = if message.is_from(local_user_id) {
        "you"
    } else if message.from.id == peer.id {
        peer.name.as_str()
    } else {
        message.from.name.as_deref().unwrap_or(&message.from.id)
    };

    let mut line = format!(
        "[{}] {}: {}",
        message.timestamp.format("%Y-%m-%d %H:%M"),
        sender,
        message.body
    );
    for attachment in &message.attachments {
        let kind = if attachment.is_image() { "image" } else { "file" };
        line.push_str(&format!(" <{}: {}>", kind, attachment.name()));
    }
    line
}

pub fn thread_lines(thread: &Thread, local_user_id: &str) -> Vec<String> {
    if thread.is_empty() {
        return vec![format!("No messages with {} yet.", thread.peer.name)];
    }
    thread
        .messages
        .iter()
        .map(|m| message_line(m, &thread.peer, local_user_id))
        .collect()
}

/// Messages that arrived after `last_shown`.
///
/// If `last_shown` is no longer part of the thread, only the tail is new.
pub fn messages_after<'a>(thread: &'a Thread, last_shown: Option<&str>) -> &'a [Message] {
    let messages = thread.messages.as_slice();
    let Some(last_id) = last_shown else {
        return messages;
    };
    match messages.iter().rposition(|m| m.id == last_id) {
        Some(index) => &messages[index + 1..],
        None => &messages[messages.len().saturating_sub(1)..],
    }
}

/// Peer list with unread badges.
pub fn peer_line(peer: &Peer, unread: u32) -> String {
    let role = peer.role.map(|r| r.to_string()).unwrap_or_default();
    let badge = if unread > 0 {
        format!(" ({} unread)", unread)
    } else {
        String::new()
    };
    format!("{:<26} {:<20} {:<12}{}", peer.id, peer.name, role, badge)
}

pub fn unread_lines(ledger: &UnreadLedger, peers: &[Peer]) -> Vec<String> {
    let mut rows: Vec<(String, u32)> = ledger
        .iter()
        .filter(|(_, count)| *count > 0)
        .map(|(id, count)| {
            let name = peers
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.name.clone())
                .unwrap_or_else(|| id.to_string());
            (name, count)
        })
        .collect();
    rows.sort();

    let mut lines: Vec<String> = rows
        .into_iter()
        .map(|(name, count)| format!("{:<20} {}", name, count))
        .collect();
    lines.push(format!("{:<20} {}", "total", ledger.total()));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::{Attachment, ConversationSummary, UserRef};

    fn ana() -> Peer {
        Peer::new("p1", "Ana")
    }

    fn msg(from: &str, body: &str) -> Message {
        Message {
            id: "m1".to_string(),
            from: UserRef::new(from),
            body: body.to_string(),
            attachments: Vec::new(),
            timestamp: Default::default(),
            to: None,
        }
    }

    #[test]
    fn test_message_line_names_sender() {
        assert!(message_line(&msg("p1", "hi"), &ana(), "me").ends_with("Ana: hi"));
        assert!(message_line(&msg("me", "hey"), &ana(), "me").ends_with("you: hey"));
    }

    #[test]
    fn test_message_line_lists_attachments() {
        let mut message = msg("p1", "see");
        message.attachments = vec![
            Attachment::new("https://cdn/x.png", "x.png", "image/png"),
            Attachment::new("https://cdn/r.pdf", "r.pdf", "application/pdf"),
        ];
        let line = message_line(&message, &ana(), "me");
        assert!(line.ends_with("see <image: x.png> <file: r.pdf>"));
    }

    #[test]
    fn test_empty_thread() {
        let thread = Thread {
            peer: ana(),
            messages: Vec::new(),
        };
        assert_eq!(thread_lines(&thread, "me"), vec!["No messages with Ana yet."]);
    }

    fn ana_thread(ids: &[&str]) -> Thread {
        Thread {
            peer: ana(),
            messages: ids
                .iter()
                .map(|id| Message {
                    id: id.to_string(),
                    ..msg("p1", id)
                })
                .collect(),
        }
    }

    fn ids(messages: &[Message]) -> Vec<&str> {
        messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_messages_after_includes_every_new_message() {
        let thread = ana_thread(&["m1", "m2", "m3", "m4"]);
        assert_eq!(ids(messages_after(&thread, Some("m2"))), vec!["m3", "m4"]);
        assert!(messages_after(&thread, Some("m4")).is_empty());
        assert_eq!(messages_after(&thread, None).len(), 4);
    }

    #[test]
    fn test_messages_after_unknown_cursor_shows_tail() {
        let thread = ana_thread(&["m5", "m6"]);
        assert_eq!(ids(messages_after(&thread, Some("gone"))), vec!["m6"]);
        assert!(messages_after(&ana_thread(&[]), Some("gone")).is_empty());
    }

    #[test]
    fn test_unread_lines_end_with_total() {
        let ledger = UnreadLedger::rebuild(&[
            ConversationSummary::new(ana(), 2),
            ConversationSummary::new(Peer::new("p2", "Bo"), 0),
        ]);
        let lines = unread_lines(&ledger, &[ana()]);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Ana"));
        assert!(lines[1].starts_with("total"));
        assert!(lines[1].ends_with('2'));
    }

    #[test]
    fn test_peer_badge() {
        assert!(peer_line(&ana(), 3).ends_with("(3 unread)"));
        assert!(!peer_line(&ana(), 0).contains("unread"));
    }
}
