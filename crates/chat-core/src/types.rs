//! Typed data model for the agent chat API.
//!
//! The service is loose about identifiers (`id` vs `_id`) and about sender
//! references (bare id vs embedded object). Those variations are normalised
//! here so the rest of the crate only ever sees one shape.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name used for attachments the server sent without one.
pub const DEFAULT_ATTACHMENT_NAME: &str = "Attachment";

/// Role of an agent account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeerRole {
    Agent,
    SuperAgent,
}

impl PeerRole {
    /// Wire representation, as used in the `role` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            PeerRole::Agent => "agent",
            PeerRole::SuperAgent => "super_agent",
        }
    }

    /// The role this role chats with: super-agents talk to agents and
    /// agents talk to super-agents.
    pub fn opposite(&self) -> Self {
        match self {
            PeerRole::Agent => PeerRole::SuperAgent,
            PeerRole::SuperAgent => PeerRole::Agent,
        }
    }
}

impl std::fmt::Display for PeerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A counterpart agent or super-agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeer")]
pub struct Peer {
    pub id: String,
    pub name: String,
    /// Contact address.
    pub email: String,
    pub role: Option<PeerRole>,
    pub status: Option<String>,
}

impl Peer {
    /// Create a peer with just an id and display name.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            role: None,
            status: None,
        }
    }

    /// Set the role.
    pub fn with_role(mut self, role: PeerRole) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the contact address.
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }
}

#[derive(Deserialize)]
struct RawPeer {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "_id")]
    underscore_id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: Option<PeerRole>,
    #[serde(default)]
    status: Option<String>,
}

impl TryFrom<RawPeer> for Peer {
    type Error = String;

    fn try_from(raw: RawPeer) -> Result<Self, Self::Error> {
        let id = pick_id(raw.id, raw.underscore_id).ok_or("peer without id")?;
        Ok(Self {
            id,
            name: raw.name.unwrap_or_default(),
            email: raw.email.unwrap_or_default(),
            role: raw.role,
            status: raw.status,
        })
    }
}

/// Reference to a user inside a message (`from` / `to`).
///
/// Accepts either a bare id string or an embedded user object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawUserRef")]
pub struct UserRef {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl UserRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserRef {
    /// Plain id string.
    Id(String),
    /// Populated user object.
    Object {
        #[serde(default)]
        id: Option<String>,
        #[serde(default, rename = "_id")]
        underscore_id: Option<String>,
        #[serde(default)]
        name: Option<String>,
    },
}

impl TryFrom<RawUserRef> for UserRef {
    type Error = String;

    fn try_from(raw: RawUserRef) -> Result<Self, Self::Error> {
        match raw {
            RawUserRef::Id(id) if !id.is_empty() => Ok(Self { id, name: None }),
            RawUserRef::Id(_) => Err("empty user reference".to_string()),
            RawUserRef::Object {
                id,
                underscore_id,
                name,
            } => {
                let id = pick_id(id, underscore_id).ok_or("user reference without id")?;
                Ok(Self { id, name })
            }
        }
    }
}

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case", try_from = "RawAttachment")]
pub enum Attachment {
    /// Rendered inline.
    Image { url: String, name: String, mime: String },
    /// Offered as a download link.
    File { url: String, name: String, mime: String },
}

impl Attachment {
    /// Build an attachment, picking the variant from the MIME type.
    pub fn new(url: impl Into<String>, name: impl Into<String>, mime: impl Into<String>) -> Self {
        let (url, name, mime) = (url.into(), name.into(), mime.into());
        if mime.starts_with("image/") {
            Attachment::Image { url, name, mime }
        } else {
            Attachment::File { url, name, mime }
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Attachment::Image { url, .. } | Attachment::File { url, .. } => url,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Attachment::Image { name, .. } | Attachment::File { name, .. } => name,
        }
    }

    pub fn mime(&self) -> &str {
        match self {
            Attachment::Image { mime, .. } | Attachment::File { mime, .. } => mime,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Attachment::Image { .. })
    }
}

#[derive(Deserialize)]
struct RawAttachment {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, alias = "mimeType")]
    mime: Option<String>,
}

impl TryFrom<RawAttachment> for Attachment {
    type Error = String;

    fn try_from(raw: RawAttachment) -> Result<Self, Self::Error> {
        let url = raw
            .url
            .filter(|u| !u.is_empty())
            .ok_or("attachment without url")?;
        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_ATTACHMENT_NAME.to_string());
        Ok(Attachment::new(url, name, raw.mime.unwrap_or_default()))
    }
}

/// A single chat message. Never mutated once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawMessage")]
pub struct Message {
    pub id: String,
    pub from: UserRef,
    /// Body text; empty for attachment-only messages.
    pub body: String,
    pub attachments: Vec<Attachment>,
    pub timestamp: DateTime<Utc>,
    /// Conversation partner, when the server includes it.
    pub to: Option<UserRef>,
}

impl Message {
    /// Whether the local user with the given id sent this message.
    pub fn is_from(&self, user_id: &str) -> bool {
        self.from.id == user_id
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(default, rename = "_id")]
    underscore_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
    from: UserRef,
    #[serde(default, alias = "body")]
    message: Option<String>,
    #[serde(default)]
    attachments: Option<Vec<Attachment>>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    to: Option<UserRef>,
}

impl TryFrom<RawMessage> for Message {
    type Error = String;

    fn try_from(raw: RawMessage) -> Result<Self, Self::Error> {
        let id = pick_id(raw.id, raw.underscore_id).ok_or("message without id")?;
        let timestamp = raw
            .timestamp
            .or(raw.created_at)
            .ok_or_else(|| format!("message {} without timestamp", id))?;
        Ok(Self {
            id,
            from: raw.from,
            body: raw.message.unwrap_or_default(),
            attachments: raw.attachments.unwrap_or_default(),
            timestamp,
            to: raw.to,
        })
    }
}

/// The loaded history with one peer, oldest message first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub peer: Peer,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Thread {
    /// The most recent message.
    pub fn tail(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn tail_id(&self) -> Option<&str> {
        self.tail().map(|m| m.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Per-peer aggregate used for the peer list and unread badges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    /// Missing when the server could not resolve the counterpart.
    #[serde(default)]
    pub peer: Option<Peer>,
    #[serde(default)]
    pub last_message: Option<Message>,
    #[serde(default)]
    pub unread_count: u32,
}

impl ConversationSummary {
    pub fn new(peer: Peer, unread_count: u32) -> Self {
        Self {
            peer: Some(peer),
            last_message: None,
            unread_count,
        }
    }

    pub fn peer_id(&self) -> Option<&str> {
        self.peer.as_ref().map(|p| p.id.as_str())
    }
}

fn pick_id(id: Option<String>, underscore_id: Option<String>) -> Option<String> {
    id.filter(|s| !s.is_empty())
        .or_else(|| underscore_id.filter(|s| !s.is_empty()))
}
