//! Request and response envelopes used on the wire.

use chat_core::{ConversationSummary, Message, Peer};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: String,
    pub agent: Peer,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentResponse {
    pub agent: Peer,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentsResponse {
    #[serde(default)]
    pub agents: Vec<Peer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationsResponse {
    #[serde(default)]
    pub conversations: Vec<ConversationSummary>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SendRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SendResponse {
    pub message: Message,
}
