//! Agent chat HTTP client.

use async_trait::async_trait;
use chat_core::{
    ChatApi, ChatError, ConversationSummary, Message, OutgoingFile, Peer, PeerRole, Thread,
};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::ApiConfig;
use crate::wire::{
    AgentResponse, AgentsResponse, ConversationsResponse, LoginRequest, LoginResponse,
    SendRequest, SendResponse,
};

/// Multipart field carrying the message text.
const MESSAGE_FIELD: &str = "message";

/// Multipart field repeated once per uploaded file.
const FILES_FIELD: &str = "files";

/// Client for the agent chat REST API.
#[derive(Clone)]
pub struct ChatClient {
    http: Client,
    config: ApiConfig,
}

impl ChatClient {
    /// Create a client for the given session context.
    ///
    /// No request is made; a missing token only surfaces as
    /// [`ChatError::Auth`] on the first authenticated call.
    pub fn new(config: ApiConfig) -> Result<Self, ChatError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ChatError::Network(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, config })
    }

    /// Log in with email and password.
    ///
    /// Returns a client carrying the issued token, plus the logged-in agent.
    pub async fn login(
        config: ApiConfig,
        email: &str,
        password: &str,
    ) -> Result<(Self, Peer), ChatError> {
        let anonymous = Self::new(config)?;
        let url = anonymous.config.login_url();
        debug!("POST {}", url);

        let request = anonymous
            .http
            .post(&url)
            .json(&LoginRequest { email, password });
        let resp: LoginResponse = anonymous.execute(request).await?;

        info!(agent = %resp.agent.name, "Logged in to chat API");

        let mut config = anonymous.config;
        config.token = Some(resp.token);
        Ok((Self::new(config)?, resp.agent))
    }

    /// Whether a bearer token is configured.
    pub fn is_authenticated(&self) -> bool {
        self.config.token.is_some()
    }

    /// Get the configuration.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, ChatError> {
        let token = self
            .config
            .token
            .as_deref()
            .ok_or_else(|| ChatError::Auth("no token configured".to_string()))?;
        Ok(request.bearer_auth(token))
    }

    async fn get_json<R: DeserializeOwned>(&self, url: &str) -> Result<R, ChatError> {
        debug!("GET {}", url);
        let request = self.authorize(self.http.get(url))?;
        self.execute(request).await
    }

    /// Send a request and decode a JSON body, mapping every failure mode.
    async fn execute<R: DeserializeOwned>(&self, request: RequestBuilder) -> Result<R, ChatError> {
        let response = request.send().await.map_err(network_error)?;
        let response = check_status(response).await?;

        let body = response.text().await.map_err(network_error)?;
        serde_json::from_str(&body).map_err(|e| {
            debug!("Undecodable body: {}", body);
            ChatError::Decode(e.to_string())
        })
    }
}

/// Map non-2xx responses to errors. Error bodies are read as text only.
async fn check_status(response: Response) -> Result<Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = status.as_u16(), "Chat API request failed");

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(ChatError::Auth(if body.is_empty() {
            status.to_string()
        } else {
            body
        })),
        _ => Err(ChatError::Request {
            status: status.as_u16(),
            body,
        }),
    }
}

fn network_error(err: reqwest::Error) -> ChatError {
    if err.is_decode() {
        ChatError::Decode(err.to_string())
    } else {
        ChatError::Network(err.to_string())
    }
}

fn file_part(file: OutgoingFile) -> Result<Part, ChatError> {
    let OutgoingFile {
        file_name,
        mime,
        bytes,
    } = file;
    Part::bytes(bytes)
        .file_name(file_name.clone())
        .mime_str(&mime)
        .map_err(|e| ChatError::InvalidAttachment(format!("{} ({}): {}", file_name, mime, e)))
}

#[async_trait]
impl ChatApi for ChatClient {
    async fn me(&self) -> Result<Peer, ChatError> {
        let resp: AgentResponse = self.get_json(&self.config.me_url()).await?;
        Ok(resp.agent)
    }

    async fn list_peers(&self, role: Option<PeerRole>) -> Result<Vec<Peer>, ChatError> {
        let url = self.config.agents_url(role.as_ref().map(PeerRole::as_str));
        let resp: AgentsResponse = self.get_json(&url).await?;
        Ok(resp.agents)
    }

    async fn get_thread(&self, peer_id: &str) -> Result<Thread, ChatError> {
        self.get_json(&self.config.thread_url(peer_id)).await
    }

    async fn send_message(&self, peer_id: &str, text: &str) -> Result<Message, ChatError> {
        let url = self.config.thread_url(peer_id);
        debug!("POST {} (json)", url);

        let request = self
            .authorize(self.http.post(&url))?
            .json(&SendRequest { message: text });
        let resp: SendResponse = self.execute(request).await?;
        Ok(resp.message)
    }

    async fn send_message_with_attachments(
        &self,
        peer_id: &str,
        text: Option<&str>,
        files: Vec<OutgoingFile>,
    ) -> Result<Message, ChatError> {
        let url = self.config.thread_url(peer_id);
        debug!("POST {} (multipart, {} files)", url, files.len());

        let mut form = Form::new();
        if let Some(text) = text {
            form = form.text(MESSAGE_FIELD, text.to_string());
        }
        for file in files {
            form = form.part(FILES_FIELD, file_part(file)?);
        }

        let request = self.authorize(self.http.post(&url))?.multipart(form);
        let resp: SendResponse = self.execute(request).await?;
        Ok(resp.message)
    }

    async fn list_conversation_summaries(&self) -> Result<Vec<ConversationSummary>, ChatError> {
        let resp: ConversationsResponse = self.get_json(&self.config.conversations_url()).await?;
        Ok(resp.conversations)
    }

    fn name(&self) -> &str {
        "ChatClient"
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("config", &self.config)
            .finish()
    }
}
