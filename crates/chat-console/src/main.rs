//! Terminal console for agent-to-agent chat.
//!
//! Lists peers, watches a thread with live polling and unread totals, and
//! sends messages with attachments.

mod config;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use chat_client::ChatClient;
use chat_core::{ChatApi, ChatError, MessageDraft, OutgoingFile, Peer};
use chat_sync::{ChatEvent, ChatSession, Notice, UnreadLedger};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use crate::config::{ConsoleConfig, Overrides};

#[derive(Debug, Parser)]
#[command(name = "chat-console")]
#[command(about = "Chat with other agents and keep an eye on unread messages")]
struct Args {
    /// API base URL. Falls back to CHAT_API_BASE.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Bearer token. Falls back to CHAT_API_TOKEN.
    #[arg(long, global = true)]
    token: Option<String>,

    /// Login email, used when no token is available. Falls back to CHAT_EMAIL.
    #[arg(long, global = true)]
    email: Option<String>,

    /// Login password. Falls back to CHAT_PASSWORD.
    #[arg(long, global = true)]
    password: Option<String>,

    /// Thread reload period in seconds
    #[arg(long, global = true)]
    thread_poll_secs: Option<u64>,

    /// Unread refresh period in seconds
    #[arg(long, global = true)]
    unread_poll_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List peers you can chat with, with unread counts
    Peers,

    /// Show unread counts per peer
    Unread,

    /// Open a thread and follow it until Ctrl+C
    Watch {
        /// Peer id (defaults to the first peer)
        #[arg(long)]
        peer: Option<String>,
    },

    /// Send a message to a peer
    Send {
        /// Peer id
        #[arg(long)]
        peer: String,

        /// Message text
        #[arg(long, short)]
        message: Option<String>,

        /// File to attach (repeatable)
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,chat_console=info")),
        )
        .init();

    let args = Args::parse();
    let config = ConsoleConfig::from_env()?.with_overrides(Overrides {
        base_url: args.base_url,
        token: args.token,
        email: args.email,
        password: args.password,
        thread_poll_secs: args.thread_poll_secs,
        unread_poll_secs: args.unread_poll_secs,
    })?;

    let client = connect(&config).await?;
    info!(base_url = %client.config().base_url, "Connected to chat API");
    let api: Arc<dyn ChatApi> = Arc::new(client);

    match args.command {
        Command::Peers => list_peers(api).await?,
        Command::Unread => show_unread(api).await?,
        Command::Watch { peer } => watch(api, &config, peer).await?,
        Command::Send {
            peer,
            message,
            files,
        } => send(api, &config, &peer, message, files).await?,
    }

    Ok(())
}

/// Build an authenticated client, logging in when there is no token.
async fn connect(config: &ConsoleConfig) -> Result<ChatClient, ChatError> {
    if config.api.token.is_none() {
        if let Some((email, password)) = config.credentials() {
            let (client, me) = ChatClient::login(config.api.clone(), email, password).await?;
            info!(user = %me.name, "Logged in");
            return Ok(client);
        }
        return Err(ChatError::Auth(
            "no token; set CHAT_API_TOKEN or pass --email and --password".to_string(),
        ));
    }
    ChatClient::new(config.api.clone())
}

async fn chat_peers(api: &dyn ChatApi) -> Result<(Peer, Vec<Peer>), ChatError> {
    let me = api.me().await?;
    let peers = api.list_peers(me.role.map(|r| r.opposite())).await?;
    Ok((me, peers))
}

async fn list_peers(api: Arc<dyn ChatApi>) -> Result<(), ChatError> {
    let (_, peers) = chat_peers(api.as_ref()).await?;
    let ledger = UnreadLedger::rebuild(&api.list_conversation_summaries().await?);

    if peers.is_empty() {
        println!("No peers available.");
    }
    for peer in &peers {
        println!("{}", render::peer_line(peer, ledger.count_for(&peer.id)));
    }
    Ok(())
}

async fn show_unread(api: Arc<dyn ChatApi>) -> Result<(), ChatError> {
    let (_, peers) = chat_peers(api.as_ref()).await?;
    let ledger = UnreadLedger::rebuild(&api.list_conversation_summaries().await?);
    for line in render::unread_lines(&ledger, &peers) {
        println!("{}", line);
    }
    Ok(())
}

async fn watch(
    api: Arc<dyn ChatApi>,
    config: &ConsoleConfig,
    peer: Option<String>,
) -> Result<(), ChatError> {
    let session = ChatSession::start(api, config.poll).await?;
    let mut events = session.subscribe();

    let selected = match peer {
        Some(peer_id) => {
            session.select_peer(&peer_id).await?;
            Some(peer_id)
        }
        None => session.select_first_peer().await?.map(|p| p.id),
    };
    let Some(peer_id) = selected else {
        println!("No peers available.");
        session.teardown();
        return Ok(());
    };

    let local_user_id = session.me().id.clone();
    let mut last_shown: Option<String> = None;
    if let Some(thread) = session.thread() {
        for line in render::thread_lines(&thread, &local_user_id) {
            println!("{}", line);
        }
        last_shown = thread.tail_id().map(str::to_string);
    }
    println!("Watching {} (unread: {}). Ctrl+C to stop.", peer_id, session.aggregator().total());

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }

            event = events.recv() => match event {
                Ok(ChatEvent::UnreadTotal(total)) => println!("-- unread: {}", total),
                Ok(ChatEvent::Notice(notice)) => {
                    println!("-- {}", notice);
                    if let Notice::NewMessage { .. } = notice {
                        if let Some(thread) = session.thread() {
                            for message in render::messages_after(&thread, last_shown.as_deref()) {
                                println!("{}", render::message_line(message, &thread.peer, &local_user_id));
                            }
                            last_shown = thread.tail_id().map(str::to_string);
                        }
                    }
                }
                Ok(ChatEvent::SessionExpired) => {
                    warn!("Session expired, log in again");
                    break;
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Console fell behind on events"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    session.teardown();
    Ok(())
}

async fn send(
    api: Arc<dyn ChatApi>,
    config: &ConsoleConfig,
    peer_id: &str,
    message: Option<String>,
    files: Vec<PathBuf>,
) -> Result<(), ChatError> {
    let mut draft = MessageDraft {
        text: message,
        files: Vec::with_capacity(files.len()),
    };
    for path in &files {
        draft = draft.with_file(OutgoingFile::from_path(path).await?);
    }
    draft.validate()?;

    let session = ChatSession::start(api, config.poll).await?;
    let result = async {
        session.select_peer(peer_id).await?;
        session.send(draft).await
    }
    .await;
    session.teardown();

    let sent = result?;
    println!("Message sent ({})", sent.id);
    Ok(())
}
