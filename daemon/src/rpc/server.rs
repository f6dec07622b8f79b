//! JSON-RPC server over stdin/stdout.
//!
//! Implements the JSON-RPC 2.0 protocol for daemon communication. Requests
//! are handled one line at a time, except speech synthesis, which runs in a
//! task so notifications keep flowing while it waits on the provider. Video
//! jobs continue in background tasks and report back through a [`Notifier`],
//! whose messages share the single output writer with responses.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::cache::ClipCache;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, ErrorCode, Result};
use crate::keystore::KeyStore;
use crate::provider::{GeminiClient, SpeechProvider, VideoProvider};

use super::methods::handle_request;
use super::types::{
    JsonRpcError, JsonRpcErrorResponse, JsonRpcNotification, JsonRpcRequest, JsonRpcResponse,
    JSONRPC_VERSION,
};

/// Sends notifications to the output writer.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<String>,
}

impl Notifier {
    /// Creates a notifier and the receiver the writer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queues a JSON-RPC notification.
    pub fn send<T: Serialize>(&self, method: &'static str, params: T) {
        match serde_json::to_string(&JsonRpcNotification::new(method, params)) {
            Ok(json) => {
                if self.tx.send(json).is_err() {
                    debug!(method, "Output closed, notification dropped");
                }
            }
            Err(e) => warn!(method, "Failed to serialize notification: {}", e),
        }
    }

    /// Queues an already serialized message, such as a deferred response.
    pub(crate) fn send_line(&self, line: String) {
        if self.tx.send(line).is_err() {
            debug!("Output closed, message dropped");
        }
    }
}

/// Methods whose handlers wait on the provider and run outside the read loop.
const BACKGROUND_METHODS: &[&str] = &["synthesize_speech"];

/// Video and speech backends used by the handlers.
#[derive(Clone)]
pub struct Providers {
    pub video: Arc<dyn VideoProvider>,
    pub speech: Arc<dyn SpeechProvider>,
    /// Speech model name, part of every clip ID.
    pub speech_model: String,
}

impl Providers {
    /// Builds HTTP-backed providers with the given key.
    pub fn gemini(config: &DaemonConfig, api_key: String) -> Result<Self> {
        let client = Arc::new(GeminiClient::new(config, api_key)?);
        Ok(Self {
            speech_model: client.speech_model().to_string(),
            video: client.clone(),
            speech: client,
        })
    }
}

/// State shared across all request handlers and background jobs.
pub struct ServerState {
    /// Daemon configuration.
    pub config: DaemonConfig,
    /// Persistent API key storage.
    pub key_store: KeyStore,
    /// Speech clip cache.
    pub cache: Mutex<ClipCache>,
    notifier: Notifier,
    /// Fixed providers; when None, a client is built per request from the
    /// current API key so `set_api_key` takes effect immediately.
    providers: Option<Providers>,
    /// Flag to signal server shutdown.
    shutdown: AtomicBool,
}

impl ServerState {
    /// Creates new server state.
    pub fn new(config: DaemonConfig, key_store: KeyStore, notifier: Notifier) -> Self {
        Self {
            config,
            key_store,
            cache: Mutex::new(ClipCache::new()),
            notifier,
            providers: None,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Uses the given providers instead of building HTTP clients.
    pub fn with_providers(mut self, providers: Providers) -> Self {
        self.providers = Some(providers);
        self
    }

    /// Returns the providers for a request.
    pub fn providers(&self) -> Result<Providers> {
        if let Some(ref providers) = self.providers {
            return Ok(providers.clone());
        }
        let api_key = self.config.resolve_api_key(&self.key_store)?;
        Providers::gemini(&self.config, api_key)
    }

    /// Speech model that clip IDs are computed against.
    pub fn speech_model(&self) -> &str {
        match self.providers {
            Some(ref providers) => &providers.speech_model,
            None => &self.config.speech_model,
        }
    }

    /// Notification sender for background tasks.
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Signals the server to shut down.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Returns true if shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

/// Runs the JSON-RPC server, reading from stdin and writing to stdout.
pub async fn run_server(config: DaemonConfig) -> Result<()> {
    let (notifier, notifications) = Notifier::channel();
    let state = Arc::new(ServerState::new(config, KeyStore::open_default(), notifier));

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(state, stdin, stdout, notifications).await
}

/// Serves requests from `reader` until EOF or `shutdown`.
///
/// Responses and queued notifications are written to `writer` as single
/// lines. Background requests still running when the loop ends are awaited,
/// then everything still queued is flushed.
pub async fn serve<R, W>(
    state: Arc<ServerState>,
    reader: R,
    mut writer: W,
    mut notifications: mpsc::UnboundedReceiver<String>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("JSON-RPC server started, waiting for requests");
    let mut lines = reader.lines();
    let mut background = JoinSet::new();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(l)) => l,
                    Ok(None) => {
                        debug!("Input closed");
                        break;
                    }
                    Err(e) => {
                        error!("Error reading input: {}", e);
                        break;
                    }
                };

                // Skip empty lines
                if line.trim().is_empty() {
                    continue;
                }

                match parse_request(&line) {
                    Err(response) => write_line(&mut writer, &response).await?,
                    Ok(request) if BACKGROUND_METHODS.contains(&request.method.as_str()) => {
                        let state = state.clone();
                        background.spawn(async move {
                            let response = dispatch(request, &state).await;
                            state.notifier().send_line(response);
                        });
                    }
                    Ok(request) => {
                        let response = dispatch(request, &state).await;
                        write_line(&mut writer, &response).await?;
                    }
                }

                if state.is_shutdown() {
                    info!("Server shutdown requested");
                    break;
                }
            }
            Some(notification) = notifications.recv() => {
                write_line(&mut writer, &notification).await?;
            }
            Some(joined) = background.join_next() => {
                if let Err(e) = joined {
                    error!("Background request task failed: {}", e);
                }
            }
        }
    }

    while let Some(joined) = background.join_next().await {
        if let Err(e) = joined {
            error!("Background request task failed: {}", e);
        }
    }
    while let Ok(notification) = notifications.try_recv() {
        write_line(&mut writer, &notification).await?;
    }

    info!("JSON-RPC server stopped");
    Ok(())
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &mut W, line: &str) -> Result<()> {
    let io_err = |e: std::io::Error| {
        DaemonError::with_source(ErrorCode::OutputWriteFailed, "Failed to write output", e)
    };
    writer.write_all(line.as_bytes()).await.map_err(io_err)?;
    writer.write_all(b"\n").await.map_err(io_err)?;
    writer.flush().await.map_err(io_err)
}

/// Parses a request line. On failure, returns the error response to send.
fn parse_request(line: &str) -> std::result::Result<JsonRpcRequest, String> {
    // Parse JSON
    let request: JsonRpcRequest = serde_json::from_str(line).map_err(|e| {
        let error =
            JsonRpcErrorResponse::new(None, JsonRpcError::parse_error(format!("Invalid JSON: {}", e)));
        serde_json::to_string(&error).unwrap_or_default()
    })?;

    // Validate JSON-RPC version
    if request.jsonrpc != JSONRPC_VERSION {
        let error = JsonRpcErrorResponse::new(
            Some(request.id),
            JsonRpcError::invalid_request("Invalid JSON-RPC version (expected 2.0)"),
        );
        return Err(serde_json::to_string(&error).unwrap_or_default());
    }

    Ok(request)
}

/// Runs a parsed request and serializes its response.
async fn dispatch(request: JsonRpcRequest, state: &Arc<ServerState>) -> String {
    debug!(method = %request.method, "Handling request");
    match handle_request(&request.method, request.params, state).await {
        Ok(result) => {
            serde_json::to_string(&JsonRpcResponse::new(request.id, result)).unwrap_or_default()
        }
        Err(error) => {
            debug!(method = %request.method, code = error.code, "Request failed: {}", error.message);
            serde_json::to_string(&JsonRpcErrorResponse::new(Some(request.id), error))
                .unwrap_or_default()
        }
    }
}
