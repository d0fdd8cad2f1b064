//! REST implementation of the backend boundary
//!
//! Talks to the managed backend's HTTP surface: the datastore half speaks
//! PostgREST (`/rest/v1/{table}` with filter/order query parameters), the
//! auth half speaks GoTrue (`/auth/v1/*`). One [`RestBackend`] handle
//! implements both traits and carries the session token pair so that data
//! requests run under the signed-in principal's row-level permissions.

mod datastore;
mod provider;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::auth::{AuthEvent, AuthSession};
use crate::config::BackendConfig;
use crate::error::{BackendError, BackendResult};

/// Capacity of the session-change broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Access/refresh token pair plus the principal it belongs to
#[derive(Debug, Clone)]
pub(crate) struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub session: AuthSession,
}

/// Persisted session state (only the refresh token leaves memory)
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct StoredSession {
    pub refresh_token: String,
}

/// HTTP client for the managed backend
pub struct RestBackend {
    http: reqwest::Client,
    config: BackendConfig,
    token: RwLock<Option<TokenPair>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RestBackend {
    /// Create a new backend handle
    pub fn new(config: BackendConfig) -> BackendResult<Self> {
        let http = reqwest::Client::builder().build()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            http,
            config,
            token: RwLock::new(None),
            events,
        })
    }

    /// The configuration this handle was built with
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub(crate) fn emit(&self, event: AuthEvent) {
        // Nobody listening is fine; the store subscribes lazily
        let _ = self.events.send(event);
    }

    pub(crate) fn event_sender(&self) -> &broadcast::Sender<AuthEvent> {
        &self.events
    }

    /// Bearer token for the next request: session token when signed in,
    /// anon key otherwise
    async fn bearer(&self) -> String {
        match self.token.read().await.as_ref() {
            Some(pair) => pair.access_token.clone(),
            None => self.config.anon_key.clone(),
        }
    }

    pub(crate) async fn store_token(&self, pair: TokenPair) {
        if let Some(path) = &self.config.session_file {
            let stored = StoredSession {
                refresh_token: pair.refresh_token.clone(),
            };
            match serde_json::to_vec(&stored) {
                Ok(bytes) => {
                    if let Err(err) = tokio::fs::write(path, bytes).await {
                        tracing::warn!("failed to persist session: {err}");
                    }
                }
                Err(err) => tracing::warn!("failed to serialize session: {err}"),
            }
        }
        *self.token.write().await = Some(pair);
    }

    pub(crate) async fn clear_token(&self) {
        *self.token.write().await = None;
        if let Some(path) = &self.config.session_file {
            if let Err(err) = tokio::fs::remove_file(path).await {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("failed to remove persisted session: {err}");
                }
            }
        }
    }

    pub(crate) async fn current_token(&self) -> Option<TokenPair> {
        self.token.read().await.clone()
    }

    pub(crate) async fn load_stored_session(&self) -> Option<StoredSession> {
        let path = self.config.session_file.as_ref()?;
        let bytes = tokio::fs::read(path).await.ok()?;
        match serde_json::from_slice(&bytes) {
            Ok(stored) => Some(stored),
            Err(err) => {
                tracing::warn!("ignoring malformed persisted session: {err}");
                None
            }
        }
    }

    /// Start a request with the backend's standing headers attached
    pub(crate) async fn request(
        &self,
        method: reqwest::Method,
        url: &str,
    ) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("apikey", self.config.anon_key.as_str())
            .bearer_auth(self.bearer().await)
    }

    /// Read a JSON body out of a response, surfacing non-success statuses
    /// as [`BackendError::Api`]
    pub(crate) async fn read_json<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> BackendResult<T> {
        let response = Self::check_status(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Surface non-success statuses as [`BackendError::Api`], discarding
    /// the body otherwise
    pub(crate) async fn check_status(
        response: reqwest::Response,
    ) -> BackendResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .ok()
            .map(|body| extract_error_message(&body))
            .unwrap_or_default();
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Equality filter in the backend's query syntax
    pub(crate) fn eq_filter(id: Uuid) -> String {
        format!("eq.{id}")
    }
}

impl std::fmt::Debug for RestBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestBackend")
            .field("url", &self.config.url)
            .finish_non_exhaustive()
    }
}

/// Pull a human-readable message out of a backend error body
///
/// PostgREST answers `{"message": ...}`, GoTrue `{"error_description":
/// ...}` or `{"msg": ...}`; anything else is passed through verbatim.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error_description", "msg", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    body.chars().take(200).collect()
}
