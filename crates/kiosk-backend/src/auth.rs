//! Auth service boundary
//!
//! The backend's auth service owns credentials, sessions, and tokens; the
//! storefront only ever sees the authenticated principal. Session changes
//! are push-driven: implementations broadcast [`AuthEvent`]s so that
//! sign-ins and sign-outs from any source (explicit calls, token expiry)
//! reach the store without polling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::error::BackendResult;

/// An authenticated principal as reported by the auth service
///
/// This is not the profile row; the store resolves it to a `User`
/// (creating the row on first sight).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Principal id; shared with the profile row
    pub user_id: Uuid,
    /// E-mail the principal authenticated with
    pub email: String,
    /// Display name from signup metadata, if any
    pub name: Option<String>,
}

/// Session-change notification
#[derive(Debug, Clone)]
pub enum AuthEvent {
    /// A session was established (sign-in, sign-up, recovery refresh)
    SignedIn(AuthSession),
    /// The session ended
    SignedOut,
}

/// Auth service operations
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Recover the current session, if one exists
    async fn current_session(&self) -> BackendResult<Option<AuthSession>>;

    /// Check credentials and establish a session
    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession>;

    /// Create a new principal
    ///
    /// Returns `None` when the backend defers the session (for example
    /// pending e-mail confirmation); the session then arrives later as a
    /// [`AuthEvent::SignedIn`] broadcast.
    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> BackendResult<Option<AuthSession>>;

    /// Invalidate the current session
    async fn sign_out(&self) -> BackendResult<()>;

    /// Subscribe to session-change notifications
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}
