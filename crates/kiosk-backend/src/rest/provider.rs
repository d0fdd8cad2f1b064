//! GoTrue auth implementation

use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::{AuthEvent, AuthProvider, AuthSession};
use crate::error::{BackendError, BackendResult};

use super::{RestBackend, TokenPair};

/// Principal shape in GoTrue responses
#[derive(Debug, Deserialize)]
struct WireUser {
    id: Uuid,
    email: Option<String>,
    user_metadata: Option<WireMetadata>,
}

#[derive(Debug, Deserialize)]
struct WireMetadata {
    name: Option<String>,
}

/// Successful token grant (password or refresh)
#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    refresh_token: String,
    user: WireUser,
}

impl WireUser {
    fn into_session(self) -> AuthSession {
        AuthSession {
            user_id: self.id,
            email: self.email.unwrap_or_default(),
            name: self.user_metadata.and_then(|m| m.name),
        }
    }
}

impl RestBackend {
    /// Exchange credentials or a refresh token for a session
    async fn token_grant(
        &self,
        grant_type: &str,
        body: serde_json::Value,
    ) -> BackendResult<AuthSession> {
        let response = self
            .request(Method::POST, &self.config().auth_url("token"))
            .await
            .query(&[("grant_type", grant_type)])
            .json(&body)
            .send()
            .await?;

        // The auth service reports bad credentials as a client error on
        // the token endpoint, not as a distinct status
        if matches!(response.status().as_u16(), 400 | 401) {
            return Err(BackendError::InvalidCredentials);
        }

        let grant: TokenGrant = Self::read_json(response).await?;
        let session = grant.user.into_session();
        self.store_token(TokenPair {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token,
            session: session.clone(),
        })
        .await;
        Ok(session)
    }
}

#[async_trait]
impl AuthProvider for RestBackend {
    async fn current_session(&self) -> BackendResult<Option<AuthSession>> {
        if let Some(pair) = self.current_token().await {
            return Ok(Some(pair.session));
        }

        // Cold start: redeem the persisted refresh token, if any
        let Some(stored) = self.load_stored_session().await else {
            return Ok(None);
        };
        let session = self
            .token_grant(
                "refresh_token",
                json!({ "refresh_token": stored.refresh_token }),
            )
            .await?;
        Ok(Some(session))
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<AuthSession> {
        let session = self
            .token_grant(
                "password",
                json!({ "email": email, "password": password }),
            )
            .await?;
        self.emit(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> BackendResult<Option<AuthSession>> {
        let response = self
            .request(Method::POST, &self.config().auth_url("signup"))
            .await
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        let body: serde_json::Value = serde_json::from_slice(&response.bytes().await?)?;

        // With confirmations disabled the signup answers with a full
        // session; otherwise only the pending principal comes back and
        // the session arrives after confirmation
        if body.get("access_token").is_some() {
            let grant: TokenGrant = serde_json::from_value(body)?;
            let session = grant.user.into_session();
            self.store_token(TokenPair {
                access_token: grant.access_token,
                refresh_token: grant.refresh_token,
                session: session.clone(),
            })
            .await;
            self.emit(AuthEvent::SignedIn(session.clone()));
            return Ok(Some(session));
        }
        Ok(None)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        let token = self.current_token().await;

        // Local state goes first so a failed remote call can never leave
        // a half-signed-out handle
        self.clear_token().await;
        self.emit(AuthEvent::SignedOut);

        if let Some(pair) = token {
            let response = self
                .http
                .post(self.config().auth_url("logout"))
                .header("apikey", self.config().anon_key.as_str())
                .bearer_auth(pair.access_token)
                .send()
                .await?;
            Self::check_status(response).await?;
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.event_sender().subscribe()
    }
}
