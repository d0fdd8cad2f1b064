//! Auth store - authentication lifecycle and current-principal state
//!
//! Wraps the backend's auth service and the user collection: checks
//! credentials, recovers sessions at startup, lazily provisions profile
//! rows, and follows the session-change stream so that sign-ins and
//! sign-outs from any source update the [`SessionContext`] without user
//! interaction.

use std::sync::{Arc, Mutex};

use kiosk_backend::{
    mapper::user_from_row, AuthProvider, AuthSession, BackendResult, Datastore, NewUser,
};
use kiosk_types::{Role, User};
use tokio::task::JoinHandle;
use tracing::instrument;

use crate::config::StoreConfig;
use crate::session::SessionContext;

/// Authentication store
///
/// Generic over the datastore and auth-provider implementations so tests
/// can run it against in-memory fakes.
pub struct AuthStore<D: Datastore, A: AuthProvider> {
    datastore: Arc<D>,
    provider: Arc<A>,
    session: Arc<SessionContext>,
    config: StoreConfig,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl<D: Datastore + 'static, A: AuthProvider + 'static> AuthStore<D, A> {
    /// Create a new auth store
    ///
    /// The store is inert until [`bootstrap`](Self::bootstrap) runs.
    pub fn new(
        datastore: Arc<D>,
        provider: Arc<A>,
        session: Arc<SessionContext>,
        config: StoreConfig,
    ) -> Self {
        Self {
            datastore,
            provider,
            session,
            config,
            listener: Mutex::new(None),
        }
    }

    /// The shared session context
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Startup: recover an existing session and start following the
    /// session-change stream
    ///
    /// The store only declares itself ready (settles out of
    /// `Authenticating`) once the recovered principal's profile is
    /// resolved. Recovery or provisioning failure leaves the store
    /// unauthenticated; it never crashes the startup path.
    pub async fn bootstrap(&self) {
        self.session.begin_authenticating().await;

        match self.provider.current_session().await {
            Ok(Some(auth)) => match self.resolve_profile(&auth).await {
                Ok(user) => {
                    tracing::debug!(user = %user.id, "session recovered");
                    self.session.set_authenticated(user).await;
                }
                Err(err) => {
                    tracing::error!("profile resolution during recovery failed: {err}");
                    self.session.clear().await;
                }
            },
            Ok(None) => self.session.clear().await,
            Err(err) => {
                tracing::error!("session recovery failed: {err}");
                self.session.clear().await;
            }
        }

        self.spawn_listener();
    }

    /// Check credentials and resolve the principal to a profile
    ///
    /// Never returns an error: failures are logged and reported as
    /// `false`, with the session left unauthenticated.
    #[instrument(skip(self, password), level = "debug")]
    pub async fn login(&self, email: &str, password: &str) -> bool {
        self.session.begin_authenticating().await;

        let auth = match self.provider.sign_in(email, password).await {
            Ok(auth) => auth,
            Err(err)
                if err.is_invalid_credentials()
                    && self.config.bootstrap_admin
                    && self.config.is_admin_email(email) =>
            {
                tracing::info!("reserved admin account missing, running first-run bootstrap");
                match self.bootstrap_admin(email, password).await {
                    Some(auth) => auth,
                    None => {
                        self.session.clear().await;
                        return false;
                    }
                }
            }
            Err(err) => {
                tracing::error!("login failed: {err}");
                self.session.clear().await;
                return false;
            }
        };

        match self.resolve_profile(&auth).await {
            Ok(user) => {
                self.session.set_authenticated(user).await;
                true
            }
            Err(err) => {
                tracing::error!("profile resolution failed: {err}");
                self.session.clear().await;
                false
            }
        }
    }

    /// Create a new client account
    ///
    /// The profile row is NOT written here: it is provisioned by the
    /// session-change listener when the backend announces the new
    /// session. Callers must not assume the profile exists the moment
    /// this returns.
    #[instrument(skip(self, password), level = "debug")]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> bool {
        if password.chars().count() < self.config.min_password_len {
            tracing::warn!(
                min = self.config.min_password_len,
                "registration rejected: password too short"
            );
            return false;
        }

        self.session.begin_authenticating().await;
        match self.provider.sign_up(name, email, password).await {
            Ok(Some(_)) => {
                // The SignedIn broadcast is already queued; the listener
                // settles the phase once the profile is provisioned
                true
            }
            Ok(None) => {
                // Session deferred (e-mail confirmation pending)
                self.session.clear().await;
                true
            }
            Err(err) => {
                tracing::error!("registration failed: {err}");
                self.session.clear().await;
                false
            }
        }
    }

    /// End the session
    ///
    /// Local state is cleared unconditionally, even when the remote
    /// invalidation fails; the storefront must never show a signed-in
    /// header for a dead session.
    pub async fn logout(&self) {
        if let Err(err) = self.provider.sign_out().await {
            tracing::error!("remote sign-out failed: {err}");
        }
        self.session.clear().await;
    }

    /// First-run bootstrap of the reserved admin account: sign it up,
    /// then retry the login once
    async fn bootstrap_admin(&self, email: &str, password: &str) -> Option<AuthSession> {
        if let Err(err) = self.provider.sign_up("Administrator", email, password).await {
            tracing::error!("admin bootstrap sign-up failed: {err}");
            return None;
        }
        match self.provider.sign_in(email, password).await {
            Ok(auth) => Some(auth),
            Err(err) => {
                tracing::error!("admin bootstrap retry failed: {err}");
                None
            }
        }
    }

    /// Resolve an authenticated principal to its profile row, creating
    /// the row on first sight
    async fn resolve_profile(&self, auth: &AuthSession) -> BackendResult<User> {
        resolve_profile(self.datastore.as_ref(), &self.config, auth).await
    }

    /// Follow the session-change stream for the rest of the store's life
    fn spawn_listener(&self) {
        let mut rx = self.provider.subscribe();
        let datastore = Arc::clone(&self.datastore);
        let session = Arc::clone(&self.session);
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(kiosk_backend::AuthEvent::SignedIn(auth)) => {
                        match resolve_profile(datastore.as_ref(), &config, &auth).await {
                            Ok(user) => session.set_authenticated(user).await,
                            Err(err) => {
                                tracing::error!("profile provisioning failed: {err}");
                                session.clear().await;
                            }
                        }
                    }
                    Ok(kiosk_backend::AuthEvent::SignedOut) => {
                        session.clear().await;
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "session-change stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let mut guard = self.listener.lock().expect("listener lock");
        if let Some(previous) = guard.replace(handle) {
            previous.abort();
        }
    }
}

impl<D: Datastore, A: AuthProvider> Drop for AuthStore<D, A> {
    fn drop(&mut self) {
        if let Ok(mut guard) = self.listener.lock() {
            if let Some(handle) = guard.take() {
                handle.abort();
            }
        }
    }
}

impl<D: Datastore, A: AuthProvider> std::fmt::Debug for AuthStore<D, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Look up the profile row for a principal, inserting one if absent
///
/// The reserved e-mail becomes the administrator; everyone else is a
/// client. The display name falls back from signup metadata to the
/// e-mail local part.
async fn resolve_profile<D: Datastore + ?Sized>(
    datastore: &D,
    config: &StoreConfig,
    auth: &AuthSession,
) -> BackendResult<User> {
    if let Some(row) = datastore.find_user(auth.user_id).await? {
        return Ok(user_from_row(row));
    }

    let name = auth
        .name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .or_else(|| {
            auth.email
                .split('@')
                .next()
                .filter(|local| !local.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "User".to_string());

    let role = if config.is_admin_email(&auth.email) {
        Role::Admin
    } else {
        Role::Client
    };

    let new_user = NewUser {
        id: auth.user_id,
        name,
        email: auth.email.clone(),
        role,
        points: 0,
    };
    let row = match datastore.insert_user(new_user).await {
        Ok(row) => row,
        Err(err) => {
            // A concurrent provisioning of the same principal may have
            // won the insert; the row is what matters, not who wrote it
            match datastore.find_user(auth.user_id).await? {
                Some(row) => row,
                None => return Err(err),
            }
        }
    };
    tracing::debug!(user = %row.id, role = %row.role, "profile provisioned");
    Ok(user_from_row(row))
}
