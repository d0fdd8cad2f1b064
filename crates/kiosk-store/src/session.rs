//! Current-principal session context
//!
//! One `SessionContext` exists per running storefront. It is created at
//! startup, shared by the auth and catalog stores, and is the only place
//! the authenticated user is held — there is no ambient global. Teardown
//! is explicit: [`SessionContext::clear`] on logout or remote sign-out.

use kiosk_types::{User, UserId};
use tokio::sync::RwLock;

/// Authentication lifecycle phase
///
/// `Authenticating` covers login/register submission and startup session
/// recovery; every path leaves it for one of the two settled phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// No principal; the entry screen is showing
    Unauthenticated,
    /// A credential check or session recovery is in flight
    Authenticating,
    /// A principal is resolved and its profile loaded
    Authenticated,
}

/// Shared holder for the authentication phase and the current user
#[derive(Debug)]
pub struct SessionContext {
    phase: RwLock<AuthPhase>,
    current: RwLock<Option<User>>,
}

impl SessionContext {
    /// Create a fresh, unauthenticated context
    pub fn new() -> Self {
        Self {
            phase: RwLock::new(AuthPhase::Unauthenticated),
            current: RwLock::new(None),
        }
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> AuthPhase {
        *self.phase.read().await
    }

    /// Snapshot of the signed-in user, if any
    pub async fn current_user(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    /// Whether a user is signed in
    pub async fn is_authenticated(&self) -> bool {
        self.phase().await == AuthPhase::Authenticated
    }

    /// Enter the in-flight phase
    pub(crate) async fn begin_authenticating(&self) {
        *self.phase.write().await = AuthPhase::Authenticating;
    }

    /// Settle into the authenticated phase with the resolved user
    pub(crate) async fn set_authenticated(&self, user: User) {
        *self.current.write().await = Some(user);
        *self.phase.write().await = AuthPhase::Authenticated;
    }

    /// Drop the principal and settle into the unauthenticated phase
    pub(crate) async fn clear(&self) {
        *self.current.write().await = None;
        *self.phase.write().await = AuthPhase::Unauthenticated;
    }

    /// Replace the user snapshot if it belongs to the given id
    ///
    /// Keeps the header badge consistent after a points credit without a
    /// full reload; a stale call for some other user is a no-op.
    pub(crate) async fn refresh_user(&self, user: &User) -> bool {
        let mut current = self.current.write().await;
        match current.as_ref() {
            Some(existing) if existing.id == user.id => {
                *current = Some(user.clone());
                true
            }
            _ => false,
        }
    }

    /// Id of the signed-in user, if any
    pub async fn current_user_id(&self) -> Option<UserId> {
        self.current.read().await.as_ref().map(|u| u.id)
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}
