//! Explicit session context and its sign-in/sign-out lifecycle.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use crate::{
    errors::{AppError, AppResult},
    identity::IdentityProvider,
};

/// The authenticated identity every owner-scoped operation runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    user_id: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

/// Holds the current session for a client run.
///
/// Established on sign-in, cleared on sign-out. Observers subscribe to a
/// `watch` channel instead of registering callbacks.
pub struct AuthState {
    identity: Arc<dyn IdentityProvider>,
    current: watch::Sender<Option<Session>>,
}

impl AuthState {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        let (current, _) = watch::channel(None);
        Self { identity, current }
    }

    /// Verify credentials and make the resulting session current.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` on a wrong email or password, or a backend error.
    pub async fn sign_in(&self, email: &str, password: &str) -> AppResult<Session> {
        let user_id = self.identity.verify_credentials(email, password).await?;
        let session = Session::new(user_id);
        self.establish(session.clone());
        Ok(session)
    }

    /// Make an already-authenticated session current (e.g. right after registration).
    pub fn establish(&self, session: Session) {
        info!(user_id = %session.user_id(), "session established");
        self.current.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if let Some(previous) = self.current.send_replace(None) {
            info!(user_id = %previous.user_id(), "session cleared");
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<Session> {
        self.current.borrow().clone()
    }

    #[must_use]
    pub fn current_user_id(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|s| s.user_id.clone())
    }

    /// Session required for an owner-scoped operation.
    ///
    /// # Errors
    /// Returns `Unauthorized` when nobody is signed in.
    pub fn require(&self) -> AppResult<Session> {
        self.current().ok_or(AppError::Unauthorized)
    }

    /// Receiver notified on every session start and end.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.current.subscribe()
    }
}
