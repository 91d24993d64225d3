use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use crate::auth::credentials::{CredentialStore, TokenPair};
use crate::auth::refresh_gate::RefreshGate;
use crate::errors::CredentialError;

/// Whether the user currently holds credentials.
///
/// `SignedOut` is the signal to route the user back to the sign-in entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Authenticated,
    SignedOut { reason: Option<String> },
}

/// Owns all mutable auth state: the token store, the refresh gate and the
/// published session status. Injected into the API client.
pub struct AuthSession {
    store: Arc<dyn CredentialStore>,
    gate: RefreshGate,
    status: watch::Sender<SessionStatus>,
}

impl AuthSession {
    /// Builds a session over `store`, starting `Authenticated` if it already holds an access token.
    pub async fn restore(store: Arc<dyn CredentialStore>) -> Self {
        let initial = if store.access_token().await.is_some() {
            SessionStatus::Authenticated
        } else {
            SessionStatus::SignedOut { reason: None }
        };
        let (status, _) = watch::channel(initial);
        Self {
            store,
            gate: RefreshGate::new(),
            status,
        }
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn gate(&self) -> &RefreshGate {
        &self.gate
    }

    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status.subscribe()
    }

    /// Stores freshly issued credentials from login, registration or an OAuth callback.
    pub async fn establish(&self, tokens: TokenPair) -> Result<(), CredentialError> {
        self.store.set_tokens(tokens).await?;
        self.gate.reset();
        self.status.send_replace(SessionStatus::Authenticated);
        info!("Session established");
        Ok(())
    }

    /// Stores the pair returned by a successful refresh.
    pub(crate) async fn rotate(&self, tokens: TokenPair) -> Result<(), CredentialError> {
        self.store.set_tokens(tokens).await?;
        self.status.send_replace(SessionStatus::Authenticated);
        Ok(())
    }

    /// Drops all credentials and publishes `SignedOut`.
    ///
    /// Always publishes, even if the store fails to clear, so the UI leaves
    /// authenticated views.
    pub async fn sign_out(&self, reason: Option<String>) {
        if let Err(e) = self.store.clear().await {
            error!("Failed to clear credentials: {e}");
        }
        info!(reason = reason.as_deref().unwrap_or("user request"), "Session cleared");
        self.status.send_replace(SessionStatus::SignedOut { reason });
    }
}
