//! Credential stores: hold the current access/refresh token pair.
//!
//! The API client never reaches for tokens through globals; it is handed an
//! `Arc<dyn CredentialStore>` and reads/writes through this trait only.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::CredentialError;

/// Access and refresh token pair as issued by the auth endpoints.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            refresh_token: Some(refresh_token.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |t: &Option<String>| t.as_ref().map(|_| "***");
        f.debug_struct("TokenPair")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// Storage backend for the token pair. Swap implementations without touching the client.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn access_token(&self) -> Option<String>;

    async fn refresh_token(&self) -> Option<String>;

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), CredentialError>;

    /// Removes both tokens. The caller is unauthenticated afterwards.
    async fn clear(&self) -> Result<(), CredentialError>;
}

/// Process-local store. Tokens are lost when the process exits.
#[derive(Default)]
pub struct MemoryCredentialStore {
    tokens: RwLock<TokenPair>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            tokens: RwLock::new(tokens),
        }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn access_token(&self) -> Option<String> {
        self.tokens.read().access_token.clone()
    }

    async fn refresh_token(&self) -> Option<String> {
        self.tokens.read().refresh_token.clone()
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), CredentialError> {
        *self.tokens.write() = tokens;
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        *self.tokens.write() = TokenPair::default();
        Ok(())
    }
}

/// JSON-file store so a signed-in session survives across CLI invocations.
///
/// A missing file means "signed out". The file is loaded lazily on first access
/// and cached; every mutation is written through before returning.
pub struct FileCredentialStore {
    path: PathBuf,
    cache: Mutex<Option<TokenPair>>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<TokenPair, CredentialError> {
        let mut cache = self.cache.lock().await;
        if let Some(tokens) = cache.as_ref() {
            return Ok(tokens.clone());
        }
        let tokens = match tokio::fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => TokenPair::default(),
            Err(e) => return Err(e.into()),
        };
        *cache = Some(tokens.clone());
        Ok(tokens)
    }

    async fn current(&self) -> TokenPair {
        match self.load().await {
            Ok(tokens) => tokens,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Unreadable credential file: {e}");
                TokenPair::default()
            }
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn access_token(&self) -> Option<String> {
        self.current().await.access_token
    }

    async fn refresh_token(&self) -> Option<String> {
        self.current().await.refresh_token
    }

    async fn set_tokens(&self, tokens: TokenPair) -> Result<(), CredentialError> {
        let mut cache = self.cache.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&tokens)?).await?;
        debug!(path = %self.path.display(), "Credentials persisted");
        *cache = Some(tokens);
        Ok(())
    }

    async fn clear(&self) -> Result<(), CredentialError> {
        let mut cache = self.cache.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        *cache = Some(TokenPair::default());
        Ok(())
    }
}
