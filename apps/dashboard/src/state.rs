use std::sync::Arc;

use tracing::info;

use crate::api_client::ApiClient;
use crate::auth::{AuthSession, CredentialStore, FileCredentialStore};
use crate::config::Config;
use crate::errors::ApiError;
use crate::layout::{LayoutMonitor, PaginatedPreview, PreviewSettings};
use crate::services::{AuthService, ResumeService};

/// Everything a dashboard command needs, wired once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub auth: AuthService,
    pub resumes: ResumeService,
    /// Receives height reports for the document being previewed.
    pub monitor: LayoutMonitor,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, ApiError> {
        let store: Arc<dyn CredentialStore> =
            Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
        Self::with_store(config, store).await
    }

    pub async fn with_store(
        config: Config,
        store: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let session = Arc::new(AuthSession::restore(store).await);
        info!(status = ?session.status(), "Session restored");

        let api = ApiClient::from_config(&config, session)?;
        Ok(Self {
            auth: AuthService::new(api.clone()),
            resumes: ResumeService::new(api.clone()),
            api,
            monitor: LayoutMonitor::new(),
            config,
        })
    }

    /// Attaches a preview engine to the shared monitor using the configured paper and viewport.
    pub fn preview(&self, print_mode: bool) -> PaginatedPreview {
        PaginatedPreview::attach(
            &self.monitor,
            PreviewSettings {
                paper: self.config.paper,
                viewport: self.config.viewport,
                print_mode,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use super::*;
    use crate::auth::{MemoryCredentialStore, SessionStatus, TokenPair};
    use crate::layout::{PaperSize, Viewport};

    fn config() -> Config {
        Config {
            api_base_url: "http://127.0.0.1:9".to_string(),
            credentials_path: PathBuf::from("unused.json"),
            request_timeout: Duration::from_secs(1),
            refresh_timeout: Duration::from_secs(1),
            paper: PaperSize::Letter,
            viewport: Viewport::new(900.0, 1000.0),
            rust_log: "info".to_string(),
        }
    }

    #[tokio::test]
    async fn test_state_restores_session_from_store() {
        let store = Arc::new(MemoryCredentialStore::with_tokens(TokenPair::new("a", "r")));
        let state = AppState::with_store(config(), store).await.unwrap();
        assert_eq!(state.api.session().status(), SessionStatus::Authenticated);
        assert_eq!(state.api.base_url(), "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn test_preview_uses_configured_paper() {
        let state = AppState::with_store(config(), Arc::new(MemoryCredentialStore::new()))
            .await
            .unwrap();
        let preview = state.preview(false);
        assert_eq!(state.monitor.subscriber_count(), 1);
        assert!((preview.natural_width_px() - PaperSize::Letter.width_px()).abs() < 1e-9);
    }
}
