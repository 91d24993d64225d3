use reqwest::{Method, Url};
use tracing::{info, warn};

use crate::api_client::ApiClient;
use crate::auth::TokenPair;
use crate::errors::ApiError;
use crate::models::{AuthResponse, LoginRequest, RegisterRequest, User};

/// Sign-in, registration, OAuth completion and sign-out.
///
/// These endpoints are public: a 401 here means bad credentials, never an
/// expired token, so they bypass the refresh path.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Option<User>, ApiError> {
        let body = serde_json::to_value(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let response = self
            .api
            .send_public(Method::POST, "/auth/login", Some(&body))
            .await?;
        let auth: AuthResponse = serde_json::from_slice(&response.bytes().await?)?;
        self.store(auth).await
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, ApiError> {
        let body = serde_json::to_value(RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        })?;
        let response = self
            .api
            .send_public(Method::POST, "/auth/register", Some(&body))
            .await?;
        let auth: AuthResponse = serde_json::from_slice(&response.bytes().await?)?;
        self.store(auth).await
    }

    /// Completes an OAuth sign-in from the provider's redirect URL.
    ///
    /// The backend appends `access_token` and `refresh_token` to the callback query.
    pub async fn complete_oauth(&self, callback_url: &str) -> Result<(), ApiError> {
        let tokens = parse_oauth_callback(callback_url)?;
        self.api.session().establish(tokens).await?;
        info!("OAuth sign-in completed");
        Ok(())
    }

    /// Tells the backend to revoke the session, then clears local credentials
    /// regardless of whether the backend call succeeded.
    pub async fn logout(&self) {
        if let Err(e) = self.api.execute(Method::POST, "/auth/logout", None).await {
            warn!("Logout request failed, clearing local session anyway: {e}");
        }
        self.api.session().sign_out(None).await;
    }

    async fn store(&self, auth: AuthResponse) -> Result<Option<User>, ApiError> {
        self.api
            .session()
            .establish(TokenPair::new(auth.access_token, auth.refresh_token))
            .await?;
        if let Some(user) = &auth.user {
            info!(user_id = %user.id, "Signed in");
        }
        Ok(auth.user)
    }
}

pub fn parse_oauth_callback(callback_url: &str) -> Result<TokenPair, ApiError> {
    let url = Url::parse(callback_url).map_err(|e| ApiError::InvalidCallback(e.to_string()))?;

    let mut tokens = TokenPair::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "access_token" => tokens.access_token = Some(value.into_owned()),
            "refresh_token" => tokens.refresh_token = Some(value.into_owned()),
            "error" => return Err(ApiError::InvalidCallback(value.into_owned())),
            _ => {}
        }
    }

    if tokens.access_token.is_none() || tokens.refresh_token.is_none() {
        return Err(ApiError::InvalidCallback(
            "callback is missing access_token or refresh_token".to_string(),
        ));
    }
    Ok(tokens)
}
