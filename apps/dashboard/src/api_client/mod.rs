//! API Client: the single point of entry for every Resource API call.
//!
//! ARCHITECTURAL RULE: services never talk to `reqwest` directly. Authenticated
//! calls go through `execute` (bearer attachment + refresh-on-401), public auth
//! endpoints go through `send_public`.
//!
//! Refresh protocol for a request that receives 401:
//! 1. The request spends its single retry.
//! 2. The refresh gate admits it as leader, follower or late arrival.
//! 3. The leader refreshes, stores the new pair (or signs the session out),
//!    then releases every follower with the same outcome.
//! 4. On success the request is replayed once with the current token. A second
//!    401 is terminal.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{Admission, AuthSession, RefreshOutcome, TokenPair};
use crate::config::Config;
use crate::errors::{error_message, ApiError, RefreshError};

#[cfg(test)]
mod tests;

pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct IssuedTokens {
    access_token: String,
    refresh_token: Option<String>,
}

/// HTTP client shared by all Resource API callers.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<AuthSession>,
    refresh_timeout: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("refresh_timeout", &self.refresh_timeout)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(
        base_url: impl Into<String>,
        session: Arc<AuthSession>,
        request_timeout: Duration,
        refresh_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ApiError::ClientInit(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
            refresh_timeout,
        })
    }

    pub fn from_config(config: &Config, session: Arc<AuthSession>) -> Result<Self, ApiError> {
        Self::new(
            config.api_base_url.clone(),
            session,
            config.request_timeout,
            config.refresh_timeout,
        )
    }

    pub fn session(&self) -> &Arc<AuthSession> {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Sends an authenticated request, recovering once from an expired access token.
    ///
    /// Non-401 failures are returned unchanged and never trigger a refresh.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let generation = self.session.gate().generation();
        let token = self.session.store().access_token().await;

        let response = self.dispatch(&method, path, body, token.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return ensure_success(response).await;
        }

        debug!(%method, path, "Received 401, recovering credentials");
        self.recover(generation).await?;

        let token = self.session.store().access_token().await;
        debug!(%method, path, "Replaying request with refreshed credentials");
        let response = self.dispatch(&method, path, body, token.as_deref()).await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            warn!(%method, path, "Request rejected again after token refresh");
            self.session
                .sign_out(Some("Unauthorized after token refresh".to_string()))
                .await;
            return Err(ApiError::Unauthorized);
        }

        ensure_success(response).await
    }

    /// Sends a request without credentials and without refresh handling.
    /// Used for login, registration and other unauthenticated endpoints.
    pub async fn send_public(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Response, ApiError> {
        let response = self.dispatch(&method, path, body, None).await?;
        ensure_success(response).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(Method::GET, path, None).await?;
        decode(response).await
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::POST, path, Some(&body)).await?;
        decode(response).await
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_value(body)?;
        let response = self.execute(Method::PUT, path, Some(&body)).await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, None).await?;
        Ok(())
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Response, ApiError> {
        let mut request = self.client.request(method.clone(), self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Obtains usable credentials for a request dispatched under `generation`.
    async fn recover(&self, generation: u64) -> Result<(), ApiError> {
        let outcome = match self.session.gate().admit(generation) {
            Admission::Settled(outcome) => outcome,
            Admission::Follower(rx) => rx.await.unwrap_or(Err(RefreshError::Abandoned)),
            Admission::Leader(guard) => {
                let outcome = self.refresh_tokens().await;
                if let Err(e) = &outcome {
                    warn!("Token refresh failed: {e}");
                    self.session.sign_out(Some(e.to_string())).await;
                }
                let released = guard.settle(outcome.clone());
                debug!(released, "Refresh settled");
                outcome
            }
        };
        Ok(outcome?)
    }

    /// Exchanges the stored refresh token for a new pair and stores it.
    async fn refresh_tokens(&self) -> RefreshOutcome {
        let refresh_token = self
            .session
            .store()
            .refresh_token()
            .await
            .ok_or(RefreshError::MissingRefreshToken)?;

        info!("Refreshing access token");
        let call = async {
            let response = self
                .client
                .post(self.url(REFRESH_PATH))
                .json(&RefreshRequest {
                    refresh_token: &refresh_token,
                })
                .send()
                .await
                .map_err(|e| RefreshError::Transport(e.to_string()))?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(RefreshError::Rejected {
                    status: status.as_u16(),
                    message: error_message(&body),
                });
            }

            response
                .json::<IssuedTokens>()
                .await
                .map_err(|e| RefreshError::Malformed(e.to_string()))
        };

        let issued = tokio::time::timeout(self.refresh_timeout, call)
            .await
            .map_err(|_| RefreshError::Timeout(self.refresh_timeout))??;

        let tokens = TokenPair {
            access_token: Some(issued.access_token),
            refresh_token: Some(issued.refresh_token.unwrap_or(refresh_token)),
        };
        self.session
            .rotate(tokens)
            .await
            .map_err(|e| RefreshError::Store(e.to_string()))?;

        info!("Access token refreshed");
        Ok(())
    }
}

/// Passes success through; maps any other status to a categorized error.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), "API returned error status");
    Err(ApiError::from_status(status, &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}
