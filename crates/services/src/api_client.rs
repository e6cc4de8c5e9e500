use std::env;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::auth::CredentialProvider;
use crate::error::ApiError;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Where and how to reach the backend API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Reads `RUSH_API_BASE_URL` and `RUSH_API_TIMEOUT_SECS`, falling back
    /// to the local dev server the original client also defaults to.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url =
            env::var("RUSH_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = env::var("RUSH_API_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Thin HTTP client over the backend.
///
/// Looks the credential up on every call and attaches `Authorization:
/// Bearer …` only when a token is present, matching the interceptor
/// behavior of the original web client.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    /// Builds the client with the given credential source.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` when the underlying HTTP client cannot be built.
    pub fn new(
        config: ApiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            config,
            credentials,
        })
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET a JSON resource.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::HttpStatus` for non-success responses and
    /// `ApiError::Http` for transport or decoding failures.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path);
        debug!(target: "rush_api", %url, "GET");
        let mut request = self.http.get(&url).query(query);
        if let Some(token) = self.credentials.bearer_token().await {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    /// POST a JSON body, discarding any response payload.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::HttpStatus` for non-success responses and
    /// `ApiError::Http` for transport failures.
    pub async fn post_json<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(), ApiError> {
        let url = self.endpoint(path);
        debug!(target: "rush_api", %url, "POST");
        let mut request = self.http.post(&url).json(body);
        if let Some(token) = self.credentials.bearer_token().await {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(())
    }
}
