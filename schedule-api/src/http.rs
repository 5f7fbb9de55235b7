//! reqwest-backed [`Transport`] with bearer authentication.
//!
//! A 401 triggers one `POST /auth/refresh`; the original request is then
//! retried once with the new access token. When either step fails the
//! session is over and [`ApiError::SessionExpired`] is returned.
//!
//! Refreshes are serialized. A request that was rejected with a token
//! another request already replaced retries with the new one instead of
//! spending the rotated refresh token again.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::envelope::error_message;
use crate::transport::{ApiRequest, Method, Transport};
use crate::{ApiConfig, ApiError};

const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tokens {
    pub access: Option<String>,
    pub refresh: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "access_token", alias = "token")]
    access_token: String,
    #[serde(default, alias = "refresh_token")]
    refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    login_route: String,
    tokens: Arc<RwLock<Tokens>>,
    refreshing: Arc<Mutex<()>>,
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cleaned = config.base_url.trim_end_matches('/');
        let parsed = Url::parse(cleaned)
            .map_err(|err| ApiError::Config(format!("invalid base URL '{cleaned}': {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "base URL must use http or https, got {}",
                parsed.scheme()
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| ApiError::Config(format!("could not build HTTP client: {err}")))?;

        info!(base_url = cleaned, "API client ready");
        Ok(Self {
            http,
            base_url: cleaned.to_string(),
            login_route: config.login_route.clone(),
            tokens: Arc::new(RwLock::new(Tokens {
                access: config.access_token.clone(),
                refresh: config.refresh_token.clone(),
            })),
            refreshing: Arc::new(Mutex::new(())),
        })
    }

    pub async fn tokens(&self) -> Tokens {
        self.tokens.read().await.clone()
    }

    pub async fn set_tokens(&self, tokens: Tokens) {
        *self.tokens.write().await = tokens;
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn execute(
        &self,
        request: &ApiRequest,
        access: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.http.request(method, self.url(&request.path));
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = access {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = ?request.method, path = request.path.as_str(), "sending request");
        Ok(builder.send().await?)
    }

    /// Refreshes unless the token `rejected` was already replaced.
    async fn refresh_after(&self, rejected: Option<&str>) -> Result<(), ApiError> {
        let _refreshing = self.refreshing.lock().await;
        if self.tokens.read().await.access.as_deref() != rejected {
            debug!("access token already refreshed");
            return Ok(());
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<(), ApiError> {
        let Some(refresh_token) = self.tokens.read().await.refresh.clone() else {
            return Err(self.session_expired());
        };

        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&json!({ "refreshToken": refresh_token }))
            .send()
            .await?;
        let body = read_body(response).await?;
        let refreshed: RefreshResponse = serde_json::from_value(body)?;

        let mut tokens = self.tokens.write().await;
        tokens.access = Some(refreshed.access_token);
        if let Some(refresh) = refreshed.refresh_token {
            tokens.refresh = Some(refresh);
        }
        info!("access token refreshed");
        Ok(())
    }

    fn session_expired(&self) -> ApiError {
        ApiError::SessionExpired {
            login_route: self.login_route.clone(),
        }
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let access = self.tokens.read().await.access.clone();
        let response = self.execute(&request, access.as_deref()).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return read_body(response).await;
        }

        if let Err(err) = self.refresh_after(access.as_deref()).await {
            warn!(error = %err, "token refresh failed");
            return Err(self.session_expired());
        }

        let access = self.tokens.read().await.access.clone();
        let retried = self.execute(&request, access.as_deref()).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            warn!(path = request.path.as_str(), "still unauthorized after refresh");
            return Err(self.session_expired());
        }
        read_body(retried).await
    }
}

/// JSON body of a successful response; error bodies become
/// [`ApiError::Server`] with the best message available.
async fn read_body(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if status.is_success() {
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        return Ok(serde_json::from_slice(&bytes)?);
    }

    let message = serde_json::from_slice::<Value>(&bytes)
        .ok()
        .as_ref()
        .and_then(error_message)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()))
        });
    Err(ApiError::server(status.as_u16(), message))
}
