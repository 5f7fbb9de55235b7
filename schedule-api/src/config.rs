use std::env;
use std::time::Duration;

use tracing::warn;

use crate::ApiError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Connection settings for the practice API.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub timeout: Duration,
    /// Where the UI sends the user once the session cannot be refreshed.
    pub login_route: String,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_token: None,
            refresh_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        }
    }

    pub fn with_tokens(mut self, access: Option<String>, refresh: Option<String>) -> Self {
        self.access_token = access;
        self.refresh_token = refresh;
        self
    }

    /// Reads `SCHEDULE_*` variables, loading a `.env` file first when present.
    pub fn from_env() -> Result<Self, ApiError> {
        dotenvy::dotenv().ok();

        let base_url = env::var("SCHEDULE_API_URL")
            .map_err(|_| ApiError::Config("SCHEDULE_API_URL is not set".to_string()))?;
        let timeout_secs = match env::var("SCHEDULE_TIMEOUT_SECS") {
            Ok(raw) => raw.parse::<u64>().unwrap_or_else(|_| {
                warn!(value = raw.as_str(), "SCHEDULE_TIMEOUT_SECS is not a number, using default");
                DEFAULT_TIMEOUT_SECS
            }),
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            base_url,
            access_token: env::var("SCHEDULE_ACCESS_TOKEN").ok(),
            refresh_token: env::var("SCHEDULE_REFRESH_TOKEN").ok(),
            timeout: Duration::from_secs(timeout_secs),
            login_route: env::var("SCHEDULE_LOGIN_ROUTE")
                .unwrap_or_else(|_| DEFAULT_LOGIN_ROUTE.to_string()),
        })
    }
}
