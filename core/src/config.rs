//! Client configuration.
//!
//! `ClientConfig` is the immutable value each client owns. `ClientSettings`
//! is the configuration document applications load (JSON or environment) and
//! turn into a config with `ClientConfig::from_settings`.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Request id sent when no supplier is configured.
pub const DEFAULT_REQUEST_ID: &str = "Not-Set";

/// Produces the value of the `Govuk-Request-Id` header for each request.
pub type RequestIdFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Supplier returning a fresh v4 UUID per request.
pub fn uuid_request_id() -> RequestIdFn {
    Arc::new(|| uuid::Uuid::new_v4().to_string())
}

#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) base_url: String,
    pub(crate) token: Option<String>,
    pub(crate) dry_run: bool,
    pub(crate) request_id: RequestIdFn,
    pub(crate) retry_on_error: bool,
    pub(crate) compress: bool,
}

impl ClientConfig {
    /// Fails with `ClientError::Configuration` when `base_url` is empty.
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base_url must be a non-empty string".to_string()));
        }
        Ok(Self {
            base_url,
            token,
            dry_run: false,
            request_id: Arc::new(|| DEFAULT_REQUEST_ID.to_string()),
            retry_on_error: true,
            compress: true,
        })
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self> {
        let mut config = Self::new(settings.url.clone(), settings.token.clone())?;
        config.dry_run = settings.dry_run;
        Ok(config)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn retry_on_error(&self) -> bool {
        self.retry_on_error
    }

    pub fn compress(&self) -> bool {
        self.compress
    }

    pub fn request_id(&self) -> String {
        (self.request_id)()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("dry_run", &self.dry_run)
            .field("retry_on_error", &self.retry_on_error)
            .field("compress", &self.compress)
            .finish_non_exhaustive()
    }
}

/// Configuration document with the keys `url`, `token` and `dry_run`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    pub url: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

impl ClientSettings {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ClientError::Configuration(e.to_string()))
    }

    /// Reads `PP_URL`, `PP_TOKEN` and `PP_DRY_RUN` (`1`/`true`/`yes`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("PP_URL")
            .ok_or_else(|| ClientError::Configuration("PP_URL is not set".to_string()))?;
        let token = lookup("PP_TOKEN").filter(|token| !token.is_empty());
        let dry_run = lookup("PP_DRY_RUN")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Ok(Self { url, token, dry_run })
    }
}
