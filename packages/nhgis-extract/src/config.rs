//! Configuration constants and API settings for the extract client.

use std::fmt;

use crate::error::{ExtractError, Result};

/// Base URL of the IPUMS API.
pub const DEFAULT_BASE_URL: &str = "https://api.ipums.org";

/// API version sent with every request.
pub const API_VERSION: &str = "v1";

/// Product name for extract endpoints.
pub const PRODUCT: &str = "nhgis";

/// Where API keys are issued.
pub const API_KEYS_URL: &str = "https://account.ipums.org/api_keys";

/// API documentation entry point.
pub const API_DOCUMENTATION_URL: &str = "https://developer.ipums.org/docs/get-started/";

/// Reference for HTTP status codes, included in transport errors.
pub const HTTP_STATUS_REFERENCE_URL: &str = "https://developer.mozilla.org/en-US/docs/Web/HTTP/Status";

/// HTTP timeout in seconds.
///
/// Extract submission can take a while when the provider is busy.
pub const HTTP_TIMEOUT_SECS: u64 = 60;

/// Description used when the caller does not provide one.
pub const DEFAULT_DESCRIPTION: &str = "nhgis-extract extract";

/// Wildcard geographic extent, selecting every area at a level.
pub const WILDCARD_EXTENT: &str = "*";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "IPUMS_API_KEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "IPUMS_API_BASE_URL";

/// Environment variable overriding the HTTP timeout.
pub const TIMEOUT_ENV: &str = "IPUMS_HTTP_TIMEOUT_SECS";

/// Settings shared by the metadata and extract clients.
///
/// `Debug` is implemented manually so the API key never ends up in logs.
#[derive(Clone)]
pub struct ApiConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV).map_err(|_| {
            ExtractError::Config(format!(
                "{API_KEY_ENV} not set. API keys can be obtained here: {API_KEYS_URL}"
            ))
        })?;

        let mut builder = Self::builder(api_key);

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            builder = builder.base_url(base_url);
        }

        if let Ok(timeout) = std::env::var(TIMEOUT_ENV) {
            builder = builder.timeout_secs(parse_timeout(&timeout)?);
        }

        builder.build()
    }

    /// Create a config builder.
    pub fn builder(api_key: impl Into<String>) -> ApiConfigBuilder {
        ApiConfigBuilder {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.into(),
            timeout_secs: HTTP_TIMEOUT_SECS,
        }
    }
}

fn parse_timeout(value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| {
        ExtractError::Config(format!(
            "{TIMEOUT_ENV} must be a whole number of seconds, got '{value}'"
        ))
    })
}

/// Builder for [`ApiConfig`].
pub struct ApiConfigBuilder {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl ApiConfigBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Finish the builder, rejecting a blank key or base URL.
    pub fn build(self) -> Result<ApiConfig> {
        if self.api_key.trim().is_empty() {
            return Err(ExtractError::Config(format!(
                "API key is blank. API keys can be obtained here: {API_KEYS_URL}"
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(ExtractError::Config("base URL is blank".into()));
        }
        Ok(ApiConfig {
            api_key: self.api_key,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            timeout_secs: self.timeout_secs,
        })
    }
}
