//! HTTP transport for talking to the IPUMS API.
//!
//! The [`Transport`] trait is the only seam between the validation core and
//! the network. [`HttpTransport`] is the blocking `reqwest` implementation;
//! tests swap in [`test_support::MockTransport`].

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ApiConfig, API_VERSION, PRODUCT};
use crate::error::{ExtractError, Result};

/// User agent string identifying this client.
const USER_AGENT: &str = concat!("nhgis-extract/", env!("CARGO_PKG_VERSION"));

/// A request target relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    segments: Vec<String>,
    query: Vec<(&'static str, &'static str)>,
}

impl Endpoint {
    /// Metadata endpoint: `/metadata/nhgis/<segments...>?version=v1`.
    pub fn metadata<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all = vec!["metadata".to_string(), PRODUCT.to_string()];
        all.extend(segments.into_iter().map(Into::into));
        Self {
            segments: all,
            query: vec![("version", API_VERSION)],
        }
    }

    /// Extract submission endpoint: `/extracts/?product=nhgis&version=v1`.
    pub fn extracts() -> Self {
        Self {
            segments: vec!["extracts".to_string(), String::new()],
            query: vec![("product", PRODUCT), ("version", API_VERSION)],
        }
    }

    /// Single extract endpoint: `/extracts/<number>?product=nhgis&version=v1`.
    pub fn extract(number: &str) -> Self {
        Self {
            segments: vec!["extracts".to_string(), number.to_string()],
            query: vec![("product", PRODUCT), ("version", API_VERSION)],
        }
    }

    /// Join this endpoint onto a base URL, percent-encoding each segment.
    pub fn to_url(&self, base_url: &str) -> Result<Url> {
        let mut url = Url::parse(base_url)
            .map_err(|e| ExtractError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        url.path_segments_mut()
            .map_err(|()| ExtractError::Config(format!("base URL '{base_url}' cannot be a base")))?
            .pop_if_empty()
            .extend(&self.segments);
        url.query_pairs_mut().clear().extend_pairs(&self.query);
        Ok(url)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.segments.join("/"))?;
        let query: Vec<String> = self.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
        if !query.is_empty() {
            write!(f, "?{}", query.join("&"))?;
        }
        Ok(())
    }
}

/// Raw response as seen by the core: status, reason phrase and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl TransportResponse {
    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON, failing with [`ExtractError::Transport`] on a
    /// non-success status.
    pub fn into_json<T: DeserializeOwned>(self, endpoint: &Endpoint) -> Result<T> {
        if !self.is_success() {
            tracing::debug!(%endpoint, status = self.status, "Provider returned an error");
            return Err(ExtractError::Transport {
                status: self.status,
                reason: self.reason,
            });
        }
        serde_json::from_str(&self.body).map_err(|e| ExtractError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

/// Synchronous request/response primitive.
pub trait Transport: Send + Sync {
    fn get(&self, endpoint: &Endpoint) -> Result<TransportResponse>;

    fn post(&self, endpoint: &Endpoint, body: &serde_json::Value) -> Result<TransportResponse>;
}

/// Create a configured HTTP client.
pub fn create_client(timeout_secs: u64) -> Result<Client> {
    let client = Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// Blocking `reqwest` transport. One request per call, no retries.
///
/// NOTE: `Debug` is not derived so the API key stays out of logs.
pub struct HttpTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config.timeout_secs)?,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
        })
    }

    fn read(response: reqwest::blocking::Response) -> Result<TransportResponse> {
        let status = response.status();
        let reason = status.canonical_reason().unwrap_or("Unknown").to_string();
        let body = response.text()?;
        Ok(TransportResponse {
            status: status.as_u16(),
            reason,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn get(&self, endpoint: &Endpoint) -> Result<TransportResponse> {
        let url = endpoint.to_url(&self.base_url)?;
        tracing::debug!(%url, "GET");
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, &self.api_key)
            .send()?;
        Self::read(response)
    }

    fn post(&self, endpoint: &Endpoint, body: &serde_json::Value) -> Result<TransportResponse> {
        let url = endpoint.to_url(&self.base_url)?;
        tracing::debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, &self.api_key)
            .json(body)
            .send()?;
        Self::read(response)
    }
}

/// Test utilities for the transport.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A request seen by [`MockTransport`].
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub method: &'static str,
        pub endpoint: String,
        pub body: Option<serde_json::Value>,
    }

    /// Mock transport that answers by endpoint and records every request.
    ///
    /// Unrouted endpoints answer 404.
    #[derive(Default)]
    pub struct MockTransport {
        routes: HashMap<String, TransportResponse>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `endpoint` with a 200 and the given JSON body.
        pub fn with_json(mut self, endpoint: &Endpoint, body: serde_json::Value) -> Self {
            self.routes.insert(
                endpoint.to_string(),
                TransportResponse {
                    status: 200,
                    reason: "OK".to_string(),
                    body: body.to_string(),
                },
            );
            self
        }

        /// Answer `endpoint` with an error status.
        pub fn with_status(mut self, endpoint: &Endpoint, status: u16, reason: &str) -> Self {
            self.routes.insert(
                endpoint.to_string(),
                TransportResponse {
                    status,
                    reason: reason.to_string(),
                    body: String::new(),
                },
            );
            self
        }

        /// All requests received so far, in order.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests
                .lock()
                .map(|r| r.clone())
                .unwrap_or_default()
        }

        /// Number of POST requests received so far.
        pub fn post_count(&self) -> usize {
            self.requests().iter().filter(|r| r.method == "POST").count()
        }

        fn respond(
            &self,
            method: &'static str,
            endpoint: &Endpoint,
            body: Option<&serde_json::Value>,
        ) -> TransportResponse {
            let key = endpoint.to_string();
            if let Ok(mut requests) = self.requests.lock() {
                requests.push(RecordedRequest {
                    method,
                    endpoint: key.clone(),
                    body: body.cloned(),
                });
            }
            self.routes.get(&key).cloned().unwrap_or(TransportResponse {
                status: 404,
                reason: "Not Found".to_string(),
                body: String::new(),
            })
        }
    }

    impl Transport for MockTransport {
        fn get(&self, endpoint: &Endpoint) -> Result<TransportResponse> {
            Ok(self.respond("GET", endpoint, None))
        }

        fn post(&self, endpoint: &Endpoint, body: &serde_json::Value) -> Result<TransportResponse> {
            Ok(self.respond("POST", endpoint, Some(body)))
        }
    }
}
