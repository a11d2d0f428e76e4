//! Extract submission and status polling.
//!
//! The client remembers the number of the most recent submission for the
//! lifetime of the instance. Submitting takes `&mut self`; share a client
//! across threads only behind external synchronization.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ApiConfig;
use crate::error::{ExtractError, Result};
use crate::http::{Endpoint, HttpTransport, Transport};
use crate::metadata::MetadataClient;
use crate::payload::{ExtractDocument, ExtractRequest};

/// Provider-assigned extract number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractId(String);

impl ExtractId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read the `number` field of a submission response.
    fn from_response(response: &Value) -> Option<Self> {
        match response.get("number")? {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            _ => None,
        }
    }
}

impl From<u64> for ExtractId {
    fn from(number: u64) -> Self {
        Self(number.to_string())
    }
}

impl FromStr for ExtractId {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ExtractError::shape("extract number", "must not be blank"));
        }
        Ok(Self(s.to_string()))
    }
}

impl fmt::Display for ExtractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-reported extract status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractStatus {
    Queued,
    Started,
    Produced,
    Canceled,
    Failed,
    Completed,
    /// A status string this client does not know.
    Other(String),
}

impl ExtractStatus {
    /// Parse a provider status string.
    #[must_use]
    pub fn parse(status: &str) -> Self {
        match status.to_lowercase().as_str() {
            "queued" => Self::Queued,
            "started" => Self::Started,
            "produced" => Self::Produced,
            "canceled" | "cancelled" => Self::Canceled,
            "failed" => Self::Failed,
            "completed" => Self::Completed,
            _ => Self::Other(status.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Started => "started",
            Self::Produced => "produced",
            Self::Canceled => "canceled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Other(s) => s,
        }
    }

    /// Whether the provider will not change this status any more.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            Self::Produced | Self::Canceled | Self::Failed | Self::Completed
        )
    }
}

impl fmt::Display for ExtractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of [`ExtractClient::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Status(ExtractStatus),
    Document(Value),
}

/// Submits extract documents and polls their status.
pub struct ExtractClient {
    transport: Arc<dyn Transport>,
    metadata: MetadataClient,
    last_extract: Option<ExtractId>,
}

impl ExtractClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            metadata: MetadataClient::new(Arc::clone(&transport)),
            transport,
            last_extract: None,
        }
    }

    /// Build a client backed by [`HttpTransport`].
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        Ok(Self::new(Arc::new(HttpTransport::new(config)?)))
    }

    /// Metadata accessor sharing this client's transport.
    #[must_use]
    pub fn metadata(&self) -> &MetadataClient {
        &self.metadata
    }

    /// Number of the most recent successful submission.
    #[must_use]
    pub fn last_extract(&self) -> Option<&ExtractId> {
        self.last_extract.as_ref()
    }

    /// Validate shapefiles, compose and submit in one step.
    ///
    /// No POST is issued if any requested shapefile is unknown.
    pub fn create_extract(&mut self, request: &ExtractRequest) -> Result<Value> {
        let document = request.compose(&self.metadata)?;
        self.submit(&document)
    }

    /// POST a composed document and record the returned extract number.
    pub fn submit(&mut self, document: &ExtractDocument) -> Result<Value> {
        let endpoint = Endpoint::extracts();
        let body = document.to_json()?;
        tracing::debug!(%endpoint, "Submitting extract");

        let response: Value = self.transport.post(&endpoint, &body)?.into_json(&endpoint)?;

        match ExtractId::from_response(&response) {
            Some(id) => {
                tracing::debug!(extract = %id, "Extract submitted");
                self.last_extract = Some(id);
            }
            None => {
                tracing::warn!("Submission response carried no extract number");
            }
        }
        Ok(response)
    }

    /// Fetch the status document of `id`, or of the last submission.
    ///
    /// With `status_only` the `status` field is returned on its own.
    pub fn poll(&self, id: Option<&ExtractId>, status_only: bool) -> Result<PollOutcome> {
        let id = id
            .or(self.last_extract.as_ref())
            .ok_or(ExtractError::NoExtractSubmitted)?;
        let endpoint = Endpoint::extract(id.as_str());
        let document: Value = self.transport.get(&endpoint)?.into_json(&endpoint)?;

        if !status_only {
            return Ok(PollOutcome::Document(document));
        }

        let status = document
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractError::InvalidResponse {
                endpoint: endpoint.to_string(),
                message: "missing 'status' field".to_string(),
            })?;
        Ok(PollOutcome::Status(ExtractStatus::parse(status)))
    }

    /// Shorthand for a status-only poll.
    pub fn status(&self, id: Option<&ExtractId>) -> Result<ExtractStatus> {
        match self.poll(id, true)? {
            PollOutcome::Status(status) => Ok(status),
            PollOutcome::Document(_) => Err(ExtractError::InvalidResponse {
                endpoint: "extract status".to_string(),
                message: "expected a status".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::test_support::MockTransport;
    use crate::metadata::MetadataQuery;
    use serde_json::json;

    fn client(transport: &Arc<MockTransport>) -> ExtractClient {
        ExtractClient::new(transport.clone())
    }

    #[test]
    fn test_status_before_submission_fails() {
        let transport = Arc::new(MockTransport::new());
        let err = client(&transport).status(None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoExtractSubmitted);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_submit_records_number_and_polls_it() {
        let transport = Arc::new(
            MockTransport::new()
                .with_json(
                    &Endpoint::extracts(),
                    json!({"number": 42, "status": "queued"}),
                )
                .with_json(
                    &Endpoint::extract("42"),
                    json!({"number": 42, "status": "completed", "download_links": {}}),
                ),
        );
        let mut client = client(&transport);

        let response = client.create_extract(&ExtractRequest::new()).unwrap();
        assert_eq!(response["status"], "queued");
        assert_eq!(client.last_extract(), Some(&ExtractId::from(42)));

        assert_eq!(client.status(None).unwrap(), ExtractStatus::Completed);

        let PollOutcome::Document(document) = client.poll(None, false).unwrap() else {
            panic!("expected full document");
        };
        assert!(document.get("download_links").is_some());

        let posted = &transport.requests()[0];
        assert_eq!(posted.method, "POST");
        assert_eq!(posted.endpoint, "/extracts/?product=nhgis&version=v1");
        assert_eq!(
            posted.body.as_ref().unwrap()["data_format"],
            "csv_no_header"
        );
    }

    #[test]
    fn test_explicit_id_overrides_last_submission() {
        let transport = Arc::new(MockTransport::new().with_json(
            &Endpoint::extract("7"),
            json!({"number": 7, "status": "failed"}),
        ));
        let status = client(&transport)
            .status(Some(&"7".parse().unwrap()))
            .unwrap();
        assert_eq!(status, ExtractStatus::Failed);
        assert!(status.is_finished());
    }

    #[test]
    fn test_unknown_shapefile_blocks_post() {
        let transport = Arc::new(MockTransport::new().with_json(
            &MetadataQuery::Shapefiles.endpoint(),
            json!([{"name": "us_state_2010_tl2010"}]),
        ));
        let mut client = client(&transport);

        let err = client
            .create_extract(&ExtractRequest::new().shapefiles(["missing_shapefile"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedValue);
        assert_eq!(transport.post_count(), 0);
        assert!(client.last_extract().is_none());
    }

    #[test]
    fn test_submission_error_is_transport_error() {
        let transport = Arc::new(MockTransport::new().with_status(
            &Endpoint::extracts(),
            400,
            "Bad Request",
        ));
        let err = client(&transport)
            .create_extract(&ExtractRequest::new())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.to_string().contains("400"));
    }

    #[test]
    fn test_response_without_number_keeps_previous_state() {
        let transport = Arc::new(
            MockTransport::new().with_json(&Endpoint::extracts(), json!({"status": "queued"})),
        );
        let mut client = client(&transport);
        client.create_extract(&ExtractRequest::new()).unwrap();
        assert!(client.last_extract().is_none());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(ExtractStatus::parse("Queued"), ExtractStatus::Queued);
        assert_eq!(ExtractStatus::parse("cancelled"), ExtractStatus::Canceled);
        assert_eq!(
            ExtractStatus::parse("archived"),
            ExtractStatus::Other("archived".to_string())
        );
        assert!(!ExtractStatus::Started.is_finished());
    }

    #[test]
    fn test_extract_id_from_response() {
        assert_eq!(
            ExtractId::from_response(&json!({"number": 12})),
            Some(ExtractId::from(12))
        );
        assert_eq!(
            ExtractId::from_response(&json!({"number": "12"})),
            Some(ExtractId::from(12))
        );
        assert_eq!(ExtractId::from_response(&json!({"number": null})), None);
        assert!(" ".parse::<ExtractId>().is_err());
    }
}
