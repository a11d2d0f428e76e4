//! Error types for the extract client.
//!
//! Every validation failure maps onto its own variant so callers can branch
//! on [`ExtractError::kind`] instead of parsing message text.

use thiserror::Error;

use crate::config::{API_DOCUMENTATION_URL, API_KEYS_URL, HTTP_STATUS_REFERENCE_URL};

/// Main error type for the extract client library.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Argument has the wrong shape (blank name, empty list, malformed keyword).
    ///
    /// Detected before any network call is made.
    #[error("Invalid {field}: {reason}")]
    Shape { field: &'static str, reason: String },

    /// A named value is absent from the provider's metadata.
    #[error("{kind} '{value}' is not supported for {context}")]
    UnsupportedValue {
        kind: &'static str,
        value: String,
        context: String,
    },

    /// A mandatory qualifier was omitted.
    #[error("{context} requires {what}")]
    MissingRequiredValue { what: &'static str, context: String },

    /// The provider answered with a non-success status.
    #[error(
        "A {status} error code was returned. The following reason was given: {reason}. \
         API keys can be obtained here: {keys_url} \
         API documentation is here: {docs_url} \
         HTTP status code documentation: {status_url}",
        keys_url = API_KEYS_URL,
        docs_url = API_DOCUMENTATION_URL,
        status_url = HTTP_STATUS_REFERENCE_URL
    )]
    Transport { status: u16, reason: String },

    /// Status was requested before any extract was submitted.
    #[error("No extract submitted yet: submit an extract or pass an extract number")]
    NoExtractSubmitted,

    /// The provider answered successfully but the body was not what we expect.
    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed before a response was received.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Request file could not be parsed.
    #[error("Request file parse error: {0}")]
    RequestFile(#[from] serde_yaml_ng::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Shape,
    UnsupportedValue,
    MissingRequiredValue,
    Transport,
    NoExtractSubmitted,
    InvalidResponse,
    Config,
    Io,
}

impl ExtractError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Shape { .. } => ErrorKind::Shape,
            Self::UnsupportedValue { .. } => ErrorKind::UnsupportedValue,
            Self::MissingRequiredValue { .. } => ErrorKind::MissingRequiredValue,
            Self::Transport { .. } | Self::Http(_) => ErrorKind::Transport,
            Self::NoExtractSubmitted => ErrorKind::NoExtractSubmitted,
            Self::InvalidResponse { .. } | Self::Json(_) => ErrorKind::InvalidResponse,
            Self::Config(_) | Self::RequestFile(_) => ErrorKind::Config,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn shape(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Shape {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(
        kind: &'static str,
        value: impl ToString,
        context: impl Into<String>,
    ) -> Self {
        Self::UnsupportedValue {
            kind,
            value: value.to_string(),
            context: context.into(),
        }
    }
}

/// Result type alias for extract client operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
