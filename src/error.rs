//! Error types for the Turso provider.

use thiserror::Error;

use crate::schema::Diagnostic;

/// Errors produced by the Turso admin API client.
///
/// The client distinguishes three failure classes: the request never
/// completed ([`ApiError::Transport`]), the API answered with a non-success
/// status ([`ApiError::Status`]), or the response body could not be decoded
/// ([`ApiError::Decode`]).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request could not be sent or the response never arrived.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The API responded with a non-success status code.
    #[error("unexpected status {status}: {message}")]
    Status {
        /// HTTP status code returned by the API.
        status: reqwest::StatusCode,
        /// Error message extracted from the response body, or the raw body.
        message: String,
    },

    /// The response body was not valid JSON for the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    /// Whether this error is an HTTP 404 from the API.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == reqwest::StatusCode::NOT_FOUND)
    }
}

/// Errors that can occur while handling a provider operation.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A validation error in the practitioner-supplied configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// The provider configuration is incomplete or unusable.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An operation was attempted before `configure` succeeded.
    #[error("provider is not configured")]
    NotConfigured,

    /// The requested resource type is unknown to this provider.
    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    /// The requested data source type is unknown to this provider.
    #[error("unknown data source type: {0}")]
    UnknownDataSource(String),

    /// A Turso admin API call failed.
    #[error("{context}: {source}")]
    Api {
        /// Which operation was being performed, e.g. "failed to create database".
        context: String,
        /// The underlying client error.
        #[source]
        source: ApiError,
    },

    /// State or configuration could not be serialized or deserialized.
    #[error("state serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An internal invariant was violated. Indicates a bug in the host or
    /// this provider, not in the practitioner's configuration.
    #[error("internal provider error: {0}")]
    Internal(String),
}

impl ProviderError {
    /// Wrap an [`ApiError`] with the operation it occurred in.
    pub fn api(context: impl Into<String>, source: ApiError) -> Self {
        Self::Api {
            context: context.into(),
            source,
        }
    }

    /// Convert this error into a diagnostic suitable for returning to the
    /// host. The summary names the failing operation and the detail carries
    /// the underlying error text.
    pub fn into_diagnostic(self) -> Diagnostic {
        match self {
            Self::Validation(msg) => Diagnostic::error("invalid configuration").with_detail(msg),
            Self::Configuration(msg) => {
                Diagnostic::error("provider configuration error").with_detail(msg)
            },
            Self::NotConfigured => Diagnostic::error("provider is not configured")
                .with_detail("configure must be called before any resource operation"),
            Self::UnknownResource(name) => Diagnostic::error("unknown resource type")
                .with_detail(format!("no resource type named {name:?} is registered")),
            Self::UnknownDataSource(name) => Diagnostic::error("unknown data source type")
                .with_detail(format!("no data source type named {name:?} is registered")),
            Self::Api { context, source } => {
                Diagnostic::error(context).with_detail(source.to_string())
            },
            Self::Serialization(err) => {
                Diagnostic::error("state serialization error").with_detail(err.to_string())
            },
            Self::Internal(msg) => Diagnostic::error("internal provider error").with_detail(msg),
        }
    }
}
