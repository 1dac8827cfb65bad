//! Error types for the CRPT client.

use std::time::Duration;
use thiserror::Error;

/// Main error type for client construction and configuration.
#[derive(Error, Debug)]
pub enum CrptError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document field validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Transport setup errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for CrptError {
    fn from(err: config::ConfigError) -> Self {
        CrptError::Config(err.to_string())
    }
}

/// Rejected document field values.
///
/// These are raised while a document is being built, before any
/// submission is attempted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid INN provided for {field}: {value:?}")]
    InvalidInn { field: &'static str, value: String },

    #[error("Invalid production type provided: {0:?}")]
    InvalidProductionType(String),

    #[error("Invalid date provided for {field}: {value:?}")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid TN VED code: {0:?}")]
    InvalidTnvedCode(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Product #{index} has neither uit_code nor uitu_code")]
    MissingProductCode { index: usize },
}

/// Failures reported by the transport collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else if err.is_builder() {
            TransportError::Build(err.to_string())
        } else if err.is_decode() || err.is_body() {
            TransportError::MalformedResponse(err.to_string())
        } else {
            TransportError::Request(err.to_string())
        }
    }
}

/// Cause carried by a failed submission.
#[derive(Error, Debug)]
pub enum SubmissionError {
    /// The document could not be encoded as JSON
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The network call failed or timed out
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// `submit` was called outside a Tokio runtime
    #[error("no Tokio runtime available to dispatch the document")]
    NoRuntime,

    /// The dispatch task ended without reporting an outcome
    #[error("submission task ended before producing a result")]
    TaskAborted,
}

/// Result type alias for CRPT client operations.
pub type Result<T> = std::result::Result<T, CrptError>;
