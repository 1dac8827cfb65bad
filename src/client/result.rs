//! Submission inputs and outcomes.

use std::fmt;
use std::time::Duration;

use crate::document::Document;
use crate::error::SubmissionError;

/// A document paired with the signature that authorises it.
#[derive(Debug, Clone)]
pub struct SubmissionRequest<D = Document> {
    document: D,
    signature: String,
}

impl<D> SubmissionRequest<D> {
    pub fn new(document: D, signature: impl Into<String>) -> Self {
        Self {
            document,
            signature: signature.into(),
        }
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn into_parts(self) -> (D, String) {
        (self.document, self.signature)
    }
}

/// Why a submission was refused without contacting the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The current window's budget is spent.
    RateLimitExceeded {
        /// Time until the window resets, as observed at denial
        retry_after: Duration,
    },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::RateLimitExceeded { .. } => f.write_str("rate limit exceeded"),
        }
    }
}

/// Outcome of exactly one submission attempt.
#[derive(Debug)]
pub enum SubmissionResult {
    /// The remote service answered. Any status code lands here.
    Accepted { status: u16, body: String },
    /// The gate denied admission; nothing was sent.
    Rejected { reason: RejectReason },
    /// Serialization or transport failed.
    Failed { cause: SubmissionError },
}

impl SubmissionResult {
    pub fn is_accepted(&self) -> bool {
        matches!(self, SubmissionResult::Accepted { .. })
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SubmissionResult::Rejected { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SubmissionResult::Failed { .. })
    }
}

impl fmt::Display for SubmissionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmissionResult::Accepted { status, body } => {
                write!(f, "Response status code: {} Body: {}", status, body)
            }
            SubmissionResult::Rejected { .. } => {
                f.write_str("Rate limit exceeded, please try again later.")
            }
            SubmissionResult::Failed { cause } => write!(f, "Error sending document: {}", cause),
        }
    }
}
