//! Rate limited submission pipeline.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, error, info, info_span, warn, Instrument};
use url::Url;
use uuid::Uuid;

use super::handle::SubmissionHandle;
use super::result::{RejectReason, SubmissionRequest, SubmissionResult};
use super::transport::{HttpTransport, Transport};
use crate::config::ClientConfig;
use crate::document::Document;
use crate::error::{Result, SubmissionError, TransportError};
use crate::ratelimit::{AdmissionGate, Clock, SystemClock};

/// Client submitting documents to the CRPT API under a rate limit.
///
/// Every `submit` first asks the [`AdmissionGate`] for an admission. Denied
/// submissions resolve immediately as [`SubmissionResult::Rejected`] and
/// never touch the network. Admitted ones are serialized and dispatched on
/// a spawned task; the gate lock is not held while the call is in flight.
///
/// Share a client between tasks by wrapping it in an `Arc`.
pub struct CrptClient<T: Transport = HttpTransport, C: Clock = SystemClock> {
    /// Document creation endpoint
    endpoint: Url,
    /// The admission gate for this client
    gate: AdmissionGate<C>,
    /// Transport shared with in-flight dispatch tasks
    transport: Arc<T>,
    /// Upper bound on a single transport call
    timeout: Duration,
}

impl CrptClient {
    /// Create a client from configuration, using the HTTP transport.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(config.timeout())?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport + 'static> CrptClient<T> {
    /// Create a client from configuration with a custom transport.
    pub fn with_transport(config: &ClientConfig, transport: T) -> Result<Self> {
        config.validate()?;
        let gate = AdmissionGate::new(config.rate_limit.limit, config.rate_limit.window())?;

        info!(
            endpoint = %config.endpoint,
            limit = config.rate_limit.limit,
            window = ?config.rate_limit.window(),
            "CRPT client initialized"
        );

        Ok(Self::from_parts(
            config.endpoint_url()?,
            gate,
            transport,
            config.timeout(),
        ))
    }
}

impl<T: Transport + 'static, C: Clock> CrptClient<T, C> {
    /// Assemble a client from already constructed parts.
    pub fn from_parts(endpoint: Url, gate: AdmissionGate<C>, transport: T, timeout: Duration) -> Self {
        Self {
            endpoint,
            gate,
            transport: Arc::new(transport),
            timeout,
        }
    }

    /// Get the endpoint documents are posted to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Get the admission gate.
    pub fn gate(&self) -> &AdmissionGate<C> {
        &self.gate
    }

    /// Submit a document.
    ///
    /// Dispatch needs a Tokio runtime; outside one the submission fails
    /// without spending an admission. The returned handle resolves to
    /// exactly one result. An admission is spent even if serialization or
    /// the network call later fails.
    pub fn submit<D: Serialize>(&self, request: SubmissionRequest<D>) -> SubmissionHandle {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(error = %e, "Cannot dispatch document outside a Tokio runtime");
                return SubmissionHandle::ready(SubmissionResult::Failed {
                    cause: SubmissionError::NoRuntime,
                });
            }
        };

        if let Err(retry_after) = self.gate.admit() {
            warn!(
                limit = self.gate.limit(),
                retry_after = ?retry_after,
                "Rate limit exceeded, please try again later"
            );
            return SubmissionHandle::ready(SubmissionResult::Rejected {
                reason: RejectReason::RateLimitExceeded { retry_after },
            });
        }

        let (document, signature) = request.into_parts();
        let body = match serde_json::to_vec(&document) {
            Ok(body) => body,
            Err(e) => {
                error!(error = %e, "Failed to serialize document");
                return SubmissionHandle::ready(SubmissionResult::Failed { cause: e.into() });
            }
        };

        let (tx, rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let endpoint = self.endpoint.clone();
        let timeout = self.timeout;
        let span = info_span!(
            "submission",
            submission_id = %Uuid::new_v4(),
            endpoint = %endpoint
        );

        runtime.spawn(
            async move {
                let result = dispatch(transport.as_ref(), &endpoint, body, &signature, timeout).await;
                if tx.send(result).is_err() {
                    debug!("Submission handle dropped before the result arrived");
                }
            }
            .instrument(span),
        );

        SubmissionHandle::pending(rx)
    }

    /// Submit a validated [`Document`] signed with `signature`.
    pub fn create_document(&self, document: Document, signature: impl Into<String>) -> SubmissionHandle {
        self.submit(SubmissionRequest::new(document, signature))
    }
}

/// Perform the transport call and map its outcome onto a result.
async fn dispatch<T: Transport + ?Sized>(
    transport: &T,
    endpoint: &Url,
    body: Vec<u8>,
    signature: &str,
    timeout: Duration,
) -> SubmissionResult {
    debug!("Dispatching document");

    match tokio::time::timeout(timeout, transport.post(endpoint, body, signature)).await {
        Ok(Ok(response)) => {
            info!(status = response.status, "Response received");
            SubmissionResult::Accepted {
                status: response.status,
                body: response.body,
            }
        }
        Ok(Err(e)) => {
            error!(error = %e, "Error sending document");
            SubmissionResult::Failed { cause: e.into() }
        }
        Err(_) => {
            error!(timeout = ?timeout, "Error sending document: request timed out");
            SubmissionResult::Failed {
                cause: TransportError::Timeout(timeout).into(),
            }
        }
    }
}
