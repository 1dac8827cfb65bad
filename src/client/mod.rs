//! Document submission client.
//!
//! [`CrptClient`] combines the admission gate with an asynchronous
//! [`Transport`] call and reports every attempt as one [`SubmissionResult`].

mod handle;
mod pipeline;
mod result;
mod transport;

pub use handle::SubmissionHandle;
pub use pipeline::CrptClient;
pub use result::{RejectReason, SubmissionRequest, SubmissionResult};
pub use transport::{HttpTransport, Transport, TransportResponse, SIGNATURE_HEADER};
