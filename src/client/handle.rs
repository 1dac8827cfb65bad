//! Pending submission results.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

use super::result::SubmissionResult;
use crate::error::SubmissionError;

/// Future resolving to the single [`SubmissionResult`] of one `submit` call.
///
/// Rejections and serialization failures are decided before anything is
/// dispatched, so their handles are already resolved. Dispatched submissions
/// resolve when the transport call finishes. Dropping the handle does not
/// cancel the dispatch.
#[derive(Debug)]
#[must_use = "a submission handle does nothing unless awaited"]
pub struct SubmissionHandle {
    inner: Inner,
}

#[derive(Debug)]
enum Inner {
    Ready(Option<SubmissionResult>),
    Pending(oneshot::Receiver<SubmissionResult>),
}

impl SubmissionHandle {
    pub(crate) fn ready(result: SubmissionResult) -> Self {
        Self {
            inner: Inner::Ready(Some(result)),
        }
    }

    pub(crate) fn pending(receiver: oneshot::Receiver<SubmissionResult>) -> Self {
        Self {
            inner: Inner::Pending(receiver),
        }
    }

    /// Whether the result was decided without dispatching.
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, Inner::Ready(Some(_)))
    }
}

impl Future for SubmissionHandle {
    type Output = SubmissionResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.inner {
            Inner::Ready(result) => match result.take() {
                Some(result) => Poll::Ready(result),
                None => panic!("SubmissionHandle polled after completion"),
            },
            Inner::Pending(receiver) => match Pin::new(receiver).poll(cx) {
                Poll::Ready(Ok(result)) => Poll::Ready(result),
                Poll::Ready(Err(_)) => Poll::Ready(SubmissionResult::Failed {
                    cause: SubmissionError::TaskAborted,
                }),
                Poll::Pending => Poll::Pending,
            },
        }
    }
}
