//! Dispatch layer
//!
//! Wraps one captured entry into its envelope and submits it. Both public
//! flavours of every tracking call go through the same `Submission`:
//!
//! - fire-and-forget spawns it detached and logs the outcome;
//! - the awaitable form awaits it and returns the outcome.

use futures_util::future::BoxFuture;
use std::sync::Arc;

use crate::error::TrackerError;
use crate::protocol::{Envelope, PageViewEntry, PerformanceMetricEntry, TrackEventEntry};
use crate::transport::{Transport, TransportError};

/// A captured record on its way to the transport
pub type Submission = BoxFuture<'static, Result<(), TransportError>>;

#[derive(Clone)]
pub struct Dispatcher {
    satellite_id: String,
    transport: Arc<dyn Transport>,
}

impl Dispatcher {
    pub fn new(satellite_id: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            satellite_id: satellite_id.into(),
            transport,
        }
    }

    pub fn page_view(&self, entry: PageViewEntry) -> Submission {
        self.submit(Envelope::page_view(self.satellite_id.clone(), entry))
    }

    pub fn track_event(&self, entry: TrackEventEntry) -> Submission {
        self.submit(Envelope::track_event(self.satellite_id.clone(), entry))
    }

    pub fn performance_metric(&self, entry: PerformanceMetricEntry) -> Submission {
        self.submit(Envelope::performance_metric(self.satellite_id.clone(), entry))
    }

    fn submit(&self, envelope: Envelope) -> Submission {
        let transport = Arc::clone(&self.transport);
        let kind = envelope.kind();
        Box::pin(async move { transport.submit(kind, envelope).await })
    }
}

/// Run a submission detached from the caller. Never panics, never reports.
pub fn fire(what: &'static str, submission: Result<Submission, TrackerError>) {
    let submission = match submission {
        Ok(submission) => submission,
        Err(e) => {
            tracing::debug!("[Dispatcher] {} not captured: {}", what, e);
            return;
        }
    };

    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(async move {
                if let Err(e) = submission.await {
                    tracing::debug!("[Dispatcher] {} dropped: {}", what, e);
                }
            });
        }
        Err(_) => {
            tracing::warn!("[Dispatcher] No async runtime, {} dropped", what);
        }
    }
}
