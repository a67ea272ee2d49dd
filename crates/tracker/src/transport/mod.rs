//! Transport - how envelopes leave the process
//!
//! The tracker only needs `submit`. Success is any 2xx; everything else is a
//! `TransportError`. No retries, no queuing. Let the caller decide.

pub mod orbiter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::Envelope;

pub use orbiter::OrbiterApi;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Collector responded with {status}: {body}")]
    Status { status: u16, body: String },
}

/// Collector endpoint a submission targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    PageViews,
    TrackEvents,
    PerformanceMetrics,
}

impl EndpointKind {
    pub fn path(&self) -> &'static str {
        match self {
            EndpointKind::PageViews => "views",
            EndpointKind::TrackEvents => "events",
            EndpointKind::PerformanceMetrics => "metrics",
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn submit(&self, kind: EndpointKind, envelope: Envelope) -> Result<(), TransportError>;
}
