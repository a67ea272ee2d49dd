//! Performance metrics
//!
//! Web vitals are measured elsewhere; this module only defines what a
//! measurement looks like, the `MetricsSource` seam through which
//! measurements arrive, and the adapter that forwards them.

pub mod hub;
pub mod observer;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::subscription::Subscription;

pub use hub::MetricsHub;
pub use observer::{PerformanceMetricData, PerformanceObserver};

/// The metric kinds the collector accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Cumulative layout shift
    #[serde(rename = "CLS")]
    Cls,
    /// First contentful paint
    #[serde(rename = "FCP")]
    Fcp,
    /// Interaction to next paint
    #[serde(rename = "INP")]
    Inp,
    /// Largest contentful paint
    #[serde(rename = "LCP")]
    Lcp,
    /// Time to first byte
    #[serde(rename = "TTFB")]
    Ttfb,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Cls,
        MetricKind::Fcp,
        MetricKind::Inp,
        MetricKind::Lcp,
        MetricKind::Ttfb,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Cls => "CLS",
            MetricKind::Fcp => "FCP",
            MetricKind::Inp => "INP",
            MetricKind::Lcp => "LCP",
            MetricKind::Ttfb => "TTFB",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }
}

/// How the page was reached, as reported with each metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationType {
    Navigate,
    Reload,
    BackForward,
    BackForwardCache,
    Prerender,
    Restore,
}

impl NavigationType {
    /// Parse the kebab-case names vitals libraries report
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "navigate" => Some(NavigationType::Navigate),
            "reload" => Some(NavigationType::Reload),
            "back-forward" => Some(NavigationType::BackForward),
            "back-forward-cache" => Some(NavigationType::BackForwardCache),
            "prerender" => Some(NavigationType::Prerender),
            "restore" => Some(NavigationType::Restore),
            _ => None,
        }
    }
}

/// One measurement as delivered by the metrics library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// Unique per page load and metric
    pub id: String,
    pub value: f64,
    /// Change since the previous report of the same metric
    pub delta: f64,
    #[serde(default)]
    pub navigation_type: Option<NavigationType>,
}

impl Metric {
    pub fn new(id: impl Into<String>, value: f64) -> Self {
        Self {
            id: id.into(),
            value,
            delta: value,
            navigation_type: None,
        }
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    pub fn with_navigation_type(mut self, navigation_type: NavigationType) -> Self {
        self.navigation_type = Some(navigation_type);
        self
    }
}

pub type MetricCallback = Arc<dyn Fn(&Metric) + Send + Sync>;

/// External metrics library: one callback registration per metric kind
pub trait MetricsSource: Send + Sync {
    fn register(&self, kind: MetricKind, callback: MetricCallback) -> Subscription;
}
