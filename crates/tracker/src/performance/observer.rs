//! Performance observer - adapts metric callbacks to the dispatch layer
//!
//! Registers one callback per `MetricKind`. Each callback invocation is
//! reshaped into a `PerformanceMetricData` and handed to the sink on its own;
//! nothing is batched across kinds.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{Metric, MetricKind, MetricsSource, NavigationType};
use crate::observer::Observer;
use crate::subscription::Subscription;

/// Metric payload as the collector stores it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebVitalsMetric {
    pub value: f64,
    pub delta: f64,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigation_type: Option<NavigationType>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PerformanceData {
    WebVitalsMetric(WebVitalsMetric),
}

/// Normalized metric record, before session context is attached
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceMetricData {
    pub metric_name: MetricKind,
    pub data: PerformanceData,
}

impl PerformanceMetricData {
    pub fn from_metric(kind: MetricKind, metric: &Metric) -> Self {
        Self {
            metric_name: kind,
            data: PerformanceData::WebVitalsMetric(WebVitalsMetric {
                value: metric.value,
                delta: metric.delta,
                id: metric.id.clone(),
                navigation_type: metric.navigation_type,
            }),
        }
    }
}

pub type MetricSink = Arc<dyn Fn(PerformanceMetricData) + Send + Sync>;

pub struct PerformanceObserver {
    registrations: Vec<Subscription>,
}

impl PerformanceObserver {
    pub const NAME: &'static str = "PerformanceObserver";

    pub fn start(source: &dyn MetricsSource, sink: MetricSink) -> Self {
        let registrations = MetricKind::ALL
            .into_iter()
            .map(|kind| {
                let sink = sink.clone();
                source.register(
                    kind,
                    Arc::new(move |metric: &Metric| {
                        tracing::debug!(
                            "[PerformanceObserver] {} = {} ({})",
                            kind.as_str(),
                            metric.value,
                            metric.id
                        );
                        sink(PerformanceMetricData::from_metric(kind, metric));
                    }),
                )
            })
            .collect();

        tracing::debug!("[PerformanceObserver] Registered web-vitals callbacks");
        Self { registrations }
    }

    pub fn registration_count(&self) -> usize {
        self.registrations.iter().filter(|r| r.is_active()).count()
    }
}

impl Observer for PerformanceObserver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn stop(&mut self) {
        if self.registrations.is_empty() {
            return;
        }
        for mut registration in self.registrations.drain(..) {
            registration.cancel();
        }
        tracing::debug!("[PerformanceObserver] Stopped");
    }
}
