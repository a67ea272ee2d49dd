//! In-process metrics source
//!
//! Bindings to a vitals library (or the host itself) push measurements in
//! with `report`; registered callbacks for that kind are invoked in
//! registration order.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{Metric, MetricCallback, MetricKind, MetricsSource};
use crate::subscription::Subscription;

#[derive(Default)]
pub struct MetricsHub {
    callbacks: Arc<DashMap<MetricKind, Vec<(u64, MetricCallback)>>>,
    next_id: AtomicU64,
}

impl MetricsHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a measurement. Returns how many callbacks received it.
    pub fn report(&self, kind: MetricKind, metric: &Metric) -> usize {
        let callbacks: Vec<MetricCallback> = self
            .callbacks
            .get(&kind)
            .map(|entry| entry.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default();

        for callback in &callbacks {
            callback(metric);
        }
        callbacks.len()
    }

    pub fn registration_count(&self, kind: MetricKind) -> usize {
        self.callbacks.get(&kind).map(|entry| entry.len()).unwrap_or(0)
    }

    pub fn total_registrations(&self) -> usize {
        self.callbacks.iter().map(|entry| entry.len()).sum()
    }
}

impl MetricsSource for MetricsHub {
    fn register(&self, kind: MetricKind, callback: MetricCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.callbacks
            .entry(kind)
            .or_default()
            .push((id, callback));

        let callbacks = Arc::clone(&self.callbacks);
        Subscription::new(move || {
            if let Some(mut entry) = callbacks.get_mut(&kind) {
                entry.retain(|(registered, _)| *registered != id);
            }
        })
    }
}
