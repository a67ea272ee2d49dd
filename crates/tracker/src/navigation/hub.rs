//! Navigation source driven by native host events

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::{NavigateCallback, NavigationSource};
use crate::subscription::Subscription;

/// The host calls `notify` whenever its router or webview navigates
#[derive(Default)]
pub struct NavigationHub {
    subscribers: Arc<DashMap<u64, NavigateCallback>>,
    next_id: AtomicU64,
}

impl NavigationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self, url: &str) {
        let callbacks: Vec<NavigateCallback> = self
            .subscribers
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        for callback in callbacks {
            callback(url);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl NavigationSource for NavigationHub {
    fn subscribe(&self, on_navigate: NavigateCallback) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.insert(id, on_navigate);

        let subscribers = Arc::clone(&self.subscribers);
        Subscription::new(move || {
            subscribers.remove(&id);
        })
    }
}
