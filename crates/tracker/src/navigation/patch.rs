//! Navigation source that wraps `BrowserHistory` entry points
//!
//! Subscribing installs wrappers around `push_state` and `replace_state` that
//! run the original mutation first and then notify, and adds a passive
//! `popstate` listener. Cancelling puts the exact original `Arc`s back and
//! removes the listener.
//!
//! Restoring is unconditional: if other code wrapped the entry points after
//! us, its wrappers are removed along with ours.

use std::sync::Arc;

use super::history::{BrowserHistory, ListenerOptions, PopStateEvent, StateFn};
use super::{NavigateCallback, NavigationSource, POPSTATE};
use crate::subscription::Subscription;

pub struct HistoryNavigation {
    history: Arc<BrowserHistory>,
}

impl HistoryNavigation {
    pub fn new(history: Arc<BrowserHistory>) -> Self {
        Self { history }
    }

    pub fn history(&self) -> &Arc<BrowserHistory> {
        &self.history
    }

    fn wrap(original: StateFn, on_navigate: NavigateCallback) -> StateFn {
        Arc::new(move |history: &BrowserHistory, url: &str| {
            original(history, url);
            on_navigate(&history.current_url());
        })
    }
}

impl NavigationSource for HistoryNavigation {
    fn subscribe(&self, on_navigate: NavigateCallback) -> Subscription {
        let original_push = self.history.push_state_fn();
        let original_replace = self.history.replace_state_fn();

        self.history
            .set_push_state_fn(Self::wrap(original_push.clone(), on_navigate.clone()));
        self.history
            .set_replace_state_fn(Self::wrap(original_replace.clone(), on_navigate.clone()));

        let listener = self.history.add_event_listener(
            POPSTATE,
            Arc::new(move |event: &PopStateEvent| on_navigate(event.url())),
            ListenerOptions { passive: true },
        );

        tracing::debug!("[HistoryNavigation] Wrapped history entry points");

        let history = Arc::clone(&self.history);
        Subscription::new(move || {
            history.set_push_state_fn(original_push);
            history.set_replace_state_fn(original_replace);
            history.remove_event_listener(listener);
            tracing::debug!("[HistoryNavigation] Restored history entry points");
        })
    }
}
