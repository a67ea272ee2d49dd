//! Navigation observation
//!
//! A `NavigationSource` notifies once per client-side navigation. Two sources
//! ship with the crate:
//!
//! - `HistoryNavigation` wraps the entry points of a `BrowserHistory` and
//!   listens to `popstate`;
//! - `NavigationHub` is fed directly by hosts that get native navigation
//!   events instead.
//!
//! The initial page load is not a navigation. Callers track it themselves.

pub mod history;
pub mod hub;
pub mod patch;

use std::sync::Arc;

use crate::observer::Observer;
use crate::subscription::Subscription;

pub use history::{BrowserHistory, ListenerOptions, PopStateEvent, StateFn};
pub use hub::NavigationHub;
pub use patch::HistoryNavigation;

pub const POPSTATE: &str = "popstate";

/// Called with the URL navigated to
pub type NavigateCallback = Arc<dyn Fn(&str) + Send + Sync>;

pub trait NavigationSource: Send + Sync {
    /// Deliver one notification per navigation until the subscription is
    /// cancelled
    fn subscribe(&self, on_navigate: NavigateCallback) -> Subscription;
}

/// Turns navigation notifications into page views
pub struct NavigationObserver {
    subscription: Subscription,
}

impl NavigationObserver {
    pub const NAME: &'static str = "NavigationObserver";

    pub fn start(source: &dyn NavigationSource, on_navigate: NavigateCallback) -> Self {
        let subscription = source.subscribe(Arc::new(move |url: &str| {
            tracing::debug!("[NavigationObserver] Navigated to {}", url);
            on_navigate(url);
        }));
        tracing::debug!("[NavigationObserver] Started");

        Self { subscription }
    }

    pub fn is_running(&self) -> bool {
        self.subscription.is_active()
    }
}

impl Observer for NavigationObserver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn stop(&mut self) {
        if self.subscription.is_active() {
            self.subscription.cancel();
            tracing::debug!("[NavigationObserver] Stopped");
        }
    }
}
