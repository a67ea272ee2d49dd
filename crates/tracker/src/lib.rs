//! Orbiter tracking client
//!
//! Observes navigation, custom events and web-vitals reports of a host page
//! and relays each one, as a single-entry batch, to an orbiter collector.
//!
//! # Layout
//!
//! 1. **Tracker**: the lifecycle manager. `init` starts observers, `cleanup`
//!    stops them, the `track_*` calls capture and dispatch.
//! 2. **Sources**: the host page is reached through `PageEnvironment`,
//!    `NavigationSource` and `MetricsSource`. Reference implementations
//!    (`MemoryPage`, `HistoryNavigation`, `NavigationHub`, `MetricsHub`)
//!    ship here.
//! 3. **Dispatch**: one envelope per record, handed to a `Transport`.
//!    `OrbiterApi` is the HTTP one.

pub mod capture;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod navigation;
pub mod observer;
pub mod page;
pub mod performance;
pub mod protocol;
pub mod subscription;
pub mod tracker;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use capture::TrackEvent;
pub use config::{TrackingConfig, TrackingOptions};
pub use error::{Result, TrackerError};
pub use navigation::{BrowserHistory, HistoryNavigation, NavigationHub, NavigationSource};
pub use page::{MemoryPage, PageEnvironment};
pub use performance::{Metric, MetricKind, MetricsHub, MetricsSource};
pub use subscription::Subscription;
pub use tracker::{InitHandle, Tracker, TrackerBuilder};
pub use transport::{OrbiterApi, Transport};
