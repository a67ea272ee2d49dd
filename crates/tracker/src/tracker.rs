//! Tracker - the tracking lifecycle manager
//!
//! Owns the active session: configuration snapshot, dispatcher and the
//! observers started by `init`. Every public entry point works against this
//! one context object, so tests (or several embedded pages) can each hold
//! their own.
//!
//! Locking: the state lock is never held while source code runs. `init`
//! swaps the session in under the lock, then starts observers outside it and
//! attaches them only if that session is still current. Teardown takes the
//! observers out before stopping them. Capture paths hold the lock just long
//! enough to clone what they need. Observer callbacks keep a `Weak` to the
//! tracker so the session never keeps itself alive.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::capture::{self, SessionContext, TrackEvent};
use crate::config::TrackingConfig;
use crate::dispatch::{self, Dispatcher, Submission};
use crate::error::{Result, TrackerError};
use crate::navigation::{NavigateCallback, NavigationHub, NavigationObserver, NavigationSource};
use crate::observer::{Observer, ObserverSet};
use crate::page::PageEnvironment;
use crate::performance::observer::MetricSink;
use crate::performance::{
    Metric, MetricKind, MetricsHub, MetricsSource, PerformanceMetricData, PerformanceObserver,
};
use crate::transport::{OrbiterApi, Transport};

/// State created by one `init`
struct ActiveSession {
    generation: u64,
    config: Arc<TrackingConfig>,
    context: SessionContext,
    dispatcher: Dispatcher,
    observers: ObserverSet,
}

struct Inner {
    page: Arc<dyn PageEnvironment>,
    navigation: Arc<dyn NavigationSource>,
    metrics: Arc<dyn MetricsSource>,
    transport: Option<Arc<dyn Transport>>,
    state: Mutex<Option<ActiveSession>>,
    generation: AtomicU64,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn snapshot(&self) -> Result<(SessionContext, Dispatcher)> {
        let state = self.state();
        let session = state.as_ref().ok_or(TrackerError::NotInitialized)?;
        Ok((session.context.clone(), session.dispatcher.clone()))
    }

    fn page_view_submission(&self) -> Result<Submission> {
        let (context, dispatcher) = self.snapshot()?;
        let entry = capture::page_view(self.page.as_ref(), &context)?;
        Ok(dispatcher.page_view(entry))
    }

    fn track_event_submission(&self, event: TrackEvent) -> Result<Submission> {
        let (context, dispatcher) = self.snapshot()?;
        let entry = capture::track_event(self.page.as_ref(), &context, event)?;
        Ok(dispatcher.track_event(entry))
    }

    fn metric_submission(&self, metric: PerformanceMetricData) -> Result<Submission> {
        let (context, dispatcher) = self.snapshot()?;
        let entry = capture::performance_metric(self.page.as_ref(), &context, metric)?;
        Ok(dispatcher.performance_metric(entry))
    }

    /// Tear down the active session, or only the given generation of it
    fn teardown(&self, generation: Option<u64>) -> bool {
        let session = {
            let mut state = self.state();
            let matches = match (state.as_ref(), generation) {
                (Some(session), Some(generation)) => session.generation == generation,
                (Some(_), None) => true,
                (None, _) => false,
            };
            if !matches {
                return false;
            }
            state.take()
        };

        if let Some(mut session) = session {
            session.observers.stop_all();
            tracing::info!(
                "[Tracker] Cleaned up session {} ({})",
                session.context.session_id,
                session.config.satellite_id
            );
        }
        true
    }

    /// Hand observers started outside the lock to session `generation`
    ///
    /// Observers are stopped instead when that session is gone or already
    /// runs one of the same name. Returns how many were kept.
    fn attach(&self, generation: u64, observers: Vec<Box<dyn Observer>>) -> usize {
        let mut rejected = ObserverSet::new();
        let attached = {
            let mut state = self.state();
            match state.as_mut() {
                Some(session) if session.generation == generation => {
                    let mut attached = 0;
                    for observer in observers {
                        if session.observers.contains(observer.name()) {
                            rejected.register(observer);
                        } else {
                            session.observers.register(observer);
                            attached += 1;
                        }
                    }
                    attached
                }
                _ => {
                    for observer in observers {
                        rejected.register(observer);
                    }
                    0
                }
            }
        };

        if !rejected.is_empty() {
            tracing::debug!(
                "[Tracker] Dropping {} observers of generation {}",
                rejected.len(),
                generation
            );
            rejected.stop_all();
        }
        attached
    }
}

/// Returned by `init`; tears down what that `init` started
#[must_use = "call cleanup() to stop tracking"]
pub struct InitHandle {
    inner: Weak<Inner>,
    generation: u64,
}

impl InitHandle {
    /// Stop the observers started by this `init`. A no-op once the tracker
    /// was re-initialized or cleaned up.
    pub fn cleanup(&self) {
        if let Some(inner) = self.inner.upgrade() {
            if !inner.teardown(Some(self.generation)) {
                tracing::debug!(
                    "[Tracker] Session generation {} already replaced",
                    self.generation
                );
            }
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

pub struct TrackerBuilder {
    page: Arc<dyn PageEnvironment>,
    navigation: Option<Arc<dyn NavigationSource>>,
    metrics: Option<Arc<dyn MetricsSource>>,
    transport: Option<Arc<dyn Transport>>,
}

impl TrackerBuilder {
    pub fn navigation(mut self, navigation: Arc<dyn NavigationSource>) -> Self {
        self.navigation = Some(navigation);
        self
    }

    pub fn metrics(mut self, metrics: Arc<dyn MetricsSource>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Replace the HTTP transport `init` would build from the configuration
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Tracker {
        Tracker {
            inner: Arc::new(Inner {
                page: self.page,
                navigation: self
                    .navigation
                    .unwrap_or_else(|| Arc::new(NavigationHub::new())),
                metrics: self.metrics.unwrap_or_else(|| Arc::new(MetricsHub::new())),
                transport: self.transport,
                state: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }
}

#[derive(Clone)]
pub struct Tracker {
    inner: Arc<Inner>,
}

impl Tracker {
    pub fn builder(page: Arc<dyn PageEnvironment>) -> TrackerBuilder {
        TrackerBuilder {
            page,
            navigation: None,
            metrics: None,
            transport: None,
        }
    }

    /// Start tracking with `config`, replacing any previous session
    ///
    /// Fails before touching the current session if the configuration is
    /// invalid.
    pub fn init(&self, config: TrackingConfig) -> Result<InitHandle> {
        config.validate()?;

        let transport: Arc<dyn Transport> = match &self.inner.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(OrbiterApi::new(&config)?),
        };

        let context = SessionContext::new(&config);
        let dispatcher = Dispatcher::new(config.satellite_id.clone(), transport);
        let performance = config.performance_enabled();
        let config = Arc::new(config);
        let session_id = context.session_id.clone();

        // Install first, start observers after: sources may call back into
        // the tracker from inside subscribe/register.
        let (generation, previous) = {
            let mut state = self.inner.state();
            let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let previous = state.take();
            *state = Some(ActiveSession {
                generation,
                config: Arc::clone(&config),
                context,
                dispatcher,
                observers: ObserverSet::new(),
            });
            (generation, previous)
        };

        if let Some(mut previous) = previous {
            previous.observers.stop_all();
            tracing::debug!(
                "[Tracker] Replaced session {}",
                previous.context.session_id
            );
        }

        let mut observers: Vec<Box<dyn Observer>> = Vec::new();
        observers.push(Box::new(NavigationObserver::start(
            self.inner.navigation.as_ref(),
            self.navigation_callback(),
        )));
        if performance {
            observers.push(Box::new(PerformanceObserver::start(
                self.inner.metrics.as_ref(),
                self.metric_sink(),
            )));
        }
        let attached = self.inner.attach(generation, observers);

        tracing::info!(
            "[Tracker] Initialized session {} for satellite {} ({} observers)",
            session_id,
            config.satellite_id,
            attached
        );

        Ok(InitHandle {
            inner: Arc::downgrade(&self.inner),
            generation,
        })
    }

    /// Stop every observer and forget the session. Always safe to call.
    pub fn cleanup(&self) {
        if !self.inner.teardown(None) {
            tracing::debug!("[Tracker] Nothing to clean up");
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.state().is_some()
    }

    pub fn config(&self) -> Option<Arc<TrackingConfig>> {
        self.inner
            .state()
            .as_ref()
            .map(|session| Arc::clone(&session.config))
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner
            .state()
            .as_ref()
            .map(|session| session.context.session_id.clone())
    }

    /// Record a page view without waiting for it
    pub fn track_page_view(&self) {
        dispatch::fire("page view", self.inner.page_view_submission());
    }

    pub async fn track_page_view_async(&self) -> Result<()> {
        self.inner.page_view_submission()?.await?;
        Ok(())
    }

    pub fn track_event(&self, event: TrackEvent) {
        dispatch::fire("track event", self.inner.track_event_submission(event));
    }

    pub async fn track_event_async(&self, event: TrackEvent) -> Result<()> {
        self.inner.track_event_submission(event)?.await?;
        Ok(())
    }

    /// Record a metric measured outside the registered metrics source
    pub fn track_performance_metric(&self, kind: MetricKind, metric: &Metric) {
        let data = PerformanceMetricData::from_metric(kind, metric);
        dispatch::fire("performance metric", self.inner.metric_submission(data));
    }

    pub async fn track_performance_metric_async(
        &self,
        kind: MetricKind,
        metric: &Metric,
    ) -> Result<()> {
        let data = PerformanceMetricData::from_metric(kind, metric);
        self.inner.metric_submission(data)?.await?;
        Ok(())
    }

    /// Register the performance observer if the session enables it
    ///
    /// Does nothing when performance tracking is off or already running.
    pub fn start_track_performance(&self) {
        let generation = {
            let state = self.inner.state();

            let Some(session) = state.as_ref() else {
                tracing::debug!("[Tracker] Performance not started: not initialized");
                return;
            };

            if !session.config.performance_enabled() {
                return;
            }

            if session.observers.contains(PerformanceObserver::NAME) {
                tracing::debug!("[Tracker] Performance observer already running");
                return;
            }
            session.generation
        };

        let observer: Box<dyn Observer> = Box::new(PerformanceObserver::start(
            self.inner.metrics.as_ref(),
            self.metric_sink(),
        ));
        self.inner.attach(generation, vec![observer]);
    }

    fn navigation_callback(&self) -> NavigateCallback {
        let inner = Arc::downgrade(&self.inner);
        Arc::new(move |_url: &str| {
            if let Some(inner) = inner.upgrade() {
                dispatch::fire("page view", inner.page_view_submission());
            }
        })
    }

    fn metric_sink(&self) -> MetricSink {
        let inner = Arc::downgrade(&self.inner);
        Arc::new(move |metric: PerformanceMetricData| {
            if let Some(inner) = inner.upgrade() {
                dispatch::fire("performance metric", inner.metric_submission(metric));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackingOptions;
    use crate::navigation::HistoryNavigation;
    use crate::protocol::Envelope;
    use crate::performance::MetricCallback;
    use crate::subscription::Subscription;
    use crate::test_support::{memory_page, RecordingTransport};
    use crate::transport::EndpointKind;
    use std::sync::mpsc;
    use std::time::Duration;

    struct Fixture {
        tracker: Tracker,
        page: Arc<crate::page::MemoryPage>,
        metrics: Arc<MetricsHub>,
        transport: Arc<RecordingTransport>,
    }

    fn fixture() -> Fixture {
        let page = memory_page();
        let metrics = Arc::new(MetricsHub::new());
        let transport = RecordingTransport::new();
        let tracker = Tracker::builder(page.clone())
            .navigation(Arc::new(HistoryNavigation::new(page.history())))
            .metrics(metrics.clone())
            .transport(transport.clone())
            .build();

        Fixture {
            tracker,
            page,
            metrics,
            transport,
        }
    }

    /// Replays a buffered TTFB measurement from inside `register`
    #[derive(Default)]
    struct ReplayingMetrics {
        hub: MetricsHub,
    }

    impl MetricsSource for ReplayingMetrics {
        fn register(&self, kind: MetricKind, callback: MetricCallback) -> Subscription {
            if kind == MetricKind::Ttfb {
                callback(&Metric::new("v4-ttfb", 80.0));
            }
            self.hub.register(kind, callback)
        }
    }

    /// Notifies from inside `subscribe` and again while unsubscribing
    #[derive(Default)]
    struct EagerNavigation {
        hub: NavigationHub,
    }

    impl NavigationSource for EagerNavigation {
        fn subscribe(&self, on_navigate: NavigateCallback) -> Subscription {
            on_navigate("https://example.com/");
            let mut registration = self.hub.subscribe(on_navigate.clone());
            Subscription::new(move || {
                registration.cancel();
                on_navigate("https://example.com/leaving");
            })
        }
    }

    /// Run `f` on its own thread inside the current runtime, failing the test
    /// if it does not return in time
    fn within<T, F>(f: F) -> T
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let runtime = tokio::runtime::Handle::current();
        std::thread::spawn(move || {
            let _guard = runtime.enter();
            let _ = tx.send(f());
        });
        rx.recv_timeout(Duration::from_secs(3))
            .expect("tracker call did not return")
    }

    fn config(performance: bool) -> TrackingConfig {
        TrackingConfig::new("sat", "orb").with_options(TrackingOptions {
            performance,
            user_agent_parser: false,
        })
    }

    #[test]
    fn test_cleanup_without_init() {
        let f = fixture();
        f.tracker.cleanup();
        f.tracker.cleanup();
        assert!(!f.tracker.is_initialized());
    }

    #[test]
    fn test_invalid_config_keeps_previous_session() {
        let f = fixture();
        let _handle = f.tracker.init(config(false)).unwrap();
        let session = f.tracker.session_id();

        let err = f
            .tracker
            .init(TrackingConfig::new("", "orb"))
            .err()
            .unwrap();
        assert!(matches!(err, TrackerError::Config(_)));
        assert_eq!(f.tracker.session_id(), session);
    }

    #[tokio::test]
    async fn test_async_before_init_is_error() {
        let f = fixture();
        assert!(matches!(
            f.tracker.track_page_view_async().await,
            Err(TrackerError::NotInitialized)
        ));
        // Fire-and-forget stays silent
        f.tracker.track_page_view();
        f.tracker.track_event(TrackEvent::new("click"));
        assert_eq!(f.transport.count(), 0);
    }

    #[tokio::test]
    async fn test_satellite_id_from_active_config() {
        let f = fixture();
        let _first = f.tracker.init(config(false)).unwrap();
        f.tracker.track_page_view_async().await.unwrap();

        let _second = f
            .tracker
            .init(TrackingConfig::new("other-sat", "orb"))
            .unwrap();
        f.tracker.track_page_view_async().await.unwrap();

        let satellites: Vec<String> = f
            .transport
            .submissions()
            .iter()
            .map(|(_, envelope)| envelope.satellite_id().to_string())
            .collect();
        assert_eq!(satellites, vec!["sat".to_string(), "other-sat".to_string()]);
    }

    #[test]
    fn test_stale_handle_does_not_tear_down_new_session() {
        let f = fixture();
        let first = f.tracker.init(config(false)).unwrap();
        let second = f.tracker.init(config(false)).unwrap();

        first.cleanup();
        assert!(f.tracker.is_initialized());

        second.cleanup();
        assert!(!f.tracker.is_initialized());
        second.cleanup();
    }

    #[test]
    fn test_start_track_performance_is_idempotent() {
        let f = fixture();
        let _handle = f.tracker.init(config(true)).unwrap();

        f.tracker.start_track_performance();
        f.tracker.start_track_performance();
        for kind in MetricKind::ALL {
            assert_eq!(f.metrics.registration_count(kind), 1);
        }

        f.tracker.cleanup();
        assert_eq!(f.metrics.total_registrations(), 0);
    }

    #[test]
    fn test_start_track_performance_disabled() {
        let f = fixture();
        let _handle = f.tracker.init(config(false)).unwrap();

        f.tracker.start_track_performance();
        assert_eq!(f.metrics.total_registrations(), 0);
    }

    #[tokio::test]
    async fn test_navigation_tracks_page_views() {
        let f = fixture();
        let _handle = f.tracker.init(config(false)).unwrap();

        f.page.history().push_state("/pricing");
        f.transport.wait_for(1).await;

        match &f.transport.submissions()[0] {
            (EndpointKind::PageViews, Envelope::PageViews(request)) => {
                assert_eq!(
                    request.page_views[0].page_view.href,
                    "https://example.com/pricing"
                );
            }
            other => panic!("Expected page view, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_metric_reports_are_dispatched() {
        let f = fixture();
        let _handle = f.tracker.init(config(true)).unwrap();

        f.metrics
            .report(MetricKind::Cls, &Metric::new("v3-cls", 0.02));
        f.transport.wait_for(1).await;

        let (kind, envelope) = &f.transport.submissions()[0];
        assert_eq!(*kind, EndpointKind::PerformanceMetrics);
        assert_eq!(envelope.len(), 1);
    }

    #[test]
    fn test_dropping_tracker_releases_observers() {
        let f = fixture();
        let history = f.page.history();
        let push = history.push_state_fn();

        let handle = f.tracker.init(config(true)).unwrap();
        drop(f.tracker);

        assert!(Arc::ptr_eq(&push, &history.push_state_fn()));
        assert_eq!(f.metrics.total_registrations(), 0);
        // Handle outlived the tracker
        handle.cleanup();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_metric_reported_during_register() {
        let metrics = Arc::new(ReplayingMetrics::default());
        let transport = RecordingTransport::new();
        let tracker = Tracker::builder(memory_page())
            .metrics(metrics.clone())
            .transport(transport.clone())
            .build();

        let init_tracker = tracker.clone();
        let _handle = within(move || init_tracker.init(config(true))).unwrap();
        transport.wait_for(1).await;

        let (kind, _) = &transport.submissions()[0];
        assert_eq!(*kind, EndpointKind::PerformanceMetrics);

        let start_tracker = tracker.clone();
        within(move || start_tracker.start_track_performance());
        assert_eq!(metrics.hub.registration_count(MetricKind::Ttfb), 1);

        within(move || tracker.cleanup());
        assert_eq!(metrics.hub.total_registrations(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_navigation_notified_during_subscribe_and_cancel() {
        let navigation = Arc::new(EagerNavigation::default());
        let transport = RecordingTransport::new();
        let tracker = Tracker::builder(memory_page())
            .navigation(navigation.clone())
            .transport(transport.clone())
            .build();

        let init_tracker = tracker.clone();
        let _handle = within(move || init_tracker.init(config(false))).unwrap();
        transport.wait_for(1).await;
        assert_eq!(navigation.hub.subscriber_count(), 1);

        // Re-init stops the first observer while the second starts
        let reinit_tracker = tracker.clone();
        let _handle = within(move || reinit_tracker.init(config(false))).unwrap();
        assert_eq!(navigation.hub.subscriber_count(), 1);

        let cleanup_tracker = tracker.clone();
        within(move || cleanup_tracker.cleanup());
        assert!(!tracker.is_initialized());
        assert_eq!(navigation.hub.subscriber_count(), 0);
    }

    #[test]
    fn test_unreachable_orbiter_rejected_with_injected_transport() {
        let f = fixture();
        let err = f
            .tracker
            .init(TrackingConfig::new("sat", "bad host"))
            .err()
            .unwrap();
        assert!(matches!(err, TrackerError::Config(_)));
        assert!(!f.tracker.is_initialized());
    }
}
