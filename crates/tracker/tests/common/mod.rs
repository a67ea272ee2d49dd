//! Fixtures shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use descriptor::Screen;
use tracker::protocol::Envelope;
use tracker::transport::{EndpointKind, Transport, TransportError};
use tracker::{HistoryNavigation, MemoryPage, MetricsHub, Tracker, TrackingConfig, TrackingOptions};

pub const IPHONE_SAFARI: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

/// Transport that records every submission instead of sending it
#[derive(Default)]
pub struct RecordingTransport {
    submissions: Mutex<Vec<(EndpointKind, Envelope)>>,
    fail: bool,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Records, then answers every submission with a 503
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            submissions: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn submissions(&self) -> Vec<(EndpointKind, Envelope)> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self) -> usize {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Wait until at least `n` submissions arrived, panicking after a second
    pub async fn wait_for(&self, n: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(1), async {
            while self.count() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "Expected {} submissions, got {}",
            n,
            self.count()
        );
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn submit(&self, kind: EndpointKind, envelope: Envelope) -> Result<(), TransportError> {
        self.submissions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, envelope));

        if self.fail {
            return Err(TransportError::Status {
                status: 503,
                body: "collector unavailable".to_string(),
            });
        }
        Ok(())
    }
}

pub struct Harness {
    pub tracker: Tracker,
    pub page: Arc<MemoryPage>,
    pub metrics: Arc<MetricsHub>,
    pub transport: Arc<RecordingTransport>,
}

/// Tracker over a 1024x768 page on a 1920x1080 screen (1040 available)
pub fn harness(transport: Arc<RecordingTransport>) -> Harness {
    let page = Arc::new(MemoryPage::with_url("https://example.com/"));
    page.set_viewport(1024, 768);
    page.set_screen(Screen {
        width: 1920,
        height: 1080,
        avail_width: 1920,
        avail_height: 1040,
    });
    page.set_title("Home");
    page.set_user_agent(IPHONE_SAFARI);

    let metrics = Arc::new(MetricsHub::new());
    let tracker = Tracker::builder(page.clone())
        .navigation(Arc::new(HistoryNavigation::new(page.history())))
        .metrics(metrics.clone())
        .transport(transport.clone())
        .build();

    Harness {
        tracker,
        page,
        metrics,
        transport,
    }
}

pub fn config(performance: bool, user_agent_parser: bool) -> TrackingConfig {
    TrackingConfig::new("sat-1", "orb-1").with_options(TrackingOptions {
        performance,
        user_agent_parser,
    })
}
