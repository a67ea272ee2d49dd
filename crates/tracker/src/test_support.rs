//! Shared fixtures for unit tests

use async_trait::async_trait;
use descriptor::{DeviceDescriptor, Screen, Viewport};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::page::MemoryPage;
use crate::protocol::{AnalyticKey, Envelope, PageViewEntry, PageViewPayload};
use crate::transport::{EndpointKind, Transport, TransportError};

/// 1024x768 viewport on a 1920x1080 screen with a 40px taskbar
pub fn memory_page() -> Arc<MemoryPage> {
    let page = MemoryPage::with_url("https://example.com/");
    page.set_viewport(1024, 768);
    page.set_screen(Screen {
        width: 1920,
        height: 1080,
        avail_width: 1920,
        avail_height: 1040,
    });
    page.set_title("Example");
    page.set_user_agent(IPHONE_SAFARI);
    Arc::new(page)
}

pub fn page_view_entry(satellite_id: &str) -> PageViewEntry {
    PageViewEntry {
        key: AnalyticKey::generate(),
        page_view: PageViewPayload {
            title: "Example".to_string(),
            href: "https://example.com/".to_string(),
            referrer: None,
            device: DeviceDescriptor::new(
                &Viewport {
                    inner_width: 1024,
                    inner_height: 768,
                },
                &Screen::full(1920, 1080),
            ),
            time_zone: "UTC".to_string(),
            user_agent: None,
            client: None,
            campaign: None,
            satellite_id: satellite_id.to_string(),
            session_id: "session".to_string(),
        },
    }
}

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
