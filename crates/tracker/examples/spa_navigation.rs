//! Single-page app example - page views on history navigation
//!
//! Posts to a local collector (`ORBITER_CONTAINER_URL`, default
//! `http://{orbiter}.localhost:5987`). Without one running, submissions fail
//! and show up as debug logs.

use std::sync::Arc;
use std::time::Duration;

use tracker::{
    HistoryNavigation, MemoryPage, Metric, MetricKind, MetricsHub, TrackEvent, Tracker,
    TrackingConfig, TrackingOptions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = match TrackingConfig::from_env() {
        Ok(config) => config,
        Err(_) => TrackingConfig::new("example-satellite", "example-orbiter")
            .with_container(true)
            .with_options(TrackingOptions {
                performance: true,
                user_agent_parser: true,
            }),
    };
    println!("Collector: {}", config.collector_url()?);

    let page = Arc::new(MemoryPage::with_url("https://shop.example.com/?utm_source=newsletter"));
    page.set_title("Shop");
    page.set_user_agent(
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
         (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    );

    let metrics = Arc::new(MetricsHub::new());
    let tracker = Tracker::builder(page.clone())
        .navigation(Arc::new(HistoryNavigation::new(page.history())))
        .metrics(metrics.clone())
        .build();

    let handle = tracker.init(config)?;
    println!("Session: {:?}", tracker.session_id());

    // Initial page view is ours to send
    if let Err(e) = tracker.track_page_view_async().await {
        println!("Initial page view failed: {}", e);
    }

    // Navigation is picked up by the observer
    let history = page.history();
    history.push_state("/products");
    history.push_state("/products/42");
    history.back();

    tracker.track_event(TrackEvent::new("add_to_cart").with_metadata("product", "42"));
    metrics.report(MetricKind::Lcp, &Metric::new("v4-lcp-1", 1830.0));

    // Let detached submissions finish
    tokio::time::sleep(Duration::from_secs(1)).await;

    handle.cleanup();
    println!("Tracking stopped, initialized: {}", tracker.is_initialized());

    Ok(())
}
