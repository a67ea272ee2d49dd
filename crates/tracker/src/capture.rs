//! Capture - turns page state into collector entries
//!
//! Runs synchronously at the moment of the tracking call so the recorded
//! geometry and URL are the ones the caller saw.

use descriptor::{Campaign, ClientDescriptor, DeviceDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::TrackingConfig;
use crate::page::{PageEnvironment, PageError};
use crate::performance::PerformanceMetricData;
use crate::protocol::{
    AnalyticKey, PageViewEntry, PageViewPayload, PerformanceMetricEntry, PerformanceMetricPayload,
    TrackEventEntry, TrackEventPayload,
};

/// A named custom event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEvent {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
}

impl TrackEvent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }
}

/// Identity shared by every record of one `init`
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub satellite_id: String,
    pub session_id: String,
    pub parse_user_agent: bool,
}

impl SessionContext {
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            satellite_id: config.satellite_id.clone(),
            session_id: Uuid::now_v7().to_string(),
            parse_user_agent: config.user_agent_parser_enabled(),
        }
    }
}

pub fn page_view(
    page: &dyn PageEnvironment,
    context: &SessionContext,
) -> Result<PageViewEntry, PageError> {
    let device = DeviceDescriptor::new(&page.viewport()?, &page.screen()?);
    let href = page.href()?;
    let user_agent = user_agent(page)?;

    let client = match (&user_agent, context.parse_user_agent) {
        (Some(ua), true) => Some(ClientDescriptor::parse(ua)),
        _ => None,
    };

    let campaign = Campaign::from_href(&href).unwrap_or_else(|e| {
        tracing::debug!("[Capture] No campaign for {}: {}", href, e);
        None
    });

    Ok(PageViewEntry {
        key: AnalyticKey::generate(),
        page_view: PageViewPayload {
            title: page.title()?,
            href,
            referrer: page.referrer()?,
            device,
            time_zone: page.time_zone()?,
            user_agent,
            client,
            campaign,
            satellite_id: context.satellite_id.clone(),
            session_id: context.session_id.clone(),
        },
    })
}

pub fn track_event(
    page: &dyn PageEnvironment,
    context: &SessionContext,
    event: TrackEvent,
) -> Result<TrackEventEntry, PageError> {
    Ok(TrackEventEntry {
        key: AnalyticKey::generate(),
        track_event: TrackEventPayload {
            name: event.name,
            metadata: event.metadata,
            user_agent: user_agent(page)?,
            satellite_id: context.satellite_id.clone(),
            session_id: context.session_id.clone(),
        },
    })
}

pub fn performance_metric(
    page: &dyn PageEnvironment,
    context: &SessionContext,
    metric: PerformanceMetricData,
) -> Result<PerformanceMetricEntry, PageError> {
    Ok(PerformanceMetricEntry {
        key: AnalyticKey::generate(),
        performance_metric: PerformanceMetricPayload {
            href: page.href()?,
            metric_name: metric.metric_name,
            data: metric.data,
            user_agent: user_agent(page)?,
            satellite_id: context.satellite_id.clone(),
            session_id: context.session_id.clone(),
        },
    })
}

// A missing user agent is not a capture failure; a detached page is.
fn user_agent(page: &dyn PageEnvironment) -> Result<Option<String>, PageError> {
    match page.user_agent() {
        Ok(ua) => Ok(Some(ua)),
        Err(PageError::Unavailable(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
