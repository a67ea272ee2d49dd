//! Collector wire types
//!
//! Every request is an envelope `{ satellite_id, <plural>: [entry] }` holding
//! exactly one entry. Entries pair an `AnalyticKey` with the payload.

use descriptor::{Campaign, ClientDescriptor, DeviceDescriptor};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::performance::observer::PerformanceData;
use crate::performance::MetricKind;
use crate::transport::EndpointKind;

/// Unique key of a captured record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticKey {
    pub key: String,
    /// Nanoseconds since the Unix epoch
    #[serde(with = "bigint")]
    pub collected_at: u64,
}

impl AnalyticKey {
    pub fn generate() -> Self {
        let collected_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_nanos() as u64)
            .unwrap_or_default();

        Self {
            key: Uuid::now_v7().to_string(),
            collected_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViewPayload {
    pub title: String,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub device: DeviceDescriptor,
    pub time_zone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign: Option<Campaign>,
    pub satellite_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViewEntry {
    pub key: AnalyticKey,
    pub page_view: PageViewPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEventPayload {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub satellite_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackEventEntry {
    pub key: AnalyticKey,
    pub track_event: TrackEventPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetricPayload {
    pub href: String,
    pub metric_name: MetricKind,
    pub data: PerformanceData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub satellite_id: String,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetricEntry {
    pub key: AnalyticKey,
    pub performance_metric: PerformanceMetricPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPageViewsRequest {
    pub satellite_id: String,
    pub page_views: Vec<PageViewEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTrackEventsRequest {
    pub satellite_id: String,
    pub track_events: Vec<TrackEventEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetPerformanceMetricsRequest {
    pub satellite_id: String,
    pub performance_metrics: Vec<PerformanceMetricEntry>,
}

/// Any request body the collector accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Envelope {
    PageViews(SetPageViewsRequest),
    TrackEvents(SetTrackEventsRequest),
    PerformanceMetrics(SetPerformanceMetricsRequest),
}

impl Envelope {
    pub fn page_view(satellite_id: impl Into<String>, entry: PageViewEntry) -> Self {
        Envelope::PageViews(SetPageViewsRequest {
            satellite_id: satellite_id.into(),
            page_views: vec![entry],
        })
    }

    pub fn track_event(satellite_id: impl Into<String>, entry: TrackEventEntry) -> Self {
        Envelope::TrackEvents(SetTrackEventsRequest {
            satellite_id: satellite_id.into(),
            track_events: vec![entry],
        })
    }

    pub fn performance_metric(satellite_id: impl Into<String>, entry: PerformanceMetricEntry) -> Self {
        Envelope::PerformanceMetrics(SetPerformanceMetricsRequest {
            satellite_id: satellite_id.into(),
            performance_metrics: vec![entry],
        })
    }

    pub fn kind(&self) -> EndpointKind {
        match self {
            Envelope::PageViews(_) => EndpointKind::PageViews,
            Envelope::TrackEvents(_) => EndpointKind::TrackEvents,
            Envelope::PerformanceMetrics(_) => EndpointKind::PerformanceMetrics,
        }
    }

    pub fn satellite_id(&self) -> &str {
        match self {
            Envelope::PageViews(r) => &r.satellite_id,
            Envelope::TrackEvents(r) => &r.satellite_id,
            Envelope::PerformanceMetrics(r) => &r.satellite_id,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Envelope::PageViews(r) => r.page_views.len(),
            Envelope::TrackEvents(r) => r.track_events.len(),
            Envelope::PerformanceMetrics(r) => r.performance_metrics.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 64-bit integers as `{"__bigint__": "<decimal>"}`
///
/// JavaScript collectors revive this shape into a `BigInt` without losing
/// precision past 2^53.
pub mod bigint {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Tagged {
        #[serde(rename = "__bigint__")]
        value: String,
    }

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        Tagged {
            value: value.to_string(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let tagged = Tagged::deserialize(deserializer)?;
        tagged.value.parse().map_err(D::Error::custom)
    }
}
