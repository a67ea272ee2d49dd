//! Tracking configuration
//!
//! A `TrackingConfig` is a snapshot: `Tracker::init` takes it by value and a
//! later `init` replaces it wholesale. Nothing is merged between calls.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use url::Url;

/// Local collector used when running against the development container
pub const DEFAULT_CONTAINER_PORT: u16 = 5987;

/// Domain serving production orbiters
pub const PRODUCTION_DOMAIN: &str = "icp0.io";

pub const ENV_SATELLITE_ID: &str = "ORBITER_SATELLITE_ID";
pub const ENV_ORBITER_ID: &str = "ORBITER_ID";
pub const ENV_CONTAINER: &str = "ORBITER_CONTAINER";
pub const ENV_CONTAINER_URL: &str = "ORBITER_CONTAINER_URL";
pub const ENV_PERFORMANCE: &str = "ORBITER_PERFORMANCE";
pub const ENV_USER_AGENT_PARSER: &str = "ORBITER_USER_AGENT_PARSER";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Satellite id is missing")]
    MissingSatelliteId,

    #[error("Orbiter id is missing")]
    MissingOrbiterId,

    #[error("Invalid collector URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

/// Optional features, all off by default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingOptions {
    /// Collect web-vitals through the performance observer
    pub performance: bool,

    /// Attach parsed browser/os/device info to page views
    pub user_agent_parser: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingConfig {
    pub satellite_id: String,
    pub orbiter_id: String,

    /// Send to the local development container instead of production
    #[serde(default)]
    pub container: bool,

    /// Overrides the container collector address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_url: Option<Url>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<TrackingOptions>,
}

impl TrackingConfig {
    pub fn new(satellite_id: impl Into<String>, orbiter_id: impl Into<String>) -> Self {
        Self {
            satellite_id: satellite_id.into(),
            orbiter_id: orbiter_id.into(),
            container: false,
            container_url: None,
            options: None,
        }
    }

    pub fn with_container(mut self, container: bool) -> Self {
        self.container = container;
        self
    }

    pub fn with_container_url(mut self, url: Url) -> Self {
        self.container = true;
        self.container_url = Some(url);
        self
    }

    pub fn with_options(mut self, options: TrackingOptions) -> Self {
        self.options = Some(options);
        self
    }

    /// Read configuration from `ORBITER_*` environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as `from_env`, with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let satellite_id = lookup(ENV_SATELLITE_ID).ok_or(ConfigError::MissingSatelliteId)?;
        let orbiter_id = lookup(ENV_ORBITER_ID).ok_or(ConfigError::MissingOrbiterId)?;

        let flag = |key: &str| -> Result<bool, ConfigError> {
            match lookup(key) {
                Some(value) => parse_flag(key, &value),
                None => Ok(false),
            }
        };

        let container_url = lookup(ENV_CONTAINER_URL)
            .filter(|value| !value.trim().is_empty())
            .map(|value| Url::parse(value.trim()))
            .transpose()?;

        let options = TrackingOptions {
            performance: flag(ENV_PERFORMANCE)?,
            user_agent_parser: flag(ENV_USER_AGENT_PARSER)?,
        };

        let config = Self {
            satellite_id,
            orbiter_id,
            container: flag(ENV_CONTAINER)? || container_url.is_some(),
            container_url,
            options: Some(options),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.satellite_id.trim().is_empty() {
            return Err(ConfigError::MissingSatelliteId);
        }
        if self.orbiter_id.trim().is_empty() {
            return Err(ConfigError::MissingOrbiterId);
        }
        self.collector_url()?;
        Ok(())
    }

    pub fn performance_enabled(&self) -> bool {
        self.options.map(|o| o.performance).unwrap_or(false)
    }

    pub fn user_agent_parser_enabled(&self) -> bool {
        self.options.map(|o| o.user_agent_parser).unwrap_or(false)
    }

    /// Base URL of the collector this configuration targets
    pub fn collector_url(&self) -> Result<Url, ConfigError> {
        if !self.container {
            return Ok(Url::parse(&format!(
                "https://{}.{}",
                self.orbiter_id, PRODUCTION_DOMAIN
            ))?);
        }

        match &self.container_url {
            Some(url) => Ok(url.clone()),
            None => Ok(Url::parse(&format!(
                "http://{}.localhost:{}",
                self.orbiter_id, DEFAULT_CONTAINER_PORT
            ))?),
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
