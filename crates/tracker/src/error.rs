//! Error types for the tracker
//!
//! Flat hierarchy: one enum per failure source, wrapped by `TrackerError`.

use thiserror::Error;

pub use crate::config::ConfigError;
pub use crate::page::PageError;
pub use crate::transport::TransportError;

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Tracker is not initialized")]
    NotInitialized,

    #[error("Capture failed: {0}")]
    Capture(#[from] PageError),

    #[error("Submission failed: {0}")]
    Transport(#[from] TransportError),
}
