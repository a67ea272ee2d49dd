//! Error types for descriptor parsing

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DescriptorError>;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}
