//! Error Types for the Market Data Gateway

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// Unknown coin identifier or endpoint
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider answered with an error status or an unusable body
    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl GatewayError {
    /// Check if the failed call may succeed when repeated
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::RateLimited(_) | GatewayError::Network(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GatewayError::RateLimited("/search".into()).is_retryable());
        assert!(!GatewayError::NotFound("pepe".into()).is_retryable());
        assert!(!GatewayError::Provider("500".into()).is_retryable());
        assert!(GatewayError::NotFound("pepe".into()).is_not_found());
    }
}
