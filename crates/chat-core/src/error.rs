//! Error Types

use market_data::GatewayError;
use thiserror::Error;

use crate::intent::Intent;

/// Result type alias for chat operations
pub type Result<T> = std::result::Result<T, ChatError>;

/// Chat pipeline error types
#[derive(Error, Debug)]
pub enum ChatError {
    /// No coin could be identified (only raised under strict resolution)
    #[error("Could not resolve a coin from: {0}")]
    ResolutionFailure(String),

    /// Market data gateway call failed
    #[error("Market data error: {0}")]
    Gateway(#[from] GatewayError),

    /// Text did not match any accepted phrasing
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// No handler registered for a classified intent
    #[error("No handler registered for intent: {0}")]
    HandlerNotFound(Intent),

    /// Session error
    #[error("Session error: {0}")]
    Session(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChatError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            ChatError::Gateway(e) => e.is_retryable(),
            ChatError::Io(_) => true,
            _ => false,
        }
    }

    /// Convert to a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            ChatError::ResolutionFailure(_) => {
                "Sorry, I couldn't recognise that cryptocurrency. \
                 Try its full name or ticker symbol."
                    .into()
            }
            ChatError::Gateway(GatewayError::RateLimited(_)) => {
                "The market data service is busy right now. \
                 Please wait a moment and try again."
                    .into()
            }
            ChatError::Gateway(_) => {
                "Sorry, I couldn't reach the market data service. \
                 Please try again in a moment."
                    .into()
            }
            ChatError::MalformedInput(msg) => format!("I didn't understand that: {msg}"),
            ChatError::Session(_) => "Your conversation could not be loaded or saved.".into(),
            _ => "Sorry, I encountered an error processing your request. Please try again.".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_errors_convert() {
        let err: ChatError = GatewayError::RateLimited("/search".into()).into();
        assert!(err.is_retryable());
        assert!(err.user_message().contains("busy"));

        let err: ChatError = GatewayError::NotFound("pepe".into()).into();
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_handler_not_found_display() {
        let err = ChatError::HandlerNotFound(Intent::Chart);
        assert_eq!(err.to_string(), "No handler registered for intent: chart");
    }
}
