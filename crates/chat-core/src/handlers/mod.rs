//! Response Handlers
//!
//! One handler per intent. A handler is the error boundary for its own
//! gateway calls: it always produces a `Reply`, turning failures into an
//! error message and leaving holdings untouched.

mod chart;
mod help;
mod portfolio_update;
mod portfolio_value;
mod price;
mod trending;

pub use chart::ChartHandler;
pub use help::HelpHandler;
pub use portfolio_update::{ParsedUpdate, PortfolioUpdateHandler, parse_update};
pub use portfolio_value::PortfolioValueHandler;
pub use price::PriceHandler;
pub use trending::TrendingHandler;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use market_data::MarketDataGateway;

use crate::error::{ChatError, Result};
use crate::intent::Intent;
use crate::message::Message;
use crate::portfolio::Holding;
use crate::resolver::EntityResolver;

/// Input of one turn
#[derive(Clone, Copy, Debug)]
pub struct Turn<'a> {
    /// Normalized user text
    pub text: &'a str,

    /// Holdings snapshot at the start of the turn
    pub holdings: &'a [Holding],
}

/// Output of one turn
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
    pub message: Message,

    /// Replacement holdings, present only after a successful portfolio change
    pub updated_holdings: Option<Vec<Holding>>,
}

impl Reply {
    pub fn new(message: Message) -> Self {
        Self {
            message,
            updated_holdings: None,
        }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(Message::text(content))
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(Message::error(content))
    }

    pub fn with_holdings(mut self, holdings: Vec<Holding>) -> Self {
        self.updated_holdings = Some(holdings);
        self
    }
}

/// Handler trait - implement to answer an intent
#[async_trait]
pub trait Handler: Send + Sync {
    /// Intent this handler answers
    fn intent(&self) -> Intent;

    /// Produce the reply for a turn. Never fails.
    async fn handle(&self, turn: &Turn<'_>) -> Reply;
}

/// Convert a handler's internal result into a reply.
///
/// Resolution failures get their own explanation; every other error gets
/// the handler's `failure_text`.
pub(crate) fn settle(intent: Intent, result: Result<Reply>, failure_text: &str) -> Reply {
    match result {
        Ok(reply) => reply,
        Err(e @ ChatError::ResolutionFailure(_)) => {
            tracing::info!(%intent, error = %e, "Coin not recognised");
            Reply::error(e.user_message())
        }
        Err(e) => {
            tracing::warn!(%intent, error = %e, "Handler failed");
            Reply::error(failure_text)
        }
    }
}

/// Registry of handlers by intent
pub struct HandlerRegistry {
    handlers: HashMap<Intent, Arc<dyn Handler>>,
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Registry answering every intent with the built-in handlers
    pub fn with_defaults(
        gateway: Arc<dyn MarketDataGateway>,
        resolver: Arc<EntityResolver>,
        chart_days: u32,
    ) -> Self {
        let mut registry = Self::new();
        registry.register(PriceHandler::new(resolver.clone(), gateway.clone()));
        registry.register(TrendingHandler::new(gateway.clone()));
        registry.register(ChartHandler::new(resolver.clone(), gateway.clone(), chart_days));
        registry.register(PortfolioUpdateHandler::new(resolver, gateway.clone()));
        registry.register(PortfolioValueHandler::new(gateway));
        registry.register(HelpHandler);
        registry
    }

    /// Register a handler, replacing any previous one for its intent
    pub fn register<H: Handler + 'static>(&mut self, handler: H) {
        self.handlers.insert(handler.intent(), Arc::new(handler));
    }

    /// Register a shared handler
    pub fn register_shared(&mut self, handler: Arc<dyn Handler>) {
        self.handlers.insert(handler.intent(), handler);
    }

    /// Get the handler for an intent
    pub fn get(&self, intent: Intent) -> Option<Arc<dyn Handler>> {
        self.handlers.get(&intent).cloned()
    }

    /// Intents without a handler
    pub fn missing(&self) -> Vec<Intent> {
        Intent::ALL
            .into_iter()
            .filter(|intent| !self.handlers.contains_key(intent))
            .collect()
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
