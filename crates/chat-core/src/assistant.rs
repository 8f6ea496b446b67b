//! Assistant
//!
//! Runs one turn of the pipeline: normalize, classify, dispatch to the
//! intent's handler, and apply any holdings change to the session.

use std::sync::Arc;

use market_data::MarketDataGateway;

use crate::error::{ChatError, Result};
use crate::handlers::{Handler, HandlerRegistry, Reply, Turn};
use crate::intent::{self, Intent};
use crate::message::Message;
use crate::portfolio::Holding;
use crate::resolver::{CoinAlias, DEFAULT_COIN, EntityResolver, ResolutionPolicy};
use crate::session::Session;

/// Assistant configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssistantConfig {
    /// Coin used when a message names none
    pub default_coin: String,

    /// Days of history in a chart reply
    pub chart_days: u32,

    pub resolution_policy: ResolutionPolicy,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            default_coin: DEFAULT_COIN.into(),
            chart_days: market_data::DEFAULT_SERIES_DAYS,
            resolution_policy: ResolutionPolicy::default(),
        }
    }
}

impl AssistantConfig {
    /// Read `DEFAULT_COIN`, `CHART_DAYS` and `RESOLUTION_POLICY` (`lenient`|`strict`)
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let default_coin = std::env::var("DEFAULT_COIN")
            .map(|coin| coin.trim().to_lowercase())
            .unwrap_or(defaults.default_coin);

        let chart_days = match std::env::var("CHART_DAYS") {
            Ok(days) => days
                .parse()
                .map_err(|_| ChatError::Config(format!("CHART_DAYS is not a number: {days}")))?,
            Err(_) => defaults.chart_days,
        };

        let resolution_policy = match std::env::var("RESOLUTION_POLICY").as_deref() {
            Ok("strict") => ResolutionPolicy::Strict,
            Ok("lenient") | Err(_) => ResolutionPolicy::Lenient,
            Ok(other) => {
                return Err(ChatError::Config(format!("unknown RESOLUTION_POLICY: {other}")));
            }
        };

        let config = Self {
            default_coin,
            chart_days,
            resolution_policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no turn could run with
    pub fn validate(&self) -> Result<()> {
        if self.default_coin.trim().is_empty() {
            return Err(ChatError::Config("default coin must not be empty".into()));
        }
        if self.chart_days == 0 {
            return Err(ChatError::Config("chart_days must be at least 1".into()));
        }
        Ok(())
    }
}

/// The conversation pipeline
pub struct Assistant {
    gateway: Arc<dyn MarketDataGateway>,
    handlers: Arc<HandlerRegistry>,
    config: AssistantConfig,
}

impl Assistant {
    /// Create an assistant with the built-in handlers
    pub fn new(gateway: Arc<dyn MarketDataGateway>, config: AssistantConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(gateway, config))
    }

    /// Create with default configuration
    pub fn with_defaults(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self::assemble(gateway, AssistantConfig::default())
    }

    fn assemble(gateway: Arc<dyn MarketDataGateway>, config: AssistantConfig) -> Self {
        let resolver = Arc::new(Self::resolver(gateway.clone(), &config, None));
        let handlers = HandlerRegistry::with_defaults(gateway.clone(), resolver, config.chart_days);

        Self {
            gateway,
            handlers: Arc::new(handlers),
            config,
        }
    }

    fn resolver(
        gateway: Arc<dyn MarketDataGateway>,
        config: &AssistantConfig,
        aliases: Option<Vec<CoinAlias>>,
    ) -> EntityResolver {
        let resolver = EntityResolver::new(gateway)
            .with_default_coin(config.default_coin.clone())
            .with_policy(config.resolution_policy);

        match aliases {
            Some(aliases) => resolver.with_aliases(aliases),
            None => resolver,
        }
    }

    /// Answer one message against a holdings snapshot.
    ///
    /// Never fails: every problem becomes an error message in the reply.
    pub async fn process(&self, text: &str, holdings: &[Holding]) -> Reply {
        let normalized = intent::normalize(text);
        let intent = intent::classify_normalized(&normalized);
        tracing::debug!(%intent, text = %normalized, "Classified message");

        let Some(handler) = self.handlers.get(intent) else {
            let err = ChatError::HandlerNotFound(intent);
            tracing::error!(%intent, error = %err, "No handler");
            return Reply::error(err.user_message());
        };

        let turn = Turn {
            text: &normalized,
            holdings,
        };
        let reply = handler.handle(&turn).await;

        tracing::info!(
            %intent,
            kind = reply.message.body.kind(),
            holdings_changed = reply.updated_holdings.is_some(),
            "Turn complete"
        );
        reply
    }

    /// Run a full turn on a session: record the user's message, answer it,
    /// apply any holdings change and record the reply.
    pub async fn respond(&self, session: &mut Session, text: &str) -> Message {
        session.conversation.push(Message::user(text));

        let reply = self.process(text, &session.holdings).await;
        if let Some(holdings) = reply.updated_holdings {
            session.holdings = holdings;
        }

        session.conversation.push(reply.message.clone());
        session.touch();
        reply.message
    }

    /// Get the gateway
    pub fn gateway(&self) -> &Arc<dyn MarketDataGateway> {
        &self.gateway
    }

    /// Get the handler registry
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Get configuration
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Intent a message would be routed to
    pub fn classify(&self, text: &str) -> Intent {
        intent::classify(text)
    }
}

/// Builder for Assistant configuration
pub struct AssistantBuilder {
    gateway: Option<Arc<dyn MarketDataGateway>>,
    config: AssistantConfig,
    aliases: Option<Vec<CoinAlias>>,
    overrides: Vec<Arc<dyn Handler>>,
}

impl Default for AssistantBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AssistantBuilder {
    pub fn new() -> Self {
        Self {
            gateway: None,
            config: AssistantConfig::default(),
            aliases: None,
            overrides: Vec::new(),
        }
    }

    pub fn gateway(mut self, gateway: Arc<dyn MarketDataGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn config(mut self, config: AssistantConfig) -> Self {
        self.config = config;
        self
    }

    pub fn default_coin(mut self, coin_id: impl Into<String>) -> Self {
        self.config.default_coin = coin_id.into();
        self
    }

    pub fn chart_days(mut self, days: u32) -> Self {
        self.config.chart_days = days;
        self
    }

    pub fn resolution_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.config.resolution_policy = policy;
        self
    }

    /// Replace the alias table
    pub fn aliases(mut self, aliases: Vec<CoinAlias>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    /// Answer an intent with a custom handler instead of the built-in one
    pub fn handler<H: Handler + 'static>(mut self, handler: H) -> Self {
        self.overrides.push(Arc::new(handler));
        self
    }

    pub fn build(self) -> Result<Assistant> {
        let gateway = self
            .gateway
            .ok_or_else(|| ChatError::Config("Market data gateway is required".into()))?;

        self.config.validate()?;

        let resolver = Arc::new(Assistant::resolver(gateway.clone(), &self.config, self.aliases));
        let mut handlers =
            HandlerRegistry::with_defaults(gateway.clone(), resolver, self.config.chart_days);
        for handler in self.overrides {
            handlers.register_shared(handler);
        }

        Ok(Assistant {
            gateway,
            handlers: Arc::new(handlers),
            config: self.config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageBody;
    use async_trait::async_trait;
    use market_data::{GatewayOperation, MockMarketData};
    use rust_decimal_macros::dec;

    struct Canned;

    #[async_trait]
    impl Handler for Canned {
        fn intent(&self) -> Intent {
            Intent::Help
        }

        async fn handle(&self, _turn: &Turn<'_>) -> Reply {
            Reply::text("canned")
        }
    }

    #[tokio::test]
    async fn test_process_routes_by_intent() {
        let gateway = Arc::new(MockMarketData::new());
        let assistant = Assistant::with_defaults(gateway.clone());

        let reply = assistant.process("What's the price of Solana?", &[]).await;
        match reply.message.body {
            MessageBody::Price { coin_id, price, .. } => {
                assert_eq!(coin_id, "solana");
                assert_eq!(price, dec!(195));
            }
            other => panic!("expected price message, got {other:?}"),
        }
        assert_eq!(gateway.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_respond_updates_session() {
        let assistant = Assistant::with_defaults(Arc::new(MockMarketData::new()));
        let mut session = Session::new();

        let message = assistant.respond(&mut session, "I have 2 ETH").await;

        assert_eq!(message.body.kind(), "portfolio");
        assert_eq!(session.conversation.len(), 2);
        assert_eq!(session.holdings.len(), 1);
        assert_eq!(session.holdings[0].coin_id, "ethereum");
    }

    #[tokio::test]
    async fn test_failed_turn_keeps_holdings() {
        let gateway = Arc::new(MockMarketData::new().failing(GatewayOperation::Snapshot));
        let assistant = Assistant::with_defaults(gateway);
        let mut session = Session::new();
        session.holdings = vec![Holding::new("bitcoin", "btc", dec!(1)).priced_at(dec!(10))];
        let before = session.holdings.clone();

        let message = assistant.respond(&mut session, "add 5 sol").await;

        assert!(message.is_error());
        assert_eq!(session.holdings, before);
        assert_eq!(session.conversation.len(), 2);
    }

    #[tokio::test]
    async fn test_builder() {
        let gateway: Arc<dyn MarketDataGateway> = Arc::new(MockMarketData::new());
        let assistant = AssistantBuilder::new()
            .gateway(gateway)
            .default_coin("ethereum")
            .chart_days(30)
            .handler(Canned)
            .build()
            .unwrap();

        assert_eq!(assistant.config().chart_days, 30);
        assert_eq!(assistant.handlers().len(), Intent::ALL.len());
        let reply = assistant.process("hello", &[]).await;
        assert_eq!(reply.message.content(), Some("canned"));

        let reply = assistant.process("price please", &[]).await;
        match reply.message.body {
            MessageBody::Price { coin_id, .. } => assert_eq!(coin_id, "ethereum"),
            other => panic!("expected price message, got {other:?}"),
        }
    }

    #[test]
    fn test_builder_requires_gateway() {
        assert!(matches!(AssistantBuilder::new().build(), Err(ChatError::Config(_))));
    }

    #[test]
    fn test_unusable_config_is_rejected() {
        let gateway: Arc<dyn MarketDataGateway> = Arc::new(MockMarketData::new());

        let no_days = AssistantConfig {
            chart_days: 0,
            ..AssistantConfig::default()
        };
        assert!(matches!(Assistant::new(gateway.clone(), no_days), Err(ChatError::Config(_))));

        let no_coin = AssistantConfig {
            default_coin: " ".into(),
            ..AssistantConfig::default()
        };
        assert!(matches!(Assistant::new(gateway.clone(), no_coin), Err(ChatError::Config(_))));

        let built = AssistantBuilder::new().gateway(gateway.clone()).default_coin("").build();
        assert!(matches!(built, Err(ChatError::Config(_))));

        assert!(Assistant::new(gateway, AssistantConfig::default()).is_ok());
    }
}
