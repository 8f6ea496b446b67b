//! Entity Resolver
//!
//! Maps free text to a canonical coin identifier: known aliases first, then
//! the provider's search, then a default coin. This is a heuristic; a
//! message naming several coins resolves to only one.

use std::sync::Arc;

use market_data::MarketDataGateway;

use crate::error::{ChatError, Result};

/// Known spellings of one coin
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoinAlias {
    /// Canonical identifier
    pub coin_id: String,

    /// Ticker symbol, lowercase
    pub ticker: String,

    /// Substrings that identify the coin in free text
    pub keywords: Vec<String>,
}

impl CoinAlias {
    pub fn new(coin_id: &str, ticker: &str) -> Self {
        Self {
            coin_id: coin_id.into(),
            ticker: ticker.into(),
            keywords: vec![coin_id.into(), ticker.into()],
        }
    }
}

/// Alias table, in matching order
pub fn default_aliases() -> Vec<CoinAlias> {
    [
        ("bitcoin", "btc"),
        ("ethereum", "eth"),
        ("ripple", "xrp"),
        ("cardano", "ada"),
        ("solana", "sol"),
        ("dogecoin", "doge"),
        ("polkadot", "dot"),
        ("litecoin", "ltc"),
    ]
    .into_iter()
    .map(|(id, ticker)| CoinAlias::new(id, ticker))
    .collect()
}

pub const DEFAULT_COIN: &str = "bitcoin";

/// What to do when nothing identifies a coin
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Fall back to the default coin
    #[default]
    Lenient,
    /// Report `ChatError::ResolutionFailure`
    Strict,
}

/// Coin identifier resolution
pub struct EntityResolver {
    gateway: Arc<dyn MarketDataGateway>,
    aliases: Vec<CoinAlias>,
    default_coin: String,
    policy: ResolutionPolicy,
}

impl EntityResolver {
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self {
            gateway,
            aliases: default_aliases(),
            default_coin: DEFAULT_COIN.into(),
            policy: ResolutionPolicy::default(),
        }
    }

    pub fn with_aliases(mut self, aliases: Vec<CoinAlias>) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_default_coin(mut self, coin_id: impl Into<String>) -> Self {
        self.default_coin = coin_id.into();
        self
    }

    pub fn with_policy(mut self, policy: ResolutionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn default_coin(&self) -> &str {
        &self.default_coin
    }

    /// First alias entry with a keyword contained in `text`
    pub fn match_alias(&self, text: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|alias| alias.keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|alias| alias.coin_id.as_str())
    }

    /// Resolve the coin a normalized message talks about.
    ///
    /// Only fails under `ResolutionPolicy::Strict`.
    pub async fn resolve(&self, text: &str) -> Result<String> {
        if let Some(coin_id) = self.match_alias(text) {
            return Ok(coin_id.to_string());
        }

        if text.contains(self.default_coin.as_str()) {
            return Ok(self.default_coin.clone());
        }

        if let Some(token) = last_token(text) {
            if let Some(coin_id) = self.search_top(token).await {
                return Ok(coin_id);
            }
        }

        match self.policy {
            ResolutionPolicy::Lenient => {
                tracing::debug!(text, coin_id = %self.default_coin, "No coin found, using default");
                Ok(self.default_coin.clone())
            }
            ResolutionPolicy::Strict => Err(ChatError::ResolutionFailure(text.to_string())),
        }
    }

    /// Resolve a ticker typed in a portfolio update.
    ///
    /// Unknown tickers go through search; with no hit the ticker itself is
    /// used as the identifier.
    pub async fn resolve_symbol(&self, symbol: &str) -> String {
        let symbol = symbol.to_lowercase();

        if let Some(alias) = self.aliases.iter().find(|a| a.ticker == symbol) {
            return alias.coin_id.clone();
        }

        self.search_top(&symbol).await.unwrap_or(symbol)
    }

    /// Top search hit; search failures count as no hit
    async fn search_top(&self, query: &str) -> Option<String> {
        match self.gateway.search(query).await {
            Ok(hits) => hits.into_iter().next().map(|hit| hit.id),
            Err(e) => {
                tracing::warn!(query, error = %e, "Coin search failed");
                None
            }
        }
    }
}

/// Last whitespace-delimited word, stripped of surrounding punctuation
fn last_token(text: &str) -> Option<&str> {
    text.split_whitespace()
        .last()
        .map(|word| word.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|word| !word.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::{GatewayOperation, MockMarketData, SearchHit};

    fn resolver_with(gateway: MockMarketData) -> (EntityResolver, Arc<MockMarketData>) {
        let gateway = Arc::new(gateway);
        (EntityResolver::new(gateway.clone()), gateway)
    }

    #[tokio::test]
    async fn test_alias_match_in_table_order() {
        let (resolver, gateway) = resolver_with(MockMarketData::new());

        assert_eq!(resolver.resolve("price of eth").await.unwrap(), "ethereum");
        assert_eq!(resolver.resolve("what about doge?").await.unwrap(), "dogecoin");
        // both mentioned: bitcoin is declared first
        assert_eq!(resolver.resolve("eth vs btc").await.unwrap(), "bitcoin");
        assert_eq!(gateway.call_count(GatewayOperation::Search), 0);
    }

    #[tokio::test]
    async fn test_search_fallback_uses_last_token() {
        let (resolver, gateway) = resolver_with(
            MockMarketData::new()
                .with_search_hits("pepe", vec![SearchHit::new("pepe", "Pepe", "pepe")]),
        );

        assert_eq!(resolver.resolve("what's the price of pepe?").await.unwrap(), "pepe");
        assert_eq!(gateway.calls()[0].argument, "pepe");
    }

    #[tokio::test]
    async fn test_default_when_nothing_found() {
        let (resolver, _) = resolver_with(MockMarketData::new());
        assert_eq!(resolver.resolve("price of unobtanium").await.unwrap(), "bitcoin");
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_default() {
        let (resolver, _) = resolver_with(MockMarketData::new().failing(GatewayOperation::Search));
        assert_eq!(resolver.resolve("price of unobtanium").await.unwrap(), "bitcoin");
    }

    #[tokio::test]
    async fn test_strict_policy_reports_failure() {
        let gateway = Arc::new(MockMarketData::new());
        let resolver = EntityResolver::new(gateway).with_policy(ResolutionPolicy::Strict);

        let result = resolver.resolve("price of unobtanium").await;
        assert!(matches!(result, Err(ChatError::ResolutionFailure(_))));
        assert_eq!(resolver.resolve("price of sol").await.unwrap(), "solana");
    }

    #[tokio::test]
    async fn test_resolve_symbol() {
        let (resolver, gateway) = resolver_with(
            MockMarketData::new()
                .with_search_hits("shib", vec![SearchHit::new("shiba-inu", "Shiba Inu", "shib")]),
        );

        assert_eq!(resolver.resolve_symbol("ETH").await, "ethereum");
        assert_eq!(gateway.call_count(GatewayOperation::Search), 0);
        assert_eq!(resolver.resolve_symbol("shib").await, "shiba-inu");
        assert_eq!(resolver.resolve_symbol("zzz").await, "zzz");
    }

    #[test]
    fn test_last_token() {
        assert_eq!(last_token("price of pepe?"), Some("pepe"));
        assert_eq!(last_token("   "), None);
        assert_eq!(last_token("price ?!"), None);
    }
}
