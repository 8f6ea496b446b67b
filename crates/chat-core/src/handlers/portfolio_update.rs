//! Portfolio Update Handler
//!
//! Parses "i have 2 eth" style statements and upserts the holding.

use std::str::FromStr;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use market_data::MarketDataGateway;
use regex::Regex;
use rust_decimal::Decimal;

use super::{Handler, Reply, Turn, settle};
use crate::error::{ChatError, Result};
use crate::intent::Intent;
use crate::message::{Message, MessageBody};
use crate::portfolio::{self, Holding, HoldingUpdate};
use crate::resolver::EntityResolver;

const USAGE: &str = "To add holdings to your portfolio, please specify the amount and \
cryptocurrency (e.g., \"I have 2 ETH\" or \"Add 0.5 BTC\").";

const UPDATE_FAILED: &str = "Sorry, I couldn't add that cryptocurrency to your portfolio. \
Please check the symbol and try again.";

/// Accepted phrasings, tried in order
static UPDATE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        r"(?i)i have (\d+(?:\.\d+)?)\s+([a-z]+)",
        r"(?i)add (\d+(?:\.\d+)?)\s+([a-z]+)",
        r"(?i)bought (\d+(?:\.\d+)?)\s+([a-z]+)",
    ]
    .map(|p| Regex::new(p).expect("update pattern must compile"))
});

/// Amount and ticker from an update statement
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedUpdate {
    pub amount: Decimal,
    /// Lowercase ticker as typed
    pub symbol: String,
}

/// Extract amount and ticker, first matching phrasing wins
pub fn parse_update(text: &str) -> Result<ParsedUpdate> {
    let captures = UPDATE_PATTERNS
        .iter()
        .find_map(|re| re.captures(text))
        .ok_or_else(|| ChatError::MalformedInput(format!("no amount and symbol in {text:?}")))?;

    let amount = Decimal::from_str(&captures[1])
        .map_err(|e| ChatError::MalformedInput(format!("bad amount {:?}: {e}", &captures[1])))?;

    Ok(ParsedUpdate {
        amount,
        symbol: captures[2].to_lowercase(),
    })
}

pub struct PortfolioUpdateHandler {
    resolver: Arc<EntityResolver>,
    gateway: Arc<dyn MarketDataGateway>,
}

impl PortfolioUpdateHandler {
    pub fn new(resolver: Arc<EntityResolver>, gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { resolver, gateway }
    }

    async fn apply(&self, parsed: ParsedUpdate, holdings: &[Holding]) -> Result<Reply> {
        let coin_id = self.resolver.resolve_symbol(&parsed.symbol).await;
        let snapshot = self.gateway.fetch_snapshot(&coin_id).await?;

        let update = HoldingUpdate::from_snapshot(parsed.amount, &snapshot);
        tracing::info!(coin_id = %update.coin_id, amount = %update.amount, "Updating holding");

        let valuation = portfolio::upsert(holdings, update)?;

        let message = Message::assistant(MessageBody::Portfolio {
            holdings: valuation.holdings.clone(),
            total_value: valuation.total_value,
        });
        Ok(Reply::new(message).with_holdings(valuation.holdings))
    }
}

#[async_trait]
impl Handler for PortfolioUpdateHandler {
    fn intent(&self) -> Intent {
        Intent::PortfolioUpdate
    }

    async fn handle(&self, turn: &Turn<'_>) -> Reply {
        let parsed = match parse_update(turn.text) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "Portfolio update not understood");
                return Reply::text(USAGE);
            }
        };

        settle(
            Intent::PortfolioUpdate,
            self.apply(parsed, turn.holdings).await,
            UPDATE_FAILED,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::{CoinSnapshot, GatewayOperation, MockMarketData, SearchHit};
    use rust_decimal_macros::dec;

    fn handler(gateway: Arc<MockMarketData>) -> PortfolioUpdateHandler {
        let resolver = Arc::new(EntityResolver::new(gateway.clone()));
        PortfolioUpdateHandler::new(resolver, gateway)
    }

    #[test]
    fn test_parse_phrasings() {
        assert_eq!(
            parse_update("i have 2 eth").unwrap(),
            ParsedUpdate {
                amount: dec!(2),
                symbol: "eth".into(),
            }
        );
        assert_eq!(parse_update("please ADD 0.5 BTC").unwrap().amount, dec!(0.5));
        assert_eq!(parse_update("bought 1000 doge today").unwrap().symbol, "doge");
        assert!(matches!(
            parse_update("i own some bitcoin"),
            Err(ChatError::MalformedInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unparsed_text_gives_usage_without_calls() {
        let gateway = Arc::new(MockMarketData::new());
        let reply = handler(gateway.clone())
            .handle(&Turn {
                text: "my portfolio",
                holdings: &[],
            })
            .await;

        assert_eq!(reply.message.content(), Some(USAGE));
        assert!(!reply.message.is_error());
        assert!(reply.updated_holdings.is_none());
        assert!(gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_existing_holding() {
        let gateway = Arc::new(MockMarketData::new().with_price("dogecoin", dec!(0.5)));
        let existing = vec![
            Holding::new("bitcoin", "btc", dec!(1)).priced_at(dec!(100)),
            Holding::new("dogecoin", "doge", dec!(1)).priced_at(dec!(0.38)),
        ];

        let reply = handler(gateway)
            .handle(&Turn {
                text: "add 3 doge",
                holdings: &existing,
            })
            .await;

        let holdings = reply.updated_holdings.expect("holdings updated");
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[1].amount, dec!(3));
        assert_eq!(holdings[1].value, Some(dec!(1.5)));
        match reply.message.body {
            MessageBody::Portfolio { total_value, .. } => assert_eq!(total_value, dec!(101.5)),
            other => panic!("expected portfolio message, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_symbol_uses_search() {
        let gateway = Arc::new(
            MockMarketData::new()
                .with_snapshot(CoinSnapshot::new("pepe", "pepe", "Pepe", dec!(0.00002)))
                .with_search_hits("pepe", vec![SearchHit::new("pepe", "Pepe", "pepe")]),
        );

        let reply = handler(gateway)
            .handle(&Turn {
                text: "bought 1000000 pepe",
                holdings: &[],
            })
            .await;

        let holdings = reply.updated_holdings.expect("holdings updated");
        assert_eq!(holdings[0].coin_id, "pepe");
        assert_eq!(holdings[0].value, Some(dec!(20)));
    }

    #[tokio::test]
    async fn test_gateway_failure_leaves_holdings() {
        let gateway = Arc::new(MockMarketData::new().failing(GatewayOperation::Snapshot));
        let existing = vec![Holding::new("bitcoin", "btc", dec!(1)).priced_at(dec!(100))];

        let reply = handler(gateway)
            .handle(&Turn {
                text: "i have 2 eth",
                holdings: &existing,
            })
            .await;

        assert_eq!(reply.message.content(), Some(UPDATE_FAILED));
        assert!(reply.updated_holdings.is_none());
    }

    #[tokio::test]
    async fn test_oversized_amount_fails_without_panicking() {
        let gateway = Arc::new(MockMarketData::new());
        let existing = vec![Holding::new("ethereum", "eth", dec!(2)).priced_at(dec!(3450))];

        let reply = handler(gateway)
            .handle(&Turn {
                text: "i have 79228162514264337593543950335 btc",
                holdings: &existing,
            })
            .await;

        assert_eq!(reply.message.content(), Some(UPDATE_FAILED));
        assert!(reply.message.is_error());
        assert!(reply.updated_holdings.is_none());
    }
}
