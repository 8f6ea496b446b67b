//! Price Handler
//!
//! Current price of the coin a message mentions.

use std::sync::Arc;

use async_trait::async_trait;
use market_data::MarketDataGateway;

use super::{Handler, Reply, Turn, settle};
use crate::error::Result;
use crate::intent::Intent;
use crate::message::{Message, MessageBody};
use crate::resolver::EntityResolver;

const PRICE_FAILED: &str = "Sorry, I couldn't find price information for that cryptocurrency.";

pub struct PriceHandler {
    resolver: Arc<EntityResolver>,
    gateway: Arc<dyn MarketDataGateway>,
}

impl PriceHandler {
    pub fn new(resolver: Arc<EntityResolver>, gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { resolver, gateway }
    }

    async fn lookup(&self, text: &str) -> Result<Reply> {
        let coin_id = self.resolver.resolve(text).await?;
        tracing::debug!(%coin_id, "Fetching price");

        let snapshot = self.gateway.fetch_snapshot(&coin_id).await?;

        Ok(Reply::new(Message::assistant(MessageBody::Price {
            coin_id: snapshot.id,
            coin_name: snapshot.name,
            symbol: Some(snapshot.symbol),
            price: snapshot.current_price,
        })))
    }
}

#[async_trait]
impl Handler for PriceHandler {
    fn intent(&self) -> Intent {
        Intent::Price
    }

    async fn handle(&self, turn: &Turn<'_>) -> Reply {
        settle(Intent::Price, self.lookup(turn.text).await, PRICE_FAILED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::{GatewayOperation, MockMarketData};
    use rust_decimal_macros::dec;

    fn handler(gateway: MockMarketData) -> PriceHandler {
        let gateway: Arc<dyn MarketDataGateway> = Arc::new(gateway);
        PriceHandler::new(Arc::new(EntityResolver::new(gateway.clone())), gateway)
    }

    #[tokio::test]
    async fn test_price_message() {
        let handler = handler(MockMarketData::new().with_price("solana", dec!(201.5)));
        let reply = handler
            .handle(&Turn {
                text: "how much is solana",
                holdings: &[],
            })
            .await;

        match reply.message.body {
            MessageBody::Price { coin_id, symbol, price, .. } => {
                assert_eq!(coin_id, "solana");
                assert_eq!(symbol.as_deref(), Some("sol"));
                assert_eq!(price, dec!(201.5));
            }
            other => panic!("expected price message, got {other:?}"),
        }
        assert!(reply.updated_holdings.is_none());
    }

    #[tokio::test]
    async fn test_price_failure() {
        let handler = handler(MockMarketData::new().failing(GatewayOperation::Snapshot));
        let reply = handler
            .handle(&Turn {
                text: "price of btc",
                holdings: &[],
            })
            .await;

        assert!(reply.message.is_error());
        assert_eq!(reply.message.content(), Some(PRICE_FAILED));
    }
}
