//! Portfolio Value Handler
//!
//! Re-prices every holding with one batch call.

use std::sync::Arc;

use async_trait::async_trait;
use market_data::MarketDataGateway;

use super::{Handler, Reply, Turn, settle};
use crate::error::Result;
use crate::intent::Intent;
use crate::message::{Message, MessageBody};
use crate::portfolio::{self, Holding};

const EMPTY_PORTFOLIO: &str = "You don't have any holdings in your portfolio yet. \
You can add holdings by saying something like \"I have 2 ETH\".";

const VALUE_FAILED: &str = "Sorry, I couldn't retrieve your portfolio value at the moment. \
Please try again later.";

pub struct PortfolioValueHandler {
    gateway: Arc<dyn MarketDataGateway>,
}

impl PortfolioValueHandler {
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn refresh(&self, holdings: &[Holding]) -> Result<Reply> {
        let coin_ids: Vec<String> = holdings.iter().map(|h| h.coin_id.clone()).collect();
        let prices = self.gateway.fetch_batch_prices(&coin_ids).await?;
        tracing::debug!(requested = coin_ids.len(), priced = prices.len(), "Refreshed prices");

        let valuation = portfolio::revalue(holdings, &prices)?;

        let message = Message::assistant(MessageBody::Portfolio {
            holdings: valuation.holdings.clone(),
            total_value: valuation.total_value,
        });
        Ok(Reply::new(message).with_holdings(valuation.holdings))
    }
}

#[async_trait]
impl Handler for PortfolioValueHandler {
    fn intent(&self) -> Intent {
        Intent::PortfolioValue
    }

    async fn handle(&self, turn: &Turn<'_>) -> Reply {
        if turn.holdings.is_empty() {
            return Reply::text(EMPTY_PORTFOLIO);
        }

        settle(Intent::PortfolioValue, self.refresh(turn.holdings).await, VALUE_FAILED)
    }
}
