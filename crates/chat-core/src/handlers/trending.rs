//! Trending Handler

use std::sync::Arc;

use async_trait::async_trait;
use market_data::MarketDataGateway;

use super::{Handler, Reply, Turn, settle};
use crate::error::Result;
use crate::intent::Intent;
use crate::message::{Message, MessageBody};

const TRENDING_FAILED: &str = "Sorry, I couldn't fetch the trending coins right now. \
This might be due to API rate limiting or a network issue. Please try again in a moment.";

/// Provider's trending list, returned whole (display truncation is the renderer's job)
pub struct TrendingHandler {
    gateway: Arc<dyn MarketDataGateway>,
}

impl TrendingHandler {
    pub fn new(gateway: Arc<dyn MarketDataGateway>) -> Self {
        Self { gateway }
    }

    async fn lookup(&self) -> Result<Reply> {
        let coins = self.gateway.fetch_trending().await?;
        tracing::debug!(count = coins.len(), "Fetched trending coins");
        Ok(Reply::new(Message::assistant(MessageBody::Trending { coins })))
    }
}

#[async_trait]
impl Handler for TrendingHandler {
    fn intent(&self) -> Intent {
        Intent::Trending
    }

    async fn handle(&self, _turn: &Turn<'_>) -> Reply {
        settle(Intent::Trending, self.lookup().await, TRENDING_FAILED)
    }
}
