//! Chart Handler
//!
//! Snapshot and daily series are fetched concurrently; either failing
//! fails the whole reply.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join;
use market_data::MarketDataGateway;

use super::{Handler, Reply, Turn, settle};
use crate::error::Result;
use crate::intent::Intent;
use crate::message::{Message, MessageBody};
use crate::resolver::EntityResolver;

const CHART_FAILED: &str = "Sorry, I couldn't generate a chart for that cryptocurrency.";

pub struct ChartHandler {
    resolver: Arc<EntityResolver>,
    gateway: Arc<dyn MarketDataGateway>,
    days: u32,
}

impl ChartHandler {
    pub fn new(
        resolver: Arc<EntityResolver>,
        gateway: Arc<dyn MarketDataGateway>,
        days: u32,
    ) -> Self {
        Self {
            resolver,
            gateway,
            days,
        }
    }

    async fn lookup(&self, text: &str) -> Result<Reply> {
        let coin_id = self.resolver.resolve(text).await?;
        tracing::debug!(%coin_id, days = self.days, "Fetching chart");

        let (snapshot, series) = try_join(
            self.gateway.fetch_snapshot(&coin_id),
            self.gateway.fetch_daily_series(&coin_id, self.days),
        )
        .await?;

        Ok(Reply::new(Message::assistant(MessageBody::Chart {
            coin_id: snapshot.id,
            coin_name: snapshot.name,
            symbol: Some(snapshot.symbol),
            chart_data: series,
        })))
    }
}

#[async_trait]
impl Handler for ChartHandler {
    fn intent(&self) -> Intent {
        Intent::Chart
    }

    async fn handle(&self, turn: &Turn<'_>) -> Reply {
        settle(Intent::Chart, self.lookup(turn.text).await, CHART_FAILED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_data::{GatewayOperation, MockMarketData};

    fn handler(gateway: Arc<MockMarketData>) -> ChartHandler {
        let resolver = Arc::new(EntityResolver::new(gateway.clone()));
        ChartHandler::new(resolver, gateway, 7)
    }

    #[tokio::test]
    async fn test_chart_message() {
        let gateway = Arc::new(MockMarketData::new());
        let reply = handler(gateway.clone())
            .handle(&Turn {
                text: "eth chart",
                holdings: &[],
            })
            .await;

        match reply.message.body {
            MessageBody::Chart { coin_id, chart_data, .. } => {
                assert_eq!(coin_id, "ethereum");
                assert_eq!(chart_data.len(), 8);
            }
            other => panic!("expected chart message, got {other:?}"),
        }
        assert_eq!(gateway.call_count(GatewayOperation::Snapshot), 1);
        assert_eq!(gateway.call_count(GatewayOperation::DailySeries), 1);
    }

    #[tokio::test]
    async fn test_either_fetch_failing_fails_chart() {
        for operation in [GatewayOperation::Snapshot, GatewayOperation::DailySeries] {
            let gateway = Arc::new(MockMarketData::new().failing(operation));
            let reply = handler(gateway)
                .handle(&Turn {
                    text: "graph of solana",
                    holdings: &[],
                })
                .await;

            assert!(reply.message.is_error());
            assert_eq!(reply.message.content(), Some(CHART_FAILED));
            assert!(reply.updated_holdings.is_none());
        }
    }
}
