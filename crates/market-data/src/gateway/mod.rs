//! Market Data Gateway
//!
//! Capability interface to an external price/trend/chart/search provider,
//! plus the implementations shipped with the workspace.

mod coingecko;
mod mock;

pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};
pub use mock::{GatewayCall, GatewayOperation, MockMarketData};

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::model::{ChartSeries, CoinSnapshot, SearchHit, TrendingEntry};

/// Length of the daily series used for charts
pub const DEFAULT_SERIES_DAYS: u32 = 7;

/// Search results beyond this many are dropped
pub const SEARCH_LIMIT: usize = 5;

/// Market data provider trait (Strategy pattern)
///
/// Implement this for each provider. Callers work exclusively through it.
#[async_trait]
pub trait MarketDataGateway: Send + Sync {
    /// Current snapshot of a coin by canonical identifier
    async fn fetch_snapshot(&self, coin_id: &str) -> Result<CoinSnapshot>;

    /// Provider's trending list, in provider order
    async fn fetch_trending(&self) -> Result<Vec<TrendingEntry>>;

    /// Daily USD prices for the last `days` days
    async fn fetch_daily_series(&self, coin_id: &str, days: u32) -> Result<ChartSeries>;

    /// Fuzzy search, at most `SEARCH_LIMIT` hits. No hits is not an error.
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Current USD prices for several coins in one call.
    ///
    /// Identifiers without a price are absent from the map.
    async fn fetch_batch_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, Decimal>>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> bool;

    /// Provider name
    fn name(&self) -> &str;
}
