//! Mock Market Data Gateway
//!
//! For testing and offline demos. Serves realistic static snapshots, lets a
//! test force any operation to fail, and records every call made.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{MarketDataGateway, SEARCH_LIMIT};
use crate::error::{GatewayError, Result};
use crate::model::{ChartSeries, CoinSnapshot, PricePoint, SearchHit, TrendingEntry};

/// Gateway operations, used for failure injection and call inspection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GatewayOperation {
    Snapshot,
    Trending,
    DailySeries,
    Search,
    BatchPrices,
}

/// A recorded gateway call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayCall {
    pub operation: GatewayOperation,
    pub argument: String,
}

/// In-memory gateway with static data
pub struct MockMarketData {
    snapshots: BTreeMap<String, CoinSnapshot>,
    trending: Vec<TrendingEntry>,
    series: HashMap<String, ChartSeries>,
    search_hits: HashMap<String, Vec<SearchHit>>,
    failures: HashSet<GatewayOperation>,
    calls: Mutex<Vec<GatewayCall>>,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketData {
    /// Seeded with the major coins
    pub fn new() -> Self {
        let seed = [
            ("bitcoin", "btc", "Bitcoin", dec!(97500), dec!(2.5)),
            ("ethereum", "eth", "Ethereum", dec!(3450), dec!(1.8)),
            ("ripple", "xrp", "XRP", dec!(2.35), dec!(0.9)),
            ("cardano", "ada", "Cardano", dec!(0.95), dec!(-1.2)),
            ("solana", "sol", "Solana", dec!(195), dec!(4.2)),
            ("dogecoin", "doge", "Dogecoin", dec!(0.38), dec!(12.0)),
            ("polkadot", "dot", "Polkadot", dec!(7.20), dec!(0.8)),
            ("litecoin", "ltc", "Litecoin", dec!(105), dec!(1.5)),
        ];

        let mut mock = Self::empty();
        for (id, symbol, name, price, change) in seed {
            mock = mock.with_snapshot(
                CoinSnapshot::new(id, symbol, name, price)
                    .with_change_24h(change)
                    .with_description(format!("{name} is a cryptocurrency.")),
            );
        }

        mock.trending = mock
            .snapshots
            .values()
            .enumerate()
            .map(|(rank, s)| TrendingEntry {
                id: s.id.clone(),
                name: s.name.clone(),
                symbol: s.symbol.to_uppercase(),
                image: None,
                market_cap_rank: u32::try_from(rank + 1).ok(),
                price_btc: s.current_price / dec!(97500),
            })
            .collect();

        mock
    }

    /// No data at all
    pub fn empty() -> Self {
        Self {
            snapshots: BTreeMap::new(),
            trending: Vec::new(),
            series: HashMap::new(),
            search_hits: HashMap::new(),
            failures: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Add or replace a coin
    pub fn with_snapshot(mut self, snapshot: CoinSnapshot) -> Self {
        self.snapshots.insert(snapshot.id.clone(), snapshot);
        self
    }

    /// Change the current price of a known coin
    pub fn with_price(mut self, coin_id: &str, price: Decimal) -> Self {
        if let Some(snapshot) = self.snapshots.get_mut(coin_id) {
            snapshot.current_price = price;
        }
        self
    }

    /// Remove a coin, so lookups report `NotFound` and batch prices omit it
    pub fn without_coin(mut self, coin_id: &str) -> Self {
        self.snapshots.remove(coin_id);
        self
    }

    pub fn with_trending(mut self, entries: Vec<TrendingEntry>) -> Self {
        self.trending = entries;
        self
    }

    pub fn with_series(mut self, coin_id: &str, series: ChartSeries) -> Self {
        self.series.insert(coin_id.to_string(), series);
        self
    }

    /// Fixed results for a search query
    pub fn with_search_hits(mut self, query: &str, hits: Vec<SearchHit>) -> Self {
        self.search_hits.insert(query.to_lowercase(), hits);
        self
    }

    /// Make every call of `operation` fail with a provider error
    pub fn failing(mut self, operation: GatewayOperation) -> Self {
        self.failures.insert(operation);
        self
    }

    /// All calls made so far
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of calls made for one operation
    pub fn call_count(&self, operation: GatewayOperation) -> usize {
        self.calls().iter().filter(|c| c.operation == operation).count()
    }

    fn record(&self, operation: GatewayOperation, argument: impl Into<String>) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(GatewayCall {
                operation,
                argument: argument.into(),
            });

        if self.failures.contains(&operation) {
            return Err(GatewayError::Provider(format!("{operation:?} unavailable")));
        }
        Ok(())
    }

    /// Flat series at the current price, one point per day
    fn flat_series(snapshot: &CoinSnapshot, days: u32) -> ChartSeries {
        let now = Utc::now();
        let points = (0..=days)
            .rev()
            .map(|offset| PricePoint {
                timestamp: now - Duration::days(i64::from(offset)),
                price: snapshot.current_price,
            })
            .collect();
        ChartSeries::new(points)
    }
}

#[async_trait]
impl MarketDataGateway for MockMarketData {
    async fn fetch_snapshot(&self, coin_id: &str) -> Result<CoinSnapshot> {
        self.record(GatewayOperation::Snapshot, coin_id)?;
        self.snapshots
            .get(coin_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound(coin_id.to_string()))
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingEntry>> {
        self.record(GatewayOperation::Trending, "")?;
        Ok(self.trending.clone())
    }

    async fn fetch_daily_series(&self, coin_id: &str, days: u32) -> Result<ChartSeries> {
        self.record(GatewayOperation::DailySeries, coin_id)?;
        if let Some(series) = self.series.get(coin_id) {
            return Ok(series.clone());
        }
        self.snapshots
            .get(coin_id)
            .map(|s| Self::flat_series(s, days))
            .ok_or_else(|| GatewayError::NotFound(coin_id.to_string()))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.record(GatewayOperation::Search, query)?;
        let query = query.to_lowercase();

        if let Some(hits) = self.search_hits.get(&query) {
            return Ok(hits.iter().take(SEARCH_LIMIT).cloned().collect());
        }

        Ok(self
            .snapshots
            .values()
            .filter(|s| s.id == query || s.symbol == query || s.name.to_lowercase() == query)
            .take(SEARCH_LIMIT)
            .map(|s| SearchHit::new(&s.id, &s.name, &s.symbol))
            .collect())
    }

    async fn fetch_batch_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, Decimal>> {
        if coin_ids.is_empty() {
            return Ok(HashMap::new());
        }
        self.record(GatewayOperation::BatchPrices, coin_ids.join(","))?;

        Ok(coin_ids
            .iter()
            .filter_map(|id| self.snapshots.get(id).map(|s| (id.clone(), s.current_price)))
            .collect())
    }

    async fn health_check(&self) -> bool {
        true // Mock always healthy
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}
