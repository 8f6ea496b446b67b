//! Provider Data Types
//!
//! Values fetched from a market-data provider. All prices are USD and use
//! `rust_decimal` - never use f64 for money!

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Current market state of a single coin
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoinSnapshot {
    /// Canonical provider identifier (e.g., "bitcoin")
    pub id: String,

    /// Ticker symbol as the provider reports it (e.g., "btc")
    pub symbol: String,

    /// Display name (e.g., "Bitcoin")
    pub name: String,

    /// Small logo URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Current unit price in USD
    pub current_price: Decimal,

    /// Market capitalization in USD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<Decimal>,

    /// 24-hour price change percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_change_24h: Option<Decimal>,

    /// First sentence of the provider's description
    #[serde(default)]
    pub description: String,
}

impl CoinSnapshot {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        current_price: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into().to_lowercase(),
            name: name.into(),
            image: None,
            current_price,
            market_cap: None,
            price_change_24h: None,
            description: String::new(),
        }
    }

    pub fn with_market_cap(mut self, market_cap: Decimal) -> Self {
        self.market_cap = Some(market_cap);
        self
    }

    pub fn with_change_24h(mut self, change: Decimal) -> Self {
        self.price_change_24h = Some(change);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A coin from the provider's trending list
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrendingEntry {
    pub id: String,
    pub name: String,
    pub symbol: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    /// Rank by market cap (unranked coins have none)
    pub market_cap_rank: Option<u32>,

    /// Unit price quoted in BTC
    pub price_btc: Decimal,
}

/// A search result
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub name: String,
    pub symbol: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,
}

impl SearchHit {
    pub fn new(id: impl Into<String>, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            symbol: symbol.into(),
            market_cap_rank: None,
        }
    }
}

/// One sample of a price series
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/// Chronologically ordered price samples
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartSeries(Vec<PricePoint>);

impl ChartSeries {
    /// Build a series, sorting the points by timestamp
    pub fn new(mut points: Vec<PricePoint>) -> Self {
        points.sort_by_key(|p| p.timestamp);
        Self(points)
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.0
    }

    /// Most recent sample
    pub fn latest(&self) -> Option<&PricePoint> {
        self.0.last()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
