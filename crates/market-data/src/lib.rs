//! # market-data
//!
//! Market data gateway for coin-chat.
//!
//! ```text
//! ┌──────────────┐      ┌───────────────────────┐
//! │  chat-core   │─────▶│  MarketDataGateway    │
//! │  handlers    │      │  (Strategy)           │
//! └──────────────┘      └───────────┬───────────┘
//!                          ┌────────┴────────┐
//!                   CoinGeckoClient    MockMarketData
//! ```
//!
//! Handlers only ever see the trait, so the HTTP provider can be swapped for
//! the in-memory mock in tests and offline demos.

pub mod error;
pub mod gateway;
pub mod model;

pub use error::{GatewayError, Result};
pub use gateway::{
    CoinGeckoClient, CoinGeckoConfig, DEFAULT_SERIES_DAYS, GatewayCall, GatewayOperation,
    MarketDataGateway, MockMarketData, SEARCH_LIMIT,
};
pub use model::{ChartSeries, CoinSnapshot, PricePoint, SearchHit, TrendingEntry};
