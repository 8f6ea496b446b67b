//! CoinGecko Gateway
//!
//! `MarketDataGateway` over the CoinGecko v3 REST API.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::{Client, StatusCode, header::ACCEPT};
use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};

use super::{MarketDataGateway, SEARCH_LIMIT};
use crate::error::{GatewayError, Result};
use crate::model::{ChartSeries, CoinSnapshot, PricePoint, SearchHit, TrendingEntry};

const VS_CURRENCY: &str = "usd";

/// CoinGecko client configuration
#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    /// API root, without trailing slash
    pub base_url: String,

    /// Demo API key, sent as `x-cg-demo-api-key`
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Extra attempts after a 429 response
    pub max_retries: u32,

    /// Pause before retrying a rate-limited request
    pub retry_delay_ms: u64,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".into(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 1,
            retry_delay_ms: 1500,
        }
    }
}

impl CoinGeckoConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let base_url = std::env::var("COINGECKO_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_url);
        let api_key = std::env::var("COINGECKO_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        Self {
            base_url,
            api_key,
            timeout_secs: env_number("COINGECKO_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
            max_retries: env_number("COINGECKO_MAX_RETRIES").unwrap_or(defaults.max_retries),
            retry_delay_ms: env_number("COINGECKO_RETRY_DELAY_MS")
                .unwrap_or(defaults.retry_delay_ms),
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// CoinGecko market data provider
pub struct CoinGeckoClient {
    client: Client,
    config: CoinGeckoConfig,
}

impl CoinGeckoClient {
    /// Create from configuration
    pub fn from_config(config: CoinGeckoConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(GatewayError::Config("CoinGecko base URL is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("coin-chat/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(CoinGeckoConfig::from_env())
    }

    pub fn config(&self) -> &CoinGeckoConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// GET a JSON document, retrying rate-limited calls up to `max_retries` times
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut attempt = 0;

        loop {
            let mut request = self
                .client
                .get(self.url(path))
                .query(query)
                .header(ACCEPT, "application/json");
            if let Some(key) = &self.config.api_key {
                request = request.header("x-cg-demo-api-key", key);
            }

            tracing::debug!(path, attempt, "CoinGecko request");
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt < self.config.max_retries {
                    attempt += 1;
                    tracing::warn!(path, attempt, "CoinGecko rate limit hit, retrying");
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                    continue;
                }
                return Err(GatewayError::RateLimited(path.to_string()));
            }

            if status == StatusCode::NOT_FOUND {
                return Err(GatewayError::NotFound(path.to_string()));
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(GatewayError::Provider(format!("{path} returned {status}: {body}")));
            }

            let text = response.text().await?;
            if text.trim().is_empty() {
                return Err(GatewayError::Provider(format!("{path} returned an empty body")));
            }
            return Ok(serde_json::from_str(&text)?);
        }
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Deserialize)]
struct CoinResponse {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    image: Option<ImageLinks>,
    market_data: MarketDataBody,
    #[serde(default)]
    description: HashMap<String, Option<String>>,
}

#[derive(Deserialize)]
struct ImageLinks {
    small: Option<String>,
}

#[derive(Deserialize)]
struct MarketDataBody {
    #[serde(default)]
    current_price: HashMap<String, Option<Decimal>>,
    #[serde(default)]
    market_cap: HashMap<String, Option<Decimal>>,
    #[serde(default)]
    price_change_percentage_24h: Option<Decimal>,
}

#[derive(Deserialize)]
struct TrendingResponse {
    coins: Vec<TrendingWrapper>,
}

#[derive(Deserialize)]
struct TrendingWrapper {
    item: TrendingItem,
}

#[derive(Deserialize)]
struct TrendingItem {
    id: String,
    name: String,
    symbol: String,
    #[serde(default)]
    small: Option<String>,
    #[serde(default)]
    market_cap_rank: Option<u32>,
    #[serde(default)]
    price_btc: Option<Decimal>,
}

#[derive(Deserialize)]
struct MarketChartResponse {
    prices: Vec<(i64, Option<Decimal>)>,
}

#[derive(Deserialize)]
struct SearchResponse {
    coins: Vec<SearchHit>,
}

/// First sentence of a description, terminated with a period
fn first_sentence(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }
    let sentence = text.split(". ").next().unwrap_or(text).trim_end_matches('.');
    format!("{sentence}.")
}

impl CoinResponse {
    fn into_snapshot(self) -> Result<CoinSnapshot> {
        let current_price = self
            .market_data
            .current_price
            .get(VS_CURRENCY)
            .copied()
            .flatten()
            .ok_or_else(|| GatewayError::Provider(format!("no USD price for {}", self.id)))?;

        Ok(CoinSnapshot {
            market_cap: self.market_data.market_cap.get(VS_CURRENCY).copied().flatten(),
            price_change_24h: self.market_data.price_change_percentage_24h,
            image: self.image.and_then(|i| i.small),
            description: self
                .description
                .get("en")
                .and_then(|d| d.as_deref())
                .map(first_sentence)
                .unwrap_or_default(),
            current_price,
            id: self.id,
            symbol: self.symbol,
            name: self.name,
        })
    }
}

#[async_trait]
impl MarketDataGateway for CoinGeckoClient {
    async fn fetch_snapshot(&self, coin_id: &str) -> Result<CoinSnapshot> {
        let query = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("market_data", "true".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
        ];
        let response: CoinResponse = self
            .get_json(&format!("/coins/{coin_id}"), &query)
            .await
            .map_err(|e| match e {
                GatewayError::NotFound(_) => GatewayError::NotFound(coin_id.to_string()),
                other => other,
            })?;

        response.into_snapshot()
    }

    async fn fetch_trending(&self) -> Result<Vec<TrendingEntry>> {
        let response: TrendingResponse = self.get_json("/search/trending", &[]).await?;

        Ok(response
            .coins
            .into_iter()
            .map(|c| TrendingEntry {
                id: c.item.id,
                name: c.item.name,
                symbol: c.item.symbol,
                image: c.item.small,
                market_cap_rank: c.item.market_cap_rank,
                price_btc: c.item.price_btc.unwrap_or(Decimal::ZERO),
            })
            .collect())
    }

    async fn fetch_daily_series(&self, coin_id: &str, days: u32) -> Result<ChartSeries> {
        let query = [
            ("vs_currency", VS_CURRENCY.to_string()),
            ("days", days.to_string()),
            ("interval", "daily".to_string()),
        ];
        let response: MarketChartResponse = self
            .get_json(&format!("/coins/{coin_id}/market_chart"), &query)
            .await?;

        let points = response
            .prices
            .into_iter()
            .filter_map(|(millis, price)| {
                Some(PricePoint {
                    timestamp: DateTime::from_timestamp_millis(millis)?,
                    price: price?,
                })
            })
            .collect();

        Ok(ChartSeries::new(points))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response: SearchResponse = self
            .get_json("/search", &[("query", query.to_string())])
            .await?;

        let mut hits = response.coins;
        hits.truncate(SEARCH_LIMIT);
        Ok(hits)
    }

    async fn fetch_batch_prices(&self, coin_ids: &[String]) -> Result<HashMap<String, Decimal>> {
        if coin_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let query = [
            ("ids", coin_ids.join(",")),
            ("vs_currencies", VS_CURRENCY.to_string()),
        ];
        let response: HashMap<String, HashMap<String, Option<Decimal>>> =
            self.get_json("/simple/price", &query).await?;

        Ok(coin_ids
            .iter()
            .filter_map(|id| {
                let price = response.get(id)?.get(VS_CURRENCY).copied().flatten()?;
                Some((id.clone(), price))
            })
            .collect())
    }

    async fn health_check(&self) -> bool {
        match self.client.get(self.url("/ping")).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::debug!(error = %e, "CoinGecko ping failed");
                false
            }
        }
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}
