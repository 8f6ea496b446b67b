//! Server Configuration

use std::path::PathBuf;

use chat_core::{AssistantConfig, ChatError, Result};

/// Which market data backend to serve from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MarketDataSource {
    CoinGecko,
    /// Static in-memory data, no network
    Mock,
}

impl std::str::FromStr for MarketDataSource {
    type Err = ChatError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "coingecko" => Ok(Self::CoinGecko),
            "mock" => Ok(Self::Mock),
            other => Err(ChatError::Config(format!("unknown MARKET_DATA: {other}"))),
        }
    }
}

/// Server configuration
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,

    pub market_data: MarketDataSource,

    /// Directory for session files; in-memory store when unset
    pub session_dir: Option<PathBuf>,

    pub assistant: AssistantConfig,
}

impl ServerConfig {
    /// Read `BIND_ADDR`, `MARKET_DATA` and `SESSION_DIR`, plus the assistant settings
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

        let market_data = match std::env::var("MARKET_DATA") {
            Ok(source) => source.parse()?,
            Err(_) => MarketDataSource::CoinGecko,
        };

        let session_dir = std::env::var("SESSION_DIR")
            .ok()
            .filter(|dir| !dir.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind_addr,
            market_data,
            session_dir,
            assistant: AssistantConfig::from_env()?,
        })
    }
}
