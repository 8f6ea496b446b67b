//! # chat-core
//!
//! Turns a free-text message about cryptocurrencies into a typed reply.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Assistant                            │
//! │  ┌────────────┐  ┌────────────┐  ┌────────────────────────┐  │
//! │  │   Intent   │  │  Handler   │  │   EntityResolver       │  │
//! │  │ Classifier │──│  Registry  │──│   + MarketDataGateway  │  │
//! │  └────────────┘  └─────┬──────┘  └────────────────────────┘  │
//! │                        │                                     │
//! │                 Portfolio Accumulator                        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every turn produces exactly one assistant `Message`. Failures become
//! error messages and never change the user's holdings.

pub mod assistant;
pub mod error;
pub mod handlers;
pub mod intent;
pub mod message;
pub mod portfolio;
pub mod resolver;
pub mod session;

pub use assistant::{Assistant, AssistantBuilder, AssistantConfig};
pub use error::{ChatError, Result};
pub use handlers::{Handler, HandlerRegistry, Reply, Turn};
pub use intent::{Intent, classify};
pub use message::{Conversation, Message, MessageBody, Sender};
pub use portfolio::{Holding, HoldingUpdate, Valuation};
pub use resolver::{CoinAlias, EntityResolver, ResolutionPolicy};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionId, SessionStore};
