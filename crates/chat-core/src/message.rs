//! Conversation Messages
//!
//! Every turn produces one `Message`. The payload is a sum type with one
//! variant per display kind, so a message can never carry a shape that
//! disagrees with its tag.

use chrono::{DateTime, Utc};
use market_data::{ChartSeries, TrendingEntry};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::portfolio::Holding;

/// Who sent a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Assistant => write!(f, "assistant"),
        }
    }
}

/// Message payload, tagged by `type` on the wire
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageBody {
    Text {
        content: String,
    },
    Price {
        coin_id: String,
        coin_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        price: Decimal,
    },
    Trending {
        coins: Vec<TrendingEntry>,
    },
    Chart {
        coin_id: String,
        coin_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        chart_data: ChartSeries,
    },
    Portfolio {
        holdings: Vec<Holding>,
        total_value: Decimal,
    },
    Error {
        content: String,
    },
}

impl MessageBody {
    /// Wire tag of this payload
    pub fn kind(&self) -> &'static str {
        match self {
            MessageBody::Text { .. } => "text",
            MessageBody::Price { .. } => "price",
            MessageBody::Trending { .. } => "trending",
            MessageBody::Chart { .. } => "chart",
            MessageBody::Portfolio { .. } => "portfolio",
            MessageBody::Error { .. } => "error",
        }
    }
}

/// A single message in a conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: Uuid,

    pub sender: Sender,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(flatten)]
    pub body: MessageBody,
}

impl Message {
    /// Create a new message
    pub fn new(sender: Sender, body: MessageBody) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            timestamp: Utc::now(),
            body,
        }
    }

    /// Text typed by the user
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Sender::User, MessageBody::Text {
            content: content.into(),
        })
    }

    /// Any assistant payload
    pub fn assistant(body: MessageBody) -> Self {
        Self::new(Sender::Assistant, body)
    }

    /// Plain assistant text
    pub fn text(content: impl Into<String>) -> Self {
        Self::assistant(MessageBody::Text {
            content: content.into(),
        })
    }

    /// Assistant error explanation
    pub fn error(content: impl Into<String>) -> Self {
        Self::assistant(MessageBody::Error {
            content: content.into(),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self.body, MessageBody::Error { .. })
    }

    /// Text of a text or error message
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Text { content } | MessageBody::Error { content } => Some(content),
            _ => None,
        }
    }
}

/// Conversation history, oldest first
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Get all messages
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Get the last message
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Number of messages
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
