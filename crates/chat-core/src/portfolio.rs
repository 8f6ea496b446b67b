//! Portfolio Accumulator
//!
//! Pure merge logic for the user's holdings. Every function takes the
//! current collection by reference and returns a new one; nothing here
//! mutates its input. Arithmetic is checked: a value outside `Decimal`'s
//! range is reported as `ChatError::MalformedInput`, never a panic.

use std::collections::{HashMap, HashSet};

use market_data::CoinSnapshot;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// One coin held by the user
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Canonical coin identifier, unique within a collection
    pub coin_id: String,

    pub symbol: String,

    /// Quantity held (never negative)
    pub amount: Decimal,

    /// Last known unit price in USD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,

    /// `amount * price` at the last valuation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Holding {
    pub fn new(coin_id: impl Into<String>, symbol: impl Into<String>, amount: Decimal) -> Self {
        Self {
            coin_id: coin_id.into(),
            symbol: symbol.into(),
            amount,
            price: None,
            value: None,
            name: None,
        }
    }

    /// Set the unit price and recompute the value (`None` if it overflows)
    pub fn priced_at(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self.value = self.amount.checked_mul(price);
        self
    }
}

/// A new or replacement position for one coin
#[derive(Clone, Debug, PartialEq)]
pub struct HoldingUpdate {
    pub coin_id: String,
    pub symbol: String,
    pub amount: Decimal,
    pub price: Decimal,
    pub name: Option<String>,
}

impl HoldingUpdate {
    /// Position of `amount` units priced from a fresh snapshot
    pub fn from_snapshot(amount: Decimal, snapshot: &CoinSnapshot) -> Self {
        Self {
            coin_id: snapshot.id.clone(),
            symbol: snapshot.symbol.clone(),
            amount,
            price: snapshot.current_price,
            name: Some(snapshot.name.clone()),
        }
    }
}

/// Holdings together with their aggregate value
#[derive(Clone, Debug, PartialEq)]
pub struct Valuation {
    pub holdings: Vec<Holding>,
    pub total_value: Decimal,
}

impl Valuation {
    fn of(holdings: Vec<Holding>) -> Result<Self> {
        let total_value = total_value(&holdings)?;
        Ok(Self {
            holdings,
            total_value,
        })
    }
}

fn out_of_range(what: &str, coin_id: &str) -> ChatError {
    ChatError::MalformedInput(format!("{what} of {coin_id} is out of range"))
}

/// `amount * price`, failing instead of overflowing
fn value_of(coin_id: &str, amount: Decimal, price: Decimal) -> Result<Decimal> {
    amount
        .checked_mul(price)
        .ok_or_else(|| out_of_range("value", coin_id))
}

/// Sum of every holding's value; unvalued holdings count as zero
pub fn total_value(holdings: &[Holding]) -> Result<Decimal> {
    holdings.iter().try_fold(Decimal::ZERO, |total, h| {
        total
            .checked_add(h.value.unwrap_or(Decimal::ZERO))
            .ok_or_else(|| out_of_range("total value", &h.coin_id))
    })
}

/// Replace the holding for `update.coin_id` in place, or append it.
///
/// The amount is replaced, not added to (last write wins). An existing
/// entry keeps its position and symbol.
pub fn upsert(holdings: &[Holding], update: HoldingUpdate) -> Result<Valuation> {
    let mut updated = holdings.to_vec();
    let value = value_of(&update.coin_id, update.amount, update.price)?;

    match updated.iter_mut().find(|h| h.coin_id == update.coin_id) {
        Some(existing) => {
            existing.amount = update.amount;
            existing.price = Some(update.price);
            existing.value = Some(value);
            existing.name = update.name;
        }
        None => updated.push(Holding {
            coin_id: update.coin_id,
            symbol: update.symbol,
            amount: update.amount,
            price: Some(update.price),
            value: Some(value),
            name: update.name,
        }),
    }

    Valuation::of(updated)
}

/// Re-price every holding from `prices`.
///
/// A coin missing from `prices` keeps its last known price; with no price
/// at all its value is zero.
pub fn revalue(holdings: &[Holding], prices: &HashMap<String, Decimal>) -> Result<Valuation> {
    let updated = holdings
        .iter()
        .map(|h| {
            let price = prices.get(&h.coin_id).copied().or(h.price);
            let value = value_of(&h.coin_id, h.amount, price.unwrap_or(Decimal::ZERO))?;
            Ok(Holding {
                price,
                value: Some(value),
                ..h.clone()
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Valuation::of(updated)
}

/// First coin identifier that appears more than once
pub fn find_duplicate(holdings: &[Holding]) -> Option<&str> {
    let mut seen = HashSet::new();
    holdings
        .iter()
        .map(|h| h.coin_id.as_str())
        .find(|id| !seen.insert(*id))
}

/// Reject a collection that holds the same coin twice
pub fn ensure_unique(holdings: &[Holding]) -> Result<()> {
    match find_duplicate(holdings) {
        Some(coin_id) => Err(ChatError::MalformedInput(format!(
            "duplicate holding for {coin_id}"
        ))),
        None => Ok(()),
    }
}
