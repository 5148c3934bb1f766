//! Feed message types at the ingestion boundary
//!
//! Snapshots and deltas arrive from the market-data client as JSON records
//! whose levels are `[price, qty]` pairs, each element either a string or a
//! number. The pairs are kept exactly as received ([`LevelEntry`]) so the
//! orderbook can validate every entry on its own and skip the bad ones
//! without rejecting the whole message.
//!
//! # Wire shape
//!
//! ```text
//! {"type": "snapshot", "bids": [["50000", "1.2"]], "asks": [["50001", "1.0"]],
//!  "update_id": 1, "sequence": 10, "timestamp_ms": 1700000000000}
//! ```
//!
//! Bybit-style short keys (`b`, `a`, `u`, `seq`, `ts`, `s`) are accepted as aliases.

use crate::enums::Side;
use crate::error::BookError;
use rust_decimal::Decimal;
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A single scalar exactly as the feed sent it
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum RawNumber {
    String(String),
    Number(serde_json::Number),
    Other(serde_json::Value),
}

impl RawNumber {
    /// Text form used for parsing and for error reports
    pub(crate) fn as_text(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Other(v) => v.to_string(),
        }
    }

    pub(crate) fn to_decimal(&self) -> Result<Decimal, String> {
        match self {
            Self::String(s) => parse_decimal(s.trim()),
            Self::Number(n) => {
                if let Some(u) = n.as_u64() {
                    return Ok(Decimal::from(u));
                }
                if let Some(i) = n.as_i64() {
                    return Ok(Decimal::from(i));
                }
                // Floats past 2^53 no longer carry their exact digits
                let f = n.as_f64().ok_or_else(|| "invalid number".to_string())?;
                if !f.is_finite() || f.abs() > MAX_EXACT_FLOAT {
                    return Err(format!("number {} too large for exact representation", n));
                }
                parse_decimal(&n.to_string())
            }
            Self::Other(v) => Err(format!("expected string or number, got {}", v)),
        }
    }
}

/// Largest magnitude at which every integral f64 is exact
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

impl From<serde_json::Value> for RawNumber {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Number(n) => Self::Number(n),
            other => Self::Other(other),
        }
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, String> {
    if s.is_empty() {
        return Err("empty value".to_string());
    }
    if s.contains('e') || s.contains('E') {
        return Decimal::from_scientific(s).map_err(|e| e.to_string());
    }
    Decimal::from_str(s).map_err(|e| e.to_string())
}

/// One raw `[price, qty]` pair from a snapshot or delta
#[derive(Debug, Clone, PartialEq)]
pub struct LevelEntry {
    price: RawNumber,
    qty: RawNumber,
}

impl LevelEntry {
    /// Create an entry from its textual parts
    pub fn new(price: impl Into<String>, qty: impl Into<String>) -> Self {
        Self {
            price: RawNumber::String(price.into()),
            qty: RawNumber::String(qty.into()),
        }
    }

    /// Create an entry from already-parsed decimals
    pub fn from_decimals(price: Decimal, qty: Decimal) -> Self {
        Self::new(price.to_string(), qty.to_string())
    }

    /// Raw price text
    pub fn price_text(&self) -> String {
        self.price.as_text()
    }

    /// Raw quantity text
    pub fn qty_text(&self) -> String {
        self.qty.as_text()
    }

    /// Parse and validate this entry
    ///
    /// Fails with [`BookError::MalformedEntry`] if either part is not a finite
    /// decimal, or if price or quantity is negative. A zero quantity is valid
    /// and means "remove this level" in a delta.
    pub fn parse(&self, side: Side) -> Result<(Decimal, Decimal), BookError> {
        let malformed = |reason: String| {
            BookError::malformed(side, self.price.as_text(), self.qty.as_text(), reason)
        };

        let price = self
            .price
            .to_decimal()
            .map_err(|e| malformed(format!("price: {}", e)))?;
        let qty = self
            .qty
            .to_decimal()
            .map_err(|e| malformed(format!("qty: {}", e)))?;

        if price.is_sign_negative() && !price.is_zero() {
            return Err(malformed("negative price".to_string()));
        }
        if qty.is_sign_negative() && !qty.is_zero() {
            return Err(malformed("negative qty".to_string()));
        }

        Ok((price, qty))
    }
}

impl<P: ToString, Q: ToString> From<(P, Q)> for LevelEntry {
    fn from((price, qty): (P, Q)) -> Self {
        Self::new(price.to_string(), qty.to_string())
    }
}

impl<'de> Deserialize<'de> for LevelEntry {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Any shape is accepted here; a bad entry fails `parse` on its own
        let entry = match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Array(parts) => {
                let mut parts = parts.into_iter().map(RawNumber::from);
                Self {
                    price: parts.next().unwrap_or(RawNumber::Other(serde_json::Value::Null)),
                    qty: parts.next().unwrap_or(RawNumber::Other(serde_json::Value::Null)),
                }
            }
            other => Self {
                price: RawNumber::Other(other),
                qty: RawNumber::Other(serde_json::Value::Null),
            },
        };
        Ok(entry)
    }
}

impl Serialize for LevelEntry {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.price.as_text())?;
        tuple.serialize_element(&self.qty.as_text())?;
        tuple.end()
    }
}

/// Full replace-all view of one symbol's book
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookSnapshot {
    /// Trading pair symbol (informational)
    #[serde(default, alias = "s", skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Bid entries
    #[serde(default, alias = "b")]
    pub bids: Vec<LevelEntry>,
    /// Ask entries
    #[serde(default, alias = "a")]
    pub asks: Vec<LevelEntry>,
    /// Exchange update id
    #[serde(default, alias = "u")]
    pub update_id: u64,
    /// Feed sequence number
    #[serde(alias = "seq")]
    pub sequence: u64,
    /// Exchange timestamp in milliseconds
    #[serde(default, alias = "ts")]
    pub timestamp_ms: u64,
}

impl BookSnapshot {
    /// Create an empty snapshot at the given sequence
    pub fn new(update_id: u64, sequence: u64, timestamp_ms: u64) -> Self {
        Self {
            symbol: None,
            bids: Vec::new(),
            asks: Vec::new(),
            update_id,
            sequence,
            timestamp_ms,
        }
    }

    /// Set the bid entries
    pub fn with_bids<E: Into<LevelEntry>>(mut self, bids: impl IntoIterator<Item = E>) -> Self {
        self.bids = bids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the ask entries
    pub fn with_asks<E: Into<LevelEntry>>(mut self, asks: impl IntoIterator<Item = E>) -> Self {
        self.asks = asks.into_iter().map(Into::into).collect();
        self
    }

    /// Set the symbol
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }
}

/// Incremental change since the previous message
///
/// An entry with quantity zero removes its price level.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookDelta {
    /// Trading pair symbol (informational)
    #[serde(default, alias = "s", skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Changed bid entries
    #[serde(default, alias = "b")]
    pub bids: Vec<LevelEntry>,
    /// Changed ask entries
    #[serde(default, alias = "a")]
    pub asks: Vec<LevelEntry>,
    /// Exchange update id
    #[serde(default, alias = "u")]
    pub update_id: u64,
    /// Feed sequence number
    #[serde(alias = "seq")]
    pub sequence: u64,
    /// Exchange timestamp in milliseconds
    #[serde(default, alias = "ts")]
    pub timestamp_ms: u64,
}

impl BookDelta {
    /// Create an empty delta at the given sequence
    pub fn new(update_id: u64, sequence: u64, timestamp_ms: u64) -> Self {
        Self {
            symbol: None,
            bids: Vec::new(),
            asks: Vec::new(),
            update_id,
            sequence,
            timestamp_ms,
        }
    }

    /// Set the bid entries
    pub fn with_bids<E: Into<LevelEntry>>(mut self, bids: impl IntoIterator<Item = E>) -> Self {
        self.bids = bids.into_iter().map(Into::into).collect();
        self
    }

    /// Set the ask entries
    pub fn with_asks<E: Into<LevelEntry>>(mut self, asks: impl IntoIterator<Item = E>) -> Self {
        self.asks = asks.into_iter().map(Into::into).collect();
        self
    }

    /// Set the symbol
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    /// Total number of entries on both sides
    pub fn entry_count(&self) -> usize {
        self.bids.len() + self.asks.len()
    }
}

/// A book message as produced by the market-data client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeedMessage {
    /// Full rebuild
    Snapshot(BookSnapshot),
    /// Incremental update
    Delta(BookDelta),
}

impl FeedMessage {
    /// Sequence number carried by the message
    pub fn sequence(&self) -> u64 {
        match self {
            Self::Snapshot(s) => s.sequence,
            Self::Delta(d) => d.sequence,
        }
    }

    /// Symbol carried by the message, if any
    pub fn symbol(&self) -> Option<&str> {
        match self {
            Self::Snapshot(s) => s.symbol.as_deref(),
            Self::Delta(d) => d.symbol.as_deref(),
        }
    }

    /// Returns true for snapshots
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::Snapshot(_))
    }
}

impl From<BookSnapshot> for FeedMessage {
    fn from(snapshot: BookSnapshot) -> Self {
        Self::Snapshot(snapshot)
    }
}

impl From<BookDelta> for FeedMessage {
    fn from(delta: BookDelta) -> Self {
        Self::Delta(delta)
    }
}
