//! Price level types with decimal precision

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A single aggregated price level in the orderbook
///
/// Levels are immutable values: the book replaces a level wholesale on every
/// update. Equality, ordering and hashing look at `price` only, so two levels
/// at the same price compare equal even when their quantities differ. Use
/// [`PriceLevel::is_identical`] to compare every field.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceLevel {
    /// Price of this level
    #[serde(deserialize_with = "deserialize_decimal")]
    pub price: Decimal,
    /// Aggregate quantity resting at this price
    #[serde(deserialize_with = "deserialize_decimal")]
    pub quantity: Decimal,
    /// Exchange timestamp (ms) of the message that last set this level
    #[serde(default)]
    pub timestamp: u64,
    /// Number of orders contributing to this level (at least 1)
    #[serde(default = "default_order_count")]
    pub order_count: u32,
}

fn default_order_count() -> u32 {
    1
}

impl PriceLevel {
    /// Create a new price level with a single contributing order
    pub fn new(price: Decimal, quantity: Decimal, timestamp: u64) -> Self {
        Self {
            price,
            quantity,
            timestamp,
            order_count: 1,
        }
    }

    /// Set the contributing order count (clamped to at least 1)
    pub fn with_order_count(mut self, order_count: u32) -> Self {
        self.order_count = order_count.max(1);
        self
    }

    /// Create a level from f64 values (for testing)
    pub fn from_f64(price: f64, quantity: f64) -> Self {
        use rust_decimal::prelude::FromPrimitive;
        Self::new(
            Decimal::from_f64(price).unwrap_or_default(),
            Decimal::from_f64(quantity).unwrap_or_default(),
            0,
        )
    }

    /// Get price as f64 (for display)
    pub fn price_f64(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.price.to_f64().unwrap_or(0.0)
    }

    /// Get quantity as f64 (for display)
    pub fn quantity_f64(&self) -> f64 {
        use rust_decimal::prelude::ToPrimitive;
        self.quantity.to_f64().unwrap_or(0.0)
    }

    /// Check if this level has zero quantity (should be removed)
    pub fn is_zero(&self) -> bool {
        self.quantity.is_zero()
    }

    /// Field-by-field comparison, unlike `==` which compares prices only
    pub fn is_identical(&self, other: &PriceLevel) -> bool {
        self.price == other.price
            && self.quantity == other.quantity
            && self.timestamp == other.timestamp
            && self.order_count == other.order_count
    }
}

impl PartialEq for PriceLevel {
    fn eq(&self, other: &Self) -> bool {
        self.price == other.price
    }
}

impl Eq for PriceLevel {}

impl PartialOrd for PriceLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.price.cmp(&other.price)
    }
}

impl Hash for PriceLevel {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.price.hash(state);
    }
}

/// CRITICAL: Custom deserializer to preserve decimal precision
/// Feeds send JSON numbers that lose precision with f64
pub(crate) fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let raw = crate::messages::RawNumber::from(serde_json::Value::deserialize(deserializer)?);
    raw.to_decimal().map_err(D::Error::custom)
}
