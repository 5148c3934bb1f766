//! Error types for orderbook ingestion

use crate::enums::Side;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while ingesting feed data into an orderbook
///
/// None of these are fatal to the book. Malformed entries are skipped one
/// by one; stale deltas are dropped whole; gaps and crossed books are handed
/// to the owner, who decides whether to fetch a fresh snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookError {
    /// Unparsable or negative `(price, qty)` pair
    #[error("Malformed {side} entry [{price:?}, {qty:?}]: {reason}")]
    MalformedEntry {
        side: Side,
        price: String,
        qty: String,
        reason: String,
    },

    /// Delta sequence at or below the last applied sequence
    #[error("Stale sequence {sequence} (last applied {last_sequence})")]
    StaleSequence { sequence: u64, last_sequence: u64 },

    /// One or more deltas were lost between the last applied sequence and this one
    #[error("Sequence gap: expected {expected}, received {received}")]
    SequenceGap { expected: u64, received: u64 },

    /// Best bid is not strictly below best ask
    #[error("Crossed book: best bid {bid} >= best ask {ask}")]
    CrossedBook { bid: Decimal, ask: Decimal },
}

impl BookError {
    /// Create a malformed entry error
    pub fn malformed(
        side: Side,
        price: impl Into<String>,
        qty: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedEntry {
            side,
            price: price.into(),
            qty: qty.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the owner must request a fresh snapshot
    pub fn requires_resync(&self) -> bool {
        matches!(self, Self::SequenceGap { .. } | Self::CrossedBook { .. })
    }

    /// Returns true if the book stays usable without any action
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedEntry { .. } | Self::StaleSequence { .. })
    }
}
