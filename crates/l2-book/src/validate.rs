//! Book integrity checks
//!
//! Pure functions over a point-in-time copy of both sides. Nothing here
//! corrects the book: a crossed or corrupt book needs a fresh snapshot.

use l2_types::{BookError, PriceLevel, Side};
use rust_decimal::Decimal;
use std::collections::HashSet;
use thiserror::Error;

/// A broken book invariant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The same price appears twice on one side
    #[error("Duplicate {side} price level {price}")]
    DuplicatePrice { side: Side, price: Decimal },

    /// Levels are not in best-to-worst order
    #[error("{side} levels out of order: {previous} before {next}")]
    OutOfOrder {
        side: Side,
        previous: Decimal,
        next: Decimal,
    },

    /// Traversal yielded a different number of levels than the side reports
    #[error("{side} side reports {reported} levels but yielded {found}")]
    CountMismatch {
        side: Side,
        reported: usize,
        found: usize,
    },

    /// Best bid is not strictly below best ask
    #[error("Crossed book: best bid {bid} >= best ask {ask}")]
    Crossed { bid: Decimal, ask: Decimal },
}

impl Violation {
    /// Map to the ingestion error taxonomy where one exists
    pub fn as_book_error(&self) -> Option<BookError> {
        match self {
            Self::Crossed { bid, ask } => Some(BookError::CrossedBook {
                bid: *bid,
                ask: *ask,
            }),
            _ => None,
        }
    }
}

/// Check one side's levels (given best to worst) against its reported size
pub fn check_side(side: Side, levels: &[PriceLevel], reported_len: usize) -> Vec<Violation> {
    let mut violations = Vec::new();
    let order = side.sort_order();
    let mut seen = HashSet::with_capacity(levels.len());

    for level in levels {
        if !seen.insert(level.price) {
            violations.push(Violation::DuplicatePrice {
                side,
                price: level.price,
            });
        }
    }

    for pair in levels.windows(2) {
        let (previous, next) = (pair[0].price, pair[1].price);
        if previous != next && !order.precedes(&previous, &next) {
            violations.push(Violation::OutOfOrder {
                side,
                previous,
                next,
            });
        }
    }

    if levels.len() != reported_len {
        violations.push(Violation::CountMismatch {
            side,
            reported: reported_len,
            found: levels.len(),
        });
    }

    violations
}

/// Check that the best bid sits strictly below the best ask
///
/// An empty side can never cross.
pub fn check_not_crossed(best_bid: Option<&PriceLevel>, best_ask: Option<&PriceLevel>) -> Option<Violation> {
    match (best_bid, best_ask) {
        (Some(bid), Some(ask)) if bid.price >= ask.price => Some(Violation::Crossed {
            bid: bid.price,
            ask: ask.price,
        }),
        _ => None,
    }
}

/// Check both sides and the spread
pub fn check_book(
    bids: &[PriceLevel],
    bid_len: usize,
    asks: &[PriceLevel],
    ask_len: usize,
) -> Vec<Violation> {
    let mut violations = check_side(Side::Bid, bids, bid_len);
    violations.extend(check_side(Side::Ask, asks, ask_len));
    violations.extend(check_not_crossed(bids.first(), asks.first()));
    violations
}
