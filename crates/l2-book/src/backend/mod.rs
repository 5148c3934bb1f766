//! Price-level storage backends
//!
//! One side of the book is a map `price -> PriceLevel` kept in best-to-worst
//! order. Two interchangeable implementations are provided:
//!
//! | Backend | Best level | Upsert/remove | Top N |
//! |---------|------------|---------------|-------|
//! | [`SkipListBackend`] | O(1) | O(log n) expected | O(N) |
//! | [`HeapBackend`] | O(1) | O(log n) | O(N log n), pops then reinserts |
//!
//! The heap keeps a smaller footprint and the fastest best-of-book access;
//! the skip list wins when deep traversal is frequent.

pub mod heap;
pub mod skiplist;

pub use heap::HeapBackend;
pub use skiplist::{SkipList, SkipListBackend};

use l2_types::{PriceLevel, Side};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Storage for one side of the book
///
/// Implementations order levels for their [`Side`]: highest price first for
/// bids, lowest first for asks. Prices are unique; `upsert` on an existing
/// price replaces the level.
pub trait SideBackend: Send + fmt::Debug {
    /// Which implementation this is
    fn kind(&self) -> BackendKind;

    /// Side whose ordering this backend follows
    fn side(&self) -> Side;

    /// Insert a level, replacing any level at the same price
    fn upsert(&mut self, level: PriceLevel);

    /// Remove the level at `price`, returning whether one existed
    fn remove(&mut self, price: &Decimal) -> bool;

    /// Look up the level at `price`
    fn get(&self, price: &Decimal) -> Option<&PriceLevel>;

    /// Best level of the side
    fn best(&self) -> Option<&PriceLevel>;

    /// Up to `depth` levels, best to worst
    ///
    /// Takes `&mut self` because some backends restructure internally while
    /// collecting; the stored levels are unchanged once this returns.
    fn top(&mut self, depth: usize) -> Vec<PriceLevel>;

    /// Number of levels stored
    fn len(&self) -> usize;

    /// Check if the side holds no levels
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every level
    fn clear(&mut self);
}

/// Backend selection, made once when a book is constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Randomized skip list keyed by price
    #[default]
    SkipList,
    /// Indexed binary heap (max for bids, min for asks)
    Heap,
}

impl BackendKind {
    /// Returns the backend name as used in config and log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SkipList => "skip_list",
            Self::Heap => "heap",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn all_backends(side: Side) -> Vec<Box<dyn SideBackend>> {
        vec![
            Box::new(SkipListBackend::with_seed(side, 7)),
            Box::new(HeapBackend::new(side)),
        ]
    }

    fn level(price: Decimal, qty: Decimal) -> PriceLevel {
        PriceLevel::new(price, qty, 0)
    }

    #[test]
    fn test_bid_order_all_backends() {
        for mut backend in all_backends(Side::Bid) {
            backend.upsert(level(dec!(100), dec!(1)));
            backend.upsert(level(dec!(101), dec!(2)));
            backend.upsert(level(dec!(99), dec!(3)));

            let prices: Vec<_> = backend.top(10).iter().map(|l| l.price).collect();
            assert_eq!(prices, vec![dec!(101), dec!(100), dec!(99)], "{}", backend.kind());
            assert_eq!(backend.best().map(|l| l.price), Some(dec!(101)));
        }
    }

    #[test]
    fn test_ask_order_all_backends() {
        for mut backend in all_backends(Side::Ask) {
            backend.upsert(level(dec!(100), dec!(1)));
            backend.upsert(level(dec!(101), dec!(2)));
            backend.upsert(level(dec!(99), dec!(3)));

            let prices: Vec<_> = backend.top(2).iter().map(|l| l.price).collect();
            assert_eq!(prices, vec![dec!(99), dec!(100)], "{}", backend.kind());
            assert_eq!(backend.len(), 3);
        }
    }

    #[test]
    fn test_upsert_replaces_without_duplicate() {
        for mut backend in all_backends(Side::Bid) {
            backend.upsert(level(dec!(100), dec!(1)));
            backend.upsert(level(dec!(100.0), dec!(5)));

            assert_eq!(backend.len(), 1);
            assert_eq!(backend.get(&dec!(100)).map(|l| l.quantity), Some(dec!(5)));
        }
    }

    #[test]
    fn test_remove_and_clear() {
        for mut backend in all_backends(Side::Ask) {
            backend.upsert(level(dec!(100), dec!(1)));
            backend.upsert(level(dec!(101), dec!(1)));

            assert!(backend.remove(&dec!(100)));
            assert!(!backend.remove(&dec!(100)));
            assert_eq!(backend.best().map(|l| l.price), Some(dec!(101)));

            backend.clear();
            assert!(backend.is_empty());
            assert!(backend.best().is_none());
            assert!(backend.top(5).is_empty());
        }
    }

    #[test]
    fn test_backend_kind_serde() {
        let kind: BackendKind = serde_json::from_str("\"heap\"").unwrap();
        assert_eq!(kind, BackendKind::Heap);
        assert_eq!(BackendKind::default(), BackendKind::SkipList);
        assert_eq!(BackendKind::SkipList.to_string(), "skip_list");
    }
}
