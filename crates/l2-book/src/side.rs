//! One side of the book

use crate::backend::{BackendKind, SideBackend};
use l2_types::{PriceLevel, Side, SortOrder};
use rust_decimal::Decimal;

/// A backend bound to its side and sort direction
///
/// Bids iterate descending, asks ascending. Owned exclusively by one
/// orderbook; readers only ever receive copies of its levels.
#[derive(Debug)]
pub struct OrderedSide {
    side: Side,
    backend: Box<dyn SideBackend>,
}

impl OrderedSide {
    /// Wrap a backend; the side is taken from the backend
    pub fn new(backend: Box<dyn SideBackend>) -> Self {
        Self {
            side: backend.side(),
            backend,
        }
    }

    /// Which side this is
    pub fn side(&self) -> Side {
        self.side
    }

    /// Best-to-worst direction
    pub fn order(&self) -> SortOrder {
        self.side.sort_order()
    }

    /// Storage implementation in use
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Insert or replace the level at `level.price`
    pub fn upsert(&mut self, level: PriceLevel) {
        self.backend.upsert(level);
    }

    /// Remove the level at `price`
    pub fn remove(&mut self, price: &Decimal) -> bool {
        self.backend.remove(price)
    }

    /// Copy of the level at `price`
    pub fn get(&self, price: &Decimal) -> Option<PriceLevel> {
        self.backend.get(price).copied()
    }

    /// Copy of the best level
    pub fn best(&self) -> Option<PriceLevel> {
        self.backend.best().copied()
    }

    /// Up to `depth` levels, best to worst
    pub fn top(&mut self, depth: usize) -> Vec<PriceLevel> {
        self.backend.top(depth)
    }

    /// Every level, best to worst
    pub fn levels(&mut self) -> Vec<PriceLevel> {
        let len = self.backend.len();
        self.backend.top(len)
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Check if the side is empty
    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }

    /// Remove every level
    pub fn clear(&mut self) {
        self.backend.clear();
    }
}
