//! Thread-safe orderbook handle
//!
//! One producer applies messages in feed order while any number of readers
//! query. Every call takes the book's single mutex for its whole duration,
//! so readers see the state after some prefix of applied messages and never
//! a partial update. Use [`SharedOrderbook::lock`] to read several values
//! from the same state.

use crate::{
    config::BookConfig,
    metrics::MetricsSnapshot,
    orderbook::{ApplyReport, ApplyResult, DeltaOutcome, Orderbook, OrderbookSnapshot, OrderbookState},
    validate::Violation,
};
use l2_types::{BookDelta, BookSnapshot, FeedMessage, PriceLevel, Side};
use parking_lot::{Mutex, MutexGuard};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Cloneable handle to one mutex-guarded orderbook
///
/// The mutex is a plain `parking_lot::Mutex`, not a reentrant lock. Each
/// method locks exactly once, so locking again from the same thread while
/// a guard is alive deadlocks.
#[derive(Debug, Clone)]
pub struct SharedOrderbook {
    symbol: Arc<str>,
    inner: Arc<Mutex<Orderbook>>,
}

impl SharedOrderbook {
    /// Create a shared orderbook with the default backend
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::from(Orderbook::new(symbol))
    }

    /// Create a shared orderbook with a specific configuration
    pub fn with_config(symbol: impl Into<String>, config: BookConfig) -> Self {
        Self::from(Orderbook::with_config(symbol, config))
    }

    /// Get the symbol without locking
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Hold the lock across several operations
    ///
    /// The mutex is deliberately not reentrant. Calling any other method of
    /// this handle (or a clone) on the same thread while the guard is alive
    /// deadlocks; read through the guard instead.
    pub fn lock(&self) -> MutexGuard<'_, Orderbook> {
        self.inner.lock()
    }

    /// Take the lock only if nobody holds it
    pub fn try_lock(&self) -> Option<MutexGuard<'_, Orderbook>> {
        self.inner.try_lock()
    }

    /// Check if two handles refer to the same book
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// See [`Orderbook::apply`]
    pub fn apply(&self, message: &FeedMessage) -> ApplyResult {
        self.inner.lock().apply(message)
    }

    /// See [`Orderbook::apply_snapshot`]
    pub fn apply_snapshot(&self, snapshot: &BookSnapshot) -> ApplyReport {
        self.inner.lock().apply_snapshot(snapshot)
    }

    /// See [`Orderbook::apply_delta`]
    pub fn apply_delta(&self, delta: &BookDelta) -> DeltaOutcome {
        self.inner.lock().apply_delta(delta)
    }

    /// Get the best bid
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.inner.lock().best_bid()
    }

    /// Get the best ask
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.inner.lock().best_ask()
    }

    /// Best bid and ask from the same state
    pub fn best_bid_ask(&self) -> (Option<PriceLevel>, Option<PriceLevel>) {
        let book = self.inner.lock();
        (book.best_bid(), book.best_ask())
    }

    /// Get the spread
    pub fn spread(&self) -> Option<Decimal> {
        self.inner.lock().spread()
    }

    /// Get the mid price
    pub fn mid_price(&self) -> Option<Decimal> {
        self.inner.lock().mid_price()
    }

    /// Look up one level
    pub fn level(&self, side: Side, price: Decimal) -> Option<PriceLevel> {
        self.inner.lock().level(side, price)
    }

    /// Up to `depth` levels per side, best to worst
    pub fn top_levels(&self, depth: usize) -> (Vec<PriceLevel>, Vec<PriceLevel>) {
        self.inner.lock().top_levels(depth)
    }

    /// See [`Orderbook::validate`]
    pub fn validate(&self) -> bool {
        self.inner.lock().validate()
    }

    /// See [`Orderbook::violations`]
    pub fn violations(&self) -> Vec<Violation> {
        self.inner.lock().violations()
    }

    /// Get the current state
    pub fn state(&self) -> OrderbookState {
        self.inner.lock().state()
    }

    /// Check if the orderbook is synchronized
    pub fn is_synced(&self) -> bool {
        self.inner.lock().is_synced()
    }

    /// Cumulative update metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.lock().metrics()
    }

    /// Owned copy of the whole book
    pub fn snapshot(&self) -> OrderbookSnapshot {
        self.inner.lock().snapshot()
    }

    /// See [`Orderbook::reset`]
    pub fn reset(&self) {
        self.inner.lock().reset();
    }
}

impl From<Orderbook> for SharedOrderbook {
    fn from(book: Orderbook) -> Self {
        Self {
            symbol: Arc::from(book.symbol()),
            inner: Arc::new(Mutex::new(book)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_clones_share_state() {
        let book = SharedOrderbook::new("BTCUSDT");
        let reader = book.clone();
        assert!(book.ptr_eq(&reader));
        assert_eq!(reader.symbol(), "BTCUSDT");

        book.apply_snapshot(
            &BookSnapshot::new(1, 1, 0)
                .with_bids([("100", "1")])
                .with_asks([("101", "2")]),
        );

        assert!(reader.is_synced());
        let (bid, ask) = reader.best_bid_ask();
        assert_eq!(bid.map(|l| l.price), Some(dec!(100)));
        assert_eq!(ask.map(|l| l.quantity), Some(dec!(2)));
    }

    #[test]
    fn test_lock_for_consistent_reads() {
        let book = SharedOrderbook::new("BTCUSDT");
        book.apply_snapshot(&BookSnapshot::new(1, 1, 0).with_bids([("100", "1")]));

        let guard = book.lock();
        assert_eq!(guard.bid_count(), 1);
        assert_eq!(guard.best_bid().map(|l| l.price), Some(dec!(100)));
        drop(guard);

        book.reset();
        assert_eq!(book.state(), OrderbookState::Uninitialized);
    }

    #[test]
    fn test_try_lock_while_guard_held() {
        let book = SharedOrderbook::new("BTCUSDT");
        let other = book.clone();

        let guard = book.lock();
        assert!(other.try_lock().is_none());
        assert!(book.try_lock().is_none());
        drop(guard);

        let guard = other.try_lock().unwrap();
        assert_eq!(guard.state(), OrderbookState::Uninitialized);
    }
}
