//! Orderbook state machine
//!
//! Maintains one symbol's L2 book from a snapshot followed by
//! sequence-numbered deltas.
//!
//! # State Machine
//!
//! ```text
//! Uninitialized → Synced ↔ Desynchronized
//! ```
//!
//! A snapshot always moves the book to `Synced`. A sequence gap moves it to
//! `Desynchronized`, where deltas are refused until the next snapshot.

use crate::{
    backend::BackendKind,
    config::BookConfig,
    metrics::{BookMetrics, MetricsSnapshot},
    side::OrderedSide,
    validate::{check_book, Violation},
};
use l2_types::{BookDelta, BookError, BookSnapshot, FeedMessage, LevelEntry, PriceLevel, Side};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cell::Cell;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Orderbook synchronization state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderbookState {
    /// No snapshot applied yet
    #[default]
    Uninitialized,
    /// Processing deltas normally
    Synced,
    /// Sequence gap detected, needs a fresh snapshot
    Desynchronized,
}

/// Per-entry tally of one applied message
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Levels inserted or replaced
    pub upserted: usize,
    /// Levels removed by a zero quantity
    pub removed: usize,
    /// Malformed entries skipped
    pub skipped: usize,
}

/// Outcome of [`Orderbook::apply_delta`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    /// Delta applied and sequence advanced
    Applied(ApplyReport),
    /// Sequence at or below the last applied one; dropped without effect
    Stale { sequence: u64, last_sequence: u64 },
    /// Sequence skipped ahead; not applied, book is now desynchronized
    Gap { expected: u64, received: u64 },
    /// No snapshot to apply against (never synced, or desynchronized)
    AwaitingSnapshot,
}

impl DeltaOutcome {
    /// Check if the delta changed the book
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Check if the owner must fetch a fresh snapshot
    pub fn requires_resync(&self) -> bool {
        matches!(self, Self::Gap { .. } | Self::AwaitingSnapshot)
    }

    /// Convert to a `Result`, with `None` while awaiting a snapshot
    pub fn into_result(self) -> Result<Option<ApplyReport>, BookError> {
        match self {
            Self::Applied(report) => Ok(Some(report)),
            Self::AwaitingSnapshot => Ok(None),
            Self::Stale {
                sequence,
                last_sequence,
            } => Err(BookError::StaleSequence {
                sequence,
                last_sequence,
            }),
            Self::Gap { expected, received } => Err(BookError::SequenceGap { expected, received }),
        }
    }
}

/// Result of applying a feed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    /// Snapshot was applied
    Snapshot(ApplyReport),
    /// Delta was processed
    Delta(DeltaOutcome),
}

impl ApplyResult {
    /// Check if the owner must fetch a fresh snapshot
    pub fn requires_resync(&self) -> bool {
        match self {
            Self::Snapshot(_) => false,
            Self::Delta(outcome) => outcome.requires_resync(),
        }
    }
}

type BestPair = (Option<PriceLevel>, Option<PriceLevel>);

/// L2 orderbook for one symbol
#[derive(Debug)]
pub struct Orderbook {
    /// Symbol for this orderbook
    symbol: String,
    config: BookConfig,
    bids: OrderedSide,
    asks: OrderedSide,
    state: OrderbookState,
    last_update_id: u64,
    last_sequence: u64,
    timestamp_ms: u64,
    metrics: BookMetrics,
    /// Best bid/ask, `None` when dirty
    best_cache: Cell<Option<BestPair>>,
}

impl Orderbook {
    /// Create an orderbook with the default backend
    pub fn new(symbol: impl Into<String>) -> Self {
        Self::with_config(symbol, BookConfig::default())
    }

    /// Create an orderbook with a specific configuration
    pub fn with_config(symbol: impl Into<String>, config: BookConfig) -> Self {
        Self {
            symbol: symbol.into(),
            bids: config.build_side(Side::Bid),
            asks: config.build_side(Side::Ask),
            config,
            state: OrderbookState::Uninitialized,
            last_update_id: 0,
            last_sequence: 0,
            timestamp_ms: 0,
            metrics: BookMetrics::default(),
            best_cache: Cell::new(None),
        }
    }

    /// Get the symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Get the configuration
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Storage backend in use
    pub fn backend(&self) -> BackendKind {
        self.config.backend
    }

    /// Get the current state
    pub fn state(&self) -> OrderbookState {
        self.state
    }

    /// Check if the orderbook is synchronized
    pub fn is_synced(&self) -> bool {
        self.state == OrderbookState::Synced
    }

    /// Update id of the last applied message
    pub fn last_update_id(&self) -> u64 {
        self.last_update_id
    }

    /// Sequence of the last applied message
    pub fn last_sequence(&self) -> u64 {
        self.last_sequence
    }

    /// Exchange timestamp of the last applied message
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// Apply any feed message
    pub fn apply(&mut self, message: &FeedMessage) -> ApplyResult {
        match message {
            FeedMessage::Snapshot(snapshot) => ApplyResult::Snapshot(self.apply_snapshot(snapshot)),
            FeedMessage::Delta(delta) => ApplyResult::Delta(self.apply_delta(delta)),
        }
    }

    /// Replace both sides wholesale
    ///
    /// Malformed entries are skipped individually and zero quantities are
    /// ignored. The snapshot's sequence becomes the new baseline even if it
    /// is lower than the previous one. Cumulative metrics are kept.
    pub fn apply_snapshot(&mut self, snapshot: &BookSnapshot) -> ApplyReport {
        let start = Instant::now();

        self.bids.clear();
        self.asks.clear();

        let mut report = ApplyReport::default();
        self.apply_entries(Side::Bid, &snapshot.bids, snapshot.timestamp_ms, &mut report);
        self.apply_entries(Side::Ask, &snapshot.asks, snapshot.timestamp_ms, &mut report);
        self.invalidate_best();

        if snapshot.sequence < self.last_sequence {
            warn!(
                "Snapshot for {} rewinds sequence {} -> {}",
                self.symbol, self.last_sequence, snapshot.sequence
            );
        }

        self.last_update_id = snapshot.update_id;
        self.last_sequence = snapshot.sequence;
        self.timestamp_ms = snapshot.timestamp_ms;
        self.state = OrderbookState::Synced;

        self.metrics.record_malformed(report.skipped);
        self.metrics.record_update(start.elapsed());

        info!(
            "Applied snapshot for {} at seq {} ({} bids, {} asks, {} skipped)",
            self.symbol,
            snapshot.sequence,
            self.bids.len(),
            self.asks.len(),
            report.skipped
        );

        report
    }

    /// Apply an incremental update
    ///
    /// A zero quantity removes the level, a positive one upserts it.
    pub fn apply_delta(&mut self, delta: &BookDelta) -> DeltaOutcome {
        if self.state != OrderbookState::Synced {
            debug!(
                "Ignoring delta {} for {}: awaiting snapshot ({:?})",
                delta.sequence, self.symbol, self.state
            );
            return DeltaOutcome::AwaitingSnapshot;
        }

        if delta.sequence <= self.last_sequence {
            self.metrics.record_stale();
            debug!(
                "Ignoring stale update for {}: {} <= {}",
                self.symbol, delta.sequence, self.last_sequence
            );
            return DeltaOutcome::Stale {
                sequence: delta.sequence,
                last_sequence: self.last_sequence,
            };
        }

        let expected = self.last_sequence.saturating_add(1);
        if delta.sequence > expected {
            self.state = OrderbookState::Desynchronized;
            self.metrics.record_gap();
            warn!(
                "Sequence gap for {}: expected {}, received {}; resync required",
                self.symbol, expected, delta.sequence
            );
            return DeltaOutcome::Gap {
                expected,
                received: delta.sequence,
            };
        }

        let start = Instant::now();

        let mut report = ApplyReport::default();
        self.apply_entries(Side::Bid, &delta.bids, delta.timestamp_ms, &mut report);
        self.apply_entries(Side::Ask, &delta.asks, delta.timestamp_ms, &mut report);
        self.invalidate_best();

        self.last_update_id = delta.update_id;
        self.last_sequence = delta.sequence;
        self.timestamp_ms = delta.timestamp_ms;

        self.metrics.record_malformed(report.skipped);
        self.metrics.record_update(start.elapsed());

        debug!(
            "Applied delta {} for {} (+{} -{} skipped {})",
            delta.sequence, self.symbol, report.upserted, report.removed, report.skipped
        );

        DeltaOutcome::Applied(report)
    }

    fn apply_entries(
        &mut self,
        side: Side,
        entries: &[LevelEntry],
        timestamp_ms: u64,
        report: &mut ApplyReport,
    ) {
        let book_side = match side {
            Side::Bid => &mut self.bids,
            Side::Ask => &mut self.asks,
        };

        for entry in entries {
            match entry.parse(side) {
                Ok((price, qty)) if qty.is_zero() => {
                    if book_side.remove(&price) {
                        report.removed += 1;
                    }
                }
                Ok((price, qty)) => {
                    book_side.upsert(PriceLevel::new(price, qty, timestamp_ms));
                    report.upserted += 1;
                }
                Err(e) => {
                    report.skipped += 1;
                    warn!("Skipping entry for {}: {}", self.symbol, e);
                }
            }
        }
    }

    fn invalidate_best(&self) {
        self.best_cache.set(None);
    }

    fn best_pair(&self) -> BestPair {
        if let Some(cached) = self.best_cache.get() {
            return cached;
        }
        let fresh = (self.bids.best(), self.asks.best());
        self.best_cache.set(Some(fresh));
        fresh
    }

    /// Get the best bid
    pub fn best_bid(&self) -> Option<PriceLevel> {
        self.best_pair().0
    }

    /// Get the best ask
    pub fn best_ask(&self) -> Option<PriceLevel> {
        self.best_pair().1
    }

    /// Get the spread (ask - bid)
    pub fn spread(&self) -> Option<Decimal> {
        match self.best_pair() {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Get the mid price, halfway between best bid and best ask
    pub fn mid_price(&self) -> Option<Decimal> {
        match self.best_pair() {
            (Some(bid), Some(ask)) => midpoint(bid.price, ask.price),
            _ => None,
        }
    }

    /// Look up the level at `price` on one side
    pub fn level(&self, side: Side, price: Decimal) -> Option<PriceLevel> {
        match side {
            Side::Bid => self.bids.get(&price),
            Side::Ask => self.asks.get(&price),
        }
    }

    /// Up to `depth` levels per side, best to worst
    ///
    /// Takes `&mut self` because the heap backend pops and reinserts; the
    /// book is unchanged afterwards.
    pub fn top_levels(&mut self, depth: usize) -> (Vec<PriceLevel>, Vec<PriceLevel>) {
        (self.bids.top(depth), self.asks.top(depth))
    }

    /// Get top N bids
    pub fn top_bids(&mut self, n: usize) -> Vec<PriceLevel> {
        self.bids.top(n)
    }

    /// Get top N asks
    pub fn top_asks(&mut self, n: usize) -> Vec<PriceLevel> {
        self.asks.top(n)
    }

    /// Number of bid levels
    pub fn bid_count(&self) -> usize {
        self.bids.len()
    }

    /// Number of ask levels
    pub fn ask_count(&self) -> usize {
        self.asks.len()
    }

    /// Check if both sides are empty
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Every broken invariant in the current book
    pub fn violations(&mut self) -> Vec<Violation> {
        let bids = self.bids.levels();
        let asks = self.asks.levels();
        check_book(&bids, self.bids.len(), &asks, self.asks.len())
    }

    /// True if no side holds duplicate prices and the book is not crossed
    ///
    /// Violations are logged, never corrected.
    pub fn validate(&mut self) -> bool {
        let violations = self.violations();
        for violation in &violations {
            error!("Orderbook {} invalid: {}", self.symbol, violation);
        }
        violations.is_empty()
    }

    /// Cumulative update metrics
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Clear both sides and return to `Uninitialized`
    ///
    /// Metrics are kept.
    pub fn reset(&mut self) {
        self.bids.clear();
        self.asks.clear();
        self.invalidate_best();
        self.last_update_id = 0;
        self.last_sequence = 0;
        self.timestamp_ms = 0;
        self.state = OrderbookState::Uninitialized;
    }

    /// Capture current state as an owned snapshot
    pub fn snapshot(&mut self) -> OrderbookSnapshot {
        OrderbookSnapshot {
            symbol: self.symbol.clone(),
            bids: self.bids.levels(),
            asks: self.asks.levels(),
            update_id: self.last_update_id,
            sequence: self.last_sequence,
            timestamp_ms: self.timestamp_ms,
            state: self.state,
        }
    }
}

/// Immutable snapshot of orderbook state
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrderbookSnapshot {
    /// Trading pair symbol
    pub symbol: String,
    /// Bid levels, best first
    pub bids: Vec<PriceLevel>,
    /// Ask levels, best first
    pub asks: Vec<PriceLevel>,
    pub update_id: u64,
    pub sequence: u64,
    pub timestamp_ms: u64,
    /// State at time of snapshot
    pub state: OrderbookState,
}

impl OrderbookSnapshot {
    /// Get the best bid price
    pub fn best_bid_price(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    /// Get the best ask price
    pub fn best_ask_price(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    /// Get the spread
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask_price(), self.best_bid_price()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    /// Get the mid price
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_ask_price(), self.best_bid_price()) {
            (Some(ask), Some(bid)) => midpoint(bid, ask),
            _ => None,
        }
    }
}

/// Halfway between bid and ask, `None` if the arithmetic overflows
fn midpoint(bid: Decimal, ask: Decimal) -> Option<Decimal> {
    ask.checked_sub(bid)
        .and_then(|spread| bid.checked_add(spread / Decimal::TWO))
}
