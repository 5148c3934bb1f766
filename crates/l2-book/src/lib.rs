//! In-memory L2 orderbook engine
//!
//! Maintains per-symbol bid/ask price levels from a full snapshot followed
//! by sequence-numbered deltas, with two interchangeable storage backends:
//!
//! - [`SkipListBackend`] - ordered skip list, O(depth) top-N traversal
//! - [`HeapBackend`] - indexed binary heap, O(1) best level, smaller footprint
//!
//! Stale deltas are dropped, sequence gaps stop the book until the next
//! snapshot, and malformed entries are skipped individually. Integrity
//! checks are a separate, explicit [`Orderbook::validate`] call.
//!
//! # Example
//!
//! ```
//! use l2_book::{BookConfig, BackendKind, Orderbook, OrderbookState};
//! use l2_types::{BookDelta, BookSnapshot};
//!
//! let config = BookConfig::new().with_backend(BackendKind::Heap);
//! let mut book = Orderbook::with_config("BTCUSDT", config);
//! assert_eq!(book.state(), OrderbookState::Uninitialized);
//!
//! book.apply_snapshot(
//!     &BookSnapshot::new(1, 10, 0)
//!         .with_bids([("50000", "1.2")])
//!         .with_asks([("50001", "1.0")]),
//! );
//! let outcome = book.apply_delta(&BookDelta::new(2, 11, 0).with_asks([("50001", "0")]));
//!
//! assert!(outcome.is_applied());
//! assert!(book.best_ask().is_none());
//! assert!(book.validate());
//! ```

pub mod backend;
pub mod config;
pub mod metrics;
pub mod orderbook;
pub mod registry;
pub mod shared;
pub mod side;
pub mod validate;

// Re-export main types
pub use backend::{BackendKind, HeapBackend, SideBackend, SkipList, SkipListBackend};
pub use config::BookConfig;
pub use metrics::{BookMetrics, MetricsSnapshot};
pub use orderbook::{
    ApplyReport, ApplyResult, DeltaOutcome, Orderbook, OrderbookSnapshot, OrderbookState,
};
pub use registry::BookRegistry;
pub use shared::SharedOrderbook;
pub use side::OrderedSide;
pub use validate::Violation;
