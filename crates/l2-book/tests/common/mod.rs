//! Common test utilities and fixtures for integration tests
//!
//! Feed messages in the JSON shape the ingestion types accept.

#![allow(dead_code)]

use l2_book::{BackendKind, BookConfig, Orderbook};
use l2_types::{FeedMessage, PriceLevel};
use rust_decimal::Decimal;
use tracing_subscriber::EnvFilter;

/// Both storage implementations
pub const BACKENDS: [BackendKind; 2] = [BackendKind::SkipList, BackendKind::Heap];

/// Initial book at sequence 10
pub const SNAPSHOT_MESSAGE: &str = r#"{
    "type": "snapshot",
    "s": "BTCUSDT",
    "b": [["50000", "1.2"], ["49999", "0.8"]],
    "a": [["50001", "1.0"], ["50002", "0.5"]],
    "u": 100,
    "seq": 10,
    "ts": 1700000000000
}"#;

/// Next delta: updates 50000, adds 49998 and 50003, removes 50001
pub const DELTA_MESSAGE: &str = r#"{
    "type": "delta",
    "s": "BTCUSDT",
    "b": [["50000", "1.3"], ["49998", "0.1"]],
    "a": [["50001", "0"], ["50003", "0.4"]],
    "u": 101,
    "seq": 11,
    "ts": 1700000000100
}"#;

/// Delta that arrived out of order
pub const OLD_DELTA_MESSAGE: &str = r#"{
    "type": "delta",
    "b": [["50000", "7"]],
    "a": [],
    "u": 99,
    "seq": 9,
    "ts": 1699999999900
}"#;

/// Delta with one unparsable entry next to valid ones
pub const MALFORMED_DELTA_MESSAGE: &str = r#"{
    "type": "delta",
    "b": [["NaN", "1.0"], ["49997", "2.5"]],
    "a": [["50004", "0.3"]],
    "u": 102,
    "seq": 12,
    "ts": 1700000000200
}"#;

/// Delta whose level list mixes one good pair with wrongly shaped entries
pub const BAD_SHAPE_DELTA_MESSAGE: &str = r#"{
    "type": "delta",
    "b": [["49996", "1.5"], [], "50010", {"p": "50011"}],
    "a": [["50005"]],
    "u": 102,
    "seq": 12,
    "ts": 1700000000200
}"#;

/// Parse a feed message
pub fn parse_message(json: &str) -> FeedMessage {
    serde_json::from_str(json).expect("Failed to parse feed message")
}

/// Route book events to the test output (set RUST_LOG to see them)
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Empty book with a fixed skip-list seed
pub fn book_for(kind: BackendKind) -> Orderbook {
    init_tracing();
    Orderbook::with_config("BTCUSDT", BookConfig::new().with_backend(kind).with_seed(42))
}

/// Prices of a level list, in order
pub fn prices(levels: &[PriceLevel]) -> Vec<Decimal> {
    levels.iter().map(|l| l.price).collect()
}

/// (price, quantity) of a level, for compact assertions
pub fn pq(level: Option<PriceLevel>) -> Option<(Decimal, Decimal)> {
    level.map(|l| (l.price, l.quantity))
}
