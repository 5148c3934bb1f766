//! Feed scenarios run against both backends
//!
//! A snapshot followed by deltas in, queries out, exactly as the
//! market-data subsystem drives a book.

mod common;

use common::*;
use l2_book::{ApplyResult, DeltaOutcome, OrderbookState};
use l2_types::{BookDelta, BookSnapshot, FeedMessage, Side};
use rust_decimal_macros::dec;

// =============================================================================
// Snapshot and Delta Flow
// =============================================================================

#[test]
fn test_snapshot_sets_best_levels() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        let result = book.apply(&parse_message(SNAPSHOT_MESSAGE));

        assert!(matches!(result, ApplyResult::Snapshot(_)), "{kind}");
        assert_eq!(book.state(), OrderbookState::Synced);
        assert_eq!(pq(book.best_bid()), Some((dec!(50000), dec!(1.2))), "{kind}");
        assert_eq!(pq(book.best_ask()), Some((dec!(50001), dec!(1.0))), "{kind}");
        assert_eq!(book.last_sequence(), 10);
        assert_eq!(book.last_update_id(), 100);
        assert_eq!(book.timestamp_ms(), 1_700_000_000_000);
    }
}

#[test]
fn test_delta_updates_removes_and_inserts() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply(&parse_message(SNAPSHOT_MESSAGE));
        let result = book.apply(&parse_message(DELTA_MESSAGE));

        assert!(matches!(result, ApplyResult::Delta(DeltaOutcome::Applied(_))), "{kind}");
        assert_eq!(pq(book.best_bid()), Some((dec!(50000), dec!(1.3))), "{kind}");
        assert_eq!(pq(book.best_ask()), Some((dec!(50002), dec!(0.5))), "{kind}");
        assert!(book.level(Side::Bid, dec!(49998)).is_some());
        assert!(book.level(Side::Ask, dec!(50003)).is_some());
        assert!(book.level(Side::Ask, dec!(50001)).is_none());
        assert!(book.validate(), "{kind}");

        let (bids, asks) = book.top_levels(10);
        assert_eq!(prices(&bids), vec![dec!(50000), dec!(49999), dec!(49998)]);
        assert_eq!(prices(&asks), vec![dec!(50002), dec!(50003)]);
    }
}

#[test]
fn test_reapplied_delta_has_no_effect() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply(&parse_message(SNAPSHOT_MESSAGE));
        book.apply(&parse_message(DELTA_MESSAGE));
        let before = book.snapshot();

        let result = book.apply(&parse_message(DELTA_MESSAGE));

        assert_eq!(
            result,
            ApplyResult::Delta(DeltaOutcome::Stale {
                sequence: 11,
                last_sequence: 11
            })
        );
        let after = book.snapshot();
        assert_eq!(after.bids, before.bids);
        assert_eq!(after.asks, before.asks);
        assert!(after.bids.iter().zip(&before.bids).all(|(a, b)| a.is_identical(b)));
        assert_eq!(after.sequence, 11);
    }
}

#[test]
fn test_old_delta_is_dropped() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply(&parse_message(SNAPSHOT_MESSAGE));
        book.apply(&parse_message(DELTA_MESSAGE));

        let result = book.apply(&parse_message(OLD_DELTA_MESSAGE));

        assert!(matches!(
            result,
            ApplyResult::Delta(DeltaOutcome::Stale {
                sequence: 9,
                last_sequence: 11
            })
        ));
        assert_eq!(pq(book.best_bid()), Some((dec!(50000), dec!(1.3))), "{kind}");
        assert_eq!(book.last_sequence(), 11);
        assert!(book.is_synced());
    }
}

#[test]
fn test_malformed_entry_skipped_rest_applied() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply(&parse_message(SNAPSHOT_MESSAGE));
        book.apply(&parse_message(DELTA_MESSAGE));

        let result = book.apply(&parse_message(MALFORMED_DELTA_MESSAGE));

        let ApplyResult::Delta(DeltaOutcome::Applied(report)) = result else {
            panic!("Expected applied delta, got {result:?}");
        };
        assert_eq!(report.skipped, 1);
        assert_eq!(report.upserted, 2);
        assert_eq!(book.level(Side::Bid, dec!(49997)).map(|l| l.quantity), Some(dec!(2.5)));
        assert!(book.level(Side::Ask, dec!(50004)).is_some());
        assert_eq!(book.last_sequence(), 12);
        assert_eq!(book.metrics().malformed_entries, 1);
        assert!(book.validate());
    }
}

#[test]
fn test_wrongly_shaped_entries_skipped_rest_applied() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply(&parse_message(SNAPSHOT_MESSAGE));
        book.apply(&parse_message(DELTA_MESSAGE));

        let result = book.apply(&parse_message(BAD_SHAPE_DELTA_MESSAGE));

        let ApplyResult::Delta(DeltaOutcome::Applied(report)) = result else {
            panic!("Expected applied delta, got {result:?}");
        };
        assert_eq!(report.skipped, 4);
        assert_eq!(report.upserted, 1);
        assert_eq!(book.level(Side::Bid, dec!(49996)).map(|l| l.quantity), Some(dec!(1.5)));
        assert!(book.level(Side::Bid, dec!(50010)).is_none());
        assert!(book.level(Side::Ask, dec!(50005)).is_none());
        assert_eq!(book.last_sequence(), 12);
        assert_eq!(book.metrics().malformed_entries, 4);

        // The next delta follows on without a gap
        let next = book.apply_delta(&BookDelta::new(103, 13, 0).with_bids([("49996", "0")]));
        assert!(next.is_applied());
        assert_eq!(book.state(), OrderbookState::Synced);
        assert!(book.level(Side::Bid, dec!(49996)).is_none());
    }
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_top_levels_return_snapshot_sorted() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply_snapshot(
            &BookSnapshot::new(1, 1, 0)
                .with_bids([("98", "1"), ("100", "1"), ("97", "1"), ("99", "1")])
                .with_asks([("103", "1"), ("101", "1"), ("102", "1")]),
        );

        let (bids, asks) = book.top_levels(4);
        assert_eq!(prices(&bids), vec![dec!(100), dec!(99), dec!(98), dec!(97)], "{kind}");
        assert_eq!(prices(&asks), vec![dec!(101), dec!(102), dec!(103)], "{kind}");

        // Repeated traversal sees the same book
        assert_eq!(book.top_levels(4), (bids, asks));
        assert_eq!(book.bid_count(), 4);
    }
}

#[test]
fn test_equivalent_price_text_is_one_level() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply_snapshot(&BookSnapshot::new(1, 1, 0).with_bids([("50000", "1")]));
        book.apply_delta(&BookDelta::new(2, 2, 0).with_bids([("50000.00", "3")]));

        assert_eq!(book.bid_count(), 1, "{kind}");
        assert_eq!(book.best_bid().map(|l| l.quantity), Some(dec!(3)));

        book.apply_delta(&BookDelta::new(3, 3, 0).with_bids([("50000.0", "0")]));
        assert!(book.best_bid().is_none(), "{kind}");
    }
}

#[test]
fn test_gap_then_resync() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply(&parse_message(SNAPSHOT_MESSAGE));

        let gap = book.apply_delta(&BookDelta::new(105, 15, 0).with_bids([("1", "1")]));
        assert!(gap.requires_resync());
        assert_eq!(book.state(), OrderbookState::Desynchronized);
        assert!(book.level(Side::Bid, dec!(1)).is_none(), "{kind}");

        // The missing delta arriving late does not heal the book
        let late = book.apply(&parse_message(DELTA_MESSAGE));
        assert_eq!(late, ApplyResult::Delta(DeltaOutcome::AwaitingSnapshot));

        let resync = FeedMessage::from(
            BookSnapshot::new(110, 20, 0)
                .with_bids([("50010", "1")])
                .with_asks([("50011", "1")]),
        );
        book.apply(&resync);
        assert!(book.is_synced());
        assert_eq!(book.bid_count(), 1);
        assert!(book
            .apply_delta(&BookDelta::new(111, 21, 0).with_asks([("50012", "2")]))
            .is_applied());
        assert_eq!(book.metrics().sequence_gaps, 1);
    }
}

#[test]
fn test_crossed_book_reported_not_corrected() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply(&parse_message(SNAPSHOT_MESSAGE));
        book.apply_delta(&BookDelta::new(101, 11, 0).with_bids([("50005", "1")]));

        assert!(!book.validate(), "{kind}");
        assert_eq!(book.best_bid().map(|l| l.price), Some(dec!(50005)));
        assert_eq!(book.bid_count(), 3);
        assert_eq!(book.spread(), Some(dec!(-4)));
    }
}

#[test]
fn test_metrics_accumulate_across_snapshots() {
    for kind in BACKENDS {
        let mut book = book_for(kind);
        book.apply(&parse_message(SNAPSHOT_MESSAGE));
        book.apply(&parse_message(DELTA_MESSAGE));
        book.apply(&parse_message(DELTA_MESSAGE));
        book.apply(&parse_message(SNAPSHOT_MESSAGE));

        let metrics = book.metrics();
        assert_eq!(metrics.update_count, 3, "{kind}");
        assert_eq!(metrics.stale_deltas, 1);
        assert!(metrics.avg_update_latency.is_some());
    }
}

#[test]
fn test_snapshot_serializes() {
    let mut book = book_for(l2_book::BackendKind::SkipList);
    book.apply(&parse_message(SNAPSHOT_MESSAGE));

    let json = serde_json::to_value(book.snapshot()).unwrap();
    assert_eq!(json["symbol"], "BTCUSDT");
    assert_eq!(json["sequence"], 10);
    assert_eq!(json["bids"][0]["price"], "50000");
    assert_eq!(json["asks"].as_array().map(|a| a.len()), Some(2));
}
