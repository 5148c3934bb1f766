//! Demo 1: Feed Replay
//!
//! Showcases: snapshot/delta ingestion, stale and gap handling, validation
//!
//! Run: cargo run --bin replay -- [feed.jsonl] [skip_list|heap]

use colored::*;
use l2_book::{ApplyResult, BackendKind, BookConfig, DeltaOutcome, Orderbook};
use l2_types::FeedMessage;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/data/btcusdt_feed.jsonl").to_string());
    let backend = match args.next().as_deref() {
        Some("heap") => BackendKind::Heap,
        _ => BackendKind::SkipList,
    };

    println!("{}", "═".repeat(60).cyan());
    println!("{}", "  L2 FEED REPLAY".cyan().bold());
    println!("{}", format!("  {} backend, {}", backend, path).cyan());
    println!("{}", "═".repeat(60).cyan());
    println!();

    let reader = BufReader::new(File::open(&path)?);
    let mut book: Option<Orderbook> = None;
    let start = Instant::now();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let message: FeedMessage = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(e) => {
                println!("{} line {}: unparsable message: {}", "✗".red(), line_no + 1, e);
                continue;
            }
        };

        let book = book.get_or_insert_with(|| {
            let symbol = message.symbol().unwrap_or("UNKNOWN").to_string();
            Orderbook::with_config(symbol, BookConfig::new().with_backend(backend))
        });

        let seq = message.sequence();
        match book.apply(&message) {
            ApplyResult::Snapshot(report) => println!(
                "{} seq {:>4} snapshot: {} levels, {} skipped",
                "✓".green(),
                seq,
                report.upserted,
                report.skipped
            ),
            ApplyResult::Delta(DeltaOutcome::Applied(report)) => println!(
                "{} seq {:>4} delta: +{} -{} skipped {}",
                "✓".green(),
                seq,
                report.upserted,
                report.removed,
                report.skipped
            ),
            ApplyResult::Delta(DeltaOutcome::Stale { last_sequence, .. }) => println!(
                "{} seq {:>4} stale (last {}), dropped",
                "•".dimmed(),
                seq,
                last_sequence
            ),
            ApplyResult::Delta(DeltaOutcome::Gap { expected, received }) => println!(
                "{} seq {:>4} gap: expected {}, received {}; waiting for snapshot",
                "!".yellow(),
                seq,
                expected,
                received
            ),
            ApplyResult::Delta(DeltaOutcome::AwaitingSnapshot) => {
                println!("{} seq {:>4} ignored, awaiting snapshot", "!".yellow(), seq)
            }
        }
    }

    let Some(mut book) = book else {
        println!("{} No messages in {}", "✗".red(), path);
        return Ok(());
    };

    println!();
    println!("{} {} ({:?})", "Book:".bold(), book.symbol(), book.state());
    let (bids, asks) = book.top_levels(5);
    for i in 0..bids.len().max(asks.len()) {
        let bid = bids
            .get(i)
            .map(|l| format!("{:>10} @ {:<10}", l.quantity, l.price))
            .unwrap_or_default();
        let ask = asks
            .get(i)
            .map(|l| format!("{:<10} @ {:>10}", l.price, l.quantity))
            .unwrap_or_default();
        println!("  {:>25} │ {:<25}", bid.green(), ask.red());
    }

    if let (Some(spread), Some(mid)) = (book.spread(), book.mid_price()) {
        println!("  {} {}  {} {}", "Spread:".yellow(), spread, "Mid:".yellow(), mid);
    }

    let valid = book.validate();
    println!(
        "  {} {}",
        "Valid:".yellow(),
        if valid { "yes".green() } else { "NO".red() }
    );

    let metrics = book.metrics();
    println!(
        "  {} {} updates, avg {:.2}µs, {} stale, {} gaps, {} malformed",
        "Metrics:".dimmed(),
        metrics.update_count,
        metrics.avg_latency_micros(),
        metrics.stale_deltas,
        metrics.sequence_gaps,
        metrics.malformed_entries
    );
    println!("\n{} Replay complete in {:?}", "✓".green(), start.elapsed());

    Ok(())
}
