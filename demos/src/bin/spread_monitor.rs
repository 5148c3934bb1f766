//! Demo 2: Concurrent Spread Monitor
//!
//! Showcases: one feed thread writing, reader threads querying the same book
//!
//! Run: cargo run --bin spread_monitor

use colored::*;
use l2_book::{BookRegistry, SharedOrderbook};
use l2_types::{BookDelta, BookSnapshot};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

const SYMBOL: &str = "BTCUSDT";
const RUN_FOR: Duration = Duration::from_secs(10);

/// Price in cents as a two-decimal price
fn cents(value: i64) -> Decimal {
    Decimal::new(value, 2)
}

/// Random walk of the mid price, a handful of level changes per delta
fn run_feed(book: SharedOrderbook, stop: Arc<AtomicBool>, applied: Arc<AtomicU64>) {
    let mut rng = StdRng::seed_from_u64(7);
    let mut mid = 5_000_000_i64;
    let mut sequence = 1_u64;

    let snapshot = BookSnapshot::new(sequence, sequence, 0)
        .with_bids((1..=20).map(|i| (cents(mid - i * 50), "1.0")))
        .with_asks((1..=20).map(|i| (cents(mid + i * 50), "1.0")));
    book.apply_snapshot(&snapshot);

    while !stop.load(Ordering::Relaxed) {
        sequence += 1;
        let step = rng.gen_range(-2..=2) * 50;
        mid += step;

        let mut bids = Vec::new();
        let mut asks = Vec::new();
        for _ in 0..rng.gen_range(1..6) {
            let offset = rng.gen_range(1..=20) * 50;
            let qty = format!("{}.{}", rng.gen_range(0..5), rng.gen_range(0..100));
            bids.push((cents(mid - offset), qty.clone()));
            asks.push((cents(mid + offset), qty));
        }
        // Drop whatever the move pushed through the touch
        if step > 0 {
            asks.extend((0..=step).step_by(50).map(|d| (cents(mid - d), "0".to_string())));
        } else if step < 0 {
            bids.extend((0..=-step).step_by(50).map(|d| (cents(mid + d), "0".to_string())));
        }

        let delta = BookDelta::new(sequence, sequence, sequence)
            .with_bids(bids)
            .with_asks(asks);
        if book.apply_delta(&delta).is_applied() {
            applied.fetch_add(1, Ordering::Relaxed);
        }
        thread::sleep(Duration::from_micros(200));
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("{}", "═".repeat(60).cyan());
    println!("{}", "  CONCURRENT SPREAD MONITOR".cyan().bold());
    println!("{}", "  Synthetic feed, shared orderbook".cyan());
    println!("{}", "═".repeat(60).cyan());
    println!();

    let registry = BookRegistry::new();
    let book = registry.subscribe(SYMBOL);

    let stop = Arc::new(AtomicBool::new(false));
    let applied = Arc::new(AtomicU64::new(0));
    let feed = {
        let (book, stop, applied) = (book.clone(), Arc::clone(&stop), Arc::clone(&applied));
        thread::spawn(move || run_feed(book, stop, applied))
    };

    // Background reader checking integrity while the monitor prints
    let auditor = {
        let (book, stop) = (book.clone(), Arc::clone(&stop));
        thread::spawn(move || {
            let mut checks = 0_u64;
            let mut failures = 0_u64;
            while !stop.load(Ordering::Relaxed) {
                if !book.validate() {
                    failures += 1;
                }
                checks += 1;
                thread::sleep(Duration::from_millis(5));
            }
            (checks, failures)
        })
    };

    let start = Instant::now();
    while start.elapsed() < RUN_FOR {
        thread::sleep(Duration::from_millis(100));

        let measure_start = Instant::now();
        let (bid, ask) = book.best_bid_ask();
        let read_time = measure_start.elapsed();

        if let (Some(bid), Some(ask)) = (bid, ask) {
            print!("\r\x1B[K");
            print!(
                "  {} {}  {} {}  {} {}  ",
                "BID:".yellow(),
                bid.price,
                "ASK:".yellow(),
                ask.price,
                "SPREAD:".green(),
                ask.price - bid.price
            );
            print!(
                "│ {} {}ns │ {} {}",
                "Read:".dimmed(),
                read_time.as_nanos(),
                "Deltas:".dimmed(),
                applied.load(Ordering::Relaxed)
            );
            std::io::stdout().flush()?;
        }
    }

    stop.store(true, Ordering::Relaxed);
    feed.join().map_err(|_| "feed thread panicked")?;
    let (checks, failures) = auditor.join().map_err(|_| "auditor thread panicked")?;

    let metrics = book.metrics();
    println!("\n");
    println!(
        "{} {} updates, avg apply {:.2}µs",
        "✓".green(),
        metrics.update_count,
        metrics.avg_latency_micros()
    );
    println!("{} {} integrity checks, {} failed", "✓".green(), checks, failures);

    registry.unsubscribe(SYMBOL);
    info!("Demo complete");
    Ok(())
}
