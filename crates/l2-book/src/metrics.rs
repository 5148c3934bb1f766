//! Update counters and latency accounting
//!
//! Cumulative over the life of a book: snapshots and resets never clear them.

use serde::Serialize;
use std::time::Duration;

/// Counters owned by one orderbook
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookMetrics {
    /// Snapshots plus applied deltas
    pub update_count: u64,
    /// Time spent inside applied mutations
    pub total_update_time: Duration,
    /// Deltas dropped as stale or duplicate
    pub stale_deltas: u64,
    /// Deltas rejected because of a sequence gap
    pub sequence_gaps: u64,
    /// Individual entries skipped as malformed
    pub malformed_entries: u64,
}

impl BookMetrics {
    /// Record one applied snapshot or delta
    pub fn record_update(&mut self, elapsed: Duration) {
        self.update_count += 1;
        self.total_update_time += elapsed;
    }

    /// Record a stale delta
    pub fn record_stale(&mut self) {
        self.stale_deltas += 1;
    }

    /// Record a sequence gap
    pub fn record_gap(&mut self) {
        self.sequence_gaps += 1;
    }

    /// Record skipped entries
    pub fn record_malformed(&mut self, count: usize) {
        self.malformed_entries += count as u64;
    }

    /// Mean time per applied update, `None` before the first one
    pub fn avg_update_latency(&self) -> Option<Duration> {
        if self.update_count == 0 {
            return None;
        }
        let nanos = self.total_update_time.as_nanos() / u128::from(self.update_count);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }

    /// Point-in-time copy for callers
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            update_count: self.update_count,
            avg_update_latency: self.avg_update_latency(),
            total_update_time: self.total_update_time,
            stale_deltas: self.stale_deltas,
            sequence_gaps: self.sequence_gaps,
            malformed_entries: self.malformed_entries,
        }
    }
}

/// Metrics as reported by [`Orderbook::metrics`](crate::Orderbook::metrics)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub update_count: u64,
    pub avg_update_latency: Option<Duration>,
    pub total_update_time: Duration,
    pub stale_deltas: u64,
    pub sequence_gaps: u64,
    pub malformed_entries: u64,
}

impl MetricsSnapshot {
    /// Average latency in microseconds (0.0 before the first update)
    pub fn avg_latency_micros(&self) -> f64 {
        self.avg_update_latency
            .map(|d| d.as_secs_f64() * 1_000_000.0)
            .unwrap_or(0.0)
    }
}
