//! Per-symbol orderbook lifecycle
//!
//! The market-data subsystem owns a registry, creates a book when a feed
//! subscription starts and drops it when the feed is torn down. Consumers
//! receive [`SharedOrderbook`] handles; there is no global instance.

use crate::{config::BookConfig, shared::SharedOrderbook};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::info;

/// Symbol to orderbook map
#[derive(Debug, Clone, Default)]
pub struct BookRegistry {
    config: BookConfig,
    books: Arc<DashMap<String, SharedOrderbook>>,
}

impl BookRegistry {
    /// Create an empty registry with default book configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry building every book with `config`
    pub fn with_config(config: BookConfig) -> Self {
        Self {
            config,
            books: Arc::new(DashMap::new()),
        }
    }

    /// Configuration used for new books
    pub fn config(&self) -> &BookConfig {
        &self.config
    }

    /// Get or create the book for `symbol`
    ///
    /// Subscribing twice returns the same book.
    pub fn subscribe(&self, symbol: &str) -> SharedOrderbook {
        self.books
            .entry(symbol.to_string())
            .or_insert_with(|| {
                info!("Creating {} orderbook for {}", self.config.backend, symbol);
                SharedOrderbook::with_config(symbol, self.config.clone())
            })
            .clone()
    }

    /// Drop the book for `symbol`
    ///
    /// Handles already given out stay usable but are no longer tracked.
    pub fn unsubscribe(&self, symbol: &str) -> bool {
        let removed = self.books.remove(symbol).is_some();
        if removed {
            info!("Removed orderbook for {}", symbol);
        }
        removed
    }

    /// Get the book for `symbol` if subscribed
    pub fn get(&self, symbol: &str) -> Option<SharedOrderbook> {
        self.books.get(symbol).map(|entry| entry.value().clone())
    }

    /// Check if `symbol` is subscribed
    pub fn contains(&self, symbol: &str) -> bool {
        self.books.contains_key(symbol)
    }

    /// Subscribed symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.books.iter().map(|e| e.key().clone()).collect();
        symbols.sort();
        symbols
    }

    /// Number of subscribed symbols
    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Check if no symbol is subscribed
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;
    use l2_types::BookSnapshot;

    #[test]
    fn test_subscribe_is_idempotent() {
        let registry = BookRegistry::new();
        let first = registry.subscribe("BTCUSDT");
        let second = registry.subscribe("BTCUSDT");

        assert!(first.ptr_eq(&second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let registry = BookRegistry::new();
        let book = registry.subscribe("ETHUSDT");
        book.apply_snapshot(&BookSnapshot::new(1, 1, 0).with_bids([("10", "1")]));

        assert!(registry.unsubscribe("ETHUSDT"));
        assert!(!registry.unsubscribe("ETHUSDT"));
        assert!(registry.get("ETHUSDT").is_none());
        assert!(registry.is_empty());

        // Resubscribing starts from a fresh book
        let fresh = registry.subscribe("ETHUSDT");
        assert!(!fresh.ptr_eq(&book));
        assert!(!fresh.is_synced());
    }

    #[test]
    fn test_books_use_registry_config() {
        let registry = BookRegistry::with_config(BookConfig::new().with_backend(BackendKind::Heap));
        registry.subscribe("SOLUSDT");
        registry.subscribe("ADAUSDT");

        assert_eq!(registry.symbols(), vec!["ADAUSDT", "SOLUSDT"]);
        assert!(registry.contains("SOLUSDT"));
        let book = registry.get("SOLUSDT").unwrap();
        assert_eq!(book.lock().backend(), BackendKind::Heap);
    }
}
