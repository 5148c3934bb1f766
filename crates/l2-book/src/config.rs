//! Orderbook configuration

use crate::backend::skiplist::{DEFAULT_MAX_LEVEL, DEFAULT_PROBABILITY};
use crate::backend::{BackendKind, HeapBackend, SideBackend, SkipList, SkipListBackend};
use crate::side::OrderedSide;
use l2_types::Side;
use serde::{Deserialize, Serialize};

/// Configuration for an orderbook instance
///
/// Filled by the owning market-data subsystem; every field has a default so
/// partial config sections deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Price-level storage for both sides
    pub backend: BackendKind,
    /// Fixed seed for skip-list node heights (entropy when unset)
    pub skiplist_seed: Option<u64>,
    /// Maximum skip-list node height
    pub skiplist_max_level: usize,
    /// Skip-list promotion probability
    pub skiplist_probability: f64,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::SkipList,
            skiplist_seed: None,
            skiplist_max_level: DEFAULT_MAX_LEVEL,
            skiplist_probability: DEFAULT_PROBABILITY,
        }
    }
}

impl BookConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the backend
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Set a fixed skip-list seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.skiplist_seed = Some(seed);
        self
    }

    /// Set the maximum skip-list height
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.skiplist_max_level = max_level;
        self
    }

    /// Set the skip-list promotion probability
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.skiplist_probability = probability;
        self
    }

    /// Build the storage for one side
    pub fn build_backend(&self, side: Side) -> Box<dyn SideBackend> {
        match self.backend {
            BackendKind::SkipList => {
                // Distinct streams per side so both lists do not share heights
                let seed = self.skiplist_seed.map(|seed| match side {
                    Side::Bid => seed,
                    Side::Ask => seed.wrapping_add(1),
                });
                let list =
                    SkipList::with_params(self.skiplist_max_level, self.skiplist_probability, seed);
                Box::new(SkipListBackend::with_list(side, list))
            }
            BackendKind::Heap => Box::new(HeapBackend::new(side)),
        }
    }

    /// Build one side wrapped with its sort direction
    pub fn build_side(&self, side: Side) -> OrderedSide {
        OrderedSide::new(self.build_backend(side))
    }
}
