//! Randomized skip list
//!
//! Nodes live in an arena (`Vec<Option<Node>>`) and link to each other by
//! index, so the structure needs no `unsafe` and no reference counting.
//! Freed slots are recycled through a free list.
//!
//! Every node gets a height drawn by repeated coin flips (promotion
//! probability `p`, capped at `max_level`). Search, insert and delete start
//! at the highest active level, advance while the next key is smaller than
//! the target, and drop one level whenever no further advance is possible.

use super::{BackendKind, SideBackend};
use l2_types::{PriceLevel, Side, SortOrder};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use std::fmt;

/// Default maximum node height
pub const DEFAULT_MAX_LEVEL: usize = 16;

/// Default promotion probability
pub const DEFAULT_PROBABILITY: f64 = 0.5;

/// Hard cap on configurable height
const MAX_LEVEL_LIMIT: usize = 32;

struct Node<K, V> {
    key: K,
    value: V,
    /// Next node at each level this node participates in
    forward: Vec<Option<usize>>,
}

/// Ordered map with expected O(log n) insert, delete and search
pub struct SkipList<K, V> {
    /// Node arena; `None` marks a free slot
    nodes: Vec<Option<Node<K, V>>>,
    /// Free slots available for reuse
    free: Vec<usize>,
    /// Header forward pointers, one per possible level
    head: Vec<Option<usize>>,
    /// Number of active levels (at least 1)
    height: usize,
    len: usize,
    max_level: usize,
    probability: f64,
    rng: StdRng,
}

impl<K: Ord, V> SkipList<K, V> {
    /// Create an empty list with default parameters and an entropy-seeded RNG
    pub fn new() -> Self {
        Self::with_params(DEFAULT_MAX_LEVEL, DEFAULT_PROBABILITY, None)
    }

    /// Create an empty list with a fixed RNG seed (deterministic node heights)
    pub fn with_seed(seed: u64) -> Self {
        Self::with_params(DEFAULT_MAX_LEVEL, DEFAULT_PROBABILITY, Some(seed))
    }

    /// Create an empty list with explicit parameters
    ///
    /// `max_level` is clamped to `1..=32` and `probability` to `[0, 1]`.
    /// A NaN probability falls back to the default.
    pub fn with_params(max_level: usize, probability: f64, seed: Option<u64>) -> Self {
        let max_level = max_level.clamp(1, MAX_LEVEL_LIMIT);
        let probability = if probability.is_nan() {
            DEFAULT_PROBABILITY
        } else {
            probability.clamp(0.0, 1.0)
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            head: vec![None; max_level],
            height: 1,
            len: 0,
            max_level,
            probability,
            rng,
        }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of currently active levels
    pub fn height(&self) -> usize {
        self.height
    }

    /// Maximum node height
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Promotion probability used for new nodes
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Insert or overwrite, returning the previous value for an existing key
    ///
    /// Overwriting keeps the existing node and key; no duplicate is created.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let (update, candidate) = self.find_path(&key);

        if let Some(node) = candidate.and_then(|idx| self.node_mut(idx)) {
            if node.key == key {
                return Some(std::mem::replace(&mut node.value, value));
            }
        }

        let node_height = self.random_height();
        if node_height > self.height {
            // Levels above the old height have the header as predecessor,
            // which `update` already records as `None`
            self.height = node_height;
        }

        let forward = (0..node_height)
            .map(|lvl| self.forward(update[lvl], lvl))
            .collect();
        let idx = self.alloc(Node { key, value, forward });
        for (lvl, pred) in update.iter().enumerate().take(node_height) {
            self.set_forward(*pred, lvl, Some(idx));
        }

        self.len += 1;
        None
    }

    /// Remove a key, returning its value
    pub fn remove(&mut self, key: &K) -> Option<V> {
        let (update, candidate) = self.find_path(key);
        let idx = candidate?;
        if self.key(idx) != Some(key) {
            return None;
        }

        for (lvl, pred) in update.iter().enumerate().take(self.height) {
            if self.forward(*pred, lvl) != Some(idx) {
                break;
            }
            let next = self.forward(Some(idx), lvl);
            self.set_forward(*pred, lvl, next);
        }

        // Lazily shrink once the uppermost levels are empty
        while self.height > 1 && self.head[self.height - 1].is_none() {
            self.height -= 1;
        }

        let node = self.nodes.get_mut(idx).and_then(Option::take)?;
        self.free.push(idx);
        self.len -= 1;
        Some(node.value)
    }

    /// Remove a key, returning whether it was present
    pub fn delete(&mut self, key: &K) -> bool {
        self.remove(key).is_some()
    }

    /// Look up a key
    pub fn search(&self, key: &K) -> Option<&V> {
        let mut current: Option<usize> = None;
        for lvl in (0..self.height).rev() {
            while let Some(next) = self.forward(current, lvl) {
                match self.key(next) {
                    Some(k) if k < key => current = Some(next),
                    _ => break,
                }
            }
        }

        let idx = self.forward(current, 0)?;
        let node = self.node(idx)?;
        (node.key == *key).then_some(&node.value)
    }

    /// Check if a key is present
    pub fn contains_key(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Smallest entry, O(1)
    pub fn first(&self) -> Option<(&K, &V)> {
        let node = self.node(self.head[0]?)?;
        Some((&node.key, &node.value))
    }

    /// Largest entry, expected O(log n)
    pub fn last(&self) -> Option<(&K, &V)> {
        let mut current: Option<usize> = None;
        for lvl in (0..self.height).rev() {
            while let Some(next) = self.forward(current, lvl) {
                current = Some(next);
            }
        }
        let node = self.node(current?)?;
        Some((&node.key, &node.value))
    }

    /// Iterate in ascending key order
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            next: self.head[0],
            remaining: self.len,
        }
    }

    /// Materialize all entries in the requested order
    ///
    /// Each call builds a fresh sequence; descending order walks the
    /// bottom level once and reverses the result.
    pub fn iter_sorted(&self, order: SortOrder) -> std::vec::IntoIter<(&K, &V)> {
        let mut items: Vec<_> = self.iter().collect();
        if order == SortOrder::Descending {
            items.reverse();
        }
        items.into_iter()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.head.iter_mut().for_each(|slot| *slot = None);
        self.height = 1;
        self.len = 0;
    }

    fn random_height(&mut self) -> usize {
        let mut height = 1;
        while height < self.max_level && self.rng.gen_bool(self.probability) {
            height += 1;
        }
        height
    }

    /// Predecessor at every level (`None` = header) and the first node whose
    /// key is not less than `key`
    fn find_path(&self, key: &K) -> (Vec<Option<usize>>, Option<usize>) {
        let mut update = vec![None; self.max_level];
        let mut current: Option<usize> = None;

        for lvl in (0..self.height).rev() {
            while let Some(next) = self.forward(current, lvl) {
                match self.key(next) {
                    Some(k) if k < key => current = Some(next),
                    _ => break,
                }
            }
            update[lvl] = current;
        }

        let candidate = self.forward(current, 0);
        (update, candidate)
    }

    fn node(&self, idx: usize) -> Option<&Node<K, V>> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(idx).and_then(Option::as_mut)
    }

    fn key(&self, idx: usize) -> Option<&K> {
        self.node(idx).map(|n| &n.key)
    }

    fn forward(&self, at: Option<usize>, lvl: usize) -> Option<usize> {
        match at {
            None => self.head.get(lvl).copied().flatten(),
            Some(idx) => self
                .node(idx)
                .and_then(|n| n.forward.get(lvl).copied().flatten()),
        }
    }

    fn set_forward(&mut self, at: Option<usize>, lvl: usize, to: Option<usize>) {
        let slot = match at {
            None => self.head.get_mut(lvl),
            Some(idx) => self.node_mut(idx).and_then(|n| n.forward.get_mut(lvl)),
        };
        if let Some(slot) = slot {
            *slot = to;
        }
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }
}

impl<K: Ord, V> Default for SkipList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for SkipList<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// Ascending iterator over a [`SkipList`]
pub struct Iter<'a, K, V> {
    list: &'a SkipList<K, V>,
    next: Option<usize>,
    remaining: usize,
}

impl<'a, K: Ord, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.next?)?;
        self.next = node.forward.first().copied().flatten();
        self.remaining = self.remaining.saturating_sub(1);
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Skip-list storage for one book side
///
/// Keys are stored in the side's best-first order (bids under the negated
/// price), so the best level is always the first node and a top-N read walks
/// N nodes of the bottom level.
#[derive(Debug)]
pub struct SkipListBackend {
    side: Side,
    levels: SkipList<Decimal, PriceLevel>,
}

impl SkipListBackend {
    /// Create an empty side with an entropy-seeded RNG
    pub fn new(side: Side) -> Self {
        Self::with_list(side, SkipList::new())
    }

    /// Create an empty side with a fixed RNG seed
    pub fn with_seed(side: Side, seed: u64) -> Self {
        Self::with_list(side, SkipList::with_seed(seed))
    }

    /// Create an empty side over a preconfigured list
    pub fn with_list(side: Side, mut levels: SkipList<Decimal, PriceLevel>) -> Self {
        levels.clear();
        Self { side, levels }
    }

    /// Underlying list (keys are in best-first order)
    pub fn list(&self) -> &SkipList<Decimal, PriceLevel> {
        &self.levels
    }

    /// Key that sorts this side best-first in ascending list order
    fn key(&self, price: Decimal) -> Decimal {
        match self.side.sort_order() {
            SortOrder::Ascending => price,
            SortOrder::Descending => -price,
        }
    }
}

impl SideBackend for SkipListBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::SkipList
    }

    fn side(&self) -> Side {
        self.side
    }

    fn upsert(&mut self, level: PriceLevel) {
        let key = self.key(level.price);
        self.levels.insert(key, level);
    }

    fn remove(&mut self, price: &Decimal) -> bool {
        let key = self.key(*price);
        self.levels.delete(&key)
    }

    fn get(&self, price: &Decimal) -> Option<&PriceLevel> {
        self.levels.search(&self.key(*price))
    }

    fn best(&self) -> Option<&PriceLevel> {
        self.levels.first().map(|(_, level)| level)
    }

    fn top(&mut self, depth: usize) -> Vec<PriceLevel> {
        self.levels
            .iter()
            .take(depth)
            .map(|(_, level)| *level)
            .collect()
    }

    fn len(&self) -> usize {
        self.levels.len()
    }

    fn clear(&mut self) {
        self.levels.clear();
    }
}
