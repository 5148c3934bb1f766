//! Indexed binary heap
//!
//! Array-backed heap (max-heap for bids, min-heap for asks) plus a
//! `price -> slot` map, so any level can be updated or removed in
//! O(log n), not only the extreme one.

use super::{BackendKind, SideBackend};
use l2_types::{PriceLevel, Side};
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Heap storage for one book side
#[derive(Debug, Clone)]
pub struct HeapBackend {
    side: Side,
    heap: Vec<PriceLevel>,
    /// Current slot of every stored price
    positions: HashMap<Decimal, usize>,
}

impl HeapBackend {
    /// Create an empty side
    pub fn new(side: Side) -> Self {
        Self {
            side,
            heap: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Best level without removing it
    pub fn peek(&self) -> Option<&PriceLevel> {
        self.heap.first()
    }

    /// Remove and return the best level
    pub fn extract_top(&mut self) -> Option<PriceLevel> {
        let price = self.heap.first()?.price;
        self.take(&price)
    }

    /// Remove the level at `price`, returning it
    pub fn take(&mut self, price: &Decimal) -> Option<PriceLevel> {
        let idx = self.positions.remove(price)?;
        let last = self.heap.len().checked_sub(1)?;

        self.heap.swap(idx, last);
        let removed = self.heap.pop()?;

        if idx < self.heap.len() {
            // Re-seat the displaced element from the freed slot
            self.positions.insert(self.heap[idx].price, idx);
            let idx = self.sift_up(idx);
            self.sift_down(idx);
        }

        Some(removed)
    }

    /// True if `a` belongs above `b` in this heap
    fn outranks(&self, a: usize, b: usize) -> bool {
        self.side
            .sort_order()
            .precedes(&self.heap[a].price, &self.heap[b].price)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions.insert(self.heap[a].price, a);
        self.positions.insert(self.heap[b].price, b);
    }

    /// Move the element at `idx` towards the root, returning its final slot
    fn sift_up(&mut self, mut idx: usize) -> usize {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.outranks(idx, parent) {
                break;
            }
            self.swap(idx, parent);
            idx = parent;
        }
        idx
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut best = idx;

            if left < len && self.outranks(left, best) {
                best = left;
            }
            if right < len && self.outranks(right, best) {
                best = right;
            }
            if best == idx {
                break;
            }
            self.swap(idx, best);
            idx = best;
        }
    }

    /// Check the heap property and the index map (test support)
    #[cfg(test)]
    fn is_consistent(&self) -> bool {
        let ordered = (1..self.heap.len()).all(|i| !self.outranks(i, (i - 1) / 2));
        let indexed = self.positions.len() == self.heap.len()
            && self
                .heap
                .iter()
                .enumerate()
                .all(|(i, level)| self.positions.get(&level.price) == Some(&i));
        ordered && indexed
    }
}

impl SideBackend for HeapBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Heap
    }

    fn side(&self) -> Side {
        self.side
    }

    fn upsert(&mut self, level: PriceLevel) {
        match self.positions.get(&level.price).copied() {
            Some(idx) => {
                self.heap[idx] = level;
                // The replacement may rank either way
                let idx = self.sift_up(idx);
                self.sift_down(idx);
            }
            None => {
                self.heap.push(level);
                let idx = self.heap.len() - 1;
                self.positions.insert(level.price, idx);
                self.sift_up(idx);
            }
        }
    }

    fn remove(&mut self, price: &Decimal) -> bool {
        self.take(price).is_some()
    }

    fn get(&self, price: &Decimal) -> Option<&PriceLevel> {
        self.positions.get(price).and_then(|&idx| self.heap.get(idx))
    }

    fn best(&self) -> Option<&PriceLevel> {
        self.peek()
    }

    /// Pops the best `depth` levels in order, then pushes them back
    fn top(&mut self, depth: usize) -> Vec<PriceLevel> {
        let mut taken = Vec::with_capacity(depth.min(self.heap.len()));
        while taken.len() < depth {
            match self.extract_top() {
                Some(level) => taken.push(level),
                None => break,
            }
        }
        for level in &taken {
            self.upsert(*level);
        }
        taken
    }

    fn len(&self) -> usize {
        self.heap.len()
    }

    fn clear(&mut self) {
        self.heap.clear();
        self.positions.clear();
    }
}
