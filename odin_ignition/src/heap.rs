/*
 * Copyright © 2025, United States Government, as represented by the Administrator of
 * the National Aeronautics and Space Administration. All rights reserved.
 *
 * The “ODIN” software is licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License. You may obtain a copy
 * of the License at http://www.apache.org/licenses/LICENSE-2.0.
 *
 * Unless required by applicable law or agreed to in writing, software distributed under
 * the License is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND,
 * either express or implied. See the License for the specific language governing permissions
 * and limitations under the License.
 */

//! Min-priority queues used by [`crate::gdt`]'s Dijkstra relaxation.
//!
//! Two implementations share the same [`PriorityQueue`] trait: [`IndexedMinHeap`]
//! supports an O(log n) `decrease_key` via a position cross-reference and is the
//! one `gdt` uses; [`StaleEntryHeap`] is the simpler textbook alternative that
//! re-pushes on every relaxation and discards stale pops, kept around because it's
//! the natural first thing to reach for and is cheaper to reason about for small grids.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

pub trait PriorityQueue {
    /// Insert `id` with the given priority, or lower its priority if already present.
    fn push_or_decrease(&mut self, id: usize, priority: f64);
    /// Remove and return the (id, priority) pair with the smallest priority.
    fn pop_min(&mut self) -> Option<(usize, f64)>;
    fn is_empty(&self) -> bool;
}

/// Binary heap over a dense `0..capacity` id space, with a `position` array so
/// an id already in the heap can have its key decreased in place rather than
/// inserted as a duplicate.
pub struct IndexedMinHeap {
    heap: Vec<usize>,
    position: Vec<Option<usize>>,
    key: Vec<f64>,
}

impl IndexedMinHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        IndexedMinHeap {
            heap: Vec::with_capacity(capacity),
            position: vec![None; capacity],
            key: vec![f64::INFINITY; capacity],
        }
    }

    fn swap_at(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.position[self.heap[a]] = Some(a);
        self.position[self.heap[b]] = Some(b);
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let parent = (i - 1) / 2;
            if self.key[self.heap[i]] < self.key[self.heap[parent]] {
                self.swap_at(i, parent);
                i = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        let n = self.heap.len();
        loop {
            let (l, r) = (2 * i + 1, 2 * i + 2);
            let mut smallest = i;
            if l < n && self.key[self.heap[l]] < self.key[self.heap[smallest]] { smallest = l; }
            if r < n && self.key[self.heap[r]] < self.key[self.heap[smallest]] { smallest = r; }
            if smallest == i { break; }
            self.swap_at(i, smallest);
            i = smallest;
        }
    }
}

impl PriorityQueue for IndexedMinHeap {
    fn push_or_decrease(&mut self, id: usize, priority: f64) {
        match self.position[id] {
            Some(pos) => {
                if priority < self.key[id] {
                    self.key[id] = priority;
                    self.sift_up(pos);
                }
            }
            None => {
                self.key[id] = priority;
                let pos = self.heap.len();
                self.heap.push(id);
                self.position[id] = Some(pos);
                self.sift_up(pos);
            }
        }
    }

    fn pop_min(&mut self) -> Option<(usize, f64)> {
        if self.heap.is_empty() {
            return None;
        }
        let min_id = self.heap[0];
        let min_key = self.key[min_id];
        let last = self.heap.pop().unwrap();
        self.position[min_id] = None;
        if !self.heap.is_empty() {
            self.heap[0] = last;
            self.position[last] = Some(0);
            self.sift_down(0);
        }
        Some((min_id, min_key))
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[derive(Copy, Clone, Debug)]
struct Entry { id: usize, priority: f64 }

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool { self.priority == other.priority }
}
impl Eq for Entry {}
impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}
impl Ord for Entry {
    // reversed so `BinaryHeap`, a max-heap, behaves as a min-heap
    fn cmp(&self, other: &Self) -> Ordering {
        other.priority.partial_cmp(&self.priority).unwrap_or(Ordering::Equal)
    }
}

/// Plain binary heap that re-pushes on every `decrease_key` rather than
/// relocating the existing entry, discarding stale pops lazily against a
/// best-known-priority table.
pub struct StaleEntryHeap {
    heap: BinaryHeap<Entry>,
    best: Vec<f64>,
}

impl StaleEntryHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        StaleEntryHeap { heap: BinaryHeap::with_capacity(capacity), best: vec![f64::INFINITY; capacity] }
    }
}

impl PriorityQueue for StaleEntryHeap {
    fn push_or_decrease(&mut self, id: usize, priority: f64) {
        if priority < self.best[id] {
            self.best[id] = priority;
            self.heap.push(Entry { id, priority });
        }
    }

    fn pop_min(&mut self) -> Option<(usize, f64)> {
        while let Some(entry) = self.heap.pop() {
            if entry.priority == self.best[entry.id] {
                return Some((entry.id, entry.priority));
            }
            // stale: a cheaper priority for this id was pushed later, skip
        }
        None
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_heap_pops_in_priority_order() {
        let mut h = IndexedMinHeap::with_capacity(5);
        h.push_or_decrease(0, 5.0);
        h.push_or_decrease(1, 2.0);
        h.push_or_decrease(2, 8.0);
        h.push_or_decrease(1, 1.0); // decrease
        let mut popped = Vec::new();
        while let Some((id, _)) = h.pop_min() {
            popped.push(id);
        }
        assert_eq!(popped, vec![1, 0, 2]);
    }

    #[test]
    fn stale_entry_heap_skips_outdated_pushes() {
        let mut h = StaleEntryHeap::with_capacity(3);
        h.push_or_decrease(0, 5.0);
        h.push_or_decrease(0, 2.0);
        h.push_or_decrease(0, 9.0); // not an improvement, ignored
        assert_eq!(h.pop_min(), Some((0, 2.0)));
        assert!(h.pop_min().is_none());
    }
}
