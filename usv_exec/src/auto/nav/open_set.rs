//! # Open set
//!
//! An indexed binary min-heap: a heap stored in a `Vec`, plus a map from each queued key to its
//! position in the heap. The map gives O(1) membership tests and lets a queued key's priority be
//! lowered in O(log n), which [`std::collections::BinaryHeap`] cannot do.
//!
//! Comparisons are strict, so equal priorities never swap and the pop order for a given sequence
//! of operations is fully deterministic.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::hash::Hash;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OpenSet<K, P> {
    heap: Vec<(K, P)>,
    index: HashMap<K, usize>,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<K, P> OpenSet<K, P>
where
    K: Copy + Eq + Hash,
    P: Copy + Ord,
{
    pub fn new() -> Self {
        Self {
            heap: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Current priority of a queued key.
    pub fn priority(&self, key: &K) -> Option<P> {
        self.index.get(key).map(|&i| self.heap[i].1)
    }

    /// Remove every entry, keeping the allocations.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.index.clear();
    }

    /// Insert a key, or lower its priority if it is already queued.
    ///
    /// Returns false if the key was already queued with a priority no greater than `priority`.
    pub fn push(&mut self, key: K, priority: P) -> bool {
        if self.contains(&key) {
            return self.decrease_key(key, priority);
        }

        let pos = self.heap.len();
        self.heap.push((key, priority));
        self.index.insert(key, pos);
        self.sift_up(pos);

        true
    }

    /// Lower the priority of a queued key and restore heap order.
    ///
    /// Returns false (and does nothing) if the key is not queued or the new priority is not lower.
    pub fn decrease_key(&mut self, key: K, priority: P) -> bool {
        let pos = match self.index.get(&key) {
            Some(&p) => p,
            None => return false,
        };

        if priority >= self.heap[pos].1 {
            return false;
        }

        self.heap[pos].1 = priority;
        self.sift_up(pos);

        true
    }

    /// Remove and return the entry with the lowest priority.
    pub fn pop(&mut self) -> Option<(K, P)> {
        if self.heap.is_empty() {
            return None;
        }

        let last = self.heap.len() - 1;
        self.swap(0, last);

        let top = self.heap.pop()?;
        self.index.remove(&top.0);

        if !self.heap.is_empty() {
            self.sift_down(0);
        }

        Some(top)
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.heap[pos].1 < self.heap[parent].1 {
                self.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut pos: usize) {
        let len = self.heap.len();

        loop {
            let left = 2 * pos + 1;
            let right = left + 1;
            let mut smallest = pos;

            if left < len && self.heap[left].1 < self.heap[smallest].1 {
                smallest = left;
            }
            if right < len && self.heap[right].1 < self.heap[smallest].1 {
                smallest = right;
            }

            if smallest == pos {
                break;
            }

            self.swap(pos, smallest);
            pos = smallest;
        }
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }

        self.heap.swap(a, b);
        self.index.insert(self.heap[a].0, a);
        self.index.insert(self.heap[b].0, b);
    }
}

impl<K, P> Default for OpenSet<K, P>
where
    K: Copy + Eq + Hash,
    P: Copy + Ord,
{
    fn default() -> Self {
        Self::new()
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_pop_order() {
        let mut open = OpenSet::new();
        for (key, priority) in [(1u32, 5i64), (2, 3), (3, 8), (4, 1), (5, 4)].iter() {
            assert!(open.push(*key, *priority));
        }
        assert_eq!(open.len(), 5);

        let order: Vec<u32> = std::iter::from_fn(|| open.pop().map(|(k, _)| k)).collect();
        assert_eq!(order, vec![4, 2, 5, 1, 3]);
        assert!(open.is_empty());
        assert_eq!(open.pop(), None);
    }

    #[test]
    fn test_decrease_key() {
        let mut open = OpenSet::new();
        open.push('a', 10);
        open.push('b', 20);
        open.push('c', 30);

        assert!(open.decrease_key('c', 5));
        assert_eq!(open.priority(&'c'), Some(5));

        // Raising or keeping the priority is refused
        assert!(!open.decrease_key('a', 10));
        assert!(!open.push('a', 50));
        assert_eq!(open.priority(&'a'), Some(10));

        // Unknown keys are refused
        assert!(!open.decrease_key('z', 1));

        assert_eq!(open.pop(), Some(('c', 5)));
        assert!(!open.contains(&'c'));
        assert_eq!(open.pop(), Some(('a', 10)));
        assert_eq!(open.pop(), Some(('b', 20)));
    }

    #[test]
    fn test_heap_matches_sort() {
        // Pseudo-random priorities from a fixed LCG, with repeated decrease-keys
        let mut state = 12345u64;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) % 1000
        };

        let mut open = OpenSet::with_capacity(200);
        let mut expected = std::collections::HashMap::new();

        for key in 0..200u64 {
            let p = next();
            open.push(key, p);
            expected.insert(key, p);
        }
        for key in (0..200u64).step_by(3) {
            let p = next() / 2;
            if open.decrease_key(key, p) {
                expected.insert(key, p);
            }
        }

        let mut popped = Vec::new();
        while let Some((key, p)) = open.pop() {
            assert_eq!(expected[&key], p);
            popped.push(p);
        }

        let mut sorted = popped.clone();
        sorted.sort();
        assert_eq!(popped.len(), 200);
        assert_eq!(popped, sorted);
    }
}
