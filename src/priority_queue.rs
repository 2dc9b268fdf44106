// An indexed binary min-heap.
//
// Items are dense `usize` ids (0..capacity). Each id can be in the queue at
// most once; `positions[id]` tracks its slot in the heap so that arbitrary
// ids can be deleted in O(log n). Equal priorities are ordered by id so pops
// are deterministic.

const ABSENT: usize = usize::MAX;

#[derive(Debug, Clone, Default)]
pub struct PriorityQueue {
    /// Heap slots: (priority, id).
    heap: Vec<(f64, usize)>,
    /// positions[id] = slot in `heap`, or ABSENT.
    positions: Vec<usize>,
}

impl PriorityQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
            positions: vec![ABSENT; capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, id: usize) -> bool {
        id < self.positions.len() && self.positions[id] != ABSENT
    }

    /// Inserts `id`, replacing its priority if it is already queued.
    pub fn insert(&mut self, id: usize, priority: f64) {
        if id >= self.positions.len() {
            self.positions.resize(id + 1, ABSENT);
        }
        if self.contains(id) {
            self.remove(id);
        }
        let slot = self.heap.len();
        self.heap.push((priority, id));
        self.positions[id] = slot;
        self.float_up(slot);
    }

    /// Smallest item without removing it.
    pub fn peek(&self) -> Option<(usize, f64)> {
        self.heap.first().map(|&(p, id)| (id, p))
    }

    /// Removes and returns the item with the smallest priority.
    pub fn pop(&mut self) -> Option<(usize, f64)> {
        let (id, priority) = self.peek()?;
        self.remove_slot(0);
        Some((id, priority))
    }

    /// Deletes `id` from the queue, returning its priority if it was present.
    pub fn remove(&mut self, id: usize) -> Option<f64> {
        if !self.contains(id) {
            return None;
        }
        let slot = self.positions[id];
        let priority = self.heap[slot].0;
        self.remove_slot(slot);
        Some(priority)
    }

    fn remove_slot(&mut self, slot: usize) {
        let last = self.heap.len() - 1;
        let removed = self.heap[slot].1;
        self.swap(slot, last);
        self.heap.pop();
        self.positions[removed] = ABSENT;
        if slot < self.heap.len() {
            // The moved item can violate the heap property in either direction.
            let slot = self.float_up(slot);
            self.float_down(slot);
        }
    }

    #[inline]
    fn less(&self, a: usize, b: usize) -> bool {
        let (pa, ia) = self.heap[a];
        let (pb, ib) = self.heap[b];
        pa < pb || (pa == pb && ia < ib)
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.heap.swap(a, b);
        self.positions[self.heap[a].1] = a;
        self.positions[self.heap[b].1] = b;
    }

    fn float_up(&mut self, mut slot: usize) -> usize {
        while slot > 0 {
            let parent = (slot - 1) / 2;
            if !self.less(slot, parent) {
                break;
            }
            self.swap(slot, parent);
            slot = parent;
        }
        slot
    }

    fn float_down(&mut self, mut slot: usize) {
        let n = self.heap.len();
        loop {
            let left = 2 * slot + 1;
            if left >= n {
                break;
            }
            let right = left + 1;
            let child = if right < n && self.less(right, left) { right } else { left };
            if !self.less(child, slot) {
                break;
            }
            self.swap(slot, child);
            slot = child;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_order() {
        let mut q = PriorityQueue::with_capacity(8);
        for (id, p) in [(0, 5.0), (1, 1.0), (2, 3.0), (3, 1.0), (4, 9.0)] {
            q.insert(id, p);
        }
        let order: Vec<usize> = std::iter::from_fn(|| q.pop().map(|(id, _)| id)).collect();
        assert_eq!(order, vec![1, 3, 2, 0, 4]);
    }

    #[test]
    fn test_remove_by_key() {
        let mut q = PriorityQueue::with_capacity(4);
        q.insert(0, 2.0);
        q.insert(1, 1.0);
        q.insert(2, 3.0);
        assert_eq!(q.remove(1), Some(1.0));
        assert_eq!(q.remove(1), None);
        assert!(!q.contains(1));
        q.insert(2, 0.5);
        assert_eq!(q.len(), 2);
        assert_eq!(q.pop(), Some((2, 0.5)));
        assert_eq!(q.pop(), Some((0, 2.0)));
        assert!(q.pop().is_none());
    }
}
