//! Fixed-capacity top-N container for hypotheses.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::Hypothesis;

/// Heap entry: a hypothesis plus its push order.
///
/// Ordered by score, then by push order with earlier pushes ranking higher,
/// so equal scores resolve deterministically.
#[derive(Debug)]
struct Ranked {
    hypothesis: Hypothesis,
    order: u64,
}

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.hypothesis
            .score()
            .total_cmp(&other.hypothesis.score())
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// Keeps the `capacity` best hypotheses pushed since the last reset.
///
/// Backed by a min-heap on score: the root is the current worst entry, so a
/// push into a full set costs one comparison and at most one sift.
///
/// [`extract`](Self::extract) drains the set. Pushing to or extracting from a
/// drained set panics until [`reset`](Self::reset) is called.
#[derive(Debug)]
pub struct BoundedHypothesisSet {
    capacity: usize,
    heap: Option<BinaryHeap<Reverse<Ranked>>>,
    next_order: u64,
}

impl BoundedHypothesisSet {
    /// # Panics
    ///
    /// Panics if `capacity == 0`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "BoundedHypothesisSet capacity must be positive");
        Self { capacity, heap: Some(BinaryHeap::with_capacity(capacity)), next_order: 0 }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Live entries; `0` once drained.
    pub fn size(&self) -> usize {
        self.heap.as_ref().map_or(0, BinaryHeap::len)
    }

    pub fn is_drained(&self) -> bool {
        self.heap.is_none()
    }

    /// Score of the entry that the next push would have to beat.
    pub fn worst_score(&self) -> Option<f32> {
        self.heap.as_ref()?.peek().map(|Reverse(r)| r.hypothesis.score())
    }

    /// Offer `hypothesis` to the set. Returns whether it was kept.
    ///
    /// When full, the newcomer replaces the current minimum only if it ranks
    /// strictly higher; a newcomer that merely ties the minimum is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the set has been drained by [`extract`](Self::extract) and
    /// not reset.
    pub fn push(&mut self, hypothesis: Hypothesis) -> bool {
        let Some(heap) = self.heap.as_mut() else {
            panic!("push on a drained BoundedHypothesisSet; call reset() first");
        };
        let entry = Ranked { hypothesis, order: self.next_order };
        self.next_order += 1;

        if heap.len() < self.capacity {
            heap.push(Reverse(entry));
            return true;
        }
        match heap.peek_mut() {
            Some(mut worst) if entry > worst.0 => {
                *worst = Reverse(entry);
                true
            }
            _ => false,
        }
    }

    /// Remove and return every entry, leaving the set drained.
    ///
    /// With `sort` the result is best-first (score descending, earlier push
    /// first on ties); otherwise it is in heap order.
    ///
    /// # Panics
    ///
    /// Panics if the set is already drained.
    pub fn extract(&mut self, sort: bool) -> Vec<Hypothesis> {
        let Some(heap) = self.heap.take() else {
            panic!("extract on a drained BoundedHypothesisSet; call reset() first");
        };
        // ascending by Reverse is descending by rank
        let entries = if sort { heap.into_sorted_vec() } else { heap.into_vec() };
        entries.into_iter().map(|Reverse(r)| r.hypothesis).collect()
    }

    /// Return to an empty, push-ready state. No-op on an empty live set.
    pub fn reset(&mut self) {
        match self.heap.as_mut() {
            Some(heap) => heap.clear(),
            None => self.heap = Some(BinaryHeap::with_capacity(self.capacity)),
        }
    }
}
