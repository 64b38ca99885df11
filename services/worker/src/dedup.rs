//! Bounded LRU set of seen request ids, used by the polling fallback (and
//! retained across a stream/polling channel switch) to honor the
//! at-most-once-per-channel delivery invariant (§8, invariant 4).

use std::collections::VecDeque;

pub struct SeenIds {
    capacity: usize,
    order: VecDeque<String>,
}

impl SeenIds {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
        }
    }

    /// Returns `true` if `id` had not been seen before, inserting it.
    pub fn insert_if_new(&mut self, id: &str) -> bool {
        if self.order.iter().any(|seen| seen == id) {
            return false;
        }
        if self.order.len() >= self.capacity {
            self.order.pop_front();
        }
        self.order.push_back(id.to_owned());
        true
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedups_repeated_ids() {
        let mut seen = SeenIds::new(512);
        assert!(seen.insert_if_new("r1"));
        assert!(!seen.insert_if_new("r1"));
        assert!(seen.insert_if_new("r2"));
    }

    #[test]
    fn evicts_oldest_once_capacity_is_reached() {
        let mut seen = SeenIds::new(2);
        assert!(seen.insert_if_new("r1"));
        assert!(seen.insert_if_new("r2"));
        assert!(seen.insert_if_new("r3"));
        // r1 was evicted to make room for r3, so it looks "new" again.
        assert!(seen.insert_if_new("r1"));
    }

    #[test]
    fn clear_resets_dedup_state() {
        let mut seen = SeenIds::new(512);
        seen.insert_if_new("r1");
        seen.clear();
        assert!(seen.insert_if_new("r1"));
    }
}
