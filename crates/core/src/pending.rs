//! Pending Set.
//!
//! A set of request ids backed by a dense vector and an index map. Insertion, membership and
//! removal are O(1); removal swaps the target with the last element, so the order of the
//! remaining ids changes after any removal that is not at the tail.

use std::collections::HashMap;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// The set of pending request ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSet {
    /// The ids, densely packed.
    ids: Vec<B256>,
    /// The position of each id in `ids`.
    positions: HashMap<B256, usize>,
}

impl PendingSet {
    /// Creates an empty [`PendingSet`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `id` to the set. Returns `false` if it was already present.
    pub fn add(&mut self, id: B256) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        self.positions.insert(id, self.ids.len());
        self.ids.push(id);
        true
    }

    /// Removes `id` from the set. Returns `false` if it was not present.
    pub fn remove(&mut self, id: &B256) -> bool {
        let Some(position) = self.positions.remove(id) else {
            return false;
        };
        self.ids.swap_remove(position);
        if let Some(moved) = self.ids.get(position) {
            self.positions.insert(*moved, position);
        }
        true
    }

    /// Returns whether `id` is in the set.
    #[must_use]
    pub fn contains(&self, id: &B256) -> bool {
        self.positions.contains_key(id)
    }

    /// Returns the number of ids in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Returns up to `limit` ids starting at `offset`.
    ///
    /// Returns an empty slice if `offset` is past the end.
    #[must_use]
    pub fn page(&self, offset: usize, limit: usize) -> &[B256] {
        if offset >= self.ids.len() {
            return &[];
        }
        let end = offset + limit.min(self.ids.len() - offset);
        &self.ids[offset..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u8) -> B256 {
        B256::with_last_byte(n)
    }

    #[test]
    fn test_add_is_unique() {
        let mut set = PendingSet::new();
        assert!(set.add(id(1)));
        assert!(!set.add(id(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_remove_swaps_with_last() {
        let mut set = PendingSet::new();
        for n in 1..=4 {
            set.add(id(n));
        }

        assert!(set.remove(&id(2)));
        assert_eq!(set.page(0, 10), &[id(1), id(4), id(3)]);
        assert!(set.contains(&id(4)));

        // The moved id can itself be removed.
        assert!(set.remove(&id(4)));
        assert_eq!(set.page(0, 10), &[id(1), id(3)]);
    }

    #[test]
    fn test_remove_tail_and_missing() {
        let mut set = PendingSet::new();
        set.add(id(1));
        set.add(id(2));
        assert!(set.remove(&id(2)));
        assert!(!set.remove(&id(2)));
        assert_eq!(set.page(0, 10), &[id(1)]);
        assert!(set.remove(&id(1)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_page_clamps() {
        let mut set = PendingSet::new();
        for n in 1..=5 {
            set.add(id(n));
        }
        assert_eq!(set.page(3, 10), &[id(4), id(5)]);
        assert_eq!(set.page(1, 2), &[id(2), id(3)]);
        assert!(set.page(5, 1).is_empty());
        assert!(set.page(100, 1).is_empty());
        assert!(set.page(0, 0).is_empty());
    }
}
