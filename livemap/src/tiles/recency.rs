// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Insertion-ordered set with O(1) removal from anywhere.

use std::hash::Hash;

use hashbrown::HashMap;

#[derive(Clone, Debug)]
struct Node<K> {
    key: K,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Keys in the order they were last pushed, oldest first.
///
/// Backed by an arena of doubly linked nodes plus an index from key to
/// node, so `push_back`, `remove`, and `pop_front` are all O(1).
#[derive(Clone, Debug)]
pub struct RecencyList<K> {
    nodes: Vec<Option<Node<K>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
}

impl<K> Default for RecencyList<K> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
        }
    }
}

impl<K: Copy + Eq + Hash> RecencyList<K> {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Append `key` as the newest entry.
    ///
    /// Returns `false` and leaves the order unchanged if `key` is already present.
    pub fn push_back(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let node = Node {
            key,
            prev: self.tail,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                slot
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        match self.tail {
            Some(tail) => self.set_next(tail, Some(slot)),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.index.insert(key, slot);
        true
    }

    /// Remove `key`, wherever it is. Returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(slot) = self.index.remove(key) else {
            return false;
        };
        self.unlink(slot);
        true
    }

    /// Remove and return the oldest key.
    pub fn pop_front(&mut self) -> Option<K> {
        let slot = self.head?;
        let key = self.nodes[slot].as_ref()?.key;
        self.index.remove(&key);
        self.unlink(slot);
        Some(key)
    }

    /// The oldest key.
    pub fn front(&self) -> Option<K> {
        self.head
            .and_then(|slot| self.nodes[slot].as_ref())
            .map(|n| n.key)
    }

    /// Keys from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let node = self.nodes[cursor?].as_ref()?;
            cursor = node.next;
            Some(node.key)
        })
    }

    fn set_next(&mut self, slot: usize, next: Option<usize>) {
        if let Some(node) = &mut self.nodes[slot] {
            node.next = next;
        }
    }

    fn set_prev(&mut self, slot: usize, prev: Option<usize>) {
        if let Some(node) = &mut self.nodes[slot] {
            node.prev = prev;
        }
    }

    fn unlink(&mut self, slot: usize) {
        let Some(node) = self.nodes[slot].take() else {
            return;
        };
        match node.prev {
            Some(prev) => self.set_next(prev, node.next),
            None => self.head = node.next,
        }
        match node.next {
            Some(next) => self.set_prev(next, node.prev),
            None => self.tail = node.prev,
        }
        self.free.push(slot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(list: &RecencyList<u32>) -> Vec<u32> {
        list.iter().collect()
    }

    #[test]
    fn fifo_order() {
        let mut list = RecencyList::new();
        assert!(list.push_back(1));
        assert!(list.push_back(2));
        assert!(list.push_back(3));
        assert_eq!(list.front(), Some(1));
        assert_eq!(list.pop_front(), Some(1));
        assert_eq!(order(&list), [2, 3]);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn duplicates_keep_their_place() {
        let mut list = RecencyList::new();
        list.push_back(1);
        list.push_back(2);
        assert!(!list.push_back(1));
        assert_eq!(order(&list), [1, 2]);
    }

    #[test]
    fn remove_from_anywhere() {
        let mut list = RecencyList::new();
        for k in 1..=5 {
            list.push_back(k);
        }
        assert!(list.remove(&3));
        assert!(list.remove(&1));
        assert!(list.remove(&5));
        assert!(!list.remove(&5));
        assert_eq!(order(&list), [2, 4]);
        assert!(!list.contains(&3));

        // Freed slots are reused without disturbing order.
        list.push_back(6);
        list.push_back(7);
        assert_eq!(order(&list), [2, 4, 6, 7]);
        assert_eq!(list.nodes.len(), 5);
    }

    #[test]
    fn drain_to_empty() {
        let mut list = RecencyList::new();
        list.push_back(9);
        assert_eq!(list.pop_front(), Some(9));
        assert_eq!(list.pop_front(), None);
        assert!(list.is_empty());
        assert_eq!(list.front(), None);
        list.push_back(10);
        assert_eq!(order(&list), [10]);
    }
}
