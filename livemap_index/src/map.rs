// Copyright 2025 the LiveMap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered map from cell keys to payloads with quadtree-aware queries.

use alloc::collections::BTreeMap;
use alloc::collections::btree_map;
use core::ops::Bound;

use crate::key::CellKey;

/// A map keyed by [`CellKey`] that answers ancestor and descendant queries.
///
/// Entries are kept in path order, so the descendants of a cell form one
/// contiguous run after it and are found with a single range scan instead of
/// a pass over every entry.
#[derive(Clone, Debug)]
pub struct CellMap<V> {
    entries: BTreeMap<CellKey, V>,
}

impl<V> Default for CellMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> CellMap<V> {
    /// Create an empty map.
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a payload, returning the previous one for this key.
    pub fn insert(&mut self, key: CellKey, value: V) -> Option<V> {
        self.entries.insert(key, value)
    }

    /// Remove the payload for `key`.
    pub fn remove(&mut self, key: CellKey) -> Option<V> {
        self.entries.remove(&key)
    }

    /// The payload stored for exactly `key`.
    pub fn get(&self, key: CellKey) -> Option<&V> {
        self.entries.get(&key)
    }

    /// Whether `key` itself has an entry.
    pub fn contains_key(&self, key: CellKey) -> bool {
        self.entries.contains_key(&key)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Iterate over all entries in path order.
    pub fn iter(&self) -> impl Iterator<Item = (CellKey, &V)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// The deepest stored strict ancestor of `key`.
    pub fn closest_ancestor(&self, key: CellKey) -> Option<(CellKey, &V)> {
        let mut current = key.parent();
        while let Some(candidate) = current {
            if let Some(v) = self.entries.get(&candidate) {
                return Some((candidate, v));
            }
            current = candidate.parent();
        }
        None
    }

    /// All stored strict descendants of `key`, in path order.
    pub fn descendants(&self, key: CellKey) -> impl Iterator<Item = (CellKey, &V)> + '_ {
        self.entries
            .range((Bound::Excluded(key), Bound::Unbounded))
            .take_while(move |(k, _)| key.is_ancestor_of(**k))
            .map(|(k, v)| (*k, v))
    }

    /// The stored strict descendants of `key` that have no stored ancestor below `key`.
    ///
    /// The returned cells never overlap each other. When they tile `key`
    /// completely they are the coarsest such cover.
    pub fn shallowest_descendants(&self, key: CellKey) -> ShallowestDescendants<'_, V> {
        ShallowestDescendants {
            inner: self
                .entries
                .range((Bound::Excluded(key), Bound::Unbounded)),
            root: key,
            last: None,
        }
    }
}

/// Iterator returned by [`CellMap::shallowest_descendants`].
#[derive(Debug)]
pub struct ShallowestDescendants<'a, V> {
    inner: btree_map::Range<'a, CellKey, V>,
    root: CellKey,
    last: Option<CellKey>,
}

impl<'a, V> Iterator for ShallowestDescendants<'a, V> {
    type Item = (CellKey, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for (&k, v) in self.inner.by_ref() {
            if !self.root.is_ancestor_of(k) {
                return None;
            }
            // Path order visits a cell right before its descendants.
            if self.last.is_some_and(|last| last.is_ancestor_of(k)) {
                continue;
            }
            self.last = Some(k);
            return Some((k, v));
        }
        None
    }
}

impl<V> FromIterator<(CellKey, V)> for CellMap<V> {
    fn from_iter<I: IntoIterator<Item = (CellKey, V)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<V> Extend<(CellKey, V)> for CellMap<V> {
    fn extend<I: IntoIterator<Item = (CellKey, V)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    fn key(s: &str) -> CellKey {
        s.parse().unwrap()
    }

    fn map(keys: &[&str]) -> CellMap<String> {
        keys.iter().map(|s| (key(s), (*s).to_string())).collect()
    }

    #[test]
    fn closest_ancestor_prefers_deepest() {
        let m = map(&["0", "1", "1221", "12"]);
        let (k, v) = m.closest_ancestor(key("122103")).unwrap();
        assert_eq!(k, key("1221"));
        assert_eq!(v, "1221");
        assert_eq!(m.closest_ancestor(key("1221")).unwrap().0, key("12"));
        assert!(m.closest_ancestor(key("2")).is_none());
        // A key is not its own ancestor.
        assert_eq!(m.closest_ancestor(key("1")), None);
    }

    #[test]
    fn descendants_is_a_contiguous_range() {
        let m = map(&["0", "1", "10", "123", "1230", "13", "2", "21"]);
        let d: Vec<_> = m.descendants(key("1")).map(|(k, _)| k.to_string()).collect();
        assert_eq!(d, ["10", "123", "1230", "13"]);
        assert_eq!(m.descendants(key("3")).count(), 0);
        assert_eq!(m.descendants(CellKey::ROOT).count(), 8);
    }

    #[test]
    fn shallowest_descendants_skip_nested_entries() {
        let m = map(&["1", "10", "100", "103", "11", "1111", "2"]);
        let d: Vec<_> = m
            .shallowest_descendants(key("1"))
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(d, ["10", "11"]);
        let d: Vec<_> = m
            .shallowest_descendants(key("10"))
            .map(|(k, _)| k.to_string())
            .collect();
        assert_eq!(d, ["100", "103"]);
    }
}
