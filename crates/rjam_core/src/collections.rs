//! Collection types shared by the registries.

use rustc_hash::FxHashMap;
use std::hash::Hash;

/// A map that remembers insertion order.
///
/// Rule and module tables use it so that enumeration follows definition
/// order rather than hash order.
#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    entries: Vec<(K, V)>,
    index: FxHashMap<K, usize>,
}

impl<K: Eq + Hash + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Create-or-find: returns the existing value for `key`, or inserts the
    /// one produced by `make`. The flag is `true` when an entry was created.
    pub fn entry_or_insert_with(&mut self, key: K, make: impl FnOnce() -> V) -> (&mut V, bool) {
        match self.index.get(&key) {
            Some(&idx) => (&mut self.entries[idx].1, false),
            None => {
                let idx = self.entries.len();
                self.index.insert(key.clone(), idx);
                self.entries.push((key, make()));
                (&mut self.entries[idx].1, true)
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.index.get(key).map(|&idx| &self.entries[idx].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<K: Eq + Hash + Clone, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Re-export FxHashMap for convenience.
pub type FxMap<K, V> = FxHashMap<K, V>;
