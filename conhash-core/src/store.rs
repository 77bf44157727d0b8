//! The sorted store of virtual keys backing a ring

use std::collections::HashMap;
use std::sync::Arc;

/// The virtual keys on a ring and the node that owns each of them
///
/// The key list is always sorted ascending, holds no duplicates, and holds
/// exactly the keys present in the owner map.
#[derive(Debug, Default, Clone)]
pub struct RingStore {
    /// Every virtual key on the ring in ascending order
    keys: Vec<u32>,
    /// The node that owns each virtual key
    owners: HashMap<u32, Arc<str>>,
}

impl RingStore {
    /// Create a new empty ring store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single virtual key, overwriting its owner if it already exists
    ///
    /// # Arguments
    ///
    /// * `key` - The virtual key to insert
    /// * `node` - The node that owns this key
    pub fn insert(&mut self, key: u32, node: Arc<str>) {
        // only add to our sorted keys if this key is new
        if self.owners.insert(key, node).is_none() {
            // find where this key belongs and keep our list sorted
            let index = self.keys.partition_point(|probe| *probe < key);
            self.keys.insert(index, key);
        }
    }

    /// Insert a batch of virtual keys and sort once at the end
    ///
    /// Colliding keys are last write wins.
    ///
    /// # Arguments
    ///
    /// * `batch` - The keys and owners to insert
    pub fn insert_batch<I>(&mut self, batch: I)
    where
        I: IntoIterator<Item = (u32, Arc<str>)>,
    {
        let before = self.keys.len();
        for (key, node) in batch {
            if self.owners.insert(key, node).is_none() {
                self.keys.push(key);
            }
        }
        // only resort if we actually added anything
        if self.keys.len() != before {
            self.keys.sort_unstable();
        }
    }

    /// Remove a virtual key and return its previous owner
    ///
    /// # Arguments
    ///
    /// * `key` - The virtual key to remove
    pub fn remove(&mut self, key: u32) -> Option<Arc<str>> {
        let owner = self.owners.remove(&key)?;
        // the key must be in our sorted list if it had an owner
        if let Ok(index) = self.keys.binary_search(&key) {
            self.keys.remove(index);
        }
        Some(owner)
    }

    /// Keep only the virtual keys matching a predicate in a single pass
    ///
    /// # Arguments
    ///
    /// * `keep` - Returns true for the keys and owners to keep
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(u32, &Arc<str>) -> bool,
    {
        self.owners.retain(|key, node| keep(*key, node));
        let owners = &self.owners;
        self.keys.retain(|key| owners.contains_key(key));
    }

    /// Get the node that owns a virtual key
    ///
    /// # Arguments
    ///
    /// * `key` - The virtual key to look up
    pub fn owner(&self, key: u32) -> Option<&Arc<str>> {
        self.owners.get(&key)
    }

    /// Get the index of the first key at or after a position, wrapping to 0
    ///
    /// Returns `None` on an empty store.
    ///
    /// # Arguments
    ///
    /// * `position` - The position on the ring to search from
    pub fn successor(&self, position: u32) -> Option<usize> {
        if self.keys.is_empty() {
            return None;
        }
        // binary search for the first key that isn't below our position
        let index = self.keys.partition_point(|probe| *probe < position);
        // walk off the end of the ring and we wrap back to the start
        if index == self.keys.len() {
            Some(0)
        } else {
            Some(index)
        }
    }

    /// Get the virtual key at an index in the sorted key list
    ///
    /// # Arguments
    ///
    /// * `index` - The index to read
    pub fn key_at(&self, index: usize) -> Option<u32> {
        self.keys.get(index).copied()
    }

    /// Get the sorted keys and their owners
    pub fn snapshot(&self) -> (&[u32], &HashMap<u32, Arc<str>>) {
        (&self.keys, &self.owners)
    }

    /// The number of virtual keys in this store
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether this store holds no virtual keys
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
