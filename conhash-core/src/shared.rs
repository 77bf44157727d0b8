//! A ring that can be read from many threads while it is being changed
//!
//! Writers clone the current ring, change the clone, and atomically swap it
//! in. Readers always see a complete ring and never wait on a writer.

use arc_swap::ArcSwap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::instrument;

use crate::errors::RingError;
use crate::nodes::{NodeList, NodeSpec};
use crate::ring::ConsistentHash;

/// A copy on write consistent hash ring
pub struct SharedRing {
    /// The ring readers currently see
    ring: ArcSwap<ConsistentHash>,
    /// Serializes writers so no change is lost
    writer: Mutex<()>,
}

impl SharedRing {
    /// Share a ring
    ///
    /// # Arguments
    ///
    /// * `ring` - The ring to start with
    pub fn new(ring: ConsistentHash) -> Self {
        SharedRing {
            ring: ArcSwap::from_pointee(ring),
            writer: Mutex::new(()),
        }
    }

    /// Get the current ring
    pub fn load(&self) -> Arc<ConsistentHash> {
        self.ring.load_full()
    }

    /// Get the node that owns a key on the current ring
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up
    pub fn get_node<K: AsRef<[u8]>>(&self, key: K) -> Option<String> {
        self.ring.load().get_node(key).map(str::to_owned)
    }

    /// Change a copy of the current ring and publish it if the change works
    ///
    /// # Arguments
    ///
    /// * `change` - The change to apply
    pub fn try_update<T, F>(&self, change: F) -> Result<T, RingError>
    where
        F: FnOnce(&mut ConsistentHash) -> Result<T, RingError>,
    {
        // a panicking writer never published its copy so the ring is still sound
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        // clone the ring readers currently see
        let mut next = ConsistentHash::clone(&self.ring.load());
        let output = change(&mut next)?;
        // publish our new ring
        self.ring.store(Arc::new(next));
        Ok(output)
    }

    /// Add nodes to the shared ring
    ///
    /// # Arguments
    ///
    /// * `spec` - The nodes to add
    #[instrument(name = "SharedRing::add_nodes", skip_all, err(Debug))]
    pub fn add_nodes<S: Into<NodeSpec>>(&self, spec: S) -> Result<usize, RingError> {
        self.try_update(|ring| ring.add_nodes(spec))
    }

    /// Remove nodes from the shared ring
    ///
    /// # Arguments
    ///
    /// * `nodes` - The nodes to remove
    #[instrument(name = "SharedRing::del_nodes", skip_all)]
    pub fn del_nodes<L: Into<NodeList>>(&self, nodes: L) -> usize {
        // deleting can't fail
        self.try_update(|ring| Ok(ring.del_nodes(nodes)))
            .unwrap_or_default()
    }
}
