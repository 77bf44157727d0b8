//! The consistent hash ring
//!
//! Nodes are placed on a `u32` ring as many virtual keys, proportional to
//! their weight. A key is owned by the node holding the first virtual key at
//! or after the key's own position, wrapping back to the start of the ring.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument, trace};

use crate::conf::Conf;
use crate::digest::{self, Digest, Md5Digest};
use crate::errors::RingError;
use crate::nodes::{NodeList, NodeSpec};
use crate::order::natural_cmp;
use crate::store::RingStore;
use crate::vkeys::{self, VirtualKeys};

/// The default number of replica seeds per unit of node weight
pub const DEFAULT_INTERLEAVE: u32 = 40;

/// The settings to build a ring with
#[derive(Clone)]
pub struct RingOptions {
    /// The number of replica seeds per unit of node weight
    interleave: u32,
    /// The digest used to place nodes and keys
    digest: Arc<dyn Digest>,
}

impl Default for RingOptions {
    fn default() -> Self {
        RingOptions {
            interleave: DEFAULT_INTERLEAVE,
            digest: Arc::new(Md5Digest),
        }
    }
}

impl RingOptions {
    /// Set the number of replica seeds per unit of node weight
    ///
    /// # Arguments
    ///
    /// * `interleave` - The number of replica seeds to use
    #[must_use]
    pub fn interleave(mut self, interleave: u32) -> Self {
        self.interleave = interleave;
        self
    }

    /// Set the digest used to place nodes and keys
    ///
    /// # Arguments
    ///
    /// * `digest` - The digest to use
    #[must_use]
    pub fn digest<D: Digest + 'static>(mut self, digest: D) -> Self {
        self.digest = Arc::new(digest);
        self
    }

    /// Set an already shared digest used to place nodes and keys
    ///
    /// # Arguments
    ///
    /// * `digest` - The digest to use
    #[must_use]
    pub fn shared_digest(mut self, digest: Arc<dyn Digest>) -> Self {
        self.digest = digest;
        self
    }

    /// Build a ring with these options
    ///
    /// # Arguments
    ///
    /// * `spec` - The nodes to start this ring with
    pub fn build<S: Into<NodeSpec>>(self, spec: S) -> Result<ConsistentHash, RingError> {
        // a ring with no replica seeds can never place a node
        if self.interleave == 0 {
            return Err(RingError::InvalidConf(
                "interleave must be at least 1".to_owned(),
            ));
        }
        // make sure this digest can produce ring positions at all
        digest::probe(&*self.digest)?;
        let mut ring = ConsistentHash::from_parts(self.interleave, self.digest);
        ring.add_nodes(spec)?;
        Ok(ring)
    }
}

/// A key whose owner differs between two rings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    /// The key that moved
    pub key: String,
    /// The node that owned this key before
    pub from: Option<String>,
    /// The node that owns this key now
    pub to: Option<String>,
}

/// A consistent hash ring of weighted nodes
#[derive(Clone)]
pub struct ConsistentHash {
    /// The virtual keys on this ring and their owners
    store: RingStore,
    /// The nodes on this ring in the order they were added
    nodes: Vec<Arc<str>>,
    /// The weight of each node on this ring
    weights: HashMap<Arc<str>, u32>,
    /// The number of replica seeds per unit of node weight
    interleave: u32,
    /// The digest used to place nodes and keys
    digest: Arc<dyn Digest>,
}

impl Default for ConsistentHash {
    fn default() -> Self {
        ConsistentHash::new()
    }
}

impl fmt::Debug for ConsistentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsistentHash")
            .field("nodes", &self.nodes)
            .field("vnodes", &self.store.len())
            .field("interleave", &self.interleave)
            .finish_non_exhaustive()
    }
}

impl ConsistentHash {
    /// Create an empty ring using MD5 and the default interleave
    pub fn new() -> Self {
        ConsistentHash::from_parts(DEFAULT_INTERLEAVE, Arc::new(Md5Digest))
    }

    /// Create a ring with some starting nodes using the default settings
    ///
    /// # Arguments
    ///
    /// * `spec` - The nodes to start this ring with
    pub fn with_nodes<S: Into<NodeSpec>>(spec: S) -> Result<Self, RingError> {
        RingOptions::default().build(spec)
    }

    /// Start building a ring with custom settings
    pub fn options() -> RingOptions {
        RingOptions::default()
    }

    /// Build a ring from a config
    ///
    /// # Arguments
    ///
    /// * `conf` - The config to build our ring from
    #[instrument(name = "ConsistentHash::from_conf", skip_all, err(Debug))]
    pub fn from_conf(conf: &Conf) -> Result<Self, RingError> {
        ConsistentHash::options()
            .interleave(conf.ring.interleave)
            .shared_digest(conf.ring.digest.build())
            .build(conf.node_spec())
    }

    /// Build an empty ring from already validated parts
    fn from_parts(interleave: u32, digest: Arc<dyn Digest>) -> Self {
        ConsistentHash {
            store: RingStore::new(),
            nodes: Vec::new(),
            weights: HashMap::new(),
            interleave,
            digest,
        }
    }

    /// Add nodes to this ring
    ///
    /// Nodes already on the ring are skipped and keep their old weight. The
    /// whole spec is validated before the ring is changed. Returns the number
    /// of nodes that were added.
    ///
    /// # Arguments
    ///
    /// * `spec` - The nodes to add
    #[instrument(name = "ConsistentHash::add_nodes", skip_all, err(Debug))]
    pub fn add_nodes<S: Into<NodeSpec>>(&mut self, spec: S) -> Result<usize, RingError> {
        // resolve and validate every node before we touch the ring
        let resolved = spec.into().resolve()?;
        let mut batch = Vec::new();
        let mut added = 0;
        for (name, weight) in resolved {
            // skip any nodes that are already on our ring
            if self.weights.contains_key(name.as_str()) {
                trace!(node = %name, "node already on ring");
                continue;
            }
            let node: Arc<str> = Arc::from(name);
            // generate this nodes virtual keys
            let before = batch.len();
            batch.extend(
                VirtualKeys::new(&*self.digest, &node, weight, self.interleave)
                    .map(|key| (key, node.clone())),
            );
            debug!(node = %node, weight, vnodes = batch.len() - before, "added node to ring");
            // register this node
            self.weights.insert(node.clone(), weight);
            self.nodes.push(node);
            added += 1;
        }
        // place all of our new keys and sort the ring once
        self.store.insert_batch(batch);
        Ok(added)
    }

    /// Remove nodes from this ring
    ///
    /// Nodes that are not on the ring are skipped. Returns the number of
    /// nodes that were removed.
    ///
    /// # Arguments
    ///
    /// * `nodes` - The nodes to remove
    #[instrument(name = "ConsistentHash::del_nodes", skip_all)]
    pub fn del_nodes<L: Into<NodeList>>(&mut self, nodes: L) -> usize {
        let NodeList(names) = nodes.into();
        let mut doomed = HashSet::new();
        let mut removed = 0;
        for name in names {
            // skip any nodes we don't know about
            let Some((node, weight)) = self.weights.remove_entry(name.as_str()) else {
                trace!(node = %name, "node not on ring");
                continue;
            };
            // regenerate this nodes keys and drop the ones it still owns
            for key in VirtualKeys::new(&*self.digest, &node, weight, self.interleave) {
                if self.store.owner(key).is_some_and(|owner| **owner == *node) {
                    doomed.insert(key);
                }
            }
            self.nodes.retain(|existing| *existing != node);
            debug!(node = %node, "removed node from ring");
            removed += 1;
        }
        // drop all of the doomed keys in one pass
        if !doomed.is_empty() {
            self.store.retain(|key, _| !doomed.contains(&key));
        }
        removed
    }

    /// Get the position of a key on the ring
    ///
    /// # Arguments
    ///
    /// * `key` - The key to place
    pub fn gen_key<K: AsRef<[u8]>>(&self, key: K) -> u32 {
        vkeys::position(&*self.digest, key.as_ref())
    }

    /// Get the index of the virtual key that owns a key
    ///
    /// Returns `None` if this ring is empty.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up
    pub fn get_node_pos<K: AsRef<[u8]>>(&self, key: K) -> Option<usize> {
        if self.store.is_empty() {
            return None;
        }
        self.store.successor(self.gen_key(key))
    }

    /// Get the node that owns a key
    ///
    /// Returns `None` if this ring is empty.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up
    pub fn get_node<K: AsRef<[u8]>>(&self, key: K) -> Option<&str> {
        let index = self.get_node_pos(key)?;
        let vnode = self.store.key_at(index)?;
        self.store.owner(vnode).map(|owner| &**owner)
    }

    /// Get every node on this ring in natural display order
    pub fn get_all_nodes(&self) -> Vec<&str> {
        let mut nodes = self.nodes.iter().map(|node| &**node).collect::<Vec<&str>>();
        nodes.sort_by(|left, right| natural_cmp(left, right));
        nodes
    }

    /// Get the number of nodes on this ring
    pub fn get_nodes_cnt(&self) -> usize {
        self.nodes.len()
    }

    /// Check if a node is on this ring
    ///
    /// # Arguments
    ///
    /// * `node` - The node to check for
    pub fn contains(&self, node: &str) -> bool {
        self.weights.contains_key(node)
    }

    /// Get the weight of a node on this ring
    ///
    /// # Arguments
    ///
    /// * `node` - The node to get the weight for
    pub fn weight(&self, node: &str) -> Option<u32> {
        self.weights.get(node).copied()
    }

    /// Regenerate the virtual keys for a node on this ring
    ///
    /// Keys lost to a later colliding node are still yielded.
    ///
    /// # Arguments
    ///
    /// * `node` - The node to generate keys for
    pub fn node_keys(&self, node: &str) -> Option<VirtualKeys<'_>> {
        let (node, weight) = self.weights.get_key_value(node)?;
        Some(VirtualKeys::new(
            &*self.digest,
            node,
            *weight,
            self.interleave,
        ))
    }

    /// Get the total number of virtual keys on this ring
    pub fn vnode_count(&self) -> usize {
        self.store.len()
    }

    /// Get the number of replica seeds per unit of node weight
    pub fn interleave(&self) -> u32 {
        self.interleave
    }

    /// Whether this ring has no virtual keys
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Get the store backing this ring
    pub fn store(&self) -> &RingStore {
        &self.store
    }

    /// Find every key whose owner differs between two rings
    ///
    /// # Arguments
    ///
    /// * `old` - The ring before a change
    /// * `new` - The ring after a change
    /// * `keys` - The keys to compare
    pub fn diff<I, K>(old: &ConsistentHash, new: &ConsistentHash, keys: I) -> Vec<Migration>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .filter_map(|key| {
                let key = key.as_ref();
                let from = old.get_node(key);
                let to = new.get_node(key);
                // only keep keys that actually moved
                (from != to).then(|| Migration {
                    key: key.to_owned(),
                    from: from.map(str::to_owned),
                    to: to.map(str::to_owned),
                })
            })
            .collect()
    }
}
