//! Weighted consistent hashing and tools to check how evenly it spreads keys

pub mod args;
pub mod balance;
pub mod errors;

pub use conhash_core::{
    conf, digest, nodes, order, ring, shared, store, trace, vkeys, Conf, ConsistentHash, Digest,
    DigestKind, Md5Digest, Migration, NodeList, NodeSpec, RingError, RingOptions, RingStore,
    SharedRing, Xxh3Digest, DEFAULT_INTERLEAVE,
};
pub use errors::ReportError;
