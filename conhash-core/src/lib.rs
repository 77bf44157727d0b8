//! A weighted consistent hash ring
//!
//! Keys are mapped onto a set of weighted nodes so that the mapping is stable
//! and adding or removing a node only moves the keys that node gains or loses.
//! Each node is placed on the ring as `4 * interleave * weight` virtual keys
//! derived from a pluggable digest (MD5 by default).
//!
//! ```
//! use conhash_core::ConsistentHash;
//!
//! let mut ring = ConsistentHash::with_nodes(vec!["10.0.0.1:11211", "10.0.0.2:11211"]).unwrap();
//! let owner = ring.get_node("some-key").map(str::to_owned);
//! assert!(owner.is_some());
//! ring.del_nodes(["10.0.0.1:11211"]);
//! assert_eq!(ring.get_node("some-key"), Some("10.0.0.2:11211"));
//! ```

pub mod conf;
pub mod digest;
pub mod errors;
pub mod nodes;
pub mod order;
pub mod ring;
pub mod shared;
pub mod store;
pub mod trace;
pub mod vkeys;

pub use conf::Conf;
pub use digest::{Digest, DigestKind, Md5Digest, Xxh3Digest};
pub use errors::RingError;
pub use nodes::{NodeList, NodeSpec};
pub use ring::{ConsistentHash, Migration, RingOptions, DEFAULT_INTERLEAVE};
pub use shared::SharedRing;
pub use store::RingStore;
