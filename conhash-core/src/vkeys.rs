//! Generates the virtual keys a node owns on the ring

use std::fmt::Write;

use crate::digest::{Digest, MIN_DIGEST_LEN};

/// The most ring positions a single digest is split into
pub const GROUPS_PER_DIGEST: usize = 4;

/// Turn a 4 byte digest group into a ring position
///
/// # Arguments
///
/// * `group` - The 4 bytes to read, least significant first
#[inline]
fn group_to_position(group: &[u8]) -> u32 {
    (u32::from(group[3]) << 24)
        | (u32::from(group[2]) << 16)
        | (u32::from(group[1]) << 8)
        | u32::from(group[0])
}

/// Get the ring position for some bytes using only the first digest group
///
/// # Arguments
///
/// * `digest` - The digest to hash with
/// * `key` - The key to place on the ring
pub fn position(digest: &dyn Digest, key: &[u8]) -> u32 {
    let hashed = digest.digest(key);
    // construction rejects narrow digests but never read past what we got
    let mut group = [0u8; MIN_DIGEST_LEN];
    let len = hashed.len().min(MIN_DIGEST_LEN);
    group[..len].copy_from_slice(&hashed[..len]);
    group_to_position(&group)
}

/// A lazy iterator over all of the virtual keys for one node
///
/// Each replica seed `{node}-{index}` is digested once and split into up to
/// four positions.
pub struct VirtualKeys<'a> {
    /// The digest used to amplify replica seeds
    digest: &'a dyn Digest,
    /// The node these keys belong to
    node: &'a str,
    /// The total number of replica seeds to digest
    replicas: u64,
    /// The next replica seed to digest
    next: u64,
    /// A reusable buffer for building replica seeds
    seed: String,
    /// The positions left over from the last digest
    pending: [u32; GROUPS_PER_DIGEST],
    /// How many positions from the last digest are valid
    pending_len: usize,
    /// The next pending position to yield
    pending_idx: usize,
}

impl<'a> VirtualKeys<'a> {
    /// Start generating the virtual keys for a node
    ///
    /// # Arguments
    ///
    /// * `digest` - The digest to amplify replica seeds with
    /// * `node` - The node to generate keys for
    /// * `weight` - The weight of this node
    /// * `interleave` - The number of replica seeds per unit of weight
    pub fn new(digest: &'a dyn Digest, node: &'a str, weight: u32, interleave: u32) -> Self {
        VirtualKeys {
            digest,
            node,
            replicas: u64::from(weight) * u64::from(interleave),
            next: 0,
            seed: String::with_capacity(node.len() + 8),
            pending: [0; GROUPS_PER_DIGEST],
            pending_len: 0,
            pending_idx: 0,
        }
    }

    /// Digest the next replica seed and stash its positions
    fn refill(&mut self) {
        // build this replicas seed
        self.seed.clear();
        // writing to a String can't fail
        let _ = write!(&mut self.seed, "{}-{}", self.node, self.next);
        self.next += 1;
        // digest our seed and split it into 4 byte groups
        let hashed = self.digest.digest(self.seed.as_bytes());
        self.pending_len = 0;
        self.pending_idx = 0;
        for group in hashed.chunks_exact(4).take(GROUPS_PER_DIGEST) {
            self.pending[self.pending_len] = group_to_position(group);
            self.pending_len += 1;
        }
    }
}

impl Iterator for VirtualKeys<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        // a narrow digest can produce an empty group set so loop until we have one
        while self.pending_idx == self.pending_len {
            if self.next == self.replicas {
                return None;
            }
            self.refill();
        }
        let key = self.pending[self.pending_idx];
        self.pending_idx += 1;
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::Md5Digest;

    #[test]
    fn first_replica_splits_into_four_groups() {
        let keys = VirtualKeys::new(&Md5Digest, "A", 1, 40).take(4).collect::<Vec<_>>();
        assert_eq!(keys, vec![435262711, 1786423515, 4271348207, 3371688699]);
    }

    #[test]
    fn count_scales_with_weight_and_interleave() {
        assert_eq!(VirtualKeys::new(&Md5Digest, "node", 1, 40).count(), 160);
        assert_eq!(VirtualKeys::new(&Md5Digest, "node", 3, 10).count(), 120);
        assert_eq!(VirtualKeys::new(&Md5Digest, "node", 2, 0).count(), 0);
    }

    #[test]
    fn short_digests_yield_fewer_groups() {
        let eight = |input: &[u8]| Md5Digest.digest(input)[..8].to_vec();
        let keys = VirtualKeys::new(&eight, "A", 1, 40).collect::<Vec<_>>();
        assert_eq!(keys.len(), 80);
        assert_eq!(&keys[..2], &[435262711, 1786423515]);
        // wide digests still only give four groups
        let wide = |input: &[u8]| [Md5Digest.digest(input), Md5Digest.digest(input)].concat();
        assert_eq!(VirtualKeys::new(&wide, "A", 1, 40).count(), 160);
    }

    #[test]
    fn regeneration_is_deterministic() {
        let first = VirtualKeys::new(&Md5Digest, "10.0.0.1:11211", 2, 40).collect::<Vec<_>>();
        let second = VirtualKeys::new(&Md5Digest, "10.0.0.1:11211", 2, 40).collect::<Vec<_>>();
        assert_eq!(first, second);
    }

    #[test]
    fn lookup_position_uses_first_group() {
        assert_eq!(position(&Md5Digest, b"35132097"), 2187580785);
        assert_eq!(position(&Md5Digest, b""), 3649838548);
        assert_eq!(position(&Md5Digest, b"hello"), 708854109);
    }
}
