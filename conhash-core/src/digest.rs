//! The digest functions used to place nodes and keys on the ring
//!
//! Any `Fn(&[u8]) -> Vec<u8>` can be plugged into a ring as long as it
//! produces at least 4 bytes. Digests shorter than 16 bytes yield fewer ring
//! positions per replica seed.

use md5::Digest as _;
use md5::Md5;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::RingError;

/// The smallest digest that can still produce a ring position
pub const MIN_DIGEST_LEN: usize = 4;

/// Turns arbitrary bytes into a fixed length digest
pub trait Digest: Send + Sync {
    /// Digest some bytes
    ///
    /// # Arguments
    ///
    /// * `input` - The bytes to digest
    fn digest(&self, input: &[u8]) -> Vec<u8>;
}

impl<F> Digest for F
where
    F: Fn(&[u8]) -> Vec<u8> + Send + Sync,
{
    fn digest(&self, input: &[u8]) -> Vec<u8> {
        self(input)
    }
}

/// The default 16 byte MD5 digest
#[derive(Debug, Clone, Copy, Default)]
pub struct Md5Digest;

impl Digest for Md5Digest {
    fn digest(&self, input: &[u8]) -> Vec<u8> {
        Md5::digest(input).to_vec()
    }
}

/// A 16 byte xxh3-128 digest in canonical (big endian) byte order
#[derive(Debug, Clone, Copy, Default)]
pub struct Xxh3Digest;

impl Digest for Xxh3Digest {
    fn digest(&self, input: &[u8]) -> Vec<u8> {
        xxhash_rust::xxh3::xxh3_128(input).to_be_bytes().to_vec()
    }
}

/// The digests that can be picked from a config file
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DigestKind {
    /// MD5, the default and the only kind compatible with existing rings
    #[default]
    #[serde(alias = "md5")]
    Md5,
    /// xxh3-128
    #[serde(alias = "xxh3")]
    Xxh3,
}

impl DigestKind {
    /// Build the digest function for this kind
    pub fn build(self) -> Arc<dyn Digest> {
        match self {
            DigestKind::Md5 => Arc::new(Md5Digest),
            DigestKind::Xxh3 => Arc::new(Xxh3Digest),
        }
    }
}

/// Make sure a digest function is wide enough to place anything on a ring
///
/// # Arguments
///
/// * `digest` - The digest function to probe
pub(crate) fn probe(digest: &dyn Digest) -> Result<usize, RingError> {
    // digest an empty input to learn how wide this function is
    let produced = digest.digest(&[]).len();
    if produced < MIN_DIGEST_LEN {
        return Err(RingError::DigestUnderflow { produced });
    }
    Ok(produced)
}
