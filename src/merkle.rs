pub mod builder;
pub mod internal;
pub mod persist;
mod pool;

pub use builder::{BatchWorker, LamportBatchWorker, LeafBatch, MerkleTreeBuilder};
pub use persist::{TreeRecord, TreeSerializer, TREE_FORMAT_VERSION};

use crate::address::{self, AddressType};
use crate::config::check_layer_count;
use crate::error::{Error, Result};
use crate::merkle::internal::*;
use crate::prng::Sha1Prng;

/// The per-leaf seed stream of a root secret.
///
/// A root PRNG seeded with the secret yields `bit_count` bytes for each leaf in
/// index order, so leaf `n`'s seed can only be reached by drawing every seed
/// before it. The iterator never ends.
pub struct LeafSeeds {
    prng: Sha1Prng,
    bit_count: usize,
}

impl LeafSeeds {
    pub fn new<A: AsRef<[u8]>>(root_secret: A, bit_count: usize) -> Self {
        LeafSeeds {
            prng: Sha1Prng::new(root_secret),
            bit_count,
        }
    }
}

impl Iterator for LeafSeeds {
    type Item = Vec<u8>;

    fn next(&mut self) -> Option<Vec<u8>> {
        Some(self.prng.next_bytes(self.bit_count))
    }
}

/// A Merkle tree over one-time key commitments.
///
/// Only `layer_count - 1` layers are stored: the top stored layer holds two
/// entries and the root above it is never computed. The concatenation of the
/// top pair is what gets encoded into the wallet address.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct MerkleTree {
    layer_count: usize,
    layers: Vec<Vec<String>>,
}

impl MerkleTree {
    /// Assembles the tree above a full layer of leaf commitments.
    ///
    /// The leaf count must be a power of two between `2^(MIN_LAYER_COUNT - 1)`
    /// and `2^(MAX_LAYER_COUNT - 1)`.
    pub fn from_leaves(leaves: Vec<String>) -> Result<MerkleTree> {
        let layer_count = layer_count_for(leaves.len())?;
        Ok(MerkleTree {
            layer_count,
            layers: build_layers(leaves),
        })
    }

    /// Rebuilds a tree from stored layers, checking every stored hash.
    pub fn from_layers(layer_count: usize, layers: Vec<Vec<String>>) -> Result<MerkleTree> {
        check_layer_count(layer_count)?;
        if layers.len() != layer_count - 1 {
            return Err(Error::CorruptTree(format!(
                "expected {} layers, found {}",
                layer_count - 1,
                layers.len()
            )));
        }
        for (i, layer) in layers.iter().enumerate() {
            let expected = 1usize << (layer_count - 1 - i);
            if layer.len() != expected {
                return Err(Error::CorruptTree(format!(
                    "layer {i} holds {} entries instead of {expected}",
                    layer.len()
                )));
            }
        }
        for (i, pair) in layers.windows(2).enumerate() {
            if next_layer(&pair[0]) != pair[1] {
                return Err(Error::CorruptTree(format!(
                    "layer {} does not hash to layer {}",
                    i,
                    i + 1
                )));
            }
        }
        Ok(MerkleTree {
            layer_count,
            layers,
        })
    }

    pub fn layer_count(&self) -> usize {
        self.layer_count
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    pub fn layers(&self) -> &[Vec<String>] {
        &self.layers
    }

    pub fn leaves(&self) -> &[String] {
        &self.layers[0]
    }

    pub fn top_pair(&self) -> (&str, &str) {
        let top = &self.layers[self.layers.len() - 1];
        (&top[0], &top[1])
    }

    /// The value the wallet address commits to.
    pub fn public_commitment(&self) -> String {
        let (left, right) = self.top_pair();
        format!("{left}{right}")
    }

    pub fn address_type(&self) -> AddressType {
        AddressType::from_layer_count(self.layer_count)
    }

    pub fn address(&self) -> String {
        address::encode(&self.public_commitment(), self.address_type())
    }

    /// Sibling hashes from the leaf at `index` (modulo the leaf count) up to
    /// the top stored layer.
    pub fn authentication_path(&self, index: usize) -> Vec<String> {
        authentication_path(&self.layers, index % self.leaf_count())
    }
}

fn layer_count_for(leaf_count: usize) -> Result<usize> {
    if !leaf_count.is_power_of_two() {
        return Err(Error::CorruptTree(format!(
            "leaf count {leaf_count} is not a power of two"
        )));
    }
    let layer_count = leaf_count.trailing_zeros() as usize + 1;
    check_layer_count(layer_count)?;
    Ok(layer_count)
}
