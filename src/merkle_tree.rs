use alloy_primitives::{Address, B256, U256};
use hash_db::Hasher as HashDbHasher;
use keccak_hasher::KeccakHasher;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{AllocationError, AllocationResult};

/// Keccak256 hash using keccak-hasher
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    KeccakHasher::hash(data)
}

/// Hash a pair of nodes with sorting (lexicographic order), so that
/// `hash_pair(a, b) == hash_pair(b, a)`.
pub fn hash_pair(left: &B256, right: &B256) -> B256 {
    let (first, second) = if left >= right {
        (right, left)
    } else {
        (left, right)
    };

    let mut packed = [0u8; 64];
    packed[..32].copy_from_slice(first.as_slice());
    packed[32..].copy_from_slice(second.as_slice());

    B256::from(keccak256(&packed))
}

/// Packed leaf encoding: address (20 bytes) followed by amount (32 bytes big-endian).
/// Same bytes as Solidity `abi.encodePacked(address, uint256)`.
pub fn encode_leaf_data(address: &Address, amount: &U256) -> [u8; 52] {
    let mut packed = [0u8; 52];
    packed[..20].copy_from_slice(address.as_slice());
    packed[20..].copy_from_slice(&amount.to_be_bytes::<32>());
    packed
}

pub fn leaf_hash(address: &Address, amount: &U256) -> B256 {
    B256::from(keccak256(&encode_leaf_data(address, amount)))
}

/// Parse a `0x`-prefixed (or bare) 32-byte hex hash.
pub fn parse_hash(value: &str) -> AllocationResult<B256> {
    let trimmed = value.trim();
    trimmed
        .parse::<B256>()
        .map_err(|_| AllocationError::InvalidHash(trimmed.to_string()))
}

/// Recompute the root from `leaf` and its sibling path and compare.
pub fn verify_proof(root: &B256, leaf: &B256, proof: &[B256]) -> bool {
    let computed = proof
        .iter()
        .fold(*leaf, |current, sibling| hash_pair(&current, sibling));

    &computed == root
}

/// Binary Merkle tree over allocation leaves.
///
/// Leaves are sorted ascending and deduplicated before the levels are built,
/// so the root depends only on the leaf set. An unpaired node at the end of a
/// level is promoted to the next level unchanged.
#[derive(Debug, Clone)]
pub struct AllocationTree {
    levels: Vec<Vec<B256>>,
    leaf_index_map: HashMap<B256, usize>,
}

impl AllocationTree {
    pub fn from_leaves<I>(leaves: I) -> Self
    where
        I: IntoIterator<Item = B256>,
    {
        let mut ordered_leaves: Vec<B256> = leaves.into_iter().collect();
        ordered_leaves.sort_unstable();
        ordered_leaves.dedup();

        let leaf_index_map = ordered_leaves
            .iter()
            .enumerate()
            .map(|(index, leaf)| (*leaf, index))
            .collect();

        let mut levels = vec![ordered_leaves];

        while let Some(current_level) = levels.last().filter(|level| level.len() > 1) {
            let next_level: Vec<B256> = current_level
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_pair(left, right),
                    _ => pair[0],
                })
                .collect();

            levels.push(next_level);
        }

        let tree = AllocationTree {
            levels,
            leaf_index_map,
        };

        debug!(
            "Built allocation tree: {} leaves, depth {}, root {}",
            tree.leaf_count(),
            tree.depth(),
            tree.root()
        );

        tree
    }

    /// Root hash, or `B256::ZERO` for a tree without leaves.
    pub fn root(&self) -> B256 {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or(B256::ZERO)
    }

    pub fn leaf_count(&self) -> usize {
        self.leaves().len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves().is_empty()
    }

    /// Number of hashing levels above the leaves.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    /// Leaves in tree order (ascending).
    pub fn leaves(&self) -> &[B256] {
        &self.levels[0]
    }

    pub fn contains(&self, leaf: &B256) -> bool {
        self.leaf_index_map.contains_key(leaf)
    }

    /// Sibling hashes from `leaf` up to the root. `None` if the leaf is not in the tree.
    pub fn proof_for(&self, leaf: &B256) -> Option<Vec<B256>> {
        let mut index = *self.leaf_index_map.get(leaf)?;
        let mut proof = Vec::with_capacity(self.depth());

        for level in &self.levels[..self.depth()] {
            // promoted nodes have no sibling on this level
            if let Some(sibling) = level.get(index ^ 1) {
                proof.push(*sibling);
            }
            index /= 2;
        }

        Some(proof)
    }

    pub fn verify(&self, leaf: &B256, proof: &[B256]) -> bool {
        !self.is_empty() && verify_proof(&self.root(), leaf, proof)
    }
}
