//! BLAKE3 membership tree committing to an epoch's `account → amount` allocation.
//!
//! Each allocation entry is first digested as `BLAKE3(account || amount_be)`,
//! then hashed into the tree with domain separation:
//! - Leaf hash: `BLAKE3(0x00 || digest)`
//! - Internal node: `BLAKE3(0x01 || left || right)`
//!
//! Odd-length layers are padded by duplicating the last element.
//! Empty trees produce [`Hash256::ZERO`], which no proof verifies against.

use serde::{Deserialize, Serialize};

use crate::traits::MembershipVerifier;
use crate::types::{AccountId, Amount, Hash256};

const LEAF_PREFIX: u8 = 0x00;
const NODE_PREFIX: u8 = 0x01;

/// Digest of one allocation entry: `BLAKE3(account || amount_be)`.
pub fn entry_digest(account: &AccountId, amount: Amount) -> Hash256 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(account.as_bytes());
    hasher.update(&amount.to_be_bytes());
    Hash256(hasher.finalize().into())
}

/// Domain-separated leaf hash: `BLAKE3(0x00 || data)`.
pub fn leaf_hash(data: &Hash256) -> Hash256 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[LEAF_PREFIX]);
    hasher.update(data.as_bytes());
    Hash256(hasher.finalize().into())
}

/// Domain-separated internal node hash: `BLAKE3(0x01 || left || right)`.
pub fn node_hash(left: &Hash256, right: &Hash256) -> Hash256 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&[NODE_PREFIX]);
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    Hash256(hasher.finalize().into())
}

fn next_layer(layer: &[Hash256]) -> Vec<Hash256> {
    layer
        .chunks(2)
        .map(|pair| match pair {
            [left, right] => node_hash(left, right),
            [only] => node_hash(only, only),
            _ => unreachable!("chunks(2) yields one or two elements"),
        })
        .collect()
}

/// Full membership tree supporting root computation and proof generation.
///
/// Built by the administrator off-line; the distributor only ever sees the
/// root and per-account proofs.
#[derive(Clone, Debug)]
pub struct MembershipTree {
    entries: Vec<(AccountId, Amount)>,
    /// `layers[0]` = leaf hashes, `layers[last]` = `[root]`.
    layers: Vec<Vec<Hash256>>,
}

impl MembershipTree {
    /// Build a tree over allocation entries in the given order.
    pub fn from_entries(entries: &[(AccountId, Amount)]) -> Self {
        let mut layers = Vec::new();
        let mut current: Vec<Hash256> = entries
            .iter()
            .map(|(account, amount)| leaf_hash(&entry_digest(account, *amount)))
            .collect();

        while !current.is_empty() {
            let done = current.len() == 1;
            let next = if done { Vec::new() } else { next_layer(&current) };
            layers.push(current);
            current = next;
        }

        Self {
            entries: entries.to_vec(),
            layers,
        }
    }

    /// The root commitment. [`Hash256::ZERO`] for an empty tree.
    pub fn root(&self) -> Hash256 {
        self.layers
            .last()
            .and_then(|l| l.first())
            .copied()
            .unwrap_or(Hash256::ZERO)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inclusion proof for the entry at `index`, or `None` if out of bounds.
    pub fn proof(&self, index: usize) -> Option<MembershipProof> {
        if index >= self.entries.len() {
            return None;
        }

        let mut path = Vec::with_capacity(self.layers.len().saturating_sub(1));
        let mut pos = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            let sibling_pos = pos ^ 1;
            // Odd layer: the last node is paired with itself.
            let hash = layer.get(sibling_pos).copied().unwrap_or(layer[pos]);
            let side = if pos % 2 == 0 { Side::Right } else { Side::Left };
            path.push(ProofStep { hash, side });
            pos /= 2;
        }

        Some(MembershipProof { path })
    }

    /// Inclusion proof for the first entry matching `(account, amount)`.
    pub fn proof_for(&self, account: &AccountId, amount: Amount) -> Option<MembershipProof> {
        let index = self
            .entries
            .iter()
            .position(|(a, v)| a == account && *v == amount)?;
        self.proof(index)
    }
}

/// Which side a sibling hash is on relative to the current node.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub enum Side {
    /// Sibling is on the left (we are on the right).
    Left,
    /// Sibling is on the right (we are on the left).
    Right,
}

/// A single step in a membership proof.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct ProofStep {
    pub hash: Hash256,
    pub side: Side,
}

/// Sibling path proving an entry digest is committed by a root.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct MembershipProof {
    /// Sibling hashes from leaf level up to the root.
    pub path: Vec<ProofStep>,
}

impl MembershipProof {
    /// Recompute the root from `digest` and compare with `root`.
    pub fn verify(&self, digest: &Hash256, root: &Hash256) -> bool {
        if root.is_zero() {
            return false;
        }
        let computed = self
            .path
            .iter()
            .fold(leaf_hash(digest), |current, step| match step.side {
                Side::Left => node_hash(&step.hash, &current),
                Side::Right => node_hash(&current, &step.hash),
            });
        computed == *root
    }
}

/// The production [`MembershipVerifier`] backed by [`MembershipProof`].
#[derive(Debug, Clone, Copy, Default)]
pub struct MerkleVerifier;

impl MembershipVerifier for MerkleVerifier {
    fn leaf(&self, account: &AccountId, amount: Amount) -> Hash256 {
        entry_digest(account, amount)
    }

    fn verify(&self, root: &Hash256, leaf: &Hash256, proof: &MembershipProof) -> bool {
        proof.verify(leaf, root)
    }
}
