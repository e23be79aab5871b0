//! Merkle Proofs.
//!
//! This module contains the sorted-pair merkle tree used for results roots and validators roots.
//! Siblings are combined as `H(min(a, b) ‖ max(a, b))`, so a proof is just the list of sibling
//! hashes from the leaf to the root, with no left/right flags.

use std::marker::PhantomData;

use alloy_primitives::{Keccak256, B256};

/// Trait for types that can be used as the hasher in a [`MerkleTree`].
pub trait MerkleTreeHasher {
    /// Returns the commutative hash of a pair of nodes.
    fn hash_pair(a: &B256, b: &B256) -> B256;
}

impl MerkleTreeHasher for Keccak256 {
    fn hash_pair(a: &B256, b: &B256) -> B256 {
        let (left, right) = if a <= b { (a, b) } else { (b, a) };
        let mut hasher = Keccak256::new();
        hasher.update(left);
        hasher.update(right);
        hasher.finalize()
    }
}

/// Folds `proof` into `leaf` and returns the implied root.
#[must_use]
pub fn process_proof<H: MerkleTreeHasher>(proof: &[B256], leaf: B256) -> B256 {
    proof.iter().fold(leaf, |node, sibling| H::hash_pair(&node, sibling))
}

/// Verifies that `leaf` is a member of the tree committed to by `root`.
#[must_use]
pub fn verify<H: MerkleTreeHasher>(proof: &[B256], root: B256, leaf: B256) -> bool {
    process_proof::<H>(proof, leaf) == root
}

/// A merkle tree over a fixed list of leaves.
///
/// An odd node at the end of a layer is carried up unchanged. The root of an empty tree is
/// [`B256::ZERO`], which no proof can reach.
pub struct MerkleTree<H: MerkleTreeHasher = Keccak256> {
    /// The layers of the tree, leaves first.
    layers: Vec<Vec<B256>>,
    /// The phantom data for the hasher type.
    _hasher: PhantomData<H>,
}

impl<H: MerkleTreeHasher> MerkleTree<H> {
    /// Builds the tree bottom-up from `leaves`.
    #[must_use]
    pub fn new(leaves: Vec<B256>) -> Self {
        let mut layers = vec![leaves];
        while layers.last().is_some_and(|layer| layer.len() > 1) {
            let current = &layers[layers.len() - 1];
            let next = current
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => H::hash_pair(left, right),
                    [single] => *single,
                    _ => unreachable!("chunks(2) yields one or two nodes"),
                })
                .collect();
            layers.push(next);
        }
        Self { layers, _hasher: PhantomData }
    }

    /// Returns the root of the tree.
    #[must_use]
    pub fn root(&self) -> B256 {
        self.layers.last().and_then(|layer| layer.first()).copied().unwrap_or(B256::ZERO)
    }

    /// Returns the number of leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers[0].len()
    }

    /// Returns whether the tree has no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers[0].is_empty()
    }

    /// Returns the proof for the leaf at `index`, or `None` if it is out of bounds.
    #[must_use]
    pub fn proof(&self, index: usize) -> Option<Vec<B256>> {
        if index >= self.len() {
            return None;
        }

        let mut proof = Vec::new();
        let mut current = index;
        for layer in &self.layers[..self.layers.len() - 1] {
            if let Some(sibling) = layer.get(current ^ 1) {
                proof.push(*sibling);
            }
            current >>= 1;
        }
        Some(proof)
    }
}
