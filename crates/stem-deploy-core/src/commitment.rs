//! Commitment roots.
//!
//! A rootchain is initialized with commitment roots derived from a binary
//! keccak256 Merkle tree over 32-byte leaves.

use alloy_primitives::{keccak256, B256};

/// Binary Merkle root of `leaves`.
///
/// Each parent is `keccak256(left ++ right)`. A trailing node without a
/// sibling is hashed with itself. No leaves yields the zero hash; a single
/// leaf is its own root.
pub fn binary_merkle_root(leaves: &[B256]) -> B256 {
    match leaves {
        [] => B256::ZERO,
        [leaf] => *leaf,
        _ => {
            let mut level = leaves.to_vec();
            while level.len() > 1 {
                level = level
                    .chunks(2)
                    .map(|pair| hash_pair(&pair[0], pair.get(1).unwrap_or(&pair[0])))
                    .collect();
            }
            level[0]
        }
    }
}

fn hash_pair(left: &B256, right: &B256) -> B256 {
    let mut preimage = [0u8; 64];
    preimage[..32].copy_from_slice(left.as_slice());
    preimage[32..].copy_from_slice(right.as_slice());
    keccak256(preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(byte: u8) -> B256 {
        B256::repeat_byte(byte)
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(binary_merkle_root(&[]), B256::ZERO);
        assert_eq!(binary_merkle_root(&[leaf(7)]), leaf(7));
    }

    #[test]
    fn test_pair_hashes_concatenation() {
        let mut concat = leaf(1).to_vec();
        concat.extend_from_slice(leaf(2).as_slice());
        assert_eq!(binary_merkle_root(&[leaf(1), leaf(2)]), keccak256(&concat));
    }

    #[test]
    fn test_odd_node_paired_with_itself() {
        let left = hash_pair(&leaf(1), &leaf(2));
        let right = hash_pair(&leaf(3), &leaf(3));
        assert_eq!(
            binary_merkle_root(&[leaf(1), leaf(2), leaf(3)]),
            hash_pair(&left, &right)
        );
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(
            binary_merkle_root(&[leaf(1), leaf(2)]),
            binary_merkle_root(&[leaf(2), leaf(1)])
        );
    }
}
