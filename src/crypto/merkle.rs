use super::{sha256, Hash256};

/// Reduce an ordered list of transaction ids to a Merkle root.
///
/// Pairing hashes the concatenation of the two 64-character hex renderings,
/// not the raw bytes, because the hex form is the canonical on-wire identity.
/// A level with an odd count duplicates its last element; an empty list
/// yields the null digest.
pub fn merkle_root(leaves: &[Hash256]) -> Hash256 {
    if leaves.is_empty() {
        return Hash256::NULL;
    }

    let mut level: Vec<Hash256> = leaves.to_vec();
    while level.len() > 1 {
        if level.len() % 2 != 0 {
            level.push(*level.last().expect("level is non-empty"));
        }
        level = level
            .chunks(2)
            .map(|pair| sha256(format!("{}{}", pair[0], pair[1]).as_bytes()))
            .collect();
    }
    level[0]
}
