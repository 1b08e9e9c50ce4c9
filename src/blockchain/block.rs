use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::crypto::{merkle::merkle_root, sha256, Hash256};
use crate::transaction::Transaction;

/// Number of leading zero hex characters a block hash must carry.
///
/// The `bits` header field is recorded in the serialization for forward
/// compatibility but does not vary this threshold.
pub const POW_ZERO_HEX: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub version: u32,
    pub prev_block_hash: Hash256,
    pub merkle_root: Hash256,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    /// Compact difficulty encoding, carried but not interpreted.
    pub bits: u32,
    pub nonce: u64,
}

/// A block: header plus an ordered, non-empty transaction list whose first
/// entry is the coinbase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// The block id: SHA-256 over the canonical header serialization
    /// (decimal integers, hex digests, in field order). Computed on demand
    /// so it always reflects the current header.
    pub fn hash(&self) -> Hash256 {
        let h = &self.header;
        let mut preimage = String::with_capacity(160);
        let _ = write!(
            preimage,
            "{}{}{}{}{}{}",
            h.version, h.prev_block_hash, h.merkle_root, h.timestamp, h.bits, h.nonce
        );
        sha256(preimage.as_bytes())
    }

    /// Ids of this block's transactions, in order.
    pub fn tx_ids(&self) -> Vec<Hash256> {
        self.transactions.iter().map(|tx| tx.txid()).collect()
    }

    /// Recompute the Merkle root from the transaction list and store it in
    /// the header.
    pub fn build_merkle_root(&mut self) {
        self.header.merkle_root = merkle_root(&self.tx_ids());
    }

    /// The fixed proof-of-work predicate: the block hash starts with
    /// [`POW_ZERO_HEX`] zero hex characters (16 zero bits).
    pub fn has_valid_pow(&self) -> bool {
        self.hash().leading_zero_hex(POW_ZERO_HEX)
    }
}
