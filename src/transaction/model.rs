use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::utxo::OutPoint;
use crate::crypto::{sha256, Hash256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    /// References a previous unspent output (UTXO).
    pub outpoint: OutPoint,
    /// Opaque spending credential. The ledger hands it to a pluggable
    /// predicate; coinbases carry an arbitrary message here instead.
    pub authenticator: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount in satoshis (1 coin = 10^8 units).
    pub amount: u64,
    /// Recipient commitment, a stand-in for a public-key hash.
    pub pubkey_hash: Hash256,
}

/// A transaction spending previous outputs into new ones.
///
/// The id is always derived from content via [`Transaction::txid`]; it is
/// never stored, so an id arriving over the wire cannot be forged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub version: u32,
    pub lock_time: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
}

impl TxInput {
    fn write_canonical(&self, out: &mut String) {
        let _ = write!(out, "{}{}", self.outpoint.txid, self.outpoint.vout);
        out.push_str(&self.authenticator);
    }
}

impl TxOutput {
    fn write_canonical(&self, out: &mut String) {
        let _ = write!(out, "{}{}", self.amount, self.pubkey_hash);
    }
}

impl Transaction {
    pub fn new(inputs: Vec<TxInput>, outputs: Vec<TxOutput>) -> Self {
        Self {
            version: 1,
            lock_time: 0,
            inputs,
            outputs,
        }
    }

    /// Canonical serialization: decimal integers, 64-char hex digests and
    /// verbatim authenticators, concatenated in field order. Independent
    /// implementations must reproduce this byte-for-byte to agree on ids.
    pub fn canonical(&self) -> String {
        let mut s = String::new();
        let _ = write!(s, "{}{}", self.version, self.lock_time);
        for input in &self.inputs {
            input.write_canonical(&mut s);
        }
        for output in &self.outputs {
            output.write_canonical(&mut s);
        }
        s
    }

    /// Stable content-derived transaction id.
    pub fn txid(&self) -> Hash256 {
        sha256(self.canonical().as_bytes())
    }

    /// True for the distinguished first transaction of a block: exactly one
    /// input referencing the null digest at index 0.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1
            && self.inputs[0].outpoint.txid.is_null()
            && self.inputs[0].outpoint.vout == 0
    }

    /// Build a coinbase paying `amount` to `pubkey_hash`, with `message`
    /// embedded as the sole input's authenticator.
    pub fn coinbase(message: &str, amount: u64, pubkey_hash: Hash256) -> Self {
        Self::new(
            vec![TxInput {
                outpoint: OutPoint {
                    txid: Hash256::NULL,
                    vout: 0,
                },
                authenticator: message.to_string(),
            }],
            vec![TxOutput {
                amount,
                pubkey_hash,
            }],
        )
    }

    pub fn total_output_amount(&self) -> u128 {
        self.outputs.iter().map(|o| o.amount as u128).sum()
    }
}
