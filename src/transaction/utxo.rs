use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{Transaction, TxOutput};
use crate::crypto::Hash256;

/// Identifies a specific transaction output by its txid and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub txid: Hash256,
    pub vout: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UtxoError {
    #[error("output {0} already exists in the UTXO set")]
    Duplicate(OutPoint),

    #[error("output {0} is missing from the UTXO set")]
    Missing(OutPoint),
}

/// The set of spendable outputs, keyed by (txid, vout).
///
/// Owned exclusively by the ledger; all writes happen under its lock. An
/// entry exists exactly when an accepted transaction created it and no
/// accepted transaction has spent it yet.
#[derive(Debug, Default)]
pub struct UtxoSet {
    map: HashMap<OutPoint, TxOutput>,
}

impl UtxoSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a single output. A duplicate key means a caller bug; the set
    /// never overwrites silently.
    pub fn insert(&mut self, outpoint: OutPoint, output: TxOutput) -> Result<(), UtxoError> {
        if self.map.contains_key(&outpoint) {
            return Err(UtxoError::Duplicate(outpoint));
        }
        self.map.insert(outpoint, output);
        Ok(())
    }

    /// Spend (remove) a single outpoint, returning the removed output.
    pub fn remove(&mut self, outpoint: &OutPoint) -> Result<TxOutput, UtxoError> {
        self.map.remove(outpoint).ok_or(UtxoError::Missing(*outpoint))
    }

    pub fn get(&self, outpoint: &OutPoint) -> Option<&TxOutput> {
        self.map.get(outpoint)
    }

    pub fn contains(&self, outpoint: &OutPoint) -> bool {
        self.map.contains_key(outpoint)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Read-only iterator over all entries, for balance queries and audits.
    /// Not required to be consistent under concurrent writes; take the
    /// ledger lock for a stable view.
    pub fn iter(&self) -> impl Iterator<Item = (&OutPoint, &TxOutput)> {
        self.map.iter()
    }

    /// Sum of all spendable amounts, for supply audits.
    pub fn total_amount(&self) -> u128 {
        self.map.values().map(|o| o.amount as u128).sum()
    }

    /// Insert every output of `tx` (used when applying an accepted block).
    pub fn add_tx_outputs(&mut self, tx: &Transaction) -> Result<(), UtxoError> {
        let txid = tx.txid();
        for (i, out) in tx.outputs.iter().enumerate() {
            self.insert(
                OutPoint {
                    txid,
                    vout: i as u32,
                },
                out.clone(),
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    fn outpoint(n: u8) -> OutPoint {
        OutPoint {
            txid: sha256(&[n]),
            vout: 0,
        }
    }

    fn output(amount: u64) -> TxOutput {
        TxOutput {
            amount,
            pubkey_hash: sha256(b"recipient"),
        }
    }

    #[test]
    fn insert_then_lookup() {
        let mut set = UtxoSet::new();
        set.insert(outpoint(1), output(10)).unwrap();
        assert!(set.contains(&outpoint(1)));
        assert_eq!(set.get(&outpoint(1)).unwrap().amount, 10);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn duplicate_insert_is_an_error() {
        let mut set = UtxoSet::new();
        set.insert(outpoint(1), output(10)).unwrap();
        let err = set.insert(outpoint(1), output(20)).unwrap_err();
        assert_eq!(err, UtxoError::Duplicate(outpoint(1)));
        // original entry untouched
        assert_eq!(set.get(&outpoint(1)).unwrap().amount, 10);
    }

    #[test]
    fn remove_returns_the_output() {
        let mut set = UtxoSet::new();
        set.insert(outpoint(1), output(10)).unwrap();
        let removed = set.remove(&outpoint(1)).unwrap();
        assert_eq!(removed.amount, 10);
        assert!(set.is_empty());
    }

    #[test]
    fn remove_missing_is_an_error() {
        let mut set = UtxoSet::new();
        let err = set.remove(&outpoint(9)).unwrap_err();
        assert_eq!(err, UtxoError::Missing(outpoint(9)));
    }

    #[test]
    fn add_tx_outputs_keys_by_index() {
        let tx = Transaction::new(
            vec![],
            vec![output(1), output(2), output(3)],
        );
        let mut set = UtxoSet::new();
        set.add_tx_outputs(&tx).unwrap();
        assert_eq!(set.len(), 3);
        let txid = tx.txid();
        for vout in 0..3u32 {
            let op = OutPoint { txid, vout };
            assert_eq!(set.get(&op).unwrap().amount, (vout + 1) as u64);
        }
        assert_eq!(set.total_amount(), 6);
    }
}
