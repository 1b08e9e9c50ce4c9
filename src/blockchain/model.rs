use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use log::{info, warn};
use thiserror::Error;

use super::block::{Block, BlockHeader};
use super::{COIN, DIFFICULTY_BITS};
use crate::config::Config;
use crate::crypto::{merkle::merkle_root, sha256, Hash256};
use crate::transaction::{OutPoint, Transaction, TxInput, TxOutput, UtxoError, UtxoSet};

/// The ledger is shared across the miner, the gossip threads and main; every
/// mutation and every consistent read happens under this one mutex.
pub type SharedLedger = Arc<Mutex<Ledger>>;

/// Decides whether an input's authenticator may spend the referenced output.
///
/// Real signature checking plugs in here without touching the append
/// protocol; the default accepts everything.
pub trait AuthPredicate: Send + Sync {
    fn verify(&self, input: &TxInput, prev_out: &TxOutput) -> bool;
}

struct AcceptAll;

impl AuthPredicate for AcceptAll {
    fn verify(&self, _input: &TxInput, _prev_out: &TxOutput) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("block does not extend the current tip")]
    StaleParent,

    #[error("block hash does not meet the difficulty target")]
    InsufficientWork,

    #[error("malformed block: {0}")]
    MalformedBlock(&'static str),

    #[error("merkle root does not match the block's transactions")]
    MerkleMismatch,

    #[error("input references a missing or already spent output: {0}")]
    MissingUtxo(OutPoint),

    #[error("authenticator rejected for input spending {0}")]
    BadAuthenticator(OutPoint),

    #[error("transaction {0} outputs exceed its inputs")]
    ValueViolation(Hash256),

    #[error("output {0} is spent twice within the same block")]
    DoubleSpendInBlock(OutPoint),

    #[error("coinbase claims {claimed} but at most {allowed} is available")]
    RewardViolation { claimed: u128, allowed: u128 },

    #[error(transparent)]
    Utxo(#[from] UtxoError),
}

/// The consensus core: the single best chain, the spendable-output set and
/// the reward schedule, with the full validation protocol on append.
pub struct Ledger {
    chain: Vec<Block>,
    utxo: UtxoSet,
    block_reward: u64,
    halving_interval: u64,
    bits: u32,
    auth: Box<dyn AuthPredicate>,
}

impl Ledger {
    /// Build a fresh ledger holding only the genesis block.
    ///
    /// Genesis is accepted unconditionally; its hash is not required to meet
    /// the difficulty target.
    pub fn new(config: &Config) -> Self {
        let halving_interval = if config.block_halving_interval == 0 {
            warn!("blockHalvingInterval of 0 clamped to 1");
            1
        } else {
            config.block_halving_interval
        };

        let mut ledger = Self {
            chain: Vec::new(),
            utxo: UtxoSet::new(),
            block_reward: config.block_reward,
            halving_interval,
            bits: DIFFICULTY_BITS,
            auth: Box::new(AcceptAll),
        };

        let genesis = ledger.genesis_block(&config.genesis_message);
        ledger
            .utxo
            .add_tx_outputs(&genesis.transactions[0])
            .expect("genesis outputs seed an empty UTXO set");
        info!("genesis block {} (height 0)", genesis.hash());
        ledger.chain.push(genesis);
        ledger
    }

    /// Swap in a real authenticator verifier.
    pub fn with_auth_predicate(mut self, auth: Box<dyn AuthPredicate>) -> Self {
        self.auth = auth;
        self
    }

    fn genesis_block(&self, message: &str) -> Block {
        let coinbase = Transaction::coinbase(
            message,
            self.block_reward * COIN,
            sha256(b"genesis-pubkey"),
        );
        let mut genesis = Block {
            header: BlockHeader {
                version: 1,
                prev_block_hash: Hash256::NULL,
                merkle_root: Hash256::NULL,
                timestamp: Utc::now().timestamp() as u64,
                bits: self.bits,
                nonce: 0,
            },
            transactions: vec![coinbase],
        };
        genesis.build_merkle_root();
        genesis
    }

    /// The highest block in the chain.
    pub fn tip(&self) -> &Block {
        self.chain
            .last()
            .expect("ledger always holds at least the genesis block")
    }

    /// Height of the tip; the genesis block is height 0.
    pub fn height(&self) -> u64 {
        (self.chain.len() - 1) as u64
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn utxo_set(&self) -> &UtxoSet {
        &self.utxo
    }

    /// Satoshis minted by the coinbase at `height`: the initial reward
    /// halved once per elapsed halving interval, zero after 64 halvings.
    pub fn reward_at(&self, height: u64) -> u64 {
        let halvings = height / self.halving_interval;
        if halvings >= 64 {
            return 0;
        }
        (self.block_reward >> halvings) * COIN
    }

    /// Assemble an unmined block extending the tip, paying the next
    /// height's reward to `pubkey_hash`. The caller computes the Merkle
    /// root and searches the nonce.
    pub fn build_candidate(&self, pubkey_hash: Hash256) -> Block {
        let next_height = self.chain.len() as u64;
        Block {
            header: BlockHeader {
                version: 1,
                prev_block_hash: self.tip().hash(),
                merkle_root: Hash256::NULL,
                timestamp: Utc::now().timestamp() as u64,
                bits: self.bits,
                nonce: 0,
            },
            transactions: vec![Transaction::coinbase(
                "coinbase",
                self.reward_at(next_height),
                pubkey_hash,
            )],
        }
    }

    /// Validate `block` against the tip and apply it.
    ///
    /// Validation is a read-only pass; the UTXO set and chain change only
    /// after every check succeeds, so any error leaves the ledger exactly
    /// as it was.
    pub fn append_block(&mut self, block: Block) -> Result<(), LedgerError> {
        // Link: only the current tip can be extended; forks are dropped.
        if block.header.prev_block_hash != self.tip().hash() {
            return Err(LedgerError::StaleParent);
        }

        if !block.has_valid_pow() {
            return Err(LedgerError::InsufficientWork);
        }

        let coinbase = block
            .transactions
            .first()
            .ok_or(LedgerError::MalformedBlock("empty transaction list"))?;
        if !coinbase.is_coinbase() {
            return Err(LedgerError::MalformedBlock(
                "first transaction is not a well-formed coinbase",
            ));
        }

        if block.header.merkle_root != merkle_root(&block.tx_ids()) {
            return Err(LedgerError::MerkleMismatch);
        }

        let effects = self.validate_transactions(&block)?;

        let new_height = self.chain.len() as u64;
        let allowed = self.reward_at(new_height) as u128 + effects.fees;
        if effects.coinbase_total > allowed {
            return Err(LedgerError::RewardViolation {
                claimed: effects.coinbase_total,
                allowed,
            });
        }

        for outpoint in &effects.spent {
            self.utxo.remove(outpoint)?;
        }
        for (outpoint, output) in effects.created {
            self.utxo.insert(outpoint, output)?;
        }
        let hash = block.hash();
        self.chain.push(block);
        info!("block {hash} accepted at height {new_height}");
        Ok(())
    }

    /// The per-transaction pass of the append protocol: resolve every
    /// non-coinbase input, accumulate fees, and collect the spend/create
    /// sets without touching any state.
    fn validate_transactions(&self, block: &Block) -> Result<BlockEffects, LedgerError> {
        let mut effects = BlockEffects::default();
        let mut created_keys = HashSet::new();

        for (i, tx) in block.transactions.iter().enumerate() {
            let txid = tx.txid();

            if i == 0 {
                effects.coinbase_total = tx.total_output_amount();
            } else {
                if tx.inputs.is_empty() {
                    return Err(LedgerError::MalformedBlock("transaction has no inputs"));
                }
                if tx.outputs.is_empty() {
                    return Err(LedgerError::MalformedBlock("transaction has no outputs"));
                }

                let mut input_total: u128 = 0;
                for input in &tx.inputs {
                    if !effects.spent.insert(input.outpoint) {
                        return Err(LedgerError::DoubleSpendInBlock(input.outpoint));
                    }
                    let prev_out = self
                        .utxo
                        .get(&input.outpoint)
                        .ok_or(LedgerError::MissingUtxo(input.outpoint))?;
                    if !self.auth.verify(input, prev_out) {
                        return Err(LedgerError::BadAuthenticator(input.outpoint));
                    }
                    input_total += prev_out.amount as u128;
                }

                let output_total = tx.total_output_amount();
                if output_total > input_total {
                    return Err(LedgerError::ValueViolation(txid));
                }
                effects.fees += input_total - output_total;
            }

            for (vout, output) in tx.outputs.iter().enumerate() {
                let outpoint = OutPoint {
                    txid,
                    vout: vout as u32,
                };
                if !created_keys.insert(outpoint) {
                    return Err(LedgerError::MalformedBlock(
                        "duplicate transaction id within block",
                    ));
                }
                // A key surviving from an earlier block must not be shadowed.
                if self.utxo.contains(&outpoint) && !effects.spent.contains(&outpoint) {
                    return Err(LedgerError::Utxo(UtxoError::Duplicate(outpoint)));
                }
                effects.created.push((outpoint, output.clone()));
            }
        }

        Ok(effects)
    }
}

/// Spend/create sets and totals gathered by validation, applied only after
/// every check passes.
#[derive(Default)]
struct BlockEffects {
    spent: HashSet<OutPoint>,
    created: Vec<(OutPoint, TxOutput)>,
    fees: u128,
    coinbase_total: u128,
}
