//! A minimal Bitcoin-style node: a single best chain of proof-of-work
//! blocks over a UTXO ledger, mined locally and replicated to peers over a
//! line-framed TCP gossip protocol.
//!
//! The consensus rules live in [`blockchain::Ledger`]; the miner, the peer
//! threads and the entrypoint all talk to that one shared, mutex-guarded
//! value.

pub mod blockchain;
pub mod config;
pub mod crypto;
pub mod miner;
pub mod node;
pub mod transaction;
