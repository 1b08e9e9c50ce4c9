//! The peer-to-peer boundary: serialized blocks and transactions come in off
//! sockets, the ledger decides, accepted news goes back out to every peer.

pub mod discovery;
pub mod message;
pub mod peer;
pub mod server;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use log::{debug, info, warn};

pub use message::Message;
pub use state::{NodeState, SharedNodeState};

use crate::blockchain::{Block, LedgerError, SharedLedger};
use crate::config::Config;
use crate::transaction::Transaction;

/// Start the gossip layer: the listener plus the seed-discovery loop.
/// Returns the shared node state and the address actually bound.
pub fn start(
    config: &Config,
    ledger: SharedLedger,
) -> std::io::Result<(SharedNodeState, SocketAddr)> {
    let state: SharedNodeState = Arc::new(NodeState::new());
    let (local_addr, _listener) = server::start(config.p2p_port, ledger.clone(), state.clone())?;
    let _discovery = discovery::start(config.seed_nodes.clone(), ledger, state.clone());
    Ok((state, local_addr))
}

/// Dispatch one decoded frame from a peer.
fn on_message(message: Message, ledger: &SharedLedger, state: &SharedNodeState) {
    match message {
        Message::Block { block } => {
            let _ = submit_block(ledger, state, block);
        }
        Message::Transaction { transaction } => submit_transaction(state, transaction),
    }
}

/// Hand a block to the ledger; on fresh acceptance, gossip it onward.
///
/// Rejections are logged and swallowed at the network boundary; a bad or
/// stale block from a peer is routine, never fatal.
pub fn submit_block(
    ledger: &SharedLedger,
    state: &SharedNodeState,
    block: Block,
) -> Result<(), LedgerError> {
    let hash = block.hash();
    if !state.mark_block_seen(hash) {
        debug!("block {hash} already seen; dropping");
        return Ok(());
    }

    let result = ledger
        .lock()
        .expect("ledger mutex")
        .append_block(block.clone());
    match &result {
        Ok(()) => {
            state.broadcast(&Message::Block { block });
        }
        Err(e) => warn!("rejected block {hash}: {e}"),
    }
    result
}

/// Hand a transaction to the node. Mempool acceptance is a no-op until a
/// mempool exists; structurally sane transactions are relayed once so the
/// rest of the network still hears about them.
pub fn submit_transaction(state: &SharedNodeState, transaction: Transaction) {
    let txid = transaction.txid();
    if !state.mark_transaction_seen(txid) {
        debug!("transaction {txid} already seen; dropping");
        return;
    }
    if transaction.inputs.is_empty() || transaction.outputs.is_empty() {
        warn!("ignoring structurally empty transaction {txid}");
        return;
    }

    info!("relaying transaction {txid}");
    state.broadcast(&Message::Transaction { transaction });
}
