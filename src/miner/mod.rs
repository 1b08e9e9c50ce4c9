use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{info, warn};

use crate::blockchain::{Block, SharedLedger};
use crate::crypto::Hash256;
use crate::node::{self, SharedNodeState};

/// Pause between candidates so losing a race does not turn into a tight
/// rebuild loop.
const CANDIDATE_PAUSE: Duration = Duration::from_secs(1);

/// Background proof-of-work driver.
///
/// Repeatedly snapshots a candidate from the ledger, searches the nonce
/// space, and submits solutions through the node boundary (which appends
/// and broadcasts). Stopping is cooperative: the flag is checked between
/// candidates and at every nonce.
pub struct Miner {
    ledger: SharedLedger,
    node: SharedNodeState,
    pubkey_hash: Hash256,
    running: Arc<AtomicBool>,
}

impl Miner {
    pub fn new(ledger: SharedLedger, node: SharedNodeState, pubkey_hash: Hash256) -> Self {
        Self {
            ledger,
            node,
            pubkey_hash,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawn the mining thread. Idempotent stop via [`Miner::stop`].
    pub fn start(&self) -> JoinHandle<()> {
        self.running.store(true, Ordering::SeqCst);
        let ledger = self.ledger.clone();
        let node = self.node.clone();
        let pubkey_hash = self.pubkey_hash;
        let running = self.running.clone();
        thread::spawn(move || mine_loop(ledger, node, pubkey_hash, running))
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

fn mine_loop(
    ledger: SharedLedger,
    node: SharedNodeState,
    pubkey_hash: Hash256,
    running: Arc<AtomicBool>,
) {
    info!("miner started");
    while running.load(Ordering::SeqCst) {
        let mut candidate = ledger
            .lock()
            .expect("ledger mutex")
            .build_candidate(pubkey_hash);
        candidate.build_merkle_root();

        // The search holds no locks; a peer block can land meanwhile and the
        // submit below will simply lose with a stale parent.
        if !solve(&mut candidate, &running) {
            break;
        }

        let hash = candidate.hash();
        match node::submit_block(&ledger, &node, candidate) {
            Ok(()) => info!("mined block {hash}"),
            Err(e) => warn!("mined block {hash} lost the race: {e}"),
        }

        thread::sleep(CANDIDATE_PAUSE);
    }
    info!("miner stopped");
}

/// Search nonces until the difficulty predicate holds. Returns false when
/// `running` is cleared mid-search.
fn solve(block: &mut Block, running: &AtomicBool) -> bool {
    loop {
        if !running.load(Ordering::Relaxed) {
            return false;
        }
        if block.has_valid_pow() {
            return true;
        }
        block.header.nonce += 1;
    }
}
