use std::collections::HashMap;
use std::io::Write as _;
use std::net::{SocketAddr, TcpStream};
use std::sync::{Arc, Mutex};

use log::{error, info, warn};

use super::message::Message;
use crate::crypto::Hash256;

pub type SharedNodeState = Arc<NodeState>;

/// State shared by every gossip thread: the connected-peer registry and the
/// last ids seen, used to stop relayed messages from bouncing between peers
/// forever.
#[derive(Default)]
pub struct NodeState {
    peers: Mutex<HashMap<SocketAddr, TcpStream>>,
    last_seen_block: Mutex<Option<Hash256>>,
    last_seen_transaction: Mutex<Option<Hash256>>,
}

impl NodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a connected peer's write half. The read half is owned by the
    /// peer's handler thread.
    pub fn register_peer(&self, address: SocketAddr, stream: TcpStream) {
        let mut peers = self.peers.lock().expect("peer registry mutex");
        peers.insert(address, stream);
        info!("peer {address} connected ({} total)", peers.len());
    }

    pub fn drop_peer(&self, address: &SocketAddr) {
        self.peers.lock().expect("peer registry mutex").remove(address);
    }

    pub fn is_connected(&self, address: &SocketAddr) -> bool {
        self.peers
            .lock()
            .expect("peer registry mutex")
            .contains_key(address)
    }

    pub fn peer_count(&self) -> usize {
        self.peers.lock().expect("peer registry mutex").len()
    }

    /// Record a block id; returns false when it was the last one seen
    /// (the message has already been processed and relayed).
    pub fn mark_block_seen(&self, hash: Hash256) -> bool {
        let mut last = self.last_seen_block.lock().expect("last block mutex");
        if *last == Some(hash) {
            return false;
        }
        *last = Some(hash);
        true
    }

    pub fn mark_transaction_seen(&self, txid: Hash256) -> bool {
        let mut last = self
            .last_seen_transaction
            .lock()
            .expect("last transaction mutex");
        if *last == Some(txid) {
            return false;
        }
        *last = Some(txid);
        true
    }

    /// Write `message` to every connected peer, pruning peers whose socket
    /// fails.
    pub fn broadcast(&self, message: &Message) {
        let frame = match message.to_frame() {
            Ok(frame) => frame,
            Err(e) => {
                error!("failed to encode outbound message: {e}");
                return;
            }
        };

        let mut peers = self.peers.lock().expect("peer registry mutex");
        let mut dead = Vec::new();
        for (address, stream) in peers.iter() {
            let mut writer: &TcpStream = stream;
            if let Err(e) = writer.write_all(&frame).and_then(|_| writer.flush()) {
                warn!("dropping peer {address}: {e}");
                dead.push(*address);
            }
        }
        for address in dead {
            peers.remove(&address);
        }
    }
}
