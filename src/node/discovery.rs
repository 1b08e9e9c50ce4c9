use std::net::{TcpStream, ToSocketAddrs};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info};

use super::peer;
use super::state::SharedNodeState;
use crate::blockchain::SharedLedger;

/// How often to retry the configured seed nodes.
const DISCOVERY_INTERVAL: Duration = Duration::from_secs(30);

/// Periodically (re)connect every configured `host:port` seed that is not
/// currently in the peer registry. Runs until process exit.
pub fn start(
    seeds: Vec<String>,
    ledger: SharedLedger,
    state: SharedNodeState,
) -> JoinHandle<()> {
    thread::spawn(move || loop {
        for seed in &seeds {
            connect_seed(seed, &ledger, &state);
        }
        thread::sleep(DISCOVERY_INTERVAL);
    })
}

fn connect_seed(seed: &str, ledger: &SharedLedger, state: &SharedNodeState) {
    let addrs = match seed.to_socket_addrs() {
        Ok(addrs) => addrs,
        Err(e) => {
            debug!("cannot resolve seed {seed}: {e}");
            return;
        }
    };
    for addr in addrs {
        if state.is_connected(&addr) {
            return;
        }
    }

    match TcpStream::connect(seed) {
        Ok(stream) => match peer::attach(stream, ledger.clone(), state.clone()) {
            Ok(address) => info!("connected to seed {seed} at {address}"),
            Err(e) => debug!("failed to attach seed {seed}: {e}"),
        },
        Err(e) => debug!("seed {seed} unreachable: {e}"),
    }
}
