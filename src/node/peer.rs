use std::io::{BufRead, BufReader};
use std::net::{SocketAddr, TcpStream};
use std::thread;

use log::{debug, info, warn};

use super::message::Message;
use super::state::SharedNodeState;
use crate::blockchain::SharedLedger;

/// Register a connected peer and spawn its handler thread.
///
/// The write half lives in the registry (for broadcasts); the read half is
/// consumed here, one frame per line, until the socket closes.
pub fn attach(
    stream: TcpStream,
    ledger: SharedLedger,
    state: SharedNodeState,
) -> std::io::Result<SocketAddr> {
    let address = stream.peer_addr()?;
    let reader = stream.try_clone()?;
    state.register_peer(address, stream);

    thread::spawn(move || {
        read_loop(reader, address, &ledger, &state);
        state.drop_peer(&address);
        info!("peer {address} disconnected");
    });

    Ok(address)
}

fn read_loop(
    stream: TcpStream,
    address: SocketAddr,
    ledger: &SharedLedger,
    state: &SharedNodeState,
) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!("read error from {address}: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match Message::from_frame(&line) {
            Ok(message) => super::on_message(message, ledger, state),
            // A bad frame is the peer's problem, not a reason to tear down
            // the connection.
            Err(e) => debug!("undecodable frame from {address}: {e}"),
        }
    }
}
