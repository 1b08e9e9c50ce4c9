use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::thread::{self, JoinHandle};

use log::{info, warn};

use super::peer;
use super::state::SharedNodeState;
use crate::blockchain::SharedLedger;

/// Bind the gossip port and accept peers until process exit.
///
/// Returns the bound address (the port differs from the requested one when
/// asking for port 0) and the listener thread's handle.
pub fn start(
    port: u16,
    ledger: SharedLedger,
    state: SharedNodeState,
) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))?;
    let local_addr = listener.local_addr()?;
    info!("listening for peers on {local_addr}");

    let handle = thread::spawn(move || {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    if let Err(e) = peer::attach(stream, ledger.clone(), state.clone()) {
                        warn!("failed to attach incoming peer: {e}");
                    }
                }
                Err(e) => warn!("accept failed: {e}"),
            }
        }
    });

    Ok((local_addr, handle))
}
