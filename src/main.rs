use std::env;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use dotenvy::dotenv;
use log::info;

use tinycoin::blockchain::{Ledger, SharedLedger};
use tinycoin::config::Config;
use tinycoin::crypto::sha256;
use tinycoin::miner::Miner;
use tinycoin::node;

fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.json".to_string());
    let config = Config::load(Path::new(&config_path));

    let mode = env::args().nth(1).unwrap_or_default();
    if mode == "--wallet" {
        info!("the wallet UI ships as a separate process; nothing to run here");
        return Ok(());
    }

    info!(
        "starting node (target spacing {}s, {} seed nodes)",
        config.target_spacing,
        config.seed_nodes.len()
    );
    let ledger: SharedLedger = Arc::new(Mutex::new(Ledger::new(&config)));
    let (node_state, _addr) = node::start(&config, ledger.clone())?;

    match mode.as_str() {
        "--miner" => {
            let miner = Miner::new(ledger, node_state, sha256(b"minerKey"));
            let _mining_thread = miner.start();
            idle()
        }
        "--seed" => {
            info!("running as a bootstrap peer");
            idle()
        }
        _ => {
            info!("running as a full node");
            idle()
        }
    }
}

/// Park the main thread; every worker runs until process exit.
fn idle() -> ! {
    loop {
        thread::sleep(Duration::from_secs(1));
    }
}
