//! End-to-end exercises of the gossip boundary: frames written to a real
//! socket reach the ledger, and accepted news is written back out.

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use tinycoin::blockchain::{Block, Ledger, SharedLedger};
use tinycoin::config::Config;
use tinycoin::crypto::sha256;
use tinycoin::node::{self, Message};
use tinycoin::transaction::Transaction;

fn test_node() -> (SharedLedger, tinycoin::node::SharedNodeState, std::net::SocketAddr) {
    // port 0: let the OS pick, so parallel tests never collide
    let config = Config::from_json(r#"{ "p2pPort": 0 }"#).unwrap();
    let ledger: SharedLedger = Arc::new(Mutex::new(Ledger::new(&config)));
    let (state, addr) = node::start(&config, ledger.clone()).unwrap();
    (ledger, state, addr)
}

fn mined_block(ledger: &SharedLedger) -> Block {
    let mut block = ledger
        .lock()
        .unwrap()
        .build_candidate(sha256(b"minerKey"));
    block.build_merkle_root();
    while !block.has_valid_pow() {
        block.header.nonce += 1;
    }
    block
}

fn connect(addr: std::net::SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
}

fn wait_for_height(ledger: &SharedLedger, len: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while ledger.lock().unwrap().chain().len() < len {
        assert!(Instant::now() < deadline, "chain never reached length {len}");
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn block_over_the_wire_is_accepted_and_rebroadcast() {
    let (ledger, _state, addr) = test_node();
    let block = mined_block(&ledger);

    let mut stream = connect(addr);
    stream
        .write_all(
            &Message::Block {
                block: block.clone(),
            }
            .to_frame()
            .unwrap(),
        )
        .unwrap();
    stream.flush().unwrap();

    wait_for_height(&ledger, 2);
    assert_eq!(ledger.lock().unwrap().tip().hash(), block.hash());

    // the acceptance is gossiped back out to every peer, including us
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    match Message::from_frame(line.trim_end()).unwrap() {
        Message::Block { block: echoed } => assert_eq!(echoed.hash(), block.hash()),
        other => panic!("expected a block frame, got {other:?}"),
    }
}

#[test]
fn garbage_frames_do_not_kill_the_connection() {
    let (ledger, _state, addr) = test_node();
    let block = mined_block(&ledger);

    let mut stream = connect(addr);
    stream.write_all(b"this is not json\n").unwrap();
    stream
        .write_all(&Message::Block { block }.to_frame().unwrap())
        .unwrap();
    stream.flush().unwrap();

    wait_for_height(&ledger, 2);
}

#[test]
fn stale_block_is_rejected_without_echo() {
    let (ledger, _state, addr) = test_node();
    let winner = mined_block(&ledger);
    let loser = {
        let mut block = ledger
            .lock()
            .unwrap()
            .build_candidate(sha256(b"otherMiner"));
        block.build_merkle_root();
        while !block.has_valid_pow() {
            block.header.nonce += 1;
        }
        block
    };

    let mut stream = connect(addr);
    stream
        .write_all(&Message::Block { block: winner }.to_frame().unwrap())
        .unwrap();
    wait_for_height(&ledger, 2);

    stream
        .write_all(&Message::Block { block: loser }.to_frame().unwrap())
        .unwrap();
    stream.flush().unwrap();

    // the winner comes back on the gossip path; the stale loser never does
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert!(matches!(
        Message::from_frame(line.trim_end()).unwrap(),
        Message::Block { .. }
    ));

    line.clear();
    let err = reader.read_line(&mut line);
    // nothing further: the read times out (or the line stays empty)
    assert!(err.is_err() || line.is_empty());
    assert_eq!(ledger.lock().unwrap().chain().len(), 2);
}

#[test]
fn transactions_are_relayed_once() {
    let (ledger, _state, addr) = test_node();

    // a spend of the genesis output; mempool acceptance is a no-op but the
    // relay path still gossips it
    let genesis_txid = ledger.lock().unwrap().chain()[0].transactions[0].txid();
    let tx = Transaction::new(
        vec![tinycoin::transaction::TxInput {
            outpoint: tinycoin::transaction::OutPoint {
                txid: genesis_txid,
                vout: 0,
            },
            authenticator: "sig".into(),
        }],
        vec![tinycoin::transaction::TxOutput {
            amount: 1,
            pubkey_hash: sha256(b"someone"),
        }],
    );

    let mut stream = connect(addr);
    stream
        .write_all(
            &Message::Transaction {
                transaction: tx.clone(),
            }
            .to_frame()
            .unwrap(),
        )
        .unwrap();
    stream.flush().unwrap();

    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    match Message::from_frame(line.trim_end()).unwrap() {
        Message::Transaction { transaction } => assert_eq!(transaction.txid(), tx.txid()),
        other => panic!("expected a transaction frame, got {other:?}"),
    }

    // sending the same transaction again is dropped by the dedup guard
    stream
        .write_all(&Message::Transaction { transaction: tx }.to_frame().unwrap())
        .unwrap();
    stream.flush().unwrap();

    line.clear();
    let err = reader.read_line(&mut line);
    assert!(err.is_err() || line.is_empty());
}
