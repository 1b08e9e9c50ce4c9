use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::transaction::Transaction;

/// A gossip frame. On the wire each message is one line of JSON, so peers
/// written in any language can speak the protocol with a buffered reader.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    Block { block: Block },
    Transaction { transaction: Transaction },
}

impl Message {
    /// Encode as a newline-terminated JSON frame.
    pub fn to_frame(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut frame = serde_json::to_vec(self)?;
        frame.push(b'\n');
        Ok(frame)
    }

    /// Decode a single frame (one line, without requiring the newline).
    pub fn from_frame(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}
