use std::fs;
use std::path::Path;

use log::warn;
use serde::Deserialize;

/// Node configuration, read once at startup from a JSON document.
///
/// Every key is optional and falls back to the defaults below; unknown keys
/// are ignored so older nodes tolerate newer config files.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Initial whole coins minted per block.
    pub block_reward: u64,
    /// Blocks between reward halvings.
    pub block_halving_interval: u64,
    /// Advisory seconds between blocks; recorded, not enforced.
    pub target_spacing: u64,
    /// Embedded in the genesis coinbase authenticator.
    pub genesis_message: String,
    /// TCP port the gossip listener binds.
    pub p2p_port: u16,
    /// `host:port` peers to (re)connect on discovery ticks. May be empty.
    pub seed_nodes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_reward: 50,
            block_halving_interval: 210_000,
            target_spacing: 600,
            genesis_message: "Hello from Genesis!".to_string(),
            p2p_port: 8333,
            seed_nodes: Vec::new(),
        }
    }
}

impl Config {
    /// Parse a configuration document. Unknown keys are ignored, missing
    /// keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load from `path`, falling back to full defaults when the file is
    /// absent or unparseable (with a warning, never an abort).
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(config) => config,
                Err(e) => {
                    warn!("failed to parse {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                warn!("failed to read {}: {e}; using defaults", path.display());
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let c = Config::default();
        assert_eq!(c.block_reward, 50);
        assert_eq!(c.block_halving_interval, 210_000);
        assert_eq!(c.target_spacing, 600);
        assert_eq!(c.genesis_message, "Hello from Genesis!");
        assert_eq!(c.p2p_port, 8333);
        assert!(c.seed_nodes.is_empty());
    }

    #[test]
    fn missing_keys_take_defaults() {
        let c = Config::from_json(r#"{ "blockReward": 12 }"#).unwrap();
        assert_eq!(c.block_reward, 12);
        assert_eq!(c.block_halving_interval, 210_000);
        assert_eq!(c.p2p_port, 8333);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let c = Config::from_json(r#"{ "p2pPort": 9000, "rpcPort": 1234 }"#).unwrap();
        assert_eq!(c.p2p_port, 9000);
    }

    #[test]
    fn seed_nodes_parse_as_a_list() {
        let c = Config::from_json(r#"{ "seedNodes": ["10.0.0.1:8333", "seed.example:8333"] }"#)
            .unwrap();
        assert_eq!(c.seed_nodes.len(), 2);
        assert_eq!(c.seed_nodes[0], "10.0.0.1:8333");
    }

    #[test]
    fn load_falls_back_to_defaults_for_missing_file() {
        let c = Config::load(Path::new("/nonexistent/config.json"));
        assert_eq!(c.block_reward, 50);
    }
}
