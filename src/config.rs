//! Node configuration read from the environment (and `.env` via dotenvy).
//!
//! | variable             | default     |
//! |----------------------|-------------|
//! | `HOST`               | `127.0.0.1` |
//! | `PORT`               | `8080`      |
//! | `NODE_NAME`          | `node`      |
//! | `PUBLIC_ADDRESS`     | `http://HOST:PORT` |
//! | `DIFFICULTY`         | `8`         |
//! | `PEERS`              | none        |
//! | `MINE_INTERVAL_SECS` | `0` (off)   |
//! | `PEER_TIMEOUT_SECS`  | `10`        |
//! | `DATA_FILE`          | none        |
//!
//! `PEERS` is a comma separated list of `name=url` or bare `url` entries.
//! An entry pointing at `PUBLIC_ADDRESS` is dropped.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::blockchain::DEFAULT_DIFFICULTY;
use crate::network::Node;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub node_name: String,
    /// Base URL other nodes reach this one at.
    pub public_address: String,
    pub difficulty: u32,
    pub peers: Vec<Node>,
    /// `None` disables the background miner.
    pub mine_interval: Option<Duration>,
    pub peer_timeout: Duration,
    pub data_file: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mine_interval_secs: u64 = parse(&lookup, "MINE_INTERVAL_SECS", 0)?;
        let peer_timeout_secs: u64 = parse(&lookup, "PEER_TIMEOUT_SECS", 10)?;
        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = parse(&lookup, "PORT", 8080)?;
        let public_address = lookup("PUBLIC_ADDRESS")
            .map(|address| address.trim().trim_end_matches('/').to_string())
            .filter(|address| !address.is_empty())
            .unwrap_or_else(|| format!("http://{host}:{port}"));
        let peers = lookup("PEERS")
            .as_deref()
            .map(parse_peers)
            .unwrap_or_default()
            .into_iter()
            .filter(|peer| peer.address.trim_end_matches('/') != public_address)
            .collect();

        Ok(Self {
            host,
            port,
            node_name: lookup("NODE_NAME").unwrap_or_else(|| "node".to_string()),
            public_address,
            difficulty: parse(&lookup, "DIFFICULTY", DEFAULT_DIFFICULTY)?,
            peers,
            mine_interval: (mine_interval_secs > 0)
                .then(|| Duration::from_secs(mine_interval_secs)),
            peer_timeout: Duration::from_secs(peer_timeout_secs),
            data_file: lookup("DATA_FILE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn parse<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

fn parse_peers(raw: &str) -> Vec<Node> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once('=') {
            Some((name, address)) => Node::new(name.trim(), address.trim()),
            None => Node::new(entry, entry),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError};
    use crate::network::Node;
    use std::collections::HashMap;
    use std::time::Duration;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.public_address, "http://127.0.0.1:8080");
        assert_eq!(cfg.difficulty, 8);
        assert!(cfg.peers.is_empty());
        assert!(cfg.mine_interval.is_none());
        assert!(cfg.data_file.is_none());
    }

    #[test]
    fn reads_peers_and_intervals() {
        let cfg = config(&[
            ("PEERS", "alpha=http://10.0.0.1:8080, http://10.0.0.2:8080 ,"),
            ("MINE_INTERVAL_SECS", "30"),
            ("DIFFICULTY", "12"),
            ("DATA_FILE", "chain.json"),
        ])
        .unwrap();
        assert_eq!(
            cfg.peers,
            vec![
                Node::new("alpha", "http://10.0.0.1:8080"),
                Node::new("http://10.0.0.2:8080", "http://10.0.0.2:8080"),
            ]
        );
        assert_eq!(cfg.mine_interval, Some(Duration::from_secs(30)));
        assert_eq!(cfg.difficulty, 12);
        assert_eq!(cfg.data_file.unwrap().to_str(), Some("chain.json"));
    }

    #[test]
    fn own_address_is_not_a_peer() {
        let cfg = config(&[
            ("PUBLIC_ADDRESS", "http://node-a:9000/"),
            ("PEERS", "self=http://node-a:9000/,b=http://node-b:9000"),
        ])
        .unwrap();
        assert_eq!(cfg.public_address, "http://node-a:9000");
        assert_eq!(cfg.peers, vec![Node::new("b", "http://node-b:9000")]);

        let cfg = config(&[("HOST", "0.0.0.0"), ("PORT", "7000")]).unwrap();
        assert_eq!(cfg.public_address, "http://0.0.0.0:7000");
    }

    #[test]
    fn rejects_garbage_numbers() {
        assert!(matches!(
            config(&[("PORT", "eighty")]),
            Err(ConfigError::Invalid { key: "PORT", .. })
        ));
    }
}
