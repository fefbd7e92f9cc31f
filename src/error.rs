//! Error types shared by the ledger, the miner and the sync protocol.

use thiserror::Error;

use crate::network::TransportError;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("difficulty cannot be decreased below {current} (requested {requested})")]
    DifficultyDecreased { requested: u32, current: u8 },

    #[error("difficulty {0} is out of range (max {max})", max = crate::blockchain::MAX_DIFFICULTY)]
    DifficultyOutOfRange(u32),

    #[error("cannot decode block hash: {0}")]
    Decode(String),

    #[error("nonce space exhausted while mining")]
    NonceExhausted,

    #[error("mining cancelled")]
    MiningCancelled,

    /// The tail moved while a block was being mined (usually a peer snapshot
    /// replaced local state).
    #[error("chain tail changed while mining")]
    ChainReplaced,

    #[error("chain is outdated")]
    ChainOutdated,

    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
