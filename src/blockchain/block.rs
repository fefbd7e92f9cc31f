use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{Blockhash, GENESIS_BLOCK_HASH};
use crate::error::{ChainError, Result};
use crate::transaction::Transaction;

/// How many nonces are tried between two looks at the cancel flag.
const CANCEL_CHECK_INTERVAL: u64 = 4096;

/// A batch of transactions sealed by a proof-of-work nonce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub transactions: Vec<Transaction>,
    pub timestamp: i64, // Unix timestamp (UTC)
    pub prev_hash: String,
    pub hash: String, // empty until mined
    pub difficulty: u8,
    pub nonce: u64,
}

impl Block {
    /// The first block of every chain. It carries a well-known hash and is
    /// never mined.
    pub fn genesis() -> Self {
        Self {
            transactions: Vec::new(),
            timestamp: 0,
            prev_hash: String::new(),
            hash: GENESIS_BLOCK_HASH.to_string(),
            difficulty: 0,
            nonce: 0,
        }
    }

    pub fn is_genesis(&self) -> bool {
        *self == Self::genesis()
    }

    /// Create a new block (not mined yet) holding copies of `transactions`.
    pub fn seal(transactions: &[Transaction]) -> Self {
        Self {
            transactions: transactions.to_vec(),
            timestamp: Utc::now().timestamp(),
            prev_hash: String::new(),
            hash: String::new(),
            difficulty: 0,
            nonce: 0,
        }
    }

    /// Chain this block onto `predecessor`. Must happen before mining.
    pub fn link_after(&mut self, predecessor: &Block) {
        self.prev_hash = predecessor.hash.clone();
    }

    /// Hash preimage: prev hash, timestamp, every transaction, difficulty
    /// and, when `include_nonce` is set, the nonce.
    pub fn content(&self, include_nonce: bool) -> Result<String> {
        let mut content = format!("{}{}", self.prev_hash, self.timestamp);
        for tx in &self.transactions {
            content.push_str(&tx.serialize()?);
        }
        content.push_str(&self.difficulty.to_string());
        if include_nonce {
            content.push_str(&self.nonce.to_string());
        }
        Ok(content)
    }

    /// The preimage used to check an existing hash. The nonce only takes
    /// part once a hash has been assigned.
    pub fn content_digest_input(&self) -> Result<String> {
        self.content(!self.hash.is_empty())
    }

    /// Search nonces from zero until the digest has `difficulty` leading
    /// zero bits. Returns the time spent.
    pub fn mine(&mut self, difficulty: u8) -> Result<Duration> {
        self.mine_until(difficulty, &AtomicBool::new(false))
    }

    /// Same as [`Block::mine`] but gives up with `MiningCancelled` once
    /// `cancel` is raised. A cancelled block keeps an empty hash.
    pub fn mine_until(&mut self, difficulty: u8, cancel: &AtomicBool) -> Result<Duration> {
        self.difficulty = difficulty;
        let content = self.content(false)?;
        let start = Instant::now();

        let mut nonce: u64 = 0;
        loop {
            let hash = Blockhash::digest_of(format!("{content}{nonce}").as_bytes());
            if hash.meets_difficulty(difficulty) {
                self.nonce = nonce;
                self.hash = hash.to_hex();
                return Ok(start.elapsed());
            }
            if nonce == u64::MAX {
                return Err(ChainError::NonceExhausted);
            }
            if nonce % CANCEL_CHECK_INTERVAL == 0 && cancel.load(Ordering::Relaxed) {
                return Err(ChainError::MiningCancelled);
            }
            nonce += 1;
        }
    }

    /// The stored hash parses and has the block's difficulty.
    pub fn verify_proof_of_work(&self) -> bool {
        Blockhash::from_hex(&self.hash)
            .map(|hash| hash.meets_difficulty(self.difficulty))
            .unwrap_or(false)
    }

    /// The stored hash matches the block content.
    pub fn verify_hash(&self) -> bool {
        if self.hash.is_empty() {
            return false;
        }
        match self.content_digest_input() {
            Ok(content) => Blockhash::digest_of(content.as_bytes()).to_hex() == self.hash,
            Err(_) => false,
        }
    }
}
