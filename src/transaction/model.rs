use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// Source account of transactions that create value from nothing
/// (mining rewards, initial funding).
pub const COINBASE_SOURCE: &str = "$coinbase$";

/// A transfer of `amount` from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Time-ordered unique identifier (UUID v7).
    pub id: String,
    pub target: String,
    pub source: String,
    pub amount: u64,
}

impl Transaction {
    /// Build a transaction with a fresh id. No balance validation happens here.
    pub fn new(target: impl Into<String>, source: impl Into<String>, amount: u64) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            target: target.into(),
            source: source.into(),
            amount,
        }
    }

    pub fn coinbase(target: impl Into<String>, amount: u64) -> Self {
        Self::new(target, COINBASE_SOURCE, amount)
    }

    pub fn is_coinbase(&self) -> bool {
        self.source == COINBASE_SOURCE
    }

    /// Canonical JSON encoding (fields in declaration order). This is the
    /// form that goes into the block hash preimage.
    pub fn serialize(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
