use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::ledger::Ledger;
use crate::transaction::Transaction;

/// Shared application state: the replicated ledger and who we are.
pub struct AppState {
    pub ledger: Ledger,
    pub node_name: String,
    pub public_address: String,
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse {
    pub length: usize,
    pub difficulty: u8,
    pub chain: Vec<Block>,
    pub pending: Vec<Transaction>,
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u8,
}

#[derive(Serialize)]
pub struct MineResponse {
    /// False when there was nothing pending.
    pub mined: bool,
    pub height: usize,
    pub hash: String,
    pub nonce: u64,
    pub difficulty: u8,
    pub elapsed_ms: u128,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u8,
}

#[derive(Deserialize)]
pub struct SetDifficultyRequest {
    pub difficulty: u32,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub target: String,
    pub source: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct NewTxResponse {
    pub accepted: bool,
    pub pending: usize,
}

#[derive(Deserialize)]
pub struct CoinbaseRequest {
    pub target: String,
    pub amount: u64,
}

#[derive(Serialize)]
pub struct CoinbaseResponse {
    pub id: String,
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub account: String,
    pub balance: i128,
}

/* ---------- Peer API Models ---------- */

#[derive(Serialize)]
pub struct HealthResponse {
    pub node: String,
    pub address: String,
    pub length: usize,
    pub peers: usize,
}
