//! A small replicated proof-of-work ledger.
//!
//! Blocks are hash-linked and mined against a leading-zero-bit target.
//! Nodes gossip full snapshots to each other and adopt the longest chain
//! that verifies.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod error;
pub mod ledger;
pub mod network;
pub mod storage;
pub mod transaction;

pub use error::{ChainError, Result};
pub use ledger::Ledger;
