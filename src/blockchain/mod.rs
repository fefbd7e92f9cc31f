pub mod block;
pub mod hash;
pub mod model;
pub mod snapshot;

pub use block::Block;
pub use hash::Blockhash;
pub use model::Blockchain;
pub use snapshot::Snapshot;

/// Highest proof-of-work difficulty (leading zero bits).
pub const MAX_DIFFICULTY: u8 = u8::MAX;

/// Default difficulty for a new node (keep low in dev to avoid long waits).
pub const DEFAULT_DIFFICULTY: u32 = 8;

/// Hash of the genesis block.
pub const GENESIS_BLOCK_HASH: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
