pub mod model;

pub use model::{COINBASE_SOURCE, Transaction};
