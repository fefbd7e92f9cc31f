mod balance;
mod chain;
mod health;
pub mod models;
mod peers;
mod tx;

use actix_web::HttpResponse;
use actix_web::web::{self, ServiceConfig};

use crate::error::ChainError;

pub use models::AppState;

/// Largest snapshot a peer may push.
pub const MAX_SNAPSHOT_BYTES: usize = 64 * 1024 * 1024;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.app_data(web::PayloadConfig::new(MAX_SNAPSHOT_BYTES))
        .service(chain::get_snapshot)
        .service(chain::put_snapshot)
        .service(
            web::scope("/api/v1")
                .service(health::health_check)
                .service(chain::get_chain)
                .service(chain::validate_chain)
                .service(chain::mine_block)
                .service(chain::get_difficulty)
                .service(chain::set_difficulty)
                .service(tx::post_transaction)
                .service(tx::post_coinbase)
                .service(tx::get_pending)
                .service(balance::get_balance)
                .service(peers::get_peers)
                .service(peers::register_peer),
        );
}

/// Map a ledger error onto an HTTP status. `ChainOutdated` becomes 409,
/// which peers read as "my chain is at least as long as yours".
pub(crate) fn error_response(err: &ChainError) -> HttpResponse {
    let msg = err.to_string();
    match err {
        ChainError::ChainOutdated => HttpResponse::Conflict().body(msg),
        ChainError::DifficultyDecreased { .. }
        | ChainError::DifficultyOutOfRange(_)
        | ChainError::Decode(_)
        | ChainError::InvalidSnapshot(_)
        | ChainError::Serialization(_) => HttpResponse::BadRequest().body(msg),
        ChainError::Transport(_) => HttpResponse::BadGateway().body(msg),
        ChainError::NonceExhausted
        | ChainError::MiningCancelled
        | ChainError::ChainReplaced
        | ChainError::Io(_) => HttpResponse::InternalServerError().body(msg),
    }
}
