use actix_web::{HttpResponse, Responder, get, post, put, web};
use log::{debug, info, warn};

use super::error_response;
use super::models::{
    AppState, ChainResponse, DifficultyResponse, MineResponse, SetDifficultyRequest,
    ValidateResponse,
};
use crate::blockchain::Snapshot;

/* -------------------- Peer endpoints -------------------- */

/// Serve the full snapshot to a pulling peer.
#[get("/chain")]
pub async fn get_snapshot(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.ledger.snapshot())
}

/// Accept a pushed snapshot if it is longer than ours; 409 otherwise.
#[put("/chain")]
pub async fn put_snapshot(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    let snapshot = match Snapshot::decode(&body) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("PUT /chain - rejected unreadable snapshot: {e}");
            return HttpResponse::BadRequest().body(e.to_string());
        }
    };
    let height = snapshot.blocks.len();

    // verification hashes every block, keep it off the worker
    let ledger = state.ledger.clone();
    match web::block(move || ledger.receive_snapshot(snapshot)).await {
        Ok(Ok(())) => {
            info!("PUT /chain - adopted pushed chain of {height} blocks");
            HttpResponse::Ok().finish()
        }
        Ok(Err(e)) => {
            debug!("PUT /chain - refused chain of {height} blocks: {e}");
            error_response(&e)
        }
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/* -------------------- Operator API -------------------- */

/// Get the full blockchain and pending pool.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let snapshot = state.ledger.snapshot();
    HttpResponse::Ok().json(ChainResponse {
        length: snapshot.blocks.len(),
        difficulty: snapshot.difficulty,
        chain: snapshot.blocks,
        pending: snapshot.pending,
    })
}

/// Validate the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let ledger = &state.ledger;
    HttpResponse::Ok().json(ValidateResponse {
        valid: ledger.verify(),
        length: ledger.len(),
        difficulty: ledger.difficulty(),
    })
}

/// Mine the pending pool into a new block.
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>) -> impl Responder {
    let before = state.ledger.len();
    let ledger = state.ledger.clone();
    let elapsed = match web::block(move || ledger.process_pending()).await {
        Ok(Ok(elapsed)) => elapsed,
        Ok(Err(e)) => {
            warn!("POST /mine/ - mining failed: {e}");
            return error_response(&e);
        }
        Err(e) => return HttpResponse::InternalServerError().body(e.to_string()),
    };

    let (tail, length) = (state.ledger.last_block(), state.ledger.len());
    HttpResponse::Ok().json(MineResponse {
        mined: length > before,
        height: length - 1,
        hash: tail.hash,
        nonce: tail.nonce,
        difficulty: tail.difficulty,
        elapsed_ms: elapsed.as_millis(),
    })
}

/// Get current PoW difficulty.
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: state.ledger.difficulty(),
    })
}

/// Update PoW difficulty (affects future blocks only, never lowered).
#[post("/difficulty/")]
pub async fn set_difficulty(
    state: web::Data<AppState>,
    body: web::Json<SetDifficultyRequest>,
) -> impl Responder {
    if let Err(e) = state.ledger.set_difficulty(body.difficulty) {
        warn!("POST /difficulty/ - rejected {}: {e}", body.difficulty);
        return error_response(&e);
    }
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: state.ledger.difficulty(),
    })
}
