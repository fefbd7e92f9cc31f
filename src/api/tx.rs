use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};
use std::time::Instant;

use super::models::{
    AppState, CoinbaseRequest, CoinbaseResponse, NewTxRequest, NewTxResponse, PendingResponse,
};
use crate::transaction::COINBASE_SOURCE;

/// Queue a transfer after checking the source balance.
#[post("/tx/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let t0 = Instant::now();
    let NewTxRequest {
        target,
        source,
        amount,
    } = body.into_inner();
    debug!("POST /tx/ - received: {source} -> {target}: {amount}");

    // Basic structure checks
    if amount == 0 {
        warn!("POST /tx/ - rejected: zero amount");
        return HttpResponse::BadRequest().body("amount must be > 0");
    }
    if source == COINBASE_SOURCE {
        warn!("POST /tx/ - rejected: coinbase source");
        return HttpResponse::BadRequest().body("use /coinbase/ to create value");
    }

    if !state.ledger.push_transaction(&target, &source, amount) {
        warn!("POST /tx/ - rejected: {source} cannot cover {amount}");
        return HttpResponse::BadRequest().json(NewTxResponse {
            accepted: false,
            pending: state.ledger.pending().len(),
        });
    }

    info!(
        "POST /tx/ - {source} -> {target}: {amount} OK ({} ms)",
        t0.elapsed().as_millis()
    );
    HttpResponse::Ok().json(NewTxResponse {
        accepted: true,
        pending: state.ledger.pending().len(),
    })
}

/// Credit `target` from nothing (dev faucet / mining reward).
#[post("/coinbase/")]
pub async fn post_coinbase(
    state: web::Data<AppState>,
    body: web::Json<CoinbaseRequest>,
) -> impl Responder {
    if body.amount == 0 {
        return HttpResponse::BadRequest().body("amount must be > 0");
    }
    let tx = state.ledger.push_coinbase(&body.target, body.amount);
    info!("POST /coinbase/ - {}: {} (id={})", tx.target, tx.amount, tx.id);
    HttpResponse::Ok().json(CoinbaseResponse { id: tx.id })
}

/// List the pending pool.
#[get("/pending/")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let transactions = state.ledger.pending();
    HttpResponse::Ok().json(PendingResponse {
        size: transactions.len(),
        transactions,
    })
}
