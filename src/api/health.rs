use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, HealthResponse};

#[get("/health/")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        node: state.node_name.clone(),
        address: state.public_address.clone(),
        length: state.ledger.len(),
        peers: state.ledger.peers().len(),
    })
}
