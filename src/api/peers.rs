use actix_web::{HttpResponse, Responder, get, post, web};
use log::warn;

use super::error_response;
use super::models::AppState;
use crate::network::Node;

#[get("/peers/")]
pub async fn get_peers(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.ledger.peers())
}

/// Reconcile with `node` and start gossiping with it.
#[post("/peers/")]
pub async fn register_peer(state: web::Data<AppState>, body: web::Json<Node>) -> impl Responder {
    let node = body.into_inner();
    if node.address.trim().is_empty() {
        return HttpResponse::BadRequest().body("address required");
    }
    match state.ledger.register_peer(node.clone()).await {
        Ok(()) => HttpResponse::Ok().json(state.ledger.peers()),
        Err(e) => {
            warn!("POST /peers/ - cannot register {}: {e}", node.address);
            error_response(&e)
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use serde_json::json;

    use crate::api::{AppState, init_routes};
    use crate::ledger::tests::offline_ledger;

    #[actix_web::test]
    async fn unreachable_peer_is_not_registered() {
        let state = web::Data::new(AppState {
            ledger: offline_ledger(0),
            node_name: "test".into(),
            public_address: "http://test:8080".into(),
        });
        let app = test::init_service(App::new().app_data(state.clone()).configure(init_routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/v1/peers/")
            .set_json(json!({ "name": "b", "address": "http://127.0.0.1:1" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_GATEWAY);

        let req = test::TestRequest::get().uri("/api/v1/peers/").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert!(body.as_array().unwrap().is_empty());

        let req = test::TestRequest::get().uri("/api/v1/health/").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["node"], "test");
        assert_eq!(body["address"], "http://test:8080");
        assert_eq!(body["peers"], 0);
    }
}
