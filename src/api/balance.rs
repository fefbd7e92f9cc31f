use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, BalanceResponse};

#[get("/balance/{account}/")]
pub async fn get_balance(state: web::Data<AppState>, path: web::Path<(String,)>) -> impl Responder {
    let account = path.into_inner().0;
    let balance = state.ledger.balance_of(&account);
    HttpResponse::Ok().json(BalanceResponse { account, balance })
}
