/*
 * Responsibility
 * - v1 URL layout
 * - Decide which routes sit behind the bearer token layer
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::me::me;
use crate::middleware::auth::bearer;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new().route("/me", get(me));

    bearer::apply(protected, state)
}
