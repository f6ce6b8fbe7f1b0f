/*
 * Responsibility
 * - GET /api/v1/me: who the bearer token says the caller is
 */
use axum::Json;

use crate::api::v1::dto::me::MeResponse;
use crate::api::v1::extractors::Authenticated;

pub async fn me(Authenticated(ctx): Authenticated) -> Json<MeResponse> {
    Json(MeResponse::from(ctx))
}
