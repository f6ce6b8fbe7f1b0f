//! Bearer access token → AuthenticationContext in request extensions
//!
//! - `Authorization: Bearer <jwt>` is verified through `TokenCodec::authenticate`
//!   (signature, `iss`, non-blank `sub`, `exp`).
//! - On success the context, with caller address and user agent attached, is
//!   inserted into the request extensions for the `Authenticated` extractor.
//! - Every failure is a 401 with the same body; the specific reason only goes
//!   to the log.

use std::net::SocketAddr;

use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Method, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::services::auth::{RequestMetadata, TokenError};
use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

/// Require a valid access token on every route of `router`.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, bearer_middleware))
}

async fn bearer_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // CORS preflight carries no credentials
    if req.method() == Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let token = bearer_token(req.headers()).ok_or_else(|| {
        tracing::debug!("missing or malformed Authorization header");
        AppError::Unauthorized
    })?;

    let metadata = request_metadata(&req);

    let ctx = match state.auth.authenticate(token, metadata) {
        Ok(ctx) => ctx,
        Err(TokenError::Expired) => {
            tracing::info!("access token expired");
            return Err(AppError::Unauthorized);
        }
        Err(err) => {
            tracing::warn!(error = ?err, "access token verification failed");
            return Err(err.into());
        }
    };

    tracing::debug!(username = %ctx.username, "request authenticated");
    req.extensions_mut().insert(ctx);

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn request_metadata(req: &Request<Body>) -> RequestMetadata {
    // Only present when served with `into_make_service_with_connect_info`
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    RequestMetadata {
        remote_addr,
        user_agent,
    }
}
