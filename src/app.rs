/*
 * Responsibility
 * - Tracing / panic hook setup
 * - Config → services → AppState
 * - Router assembly and axum::serve()
 */
use std::net::SocketAddr;
use std::{panic, process};

use anyhow::Context;
use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::api::v1::handlers::health::health;
use crate::config::{AppEnv, Config};
use crate::services::auth::build_token_codec;
use crate::state::AppState;

/// Log filter used when `RUST_LOG` is unset.
fn default_log_filter(app_env: AppEnv) -> &'static str {
    if app_env.is_production() {
        "info,tower_http=info"
    } else {
        "info,user_management_auth=debug,tower_http=debug"
    }
}

fn init_logging(app_env: AppEnv) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(app_env)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Route panics through tracing; outside production, take the process down with them.
fn install_panic_hook(app_env: AppEnv) {
    let fallback = panic::take_hook();
    let abort = !app_env.is_production();

    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        tracing::error!(%location, payload = ?info.payload().downcast_ref::<&str>(), "panic");

        if abort {
            process::abort();
        }
        fallback(info);
    }))
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    init_logging(config.app_env);
    install_panic_hook(config.app_env);

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let app = build_router(build_state(&config));

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}

fn build_state(config: &Config) -> AppState {
    AppState::new(build_token_codec(config))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode, header};
    use tower::ServiceExt;

    use super::*;
    use crate::services::auth::TokenCodec;
    use crate::services::auth::clock::ManualClock;

    const SECRET: &[u8] = b"router-test-secret";
    const NOW: i64 = 1_700_000_000;
    const TTL: u64 = 3600;

    fn setup() -> (Router, Arc<TokenCodec>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(NOW));
        let codec = Arc::new(
            TokenCodec::new(SECRET, "User Management, LLC", "User Management Portal", TTL)
                .with_clock(clock.clone()),
        );
        let router = build_router(AppState::new(codec.clone()));
        (router, codec, clock)
    }

    fn get_me(token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/api/v1/me");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn development_logs_this_crate_at_debug() {
        assert!(default_log_filter(AppEnv::Development).contains("user_management_auth=debug"));
        assert!(!default_log_filter(AppEnv::Production).contains("debug"));
    }

    #[tokio::test]
    async fn health_is_public() {
        let (router, _, _) = setup();

        let response = router
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn me_returns_the_authenticated_principal() {
        let (router, codec, _) = setup();
        let token = codec.issue("alice", &["ROLE_USER", "ROLE_ADMIN"]).unwrap();

        let response = router.oneshot(get_me(Some(&token))).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["username"], "alice");
        assert_eq!(
            body["authorities"],
            serde_json::json!(["ROLE_USER", "ROLE_ADMIN"])
        );
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let (router, _, _) = setup();

        let response = router.oneshot(get_me(None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(response).await["error"]["code"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn forged_and_expired_tokens_get_the_same_response() {
        let (router, codec, clock) = setup();
        let forged = TokenCodec::new(b"other-secret", "User Management, LLC", "x", TTL)
            .issue("mallory", &["ROLE_ADMIN"])
            .unwrap();
        let expiring = codec.issue("alice", &["ROLE_USER"]).unwrap();
        clock.advance(TTL as i64);

        let forged_response = router.clone().oneshot(get_me(Some(&forged))).await.unwrap();
        let expired_response = router.oneshot(get_me(Some(&expiring))).await.unwrap();

        assert_eq!(forged_response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(expired_response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(forged_response).await,
            json_body(expired_response).await
        );
    }

    #[tokio::test]
    async fn preflight_passes_through_the_auth_layer() {
        let (router, _, _) = setup();

        let response = router
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/v1/me")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // The route has no OPTIONS handler, so anything but 401 means the layer let it through.
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
