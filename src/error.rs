/*
 * Responsibility
 * - Application-wide AppError
 * - IntoResponse (HTTP status + JSON error body)
 * - Collapse token failures into what a client is allowed to see
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::auth::TokenError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("internal server error")]
    Internal,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "You need to log in to access this page".to_string(),
            ),
            AppError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_SERVER_ERROR",
                "internal server error".to_string(),
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        match e {
            // Server-side misconfiguration, not the caller's fault
            TokenError::Signing(_) => AppError::Internal,
            TokenError::Verification(_) | TokenError::Expired | TokenError::InvalidIdentity => {
                AppError::Unauthorized
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_failures_map_to_unauthorized_except_signing() {
        assert!(matches!(
            AppError::from(TokenError::Expired),
            AppError::Unauthorized
        ));
        assert!(matches!(
            AppError::from(TokenError::InvalidIdentity),
            AppError::Unauthorized
        ));
        assert!(matches!(
            AppError::from(TokenError::Verification(
                jsonwebtoken::errors::ErrorKind::InvalidSignature.into()
            )),
            AppError::Unauthorized
        ));
        assert!(matches!(
            AppError::from(TokenError::Signing("secret is empty".to_string())),
            AppError::Internal
        ));
    }

    #[tokio::test]
    async fn unauthorized_body_is_generic() {
        let response = AppError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert_eq!(
            body["error"]["message"],
            "You need to log in to access this page"
        );
    }
}
