use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::AuthenticationContext;

/// Hands the `AuthenticationContext` put in place by the bearer middleware to a handler.
///
/// Rejects with 401 when the context is missing (route not behind the middleware).
pub struct Authenticated(pub AuthenticationContext);

impl<S> FromRequestParts<S> for Authenticated
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticationContext>()
            .cloned()
            .map(Authenticated)
            .ok_or(AppError::Unauthorized)
    }
}
