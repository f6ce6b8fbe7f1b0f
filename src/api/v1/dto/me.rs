use serde::Serialize;

use crate::services::auth::AuthenticationContext;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub username: String,
    pub authorities: Vec<String>,
}

impl From<AuthenticationContext> for MeResponse {
    fn from(ctx: AuthenticationContext) -> Self {
        Self {
            username: ctx.username,
            authorities: ctx.authorities,
        }
    }
}
