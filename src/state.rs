/*
 * Responsibility
 * - Shared context handed to every router (AppState)
 * - Cheap to clone: everything inside is behind Arc
 */
use std::sync::Arc;

use crate::services::auth::TokenCodec;

#[derive(Clone, Debug)]
pub struct AppState {
    pub auth: Arc<TokenCodec>,
}

impl AppState {
    pub fn new(auth: Arc<TokenCodec>) -> Self {
        Self { auth }
    }
}
