/// Factory: build `TokenCodec` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::auth::TokenCodec;

pub fn build_token_codec(config: &Config) -> Arc<TokenCodec> {
    let codec = TokenCodec::new(
        config.jwt_secret.as_bytes(),
        config.auth_issuer.clone(),
        config.auth_audience.clone(),
        config.access_token_ttl_seconds,
    );

    Arc::new(codec)
}
