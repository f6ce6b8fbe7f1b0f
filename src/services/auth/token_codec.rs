use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::{debug, error};

use crate::services::auth::claims::{
    AuthenticationContext, RequestMetadata, TokenClaims, VerifiedClaims,
};
use crate::services::auth::clock::{Clock, SystemClock};

/// Failures produced while signing or checking a token.
///
/// `Verification` deliberately renders the same message whatever went wrong;
/// the wrapped `jsonwebtoken` error is only reachable through `source()` / `Debug`
/// so it ends up in logs and not in responses.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("token cannot be verified")]
    Verification(#[from] jsonwebtoken::errors::Error),

    #[error("token has expired")]
    Expired,

    #[error("identity is empty")]
    InvalidIdentity,
}

/// HS512 signer/verifier for access tokens.
///
/// One secret, one algorithm, one issuer. Tokens are checked for signature and
/// `iss` on every read; expiration is a separate question answered by
/// [`TokenCodec::validate`] / [`TokenCodec::is_valid`].
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    audience: String,
    ttl_seconds: u64,
    secret_is_empty: bool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenCodec")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenCodec {
    /// An empty `secret` is accepted here and reported when a token is signed.
    pub fn new(
        secret: &[u8],
        issuer: impl Into<String>,
        audience: impl Into<String>,
        ttl_seconds: u64,
    ) -> Self {
        let issuer = issuer.into();

        let mut validation = Validation::new(Algorithm::HS512);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        // Expiration is checked against our own clock, and the audience is informational.
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            issuer,
            audience: audience.into(),
            ttl_seconds,
            secret_is_empty: secret.is_empty(),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sign a token for an already-authenticated `identity`.
    ///
    /// `authorities` may be empty; order is preserved in the `authorities` claim.
    pub fn issue<S: AsRef<str>>(
        &self,
        identity: &str,
        authorities: &[S],
    ) -> Result<String, TokenError> {
        if self.secret_is_empty {
            error!("refusing to sign a token with an empty secret");
            return Err(TokenError::Signing("secret is empty".to_string()));
        }

        let now = self.clock.now();
        let claims = TokenClaims {
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            sub: identity.to_string(),
            authorities: authorities
                .iter()
                .map(|a| a.as_ref().to_string())
                .collect(),
            exp: now.saturating_add_unsigned(self.ttl_seconds),
        };

        let mut header = Header::new(Algorithm::HS512);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            TokenError::Signing(e.to_string())
        })
    }

    /// Verify signature + issuer and return the `authorities` claim.
    ///
    /// Expired tokens are still accepted here.
    pub fn verify_and_extract_authorities(&self, token: &str) -> Result<Vec<String>, TokenError> {
        Ok(self.decode(token)?.authorities)
    }

    /// Verify signature + issuer and return `sub`, regardless of `exp`.
    pub fn get_subject(&self, token: &str) -> Result<String, TokenError> {
        Ok(self.decode(token)?.sub)
    }

    /// Tagged validity check.
    ///
    /// A blank `identity` short-circuits to `InvalidIdentity` without looking at
    /// the token. Otherwise the token must verify (`Verification`) and its `exp`
    /// must be strictly after now (`Expired`).
    ///
    /// Whitespace-only identities count as blank, which is stricter than a
    /// plain emptiness check.
    pub fn validate(&self, identity: &str, token: &str) -> Result<(), TokenError> {
        if identity.trim().is_empty() {
            return Err(TokenError::InvalidIdentity);
        }

        let claims = self.decode(token)?;
        self.ensure_unexpired(&claims)
    }

    /// Boolean view of [`TokenCodec::validate`].
    ///
    /// Blank identity and expiry collapse into `Ok(false)`; a token that does
    /// not verify is still an `Err(TokenError::Verification)`.
    pub fn is_valid(&self, identity: &str, token: &str) -> Result<bool, TokenError> {
        match self.validate(identity, token) {
            Ok(()) => Ok(true),
            Err(TokenError::InvalidIdentity | TokenError::Expired) => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub fn build_authentication_context(
        &self,
        identity: impl Into<String>,
        authorities: Vec<String>,
        metadata: RequestMetadata,
    ) -> AuthenticationContext {
        AuthenticationContext {
            username: identity.into(),
            authorities,
            metadata,
        }
    }

    /// Verify, check subject and expiry, and build the context, decoding once.
    pub fn authenticate(
        &self,
        token: &str,
        metadata: RequestMetadata,
    ) -> Result<AuthenticationContext, TokenError> {
        let claims = self.decode(token)?;

        if claims.sub.trim().is_empty() {
            return Err(TokenError::InvalidIdentity);
        }
        self.ensure_unexpired(&claims)?;

        Ok(self.build_authentication_context(claims.sub, claims.authorities, metadata))
    }

    fn decode(&self, token: &str) -> Result<VerifiedClaims, TokenError> {
        if self.secret_is_empty {
            return Err(TokenError::Verification(ErrorKind::InvalidKeyFormat.into()));
        }

        let data = jsonwebtoken::decode::<VerifiedClaims>(token, &self.decoding_key, &self.validation)?;

        Ok(data.claims)
    }

    fn ensure_unexpired(&self, claims: &VerifiedClaims) -> Result<(), TokenError> {
        let now = self.clock.now();
        if claims.exp > now {
            Ok(())
        } else {
            debug!(sub = %claims.sub, exp = claims.exp, now, "token expired");
            Err(TokenError::Expired)
        }
    }
}
