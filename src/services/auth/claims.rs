use std::net::SocketAddr;

use serde::{Deserialize, Serialize};

/// Claims written into every token this service signs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub sub: String,
    pub authorities: Vec<String>,
    pub exp: i64,
}

/// Claims read back out of a token whose signature and `iss` have been checked.
///
/// `aud` and `iat` are informational: `aud` may be a string, an array or absent,
/// and `iat` may be absent. `sub`, `authorities` and `exp` are required.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifiedClaims {
    pub iss: String,
    #[serde(default)]
    pub aud: serde_json::Value,
    #[serde(default)]
    pub iat: Option<i64>,
    pub sub: String,
    pub authorities: Vec<String>,
    pub exp: i64,
}

/// Request-specific details attached to an authenticated principal.
///
/// Supplied by whoever extracted the token; never validated here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    pub remote_addr: Option<SocketAddr>,
    pub user_agent: Option<String>,
}

/// Who is making the request and what they are allowed to do.
///
/// Only ever produced after a token has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticationContext {
    pub username: String,
    pub authorities: Vec<String>,
    pub metadata: RequestMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_serialize_with_wire_names() {
        let claims = TokenClaims {
            iss: "iss".to_string(),
            aud: "aud".to_string(),
            iat: 1,
            sub: "alice".to_string(),
            authorities: vec!["ROLE_USER".to_string()],
            exp: 2,
        };

        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "iss": "iss",
                "aud": "aud",
                "iat": 1,
                "sub": "alice",
                "authorities": ["ROLE_USER"],
                "exp": 2
            })
        );
    }
}
