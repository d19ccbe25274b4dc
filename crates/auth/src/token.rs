//! Access token decoding

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

/// Signing configuration injected at startup.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id (`usr_XXXXXXXXXXXX`).
    pub id: String,
    /// Expiry, seconds since epoch.
    pub exp: u64,
    /// Token kind; refresh tokens are rejected for access.
    #[serde(rename = "type", default)]
    pub token_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("Not an access token")]
    WrongKind,
}

/// Decode and verify an HS256 access token.
pub fn decode_access_token(config: &TokenConfig, token: &str) -> Result<Claims, TokenError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )?;

    if data.claims.token_type.as_deref() == Some("refresh") {
        return Err(TokenError::WrongKind);
    }
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn issue(secret: &str, claims: &Claims) -> String {
        encode(&Header::default(), claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn future_exp() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_round_trip() {
        let config = TokenConfig::new("test-secret");
        let token = issue(
            "test-secret",
            &Claims { id: "usr_abc123def456".into(), exp: future_exp(), token_type: None },
        );

        let claims = decode_access_token(&config, &token).unwrap();
        assert_eq!(claims.id, "usr_abc123def456");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = TokenConfig::new("right-secret");
        let token = issue(
            "wrong-secret",
            &Claims { id: "usr_abc123def456".into(), exp: future_exp(), token_type: None },
        );
        assert!(matches!(decode_access_token(&config, &token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = TokenConfig::new("test-secret");
        let token = issue(
            "test-secret",
            &Claims { id: "usr_abc123def456".into(), exp: 1, token_type: None },
        );
        assert!(decode_access_token(&config, &token).is_err());
    }

    #[test]
    fn test_refresh_token_rejected_for_access() {
        let config = TokenConfig::new("test-secret");
        let token = issue(
            "test-secret",
            &Claims {
                id: "usr_abc123def456".into(),
                exp: future_exp(),
                token_type: Some("refresh".into()),
            },
        );
        assert!(matches!(decode_access_token(&config, &token), Err(TokenError::WrongKind)));
    }
}
