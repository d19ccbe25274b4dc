//! WebSocket accept-time authentication.
//!
//! Sockets authenticate with a `token` query parameter. Failures map to a
//! close with code 1008 and a fixed reason string. Unlike the HTTP boundary,
//! banned users pass here; callers that care filter afterwards.

use mistduel_db::{DbPool, User, users};

use crate::token::{TokenConfig, decode_access_token};

#[derive(Debug, thiserror::Error)]
pub enum WsAuthError {
    #[error("Missing token")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("User not found")]
    UserNotFound,
}

impl WsAuthError {
    /// Reason string for the 1008 close frame.
    pub fn close_reason(&self) -> &'static str {
        match self {
            WsAuthError::MissingToken => "Missing token",
            WsAuthError::InvalidToken => "Invalid token",
            WsAuthError::UserNotFound => "User not found",
        }
    }
}

/// Validate the `token` query parameter of a WebSocket upgrade and resolve
/// the user behind it.
pub async fn authenticate_socket(
    pool: &DbPool,
    config: &TokenConfig,
    token: Option<&str>,
) -> Result<User, WsAuthError> {
    let token = token.ok_or(WsAuthError::MissingToken)?;

    let claims =
        decode_access_token(config, token).map_err(|_| WsAuthError::InvalidToken)?;

    users::get_by_id(pool, &claims.id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Database error during socket auth");
            WsAuthError::InvalidToken
        })?
        .ok_or(WsAuthError::UserNotFound)
}
