//! Authentication extractors for HTTP handlers.
//!
//! - `AuthUser`: requires a valid bearer token (header or `access_token`
//!   cookie) and a non-banned user
//! - `RequireAdmin`: additionally requires `role = admin`

use axum::{
    extract::FromRequestParts,
    http::{
        StatusCode,
        header::{AUTHORIZATION, COOKIE},
        request::Parts,
    },
};
use chrono::Utc;

use mistduel_db::{User, users};

use crate::token::{TokenConfig, decode_access_token};

/// Cookie that may carry the access token for browser clients.
const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Trait for application state that supports auth extraction.
pub trait AuthState: Clone + Send + Sync + 'static {
    /// Get the database connection pool.
    fn db_pool(&self) -> &sqlx::PgPool;
    /// Get the token verification configuration.
    fn token_config(&self) -> &TokenConfig;
}

/// The authenticated, non-banned user behind the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

/// Requires a user with the admin role.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

/// Extract the bearer token from the Authorization header, falling back to
/// the `access_token` cookie.
///
/// If multiple cookies with the same name exist, take the LAST one - that is
/// typically the most recently set.
fn extract_token(parts: &Parts) -> Option<String> {
    if let Some(value) = parts.headers.get(AUTHORIZATION)
        && let Ok(value) = value.to_str()
        && let Some(token) = value.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    let cookie_header = parts.headers.get(COOKIE)?.to_str().ok()?;
    let prefix = format!("{ACCESS_TOKEN_COOKIE}=");
    cookie_header
        .split(';')
        .filter_map(|cookie| cookie.trim().strip_prefix(&prefix).map(str::to_string))
        .last()
}

async fn resolve_user<S: AuthState>(
    parts: &Parts,
    state: &S,
) -> Result<User, (StatusCode, &'static str)> {
    let token =
        extract_token(parts).ok_or((StatusCode::UNAUTHORIZED, "Missing token"))?;

    let claims = decode_access_token(state.token_config(), &token)
        .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid token"))?;

    let user = users::get_by_id(state.db_pool(), &claims.id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Database error during auth");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })?
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid token"))?;

    if user.is_banned(Utc::now()) {
        return Err((StatusCode::FORBIDDEN, "User is banned"));
    }

    Ok(user)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: AuthState,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        resolve_user(parts, state).await.map(AuthUser)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: AuthState,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = resolve_user(parts, state).await?;
        if !user.is_admin() {
            return Err((StatusCode::FORBIDDEN, "Forbidden"));
        }
        Ok(RequireAdmin(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(header: &str, value: &str) -> Parts {
        let request =
            Request::builder().uri("/").header(header, value).body(()).unwrap();
        request.into_parts().0
    }

    #[test]
    fn test_bearer_header_wins() {
        let parts = parts_with("authorization", "Bearer abc.def.ghi");
        assert_eq!(extract_token(&parts).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_fallback_takes_last_match() {
        let parts =
            parts_with("cookie", "access_token=old.token; theme=dark; access_token=new.token");
        assert_eq!(extract_token(&parts).as_deref(), Some("new.token"));
    }

    #[test]
    fn test_no_token_anywhere() {
        let parts = parts_with("cookie", "theme=dark");
        assert_eq!(extract_token(&parts), None);
    }
}
