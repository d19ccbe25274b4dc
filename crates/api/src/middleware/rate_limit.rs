//! Rate limiting middleware using Redis
//!
//! Fixed-window counters keyed `rl:{path}:{ip}`. Redis being down never
//! blocks traffic: counter failures log and let the request through.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use redis::AsyncCommands;

use crate::error::ApiError;
use crate::state::AppState;

/// Rate limit configuration
#[derive(Clone, Copy, Debug)]
pub struct RateLimitConfig {
    /// Max requests per window
    pub max_requests: u32,
    /// Window duration in seconds
    pub window_secs: u64,
}

impl RateLimitConfig {
    /// Lobby create/join: 10 per minute.
    pub const LOBBY: Self = Self { max_requests: 10, window_secs: 60 };

    /// Avatar reads: 3 per minute.
    pub const AVATAR: Self = Self { max_requests: 3, window_secs: 60 };
}

/// Extract client IP from request, checking X-Forwarded-For header
fn get_client_ip(request: &Request<Body>) -> String {
    if let Some(forwarded) = request.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded.to_str()
        && let Some(ip) = value.split(',').next()
    {
        return ip.trim().to_string();
    }

    if let Some(real_ip) = request.headers().get("x-real-ip")
        && let Ok(value) = real_ip.to_str()
    {
        return value.to_string();
    }

    "unknown".to_string()
}

/// Lobby-endpoint rate limit (10/min per IP).
pub async fn rate_limit_lobby(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_config(state, RateLimitConfig::LOBBY, request, next).await
}

/// Avatar-endpoint rate limit (3/min per IP).
pub async fn rate_limit_avatar(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    rate_limit_with_config(state, RateLimitConfig::AVATAR, request, next).await
}

async fn rate_limit_with_config(
    state: AppState,
    config: RateLimitConfig,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = get_client_ip(&request);
    let path = request.uri().path();
    let key = format!("rl:{path}:{ip}");

    let mut conn = match state.redis().get_multiplexed_async_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!(error = %e, "Failed to get Redis connection for rate limiting");
            return next.run(request).await;
        }
    };

    let count: u32 = match conn.incr(&key, 1).await {
        Ok(count) => count,
        Err(e) => {
            tracing::error!(error = %e, key = %key, "Failed to increment rate limit counter");
            return next.run(request).await;
        }
    };

    // Window opens with the first request.
    if count == 1
        && let Err(e) = conn.expire::<_, ()>(&key, config.window_secs as i64).await
    {
        tracing::error!(error = %e, key = %key, "Failed to set rate limit expiry");
    }

    if count > config.max_requests {
        tracing::warn!(ip = %ip, key = %key, count, "Rate limit exceeded");
        return ApiError::RateLimited.into_response();
    }

    next.run(request).await
}
