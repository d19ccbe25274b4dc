//! Authentication for MistDuel
//!
//! Bearer-token validation only: tokens are issued elsewhere (the OAuth
//! exchange is a separate service); this crate decodes and verifies them,
//! resolves the user, and guards the HTTP and WebSocket boundaries.

pub mod gateway;
pub mod middleware;
pub mod token;

pub use gateway::{WsAuthError, authenticate_socket};
pub use middleware::{AuthState, AuthUser, RequireAdmin};
pub use token::{Claims, TokenConfig, TokenError, decode_access_token};
