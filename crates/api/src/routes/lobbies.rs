//! Lobby endpoints

use axum::Json;
use axum::extract::{Path, State};

use mistduel_auth::AuthUser;
use mistduel_core::duel::rules::{DUEL_TIMER_SECS, LOBBY_LOCATIONS};
use mistduel_db::lobbies;
use mistduel_protocol::api::lobbies::{
    CreateLobbyResponse, MessageResponse, RandomLocationResponse,
};

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /lobbies/` - create a duel lobby hosted by the caller.
pub async fn create_lobby(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CreateLobbyResponse>, ApiError> {
    let locations = state.provider.random_locations(LOBBY_LOCATIONS).await?;
    let lobby = lobbies::create(
        &state.db,
        &user.id,
        locations,
        DUEL_TIMER_SECS as i32,
        None,
        None,
    )
    .await?;

    tracing::info!(user_id = %user.id, code = %lobby.invite_code, "Lobby created");
    Ok(Json(CreateLobbyResponse { invite_code: lobby.invite_code }))
}

/// `PUT /lobbies/{invite_code}/members` - join a lobby.
pub async fn join_lobby(
    Path(invite_code): Path<String>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    match lobbies::add_user(&state.db, &invite_code, &user.id).await? {
        lobbies::JoinOutcome::Joined(_) | lobbies::JoinOutcome::AlreadyIn(_) => {
            tracing::info!(user_id = %user.id, code = %invite_code, "Joined lobby");
            Ok(Json(MessageResponse { message: "Successfully joined lobby".to_string() }))
        }
        lobbies::JoinOutcome::Full => Err(ApiError::Conflict("Lobby is full".to_string())),
        lobbies::JoinOutcome::NotFound => {
            Err(ApiError::NotFound("InviteCode not found".to_string()))
        }
    }
}

/// `DELETE /lobbies/{invite_code}/members` - leave a lobby.
pub async fn leave_lobby(
    Path(invite_code): Path<String>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MessageResponse>, ApiError> {
    lobbies::remove_user(&state.db, &invite_code, &user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("InviteCode not found".to_string()))?;

    tracing::info!(user_id = %user.id, code = %invite_code, "Left lobby");
    Ok(Json(MessageResponse { message: "Successfully left lobby".to_string() }))
}

/// `GET /lobbies/random` - one random location for solo practice.
pub async fn random_location(
    State(state): State<AppState>,
) -> Result<Json<RandomLocationResponse>, ApiError> {
    let location = state.provider.random_one().await?;
    Ok(Json(RandomLocationResponse { lat: location.lat, lon: location.lon }))
}
