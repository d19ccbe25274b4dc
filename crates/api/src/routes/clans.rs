//! Clan war endpoints
//!
//! The war lifecycle: declare, accept/decline, field a roster, play your
//! pair's lobby, inspect. Scores arrive through the engine when a clan-war
//! lobby finishes, not through this surface.

use axum::Json;
use axum::extract::{Path, State};
use validator::Validate;

use mistduel_auth::AuthUser;
use mistduel_db::{User, clans};
use mistduel_engine::war;
use mistduel_protocol::api::clans::{
    ClanResponse, CreateWarRequest, RosterRequest, WarResponse,
};
use mistduel_protocol::api::lobbies::CreateLobbyResponse;

use crate::error::ApiError;
use crate::state::AppState;

fn war_response(war: clans::ClanWar) -> WarResponse {
    WarResponse {
        id: war.id,
        clan_1_id: war.clan_1_id,
        clan_2_id: war.clan_2_id,
        status: war.status,
        participants: serde_json::to_value(&war.participants.0).unwrap_or_default(),
        clan_1_score: war.clan_1_score,
        clan_2_score: war.clan_2_score,
        winner_clan_id: war.winner_clan_id,
    }
}

/// The caller's clan, which they must own.
async fn owned_clan(state: &AppState, user: &User) -> Result<clans::Clan, ApiError> {
    let clan_id = user
        .clan_id
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("You are not in a clan".to_string()))?;

    let clan = clans::get_clan(&state.db, clan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Clan not found".to_string()))?;

    if clan.owner_id != user.id {
        return Err(ApiError::Forbidden("You are not the owner of this clan".to_string()));
    }
    Ok(clan)
}

/// `POST /clans/war/declare/{clan_id}` - declare war on another clan.
pub async fn create_war(
    Path(clan_id): Path<String>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateWarRequest>,
) -> Result<Json<WarResponse>, ApiError> {
    request.validate()?;

    let clan = owned_clan(&state, &user).await?;
    if clan.id != clan_id {
        return Err(ApiError::Forbidden("You are not the owner of this clan".to_string()));
    }
    if request.defender_clan_id == clan.id {
        return Err(ApiError::Validation("A clan cannot declare war on itself".to_string()));
    }

    clans::get_clan(&state.db, &request.defender_clan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Defender clan not found".to_string()))?;

    let war = clans::create_war(&state.db, &clan.id, &request.defender_clan_id).await?;
    tracing::info!(war_id = %war.id, attacker = %clan.id, defender = %request.defender_clan_id, "War declared");
    Ok(Json(war_response(war)))
}

/// `POST /clans/war/{war_id}/accept` - defender accepts the war.
pub async fn accept_war(
    Path(war_id): Path<String>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<WarResponse>, ApiError> {
    let clan = owned_clan(&state, &user).await?;
    let war = require_war_member(&state, &war_id, &clan.id).await?;

    war::accept_war(&state.db, &war.id).await?;
    let war = clans::get_war(&state.db, &war_id).await?.ok_or_else(war_gone)?;
    Ok(Json(war_response(war)))
}

/// `POST /clans/war/{war_id}/decline` - defender refuses; attacker wins by
/// forfeit with the harsher penalty applied.
pub async fn decline_war(
    Path(war_id): Path<String>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<WarResponse>, ApiError> {
    let clan = owned_clan(&state, &user).await?;
    require_war_member(&state, &war_id, &clan.id).await?;

    war::declaim_war(&state.db, &war_id).await?;
    let war = clans::get_war(&state.db, &war_id).await?.ok_or_else(war_gone)?;
    Ok(Json(war_response(war)))
}

/// `POST /clans/war/{war_id}/roster` - field five members for your side.
/// When both sides are in, the bracket forms.
pub async fn set_roster(
    Path(war_id): Path<String>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<RosterRequest>,
) -> Result<Json<WarResponse>, ApiError> {
    request.validate()?;

    let clan_id = user
        .clan_id
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("You are not in a clan".to_string()))?;

    let war =
        war::set_participants(&state.db, &state.wars, &war_id, clan_id, request.players).await?;
    Ok(Json(war_response(war)))
}

/// `POST /clans/war/{war_id}/play` - get (or create) the caller's pair lobby.
pub async fn play_war(
    Path(war_id): Path<String>,
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<CreateLobbyResponse>, ApiError> {
    let invite_code =
        war::play_war(&state.db, &state.wars, &state.provider, &war_id, &user.id).await?;
    Ok(Json(CreateLobbyResponse { invite_code }))
}

/// `GET /clans/war/{war_id}` - inspect a war.
pub async fn get_war(
    Path(war_id): Path<String>,
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<WarResponse>, ApiError> {
    let war = clans::get_war(&state.db, &war_id).await?.ok_or_else(war_gone)?;
    Ok(Json(war_response(war)))
}

/// `GET /clans/{clan_id}` - public clan card.
pub async fn get_clan(
    Path(clan_id): Path<String>,
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
) -> Result<Json<ClanResponse>, ApiError> {
    let clan = clans::get_clan(&state.db, &clan_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Clan not found".to_string()))?;

    Ok(Json(ClanResponse {
        id: clan.id,
        name: clan.name,
        tag: clan.tag,
        owner_id: clan.owner_id,
        members: clan.members,
        xp: clan.xp,
        reputation: clan.reputation,
        wars_won: clan.wars_won,
        wars_lost: clan.wars_lost,
        wars_total: clan.wars_total,
    }))
}

fn war_gone() -> ApiError {
    ApiError::NotFound("War not found".to_string())
}

async fn require_war_member(
    state: &AppState,
    war_id: &str,
    clan_id: &str,
) -> Result<clans::ClanWar, ApiError> {
    let war = clans::get_war(&state.db, war_id).await?.ok_or_else(war_gone)?;
    if war.clan_1_id != clan_id && war.clan_2_id != clan_id {
        return Err(ApiError::Forbidden(
            "Your clan is not a participant of this war".to_string(),
        ));
    }
    Ok(war)
}
