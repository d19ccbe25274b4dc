//! Profile endpoints

use axum::Json;
use axum::extract::State;

use mistduel_auth::AuthUser;
use mistduel_db::{lobbies, users};
use mistduel_protocol::api::profile::{
    ActiveLobby, AvatarResponse, LeaderboardEntry, MeResponse,
};

use crate::cache::leaderboard::LeaderboardCache;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /profile/me` - the caller's profile and active lobbies.
pub async fn me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<MeResponse>, ApiError> {
    let active = lobbies::get_by_user(&state.db, &user.id).await?;

    Ok(Json(MeResponse {
        name: user.name,
        avatar: user.avatar,
        xp: user.xp,
        rank: user.rank,
        role: user.role,
        country_stats: serde_json::to_value(&user.country_stats.0).unwrap_or_default(),
        lobbies: active
            .into_iter()
            .map(|lobby| ActiveLobby { code: lobby.invite_code, host_id: lobby.host_id })
            .collect(),
    }))
}

/// `GET /profile/avatar`
pub async fn avatar(AuthUser(user): AuthUser) -> Json<AvatarResponse> {
    Json(AvatarResponse { avatar: user.avatar })
}

/// `GET /profile/leaderboard` - top five by XP, cached for five minutes.
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    if let Some(cached) = LeaderboardCache::get(state.redis()).await {
        return Ok(Json(cached));
    }

    let entries: Vec<LeaderboardEntry> = users::leaderboard_top5(&state.db)
        .await?
        .into_iter()
        .map(|row| LeaderboardEntry {
            user_id: row.id,
            name: row.name,
            avatar: row.avatar,
            xp: row.xp,
            rank: row.rank,
        })
        .collect();

    LeaderboardCache::set(state.redis(), &entries).await;
    Ok(Json(entries))
}
