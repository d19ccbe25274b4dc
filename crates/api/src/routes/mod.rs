//! Route registration

pub mod clans;
pub mod health;
pub mod lobbies;
pub mod profile;
pub mod ws;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::middleware::rate_limit::{rate_limit_avatar, rate_limit_lobby};
use crate::state::AppState;

pub fn create_router(state: AppState, cors: CorsLayer) -> Router {
    let lobby_limit = from_fn_with_state(state.clone(), rate_limit_lobby);
    let lobby_routes = Router::new()
        .route("/", post(lobbies::create_lobby).route_layer(lobby_limit.clone()))
        .route(
            "/{invite_code}/members",
            put(lobbies::join_lobby)
                .route_layer(lobby_limit)
                .delete(lobbies::leave_lobby),
        )
        .route("/random", get(lobbies::random_location));

    let clan_routes = Router::new()
        .route("/war/{war_id}/accept", post(clans::accept_war))
        .route("/war/{war_id}/decline", post(clans::decline_war))
        .route("/war/{war_id}/roster", post(clans::set_roster))
        .route("/war/{war_id}/play", post(clans::play_war))
        .route("/war/{war_id}", get(clans::get_war))
        .route("/war/declare/{clan_id}", post(clans::create_war))
        .route("/{clan_id}", get(clans::get_clan));

    let profile_routes = Router::new()
        .route(
            "/avatar",
            get(profile::avatar).route_layer(from_fn_with_state(state.clone(), rate_limit_avatar)),
        )
        .route("/me", get(profile::me))
        .route("/leaderboard", get(profile::leaderboard));

    Router::new()
        .route("/health", get(health::health))
        .nest("/lobbies", lobby_routes)
        .nest("/clans", clan_routes)
        .nest("/profile", profile_routes)
        .route("/ws/{lobby_code}", get(ws::lobby_socket))
        .route("/ws/{lobby_code}/spectate", get(ws::spectator_socket))
        .route("/matchmaking/", get(ws::matchmaking_socket))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}
