//! WebSocket endpoints
//!
//! Three sockets: the lobby channel (players), the spectator channel, and
//! matchmaking. Each handler authenticates the `token` query parameter on
//! accept (closing 1008 with a fixed reason on failure), splits the socket,
//! and bridges it to the engine: inbound JSON dispatches on its `type` tag
//! into actor commands, outbound events arrive on the connection's channel
//! and are written by a dedicated task.
//!
//! Handler errors close only their own socket; the lobby actor they talk to
//! is never torn down from here.

use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code};
use axum::extract::{Path, Query, State};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use mistduel_auth::authenticate_socket;
use mistduel_core::geo::valid_coordinates;
use mistduel_db::lobbies;
use mistduel_engine::{ConnHandle, LobbyCommand, LobbyHandle, QueueEntry, connection_channel};
use mistduel_protocol::socket::{ClientEvent, ServerEvent};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// `GET /ws/{lobby_code}?token=…` - player socket.
pub async fn lobby_socket(
    ws: WebSocketUpgrade,
    Path(lobby_code): Path<String>,
    Query(query): Query<TokenQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_lobby_socket(socket, state, lobby_code, query.token))
}

/// `GET /ws/{lobby_code}/spectate?token=…` - read-only observer.
pub async fn spectator_socket(
    ws: WebSocketUpgrade,
    Path(lobby_code): Path<String>,
    Query(query): Query<TokenQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_spectator_socket(socket, state, lobby_code, query.token))
}

/// `GET /matchmaking/?token=…` - matchmaking channel.
pub async fn matchmaking_socket(
    ws: WebSocketUpgrade,
    Query(query): Query<TokenQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| run_matchmaking_socket(socket, state, query.token))
}

/// Close with 1008 and a fixed reason.
async fn reject(mut socket: WebSocket, reason: &'static str) {
    let frame =
        CloseFrame { code: close_code::POLICY, reason: Utf8Bytes::from_static(reason) };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

/// Drain the connection's outbound channel into the socket.
fn spawn_writer(
    mut sink: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<ServerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if sink.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => tracing::error!(error = %e, "Failed to serialize server event"),
            }
        }
        let _ = sink.close().await;
    })
}

async fn run_lobby_socket(
    socket: WebSocket,
    state: AppState,
    lobby_code: String,
    token: Option<String>,
) {
    let user = match authenticate_socket(&state.db, &state.tokens, token.as_deref()).await {
        Ok(user) => user,
        Err(e) => return reject(socket, e.close_reason()).await,
    };
    match lobbies::get_by_code(&state.db, &lobby_code).await {
        Ok(Some(_)) => {}
        _ => return reject(socket, "Lobby not found").await,
    }

    let (conn, outbound) = connection_channel();
    let conn_id = conn.id();
    let user_id = user.id;

    let handle = state.lobbies.get_or_create(&lobby_code).await;
    let (reply_tx, reply_rx) = oneshot::channel();
    let join = LobbyCommand::Join {
        user_id: user_id.clone(),
        conn: conn.clone(),
        respond: reply_tx,
    };
    if handle.tx.send(join).await.is_err() {
        return reject(socket, "Lobby not found").await;
    }
    match reply_rx.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => return reject(socket, e.close_reason()).await,
        Err(_) => return reject(socket, "Lobby not found").await,
    }

    let (sink, mut stream) = socket.split();
    let writer = spawn_writer(sink, outbound);

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => {
                    dispatch_lobby_event(&handle, &user_id, &conn, event).await;
                }
                Err(e) => {
                    tracing::warn!(code = %lobby_code, error = %e, "Dropped unknown or malformed message");
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(code = %lobby_code, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Socket gone: hand over to the grace window. After a voluntary leave
    // this connection is already detached and the command is a no-op.
    let _ = handle.tx.send(LobbyCommand::Disconnected { user_id, conn_id }).await;
    writer.abort();
}

async fn dispatch_lobby_event(
    handle: &LobbyHandle,
    user_id: &str,
    conn: &ConnHandle,
    event: ClientEvent,
) {
    let command = match event {
        ClientEvent::GameStart => LobbyCommand::GameStart,
        ClientEvent::GameEnd => LobbyCommand::GameEnd,
        ClientEvent::SubmitGuess { lat, lon } => {
            if !valid_coordinates(lat, lon) {
                tracing::warn!(user_id, lat, lon, "Dropped out-of-bounds guess");
                return;
            }
            LobbyCommand::SubmitGuess { user_id: user_id.to_string(), lat, lon }
        }
        ClientEvent::PlayerJoined => {
            // Re-announce; the actor ignores the duplicate attach.
            let (respond, _ignored) = oneshot::channel();
            LobbyCommand::Join { user_id: user_id.to_string(), conn: conn.clone(), respond }
        }
        ClientEvent::PlayerLeft => {
            LobbyCommand::Leave { user_id: user_id.to_string(), conn_id: Some(conn.id()) }
        }
        ClientEvent::PlayerReconnect => {
            LobbyCommand::Reconnect { user_id: user_id.to_string(), conn: conn.clone() }
        }
        ClientEvent::Broadcast { message } => {
            LobbyCommand::Chat { user_id: user_id.to_string(), message }
        }
        ClientEvent::RoundStart => LobbyCommand::RoundStart,
        ClientEvent::RoundEnd => LobbyCommand::RoundEnd { round: None },
        ClientEvent::Spectate { num_player, data } => {
            LobbyCommand::SpectateRelay { num_player, data }
        }
        ClientEvent::StopMatchmaking => {
            tracing::warn!(user_id, "stop_matchmaking on a lobby socket, ignored");
            return;
        }
    };

    let _ = handle.tx.send(command).await;
}

async fn run_spectator_socket(
    socket: WebSocket,
    state: AppState,
    lobby_code: String,
    token: Option<String>,
) {
    // Banned users may spectate; only the token itself is checked.
    if let Err(e) = authenticate_socket(&state.db, &state.tokens, token.as_deref()).await {
        return reject(socket, e.close_reason()).await;
    }
    match lobbies::get_by_code(&state.db, &lobby_code).await {
        Ok(Some(_)) => {}
        _ => return reject(socket, "Lobby not found").await,
    }

    let (conn, outbound) = connection_channel();
    let conn_id = conn.id();

    let handle = state.lobbies.get_or_create(&lobby_code).await;
    if handle.tx.send(LobbyCommand::SpectatorJoin { conn }).await.is_err() {
        return reject(socket, "Lobby not found").await;
    }

    let (sink, mut stream) = socket.split();
    let writer = spawn_writer(sink, outbound);

    // Observers send nothing meaningful; drain until the socket closes.
    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }

    let _ = handle.tx.send(LobbyCommand::SpectatorLeave { conn_id }).await;
    writer.abort();
}

async fn run_matchmaking_socket(socket: WebSocket, state: AppState, token: Option<String>) {
    let user = match authenticate_socket(&state.db, &state.tokens, token.as_deref()).await {
        Ok(user) => user,
        Err(e) => return reject(socket, e.close_reason()).await,
    };

    let (conn, outbound) = connection_channel();
    let user_id = user.id;
    state
        .matchmaker
        .join_queue(QueueEntry { user_id: user_id.clone(), conn, xp: user.xp })
        .await;

    let (sink, mut stream) = socket.split();
    let writer = spawn_writer(sink, outbound);

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(ClientEvent::StopMatchmaking) => break,
                Ok(_) => {}
                Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Dropped malformed message"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(_) => break,
        }
    }

    state.matchmaker.leave_queue(&user_id).await;
    writer.abort();
}
