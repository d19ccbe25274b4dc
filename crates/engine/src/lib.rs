//! Realtime game engine for MistDuel
//!
//! The concurrent core of the backend: per-lobby actors driving the duel
//! state machine, the session registry they broadcast through, the redis
//! snapshot/disconnect store, the disconnect supervisor, the matchmaking
//! queue, and the clan war controller. The HTTP/WebSocket surface in
//! `mistduel-api` is a thin shell over this crate.

pub mod actor;
pub mod manager;
pub mod matchmaker;
pub mod registry;
pub mod snapshot;
pub mod supervisor;
pub mod war;

pub use actor::{JoinError, LobbyCommand};
pub use manager::{LobbyHandle, LobbyManager};
pub use matchmaker::{Matchmaker, QueueEntry};
pub use registry::{ConnHandle, connection_channel};
pub use snapshot::{SnapshotError, SnapshotStore};
pub use war::WarRegistry;
