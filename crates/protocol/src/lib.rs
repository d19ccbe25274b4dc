//! Wire types for MistDuel
//!
//! Everything a client sees: the tagged WebSocket event enums and the HTTP
//! request/response bodies. Field spellings here are the wire contract -
//! some (`LobbyCode`, `RoundStartTime`, `PlayerHasGuessed`) predate this
//! server and are kept for client compatibility.

pub mod api;
pub mod socket;
