//! WebSocket protocol

pub mod events;
pub mod payloads;

pub use events::{ClientEvent, ServerEvent};
pub use payloads::{PlayerInfo, RankUpInfo, ReconnectGameState, ReconnectLocation};
