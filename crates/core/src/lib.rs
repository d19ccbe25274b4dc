//! Core domain logic for MistDuel
//!
//! This crate contains the duel state machine, scoring and distance math,
//! the rank ladder, and id generation. Everything here is pure: no IO, no
//! clocks, no randomness beyond id generation.

pub mod duel;
pub mod error;
pub mod geo;
pub mod id;
pub mod rank;
pub mod scoring;

pub use error::CoreError;
pub use id::{generate_clan_id, generate_invite_code, generate_user_id, generate_war_id};
