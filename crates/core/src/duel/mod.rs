//! Duel state machine
//!
//! A pure reducer over per-lobby game state. The realtime engine feeds it
//! commands and broadcasts the resulting events; timers and persistence stay
//! outside so every transition is testable without IO.

pub mod commands;
pub mod events;
pub mod reducer;
pub mod rules;
pub mod state;

pub use commands::DuelCommand;
pub use events::DuelEvent;
pub use reducer::{ReducerResult, reduce};
pub use state::{DuelState, GameMode, Guess, RoundLocation};
