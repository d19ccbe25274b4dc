//! Database layer for MistDuel
//!
//! Connection pooling and query functions over the durable store: users,
//! lobbies, clans, clan wars, and the location catalog. Game state itself is
//! ephemeral and lives in the engine + redis, never here.

pub mod clans;
pub mod lobbies;
pub mod locations;
pub mod pool;
pub mod users;

pub use clans::{Clan, ClanWar, WarPair, WarParticipants};
pub use lobbies::{JoinOutcome, Lobby};
pub use locations::LocationRow;
pub use pool::{DbPool, create_pool};
pub use users::{CountryStat, LeaderboardRow, RankUp, User};
