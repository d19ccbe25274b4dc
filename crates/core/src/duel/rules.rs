//! Fixed game rules

/// HP each duel participant starts with.
pub const STARTING_HP: i32 = 6000;

/// Round timer for a duel lobby, seconds.
pub const DUEL_TIMER_SECS: u32 = 240;

/// Round timer for a clan-war lobby, seconds.
pub const CLAN_WAR_TIMER_SECS: u32 = 120;

/// HP lost by every participant when a round times out with no guesses.
pub const NO_GUESS_DAMAGE: i32 = 500;

/// HP lost by the participant who failed to guess when the other did.
pub const SINGLE_GUESS_DAMAGE: i32 = 1000;

/// Delay between rounds so clients can render results, seconds.
pub const INTER_ROUND_DELAY_SECS: u64 = 5;

/// Grace window between a disconnect and a forced leave, seconds.
pub const DISCONNECT_GRACE_SECS: u64 = 180;

/// Locations drawn for a lobby at creation.
pub const LOBBY_LOCATIONS: usize = 13;

/// Maximum participants in a duel lobby.
pub const MAX_DUEL_PLAYERS: usize = 2;

/// Clan war roster size per side.
pub const WAR_ROSTER_SIZE: usize = 5;
