//! Prefixed nanoid generation for entity identifiers.
//!
//! Entities use prefixed nanoid identifiers instead of UUIDs:
//! - Human-readable prefixes identify entity type at a glance
//! - URL-safe characters (no encoding needed)
//!
//! Lobby invite codes are short unprefixed nanoids; they are shared between
//! players verbatim, so brevity wins over entropy there.

use nanoid::nanoid;

/// Alphabet for id generation (URL-safe).
const ALPHABET: [char; 64] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', '-', '_', 'a',
    'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't',
    'u', 'v', 'w', 'x', 'y', 'z',
];

/// Entity ID length (excluding prefix). Provides ~71 bits entropy.
const ENTITY_ID_LEN: usize = 12;

/// Invite code length. Short enough to type, unique enough per live lobby set.
const INVITE_CODE_LEN: usize = 8;

/// Entity prefixes for different types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityPrefix {
    User,
    Clan,
    War,
}

impl EntityPrefix {
    /// Returns the string prefix for this entity type.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityPrefix::User => "usr_",
            EntityPrefix::Clan => "cln_",
            EntityPrefix::War => "war_",
        }
    }
}

/// Generate a prefixed ID for a user entity.
/// Format: `usr_XXXXXXXXXXXX` (16 chars total)
pub fn generate_user_id() -> String {
    format!("{}{}", EntityPrefix::User.as_str(), nanoid!(ENTITY_ID_LEN, &ALPHABET))
}

/// Generate a prefixed ID for a clan entity.
/// Format: `cln_XXXXXXXXXXXX` (16 chars total)
pub fn generate_clan_id() -> String {
    format!("{}{}", EntityPrefix::Clan.as_str(), nanoid!(ENTITY_ID_LEN, &ALPHABET))
}

/// Generate a prefixed ID for a clan war entity.
/// Format: `war_XXXXXXXXXXXX` (16 chars total)
pub fn generate_war_id() -> String {
    format!("{}{}", EntityPrefix::War.as_str(), nanoid!(ENTITY_ID_LEN, &ALPHABET))
}

/// Generate a lobby invite code.
/// Format: 8 URL-safe characters, no prefix.
pub fn generate_invite_code() -> String {
    nanoid!(INVITE_CODE_LEN, &ALPHABET)
}

/// Parse the prefix from an ID string.
/// Returns `None` if the ID doesn't have a recognized prefix.
pub fn parse_prefix(id: &str) -> Option<EntityPrefix> {
    if id.starts_with("usr_") {
        Some(EntityPrefix::User)
    } else if id.starts_with("cln_") {
        Some(EntityPrefix::Clan)
    } else if id.starts_with("war_") {
        Some(EntityPrefix::War)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_format() {
        let id = generate_user_id();
        assert!(id.starts_with("usr_"));
        assert_eq!(id.len(), 16);
    }

    #[test]
    fn test_invite_code_format() {
        let code = generate_invite_code();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| ALPHABET.contains(&c)));
    }

    #[test]
    fn test_parse_prefix() {
        assert_eq!(parse_prefix(&generate_war_id()), Some(EntityPrefix::War));
        assert_eq!(parse_prefix("gibberish"), None);
    }
}
