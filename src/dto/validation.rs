//! Validation helpers for DTOs.

use validator::ValidationError;

const NAME_MIN_CHARS: usize = 2;
const NAME_MAX_CHARS: usize = 20;
const ROOM_ID_LENGTH: usize = 6;
/// Characters room codes are drawn from; visually ambiguous ones are excluded.
pub const ROOM_ID_ALPHABET: &str = "23456789ABCDEFGHJKLMNPQRSTUVWXYZ";

/// Describe why `name` is not an acceptable display name, if it is not.
///
/// Names are 2 to 20 characters of letters (Arabic or Latin), digits and spaces.
pub fn player_name_problem(name: &str) -> Option<&'static str> {
    let trimmed = name.trim();
    let length = trimmed.chars().count();
    if length < NAME_MIN_CHARS {
        return Some("name must be at least 2 characters long");
    }
    if length > NAME_MAX_CHARS {
        return Some("name must be at most 20 characters long");
    }
    if !trimmed.chars().all(is_name_char) {
        return Some("name may only contain letters, digits and spaces");
    }
    None
}

fn is_name_char(c: char) -> bool {
    c == ' '
        || c.is_ascii_alphanumeric()
        || (('\u{0600}'..='\u{06FF}').contains(&c) && (c.is_alphabetic() || c.is_numeric()))
        || (('\u{00C0}'..='\u{024F}').contains(&c) && c.is_alphabetic())
}

/// Validates a player display name.
///
/// # Examples
///
/// ```ignore
/// validate_player_name("Alice")  // Ok
/// validate_player_name("سارة")   // Ok
/// validate_player_name("A")      // Err - too short
/// validate_player_name("<b>")    // Err - markup
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    match player_name_problem(name) {
        None => Ok(()),
        Some(problem) => {
            let mut err = ValidationError::new("player_name");
            err.message = Some(problem.into());
            Err(err)
        }
    }
}

/// Validates a six-character room code, ignoring case.
pub fn validate_room_id(id: &str) -> Result<(), ValidationError> {
    if id.chars().count() != ROOM_ID_LENGTH {
        let mut err = ValidationError::new("room_id_length");
        err.message = Some(format!("Room ID must be exactly 6 characters (got {})", id.len()).into());
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| ROOM_ID_ALPHABET.contains(c.to_ascii_uppercase()))
    {
        let mut err = ValidationError::new("room_id_format");
        err.message = Some("Room ID contains characters outside of the room code alphabet".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_name_valid() {
        assert!(validate_player_name("Alice").is_ok());
        assert!(validate_player_name("سارة").is_ok());
        assert!(validate_player_name("Player 2").is_ok());
        assert!(validate_player_name("  Bo  ").is_ok());
    }

    #[test]
    fn test_validate_player_name_invalid_length() {
        assert!(validate_player_name("A").is_err());
        assert!(validate_player_name("   ").is_err());
        assert!(validate_player_name("abcdefghijklmnopqrstu").is_err()); // 21 chars
    }

    #[test]
    fn test_validate_player_name_invalid_chars() {
        assert!(validate_player_name("<script>").is_err());
        assert!(validate_player_name("bob!").is_err());
        assert!(validate_player_name("a\tb").is_err());
    }

    #[test]
    fn test_validate_room_id() {
        assert!(validate_room_id("AB23CD").is_ok());
        assert!(validate_room_id("ab23cd").is_ok());
        assert!(validate_room_id("AB23C").is_err()); // too short
        assert!(validate_room_id("AB23C0").is_err()); // zero is excluded
        assert!(validate_room_id("AB23CI").is_err()); // I is excluded
    }
}
