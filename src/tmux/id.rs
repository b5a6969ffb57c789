//! Session, window and pane ids
//!
//! tmux names entities with a sigil followed by a decimal number: `$3` is a
//! session, `@12` a window, `%7` a pane. `*` in place of the number means
//! "unknown or all".

use tracing::debug;

use crate::error::{Error, Result};

/// Id used for `$*`, `@*` and `%*`
pub const UNKNOWN_ID: i32 = -1;

/// Id recorded when a token could not be parsed
pub const INVALID_ID: i32 = -2;

/// Which entity an id names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Session,
    Window,
    Pane,
}

impl IdKind {
    pub fn sigil(self) -> char {
        match self {
            IdKind::Session => '$',
            IdKind::Window => '@',
            IdKind::Pane => '%',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IdKind::Session => "session",
            IdKind::Window => "window",
            IdKind::Pane => "pane",
        }
    }
}

/// Parse an id token such as `@12` or `%*`
pub fn parse_id(kind: IdKind, token: &str) -> Result<i32> {
    let invalid = || Error::TmuxId {
        kind: kind.name(),
        token: token.to_string(),
    };
    let digits = token.strip_prefix(kind.sigil()).ok_or_else(invalid)?;
    if digits == "*" {
        return Ok(UNKNOWN_ID);
    }
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    digits.parse::<i32>().map_err(|_| invalid())
}

/// Parse an id token, logging and substituting [`INVALID_ID`] on failure
pub fn parse_id_lossy(kind: IdKind, token: &str, context: &str) -> i32 {
    match parse_id(kind, token) {
        Ok(id) => id,
        Err(err) => {
            debug!(%err, context, "malformed tmux id");
            INVALID_ID
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(IdKind::Session, "$3").unwrap(), 3);
        assert_eq!(parse_id(IdKind::Window, "@120").unwrap(), 120);
        assert_eq!(parse_id(IdKind::Pane, "%0").unwrap(), 0);
    }

    #[test]
    fn test_parse_id_unknown() {
        assert_eq!(parse_id(IdKind::Pane, "%*").unwrap(), UNKNOWN_ID);
    }

    #[test]
    fn test_parse_id_malformed() {
        assert!(parse_id(IdKind::Window, "$3").is_err());
        assert!(parse_id(IdKind::Window, "@").is_err());
        assert!(parse_id(IdKind::Window, "@1x").is_err());
        assert!(parse_id(IdKind::Window, "@-1").is_err());
        assert!(parse_id(IdKind::Window, "@99999999999").is_err());
        assert_eq!(parse_id_lossy(IdKind::Pane, "pane", "test"), INVALID_ID);
    }
}
