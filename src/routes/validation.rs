use crate::constants::{ERR_INVALID_WINDOW, MAX_USER_ID_CHARS};
use crate::error::{AppError, Result};
use crate::ledger::stats::Window;

/// Validate a user id supplied by the identity subsystem
///
/// Ids are opaque handles: 1-64 characters of letters, digits, '-' or '_'.
pub fn validate_user_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_USER_ID_CHARS
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Build an aggregation window from optional unix-second bounds, falling
/// back to `default` (the current calendar month) when neither is given
pub fn resolve_window(from: Option<i64>, to: Option<i64>, default: Window) -> Result<Window> {
    let window = match (from, to) {
        (None, None) => default,
        (f, t) => Window {
            from: f.unwrap_or(default.from),
            to: t.unwrap_or(default.to),
        },
    };

    if window.from >= window.to {
        return Err(AppError::InvalidInput(ERR_INVALID_WINDOW.to_string()));
    }

    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("alice"));
        assert!(validate_user_id("u-123_x"));
        assert!(validate_user_id(&"a".repeat(64)));

        assert!(!validate_user_id(""));
        assert!(!validate_user_id(&"a".repeat(65)));
        assert!(!validate_user_id("no spaces"));
        assert!(!validate_user_id("email@example.com"));
    }

    #[test]
    fn test_resolve_window() {
        let default = Window { from: 100, to: 200 };

        assert_eq!(resolve_window(None, None, default).unwrap(), default);
        assert_eq!(
            resolve_window(Some(50), Some(150), default).unwrap(),
            Window { from: 50, to: 150 }
        );
        assert_eq!(
            resolve_window(Some(50), None, default).unwrap(),
            Window { from: 50, to: 200 }
        );

        assert!(resolve_window(Some(150), Some(150), default).is_err());
        assert!(resolve_window(Some(300), None, default).is_err());
    }
}
