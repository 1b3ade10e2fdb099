//! Identity and coordinate types that appear inside events.
//!
//! These are newtype wrappers and plain structs with serde derives. The
//! JSON field names follow what the browser client reads (`clientId`,
//! `userId`, `userName`), so `rename_all = "camelCase"` is used throughout.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies one live connection.
///
/// A session id is generated fresh for every connection, so one logical
/// user who reconnects gets a new `SessionId` each time. It is distinct
/// from [`UserId`], which identifies the account behind the connection.
///
/// `#[serde(transparent)]` makes it serialize as a bare string.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generates a new random session id (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing string. Used when the id comes off the wire
    /// (e.g. the target of a chat message) or out of the store.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The logical user behind a session, as verified by the authenticator.
///
/// `UserId(0)` doubles as the "nobody" identity used when a session id
/// can't be resolved to a connected client.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// A presence-list entry: which user is behind which session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub client_id: SessionId,
    pub user_id: UserId,
    pub user_name: String,
}

impl UserSummary {
    /// The zero-valued identity for a session id nobody is connected as.
    pub fn unknown(client_id: SessionId) -> Self {
        Self {
            client_id,
            user_id: UserId::default(),
            user_name: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Grid coordinates
// ---------------------------------------------------------------------------

/// A cell on the game grid. `(0, 0)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the position shifted by `step`. No bounds checking here;
    /// that's the grid's job.
    pub fn offset(self, step: Step) -> Self {
        Self {
            x: self.x + step.x,
            y: self.y + step.y,
        }
    }
}

/// A validated movement request. Each axis is one of `-1`, `0`, `1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Step {
    pub x: i32,
    pub y: i32,
}

/// A session's identity together with its place on the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserLocation {
    pub user: UserSummary,
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&SessionId::new("s-1")).unwrap();
        assert_eq!(json, "\"s-1\"");
    }

    #[test]
    fn test_session_id_generate_is_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        // Hyphenated UUID: 8-4-4-4-12.
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_user_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&UserId(42)).unwrap();
        assert_eq!(json, "42");
    }

    #[test]
    fn test_user_id_display() {
        assert_eq!(UserId(7).to_string(), "U-7");
    }

    #[test]
    fn test_user_summary_uses_camel_case_fields() {
        let summary = UserSummary {
            client_id: SessionId::new("abc"),
            user_id: UserId(3),
            user_name: "ann".into(),
        };
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["clientId"], "abc");
        assert_eq!(json["userId"], 3);
        assert_eq!(json["userName"], "ann");
    }

    #[test]
    fn test_user_summary_unknown_is_zero_valued() {
        let summary = UserSummary::unknown(SessionId::new("ghost"));
        assert_eq!(summary.user_id, UserId(0));
        assert!(summary.user_name.is_empty());
        assert_eq!(summary.client_id.as_str(), "ghost");
    }

    #[test]
    fn test_position_offset_applies_both_axes() {
        let moved = Position::new(3, 3).offset(Step { x: -1, y: 1 });
        assert_eq!(moved, Position::new(2, 4));
    }
}
