//! The wire envelope and the typed events carried inside it.
//!
//! Every frame on the wire, in both directions, is one JSON object:
//!
//! ```text
//! { "eventName": "move", "eventPayload": { "x": 1, "y": 0 } }
//! ```
//!
//! Inbound frames are decoded in two steps:
//!
//! 1. bytes → [`Event`]. Failure here means the frame is garbage; the
//!    connection is dropped.
//! 2. [`Event`] → [`ClientEvent`] via `TryFrom`. Failure here means the
//!    event name is unknown or the payload has the wrong shape; the event
//!    is dropped but the connection survives.
//!
//! Outbound events are built as [`ServerEvent`] values and serialized
//! straight into the same envelope shape thanks to serde's adjacent
//! tagging.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{ProtocolError, SessionId, Step, UserId, UserLocation, UserSummary};

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The raw wire envelope, before the payload is interpreted.
///
/// `eventPayload` is kept as an untyped [`Value`] here on purpose: the
/// event name decides which typed shape it must have, and that decision is
/// made in [`ClientEvent::try_from`]. A missing payload decodes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub event_name: String,
    #[serde(default)]
    pub event_payload: Value,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// An event a client may send, after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// Ask for the presence list to be re-broadcast as a `join`.
    Join,
    /// Ask for the presence list to be re-broadcast as a `disconnect`.
    Disconnect,
    /// Ask to be placed on the grid.
    JoinGame,
    /// A chat message for one other session.
    Message(MessageRequest),
    /// A one-cell step on the grid.
    Move(Step),
}

/// Payload of an inbound `message` event.
///
/// `userID` is, despite its name, the *session* id of the recipient:
/// that's the identifier clients see in the presence list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MessageRequest {
    pub message: String,
    #[serde(rename = "userID")]
    pub target: SessionId,
}

/// Payload for events that carry no data. Rejects stray fields.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EmptyPayload {}

/// Raw `move` payload; numbers are range-checked after parsing.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MovePayloadIn {
    x: f64,
    y: f64,
}

impl MovePayloadIn {
    /// Each axis must lie in `[-1, 1]`. Fractions are truncated toward
    /// zero, so `0.5` becomes no movement on that axis.
    fn into_step(self) -> Result<Step, String> {
        let axis = |name: &str, v: f64| {
            if (-1.0..=1.0).contains(&v) {
                Ok(v.trunc() as i32)
            } else {
                Err(format!("`{name}` must be between -1 and 1, got {v}"))
            }
        };
        Ok(Step {
            x: axis("x", self.x)?,
            y: axis("y", self.y)?,
        })
    }
}

impl TryFrom<Event> for ClientEvent {
    type Error = ProtocolError;

    fn try_from(event: Event) -> Result<Self, Self::Error> {
        let name = event.event_name;
        // A `null` payload is the same as an empty object.
        let payload = match event.event_payload {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        match name.as_str() {
            "join" => parse::<EmptyPayload>(&name, payload).map(|_| Self::Join),
            "disconnect" => {
                parse::<EmptyPayload>(&name, payload).map(|_| Self::Disconnect)
            }
            "joinGame" => {
                parse::<EmptyPayload>(&name, payload).map(|_| Self::JoinGame)
            }
            "message" => parse(&name, payload).map(Self::Message),
            "move" => {
                let raw: MovePayloadIn = parse(&name, payload)?;
                raw.into_step().map(Self::Move).map_err(|reason| {
                    ProtocolError::InvalidPayload {
                        event: name.clone(),
                        reason,
                    }
                })
            }
            _ => Err(ProtocolError::UnknownEvent(name.clone())),
        }
    }
}

fn parse<T: DeserializeOwned>(event: &str, payload: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(payload).map_err(|e| ProtocolError::InvalidPayload {
        event: event.to_string(),
        reason: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// An event the server sends to clients.
///
/// `#[serde(tag = "eventName", content = "eventPayload")]` produces exactly
/// the wire envelope:
///   `{ "eventName": "gameState", "eventPayload": { "connected": [...] } }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventName", content = "eventPayload", rename_all = "camelCase")]
pub enum ServerEvent {
    /// A session came online (or presence was re-announced).
    Join(PresencePayload),
    /// A session went offline (or presence was re-announced).
    Disconnect(PresencePayload),
    /// Sessions were placed on or removed from the grid.
    JoinGame(JoinGamePayload),
    /// The full grid, sent to a session that just joined the game.
    GameState(GameStatePayload),
    /// A chat message delivered to its recipient.
    #[serde(rename = "message response")]
    MessageResponse(MessageResponsePayload),
    /// A session's new position after a move request.
    Move(MovePayload),
    /// The connection was refused (duplicate session or failed auth).
    Rejected(RejectedPayload),
}

impl ServerEvent {
    /// The wire name of this event, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Join(_) => "join",
            Self::Disconnect(_) => "disconnect",
            Self::JoinGame(_) => "joinGame",
            Self::GameState(_) => "gameState",
            Self::MessageResponse(_) => "message response",
            Self::Move(_) => "move",
            Self::Rejected(_) => "rejected",
        }
    }
}

/// Payload of `join` / `disconnect`: who acted, and who's online now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresencePayload {
    pub client_id: SessionId,
    pub users: Vec<UserSummary>,
}

/// Payload of `joinGame`: grid arrivals and departures.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JoinGamePayload {
    pub joining: Vec<UserLocation>,
    pub disconnecting: Vec<UserLocation>,
}

/// Payload of `gameState`: every placed session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatePayload {
    pub connected: Vec<UserLocation>,
}

/// Payload of `message response`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponsePayload {
    /// User id of the recipient, or 0 if the session id didn't resolve.
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub message: String,
    /// Session id of the recipient.
    #[serde(rename = "clientID")]
    pub client_id: SessionId,
    /// User id of the sender.
    #[serde(rename = "fromID")]
    pub from_id: UserId,
    /// Session id of the sender, so the recipient can reply.
    #[serde(rename = "fromClientID")]
    pub from_client_id: SessionId,
}

/// Payload of `move`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    pub x: i32,
    pub y: i32,
    pub client_id: SessionId,
    pub user_name: String,
}

/// Payload of `rejected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedPayload {
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Position;

    fn event(value: Value) -> Event {
        serde_json::from_value(value).unwrap()
    }

    // =====================================================================
    // Inbound validation
    // =====================================================================

    #[test]
    fn test_try_from_message_valid() {
        let parsed = ClientEvent::try_from(event(json!({
            "eventName": "message",
            "eventPayload": {"message": "hi", "userID": "X"}
        })))
        .unwrap();

        assert_eq!(
            parsed,
            ClientEvent::Message(MessageRequest {
                message: "hi".into(),
                target: SessionId::new("X"),
            })
        );
    }

    #[test]
    fn test_try_from_message_missing_target_is_invalid() {
        let result = ClientEvent::try_from(event(json!({
            "eventName": "message",
            "eventPayload": {"message": "hi"}
        })));
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_try_from_message_numeric_target_is_invalid() {
        // The browser client sends session ids as strings; a number is a
        // schema violation, not something to coerce.
        let result = ClientEvent::try_from(event(json!({
            "eventName": "message",
            "eventPayload": {"message": "hi", "userID": 5}
        })));
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_try_from_message_unknown_field_is_invalid() {
        let result = ClientEvent::try_from(event(json!({
            "eventName": "message",
            "eventPayload": {"message": "hi", "userID": "X", "admin": true}
        })));
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_try_from_move_valid_step() {
        let parsed = ClientEvent::try_from(event(json!({
            "eventName": "move",
            "eventPayload": {"x": -1, "y": 0}
        })))
        .unwrap();
        assert_eq!(parsed, ClientEvent::Move(Step { x: -1, y: 0 }));
    }

    #[test]
    fn test_try_from_move_fraction_truncates_toward_zero() {
        let parsed = ClientEvent::try_from(event(json!({
            "eventName": "move",
            "eventPayload": {"x": 0.9, "y": -0.5}
        })))
        .unwrap();
        assert_eq!(parsed, ClientEvent::Move(Step { x: 0, y: 0 }));
    }

    #[test]
    fn test_try_from_move_out_of_range_is_invalid() {
        let result = ClientEvent::try_from(event(json!({
            "eventName": "move",
            "eventPayload": {"x": 2, "y": 0}
        })));
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_try_from_move_missing_axis_is_invalid() {
        let result = ClientEvent::try_from(event(json!({
            "eventName": "move",
            "eventPayload": {"x": 1}
        })));
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_try_from_move_string_axis_is_invalid() {
        let result = ClientEvent::try_from(event(json!({
            "eventName": "move",
            "eventPayload": {"x": "1", "y": 0}
        })));
        assert!(matches!(result, Err(ProtocolError::InvalidPayload { .. })));
    }

    #[test]
    fn test_try_from_join_game_accepts_empty_or_missing_payload() {
        let with_empty = ClientEvent::try_from(event(json!({
            "eventName": "joinGame",
            "eventPayload": {}
        })))
        .unwrap();
        let without = ClientEvent::try_from(event(json!({
            "eventName": "joinGame"
        })))
        .unwrap();

        assert_eq!(with_empty, ClientEvent::JoinGame);
        assert_eq!(without, ClientEvent::JoinGame);
    }

    #[test]
    fn test_try_from_unknown_name_is_unknown_event() {
        let result = ClientEvent::try_from(event(json!({
            "eventName": "teleport",
            "eventPayload": {}
        })));
        assert!(matches!(result, Err(ProtocolError::UnknownEvent(n)) if n == "teleport"));
    }

    #[test]
    fn test_try_from_server_only_name_is_unknown_event() {
        // Clients can't forge a gameState.
        let result = ClientEvent::try_from(event(json!({
            "eventName": "gameState",
            "eventPayload": {"connected": []}
        })));
        assert!(matches!(result, Err(ProtocolError::UnknownEvent(_))));
    }

    // =====================================================================
    // Outbound shapes
    // =====================================================================

    #[test]
    fn test_server_event_message_response_json_format() {
        let event = ServerEvent::MessageResponse(MessageResponsePayload {
            user_id: UserId(2),
            message: "hi".into(),
            client_id: SessionId::new("X"),
            from_id: UserId(1),
            from_client_id: SessionId::new("A"),
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventName"], "message response");
        assert_eq!(json["eventPayload"]["userID"], 2);
        assert_eq!(json["eventPayload"]["message"], "hi");
        assert_eq!(json["eventPayload"]["clientID"], "X");
        assert_eq!(json["eventPayload"]["fromID"], 1);
        assert_eq!(json["eventPayload"]["fromClientID"], "A");
    }

    #[test]
    fn test_server_event_move_json_format() {
        let event = ServerEvent::Move(MovePayload {
            x: 4,
            y: 5,
            client_id: SessionId::new("A"),
            user_name: "ann".into(),
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventName"], "move");
        assert_eq!(
            json["eventPayload"],
            json!({"x": 4, "y": 5, "clientId": "A", "userName": "ann"})
        );
    }

    #[test]
    fn test_server_event_join_game_json_format() {
        let location = UserLocation {
            user: UserSummary {
                client_id: SessionId::new("A"),
                user_id: UserId(1),
                user_name: "ann".into(),
            },
            position: Position::new(3, 3),
        };
        let event = ServerEvent::JoinGame(JoinGamePayload {
            joining: vec![location],
            disconnecting: vec![],
        });
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["eventName"], "joinGame");
        assert_eq!(json["eventPayload"]["joining"][0]["user"]["clientId"], "A");
        assert_eq!(json["eventPayload"]["joining"][0]["position"], json!({"x": 3, "y": 3}));
        assert_eq!(json["eventPayload"]["disconnecting"], json!([]));
    }

    #[test]
    fn test_server_event_name_matches_wire_tag() {
        let event = ServerEvent::GameState(GameStatePayload { connected: vec![] });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventName"], event.name());
    }
}
