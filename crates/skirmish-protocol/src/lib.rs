//! Wire protocol for Skirmish.
//!
//! This crate defines the "language" that browser clients and the session
//! layer speak:
//!
//! - **Types** ([`SessionId`], [`UserId`], [`Position`], [`UserSummary`]):
//!   the identities and coordinates that appear inside events.
//! - **Events** ([`Event`], [`ClientEvent`], [`ServerEvent`]): the wire
//!   envelope and the typed variants decoded from / encoded into it.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding/validation.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw frames) and the hub
//! (who is connected). It doesn't know about connections or the grid;
//! it only knows how to serialize, deserialize, and validate events.
//!
//! ```text
//! Transport (frames) → Protocol (Event → ClientEvent) → Dispatcher
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use events::{
    ClientEvent, Event, GameStatePayload, JoinGamePayload, MessageRequest,
    MessageResponsePayload, MovePayload, PresencePayload, RejectedPayload,
    ServerEvent,
};
pub use types::{Position, SessionId, Step, UserId, UserLocation, UserSummary};
