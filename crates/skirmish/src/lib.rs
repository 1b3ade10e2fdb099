//! # Skirmish
//!
//! Real-time multiplayer grid game server over WebSockets.
//!
//! Clients connect with a `token` query parameter, get a fresh session id,
//! and exchange `{eventName, eventPayload}` JSON events: presence
//! (`join` / `disconnect`), direct messages, and moves on a shared grid
//! that survives restarts in a durable key-value store.
//!
//! ## Layers
//!
//! ```text
//! skirmish-transport   WebSocket accept/upgrade, framed send/recv
//! skirmish-protocol    wire envelope and typed events
//! skirmish-hub         presence registry and broadcast router (one task)
//! skirmish-game        grid rules, store, and game actor (one task)
//! skirmish             client actors, dispatcher, server (this crate)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use skirmish::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SkirmishError> {
//!     let server = SkirmishServer::<DevAuthenticator>::builder()
//!         .bind("0.0.0.0:8080")
//!         .build(DevAuthenticator, MemoryStore::new())
//!         .await?;
//!     server.run().await
//! }
//! ```

mod auth;
mod client;
mod config;
mod dispatch;
mod error;
mod server;

pub use auth::DevAuthenticator;
pub use client::ClientActor;
pub use config::ClientConfig;
pub use dispatch::Dispatcher;
pub use error::SkirmishError;
pub use server::{SkirmishServer, SkirmishServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{ClientConfig, DevAuthenticator, SkirmishError, SkirmishServer, SkirmishServerBuilder};
    pub use skirmish_game::{BoundsPolicy, FileStore, GameConfig, Grid, KeyValueStore, MemoryStore};
    pub use skirmish_hub::{Authenticator, HubConfig, HubError, Identity};
    pub use skirmish_protocol::{ServerEvent, SessionId, UserId};
}
