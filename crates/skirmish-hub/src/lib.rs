//! Presence and message routing for Skirmish.
//!
//! This crate knows who is connected and how to reach them:
//!
//! 1. **Authentication**: turning a connect token into an [`Identity`]
//!    ([`Authenticator`] trait)
//! 2. **Presence**: the registry of online sessions, at most one per user
//!    ([`Registry`])
//! 3. **Routing**: unicast, broadcast, and broadcast-except delivery into
//!    each session's bounded queue, evicting sessions that fall behind
//!
//! All of it runs inside one hub task reached through a [`HubHandle`], so
//! presence changes and routed events are observed in one global order.
//!
//! ```text
//! Client actors (above)  ← register, unregister, route events
//!     ↕
//! Hub (this crate)       ← one task, owns the registry
//!     ↕
//! Game actor (beside)    ← asked to drop a session's position on unregister
//! ```

mod auth;
mod client;
mod error;
mod hub;
mod registry;

pub use auth::{Authenticator, Identity};
pub use client::{ClientHandle, PresenceKind};
pub use error::HubError;
pub use hub::{HubConfig, HubHandle};
pub use registry::{Delivery, Registry};
