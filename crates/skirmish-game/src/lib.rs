//! Shared game state for Skirmish.
//!
//! The grid of player positions lives in a durable key-value store. Every
//! mutation reads the stored blob, applies the change in memory, and writes
//! it back. All of those read-modify-write cycles go through one actor task
//! per grid, so two connections moving at the same instant can't overwrite
//! each other's result.
//!
//! # Key types
//!
//! - [`GameState`]: the grid model (spawn, move, remove, serialization)
//! - [`KeyValueStore`]: the durable store seam ([`MemoryStore`], [`FileStore`])
//! - [`GameHandle`]: send commands to the running game actor
//! - [`GameConfig`] / [`Grid`]: grid size, bounds policy, store key

mod actor;
mod config;
mod error;
mod grid;
mod store;

pub use actor::{GameHandle, JoinOutcome};
pub use config::{BoundsPolicy, GameConfig, Grid};
pub use error::{GameError, StoreError};
pub use grid::GameState;
pub use store::{FileStore, KeyValueStore, MemoryStore};
