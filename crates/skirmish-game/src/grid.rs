//! The grid model: who stands where, and the rules for changing it.
//!
//! `GameState` is plain data plus pure operations. It knows nothing about
//! the store or about concurrency; the game actor loads it, calls one of
//! these methods, and saves it back.

use std::collections::{BTreeMap, HashSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use skirmish_protocol::{Position, SessionId, Step};

use crate::Grid;

/// Positions of every session placed on the grid.
///
/// Serialized form (the blob kept in the store):
///
/// ```json
/// { "locations": { "<session id>": { "x": 3, "y": 4 } } }
/// ```
///
/// A `BTreeMap` keeps the serialized order stable, which makes stored blobs
/// diff-friendly and listings deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    #[serde(default)]
    locations: BTreeMap<SessionId, Position>,
}

impl GameState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session's position, if it has joined the game.
    pub fn position(&self, session_id: &SessionId) -> Option<Position> {
        self.locations.get(session_id).copied()
    }

    pub fn contains(&self, session_id: &SessionId) -> bool {
        self.locations.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Iterates over `(session, position)` pairs in session-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&SessionId, Position)> {
        self.locations.iter().map(|(id, pos)| (id, *pos))
    }

    /// Picks a uniformly random free cell, or `None` if the grid is full.
    ///
    /// Cells are numbered `y * width + x`. Every index in
    /// `0..width * height` not taken by a placed session is a candidate.
    pub fn free_cell<R: Rng>(
        &self,
        grid: &Grid,
        rng: &mut R,
    ) -> Option<Position> {
        let occupied: HashSet<i64> = self
            .locations
            .values()
            .map(|p| i64::from(p.y) * i64::from(grid.width) + i64::from(p.x))
            .collect();

        let free: Vec<i64> = (0..grid.cell_count() as i64)
            .filter(|i| !occupied.contains(i))
            .collect();
        if free.is_empty() {
            return None;
        }

        let index = free[rng.random_range(0..free.len())];
        let width = i64::from(grid.width);
        Some(Position::new((index % width) as i32, (index / width) as i32))
    }

    /// Places a session on a random free cell.
    ///
    /// A session that is already placed keeps its position. Returns `None`
    /// only when the session is new and the grid is full.
    pub fn spawn<R: Rng>(
        &mut self,
        grid: &Grid,
        session_id: SessionId,
        rng: &mut R,
    ) -> Option<Position> {
        if let Some(existing) = self.position(&session_id) {
            return Some(existing);
        }
        let position = self.free_cell(grid, rng)?;
        self.locations.insert(session_id, position);
        Some(position)
    }

    /// Moves a session by `step`.
    ///
    /// Returns `None` if the session isn't on the grid. Otherwise returns
    /// its position afterwards: moved by exactly `step`, or unchanged if
    /// the target is out of bounds or held by another session.
    pub fn move_player(
        &mut self,
        grid: &Grid,
        session_id: &SessionId,
        step: Step,
    ) -> Option<Position> {
        let current = self.position(session_id)?;
        let target = current.offset(step);

        if !grid.allows(target.x, target.y) {
            return Some(current);
        }
        let blocked = self
            .locations
            .iter()
            .any(|(other, pos)| other != session_id && *pos == target);
        if blocked {
            return Some(current);
        }

        self.locations.insert(session_id.clone(), target);
        Some(target)
    }

    /// Takes a session off the grid, returning where it was.
    pub fn remove(&mut self, session_id: &SessionId) -> Option<Position> {
        self.locations.remove(session_id)
    }
}
