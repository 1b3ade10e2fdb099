//! Grid dimensions and game actor configuration.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// BoundsPolicy
// ---------------------------------------------------------------------------

/// How [`GameState::move_player`](crate::GameState::move_player) checks the
/// upper edge of the grid.
///
/// ```text
///           0 1 2 ... W-1 | W
/// Legacy:   ✓ ✓ ✓ ...  ✓  | ✓   (x > W rejected)
/// Strict:   ✓ ✓ ✓ ...  ✓  | ✗   (x >= W rejected)
/// ```
///
/// `Legacy` keeps the behaviour deployed clients have always seen, where a
/// player can step one column (or row) past the last cell. `Strict` keeps
/// every position inside the `W × H` grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BoundsPolicy {
    #[default]
    Legacy,
    Strict,
}

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// The playing field's shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    #[serde(default)]
    pub bounds: BoundsPolicy,
}

impl Grid {
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            bounds: BoundsPolicy::Legacy,
        }
    }

    /// Switches to the given bounds policy.
    pub fn with_bounds(mut self, bounds: BoundsPolicy) -> Self {
        self.bounds = bounds;
        self
    }

    /// Number of cells spawn can choose from.
    pub fn cell_count(&self) -> usize {
        (self.width.max(0) as usize) * (self.height.max(0) as usize)
    }

    /// Whether a move may land on `(x, y)`, per the bounds policy.
    pub fn allows(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        match self.bounds {
            BoundsPolicy::Legacy => x <= self.width && y <= self.height,
            BoundsPolicy::Strict => x < self.width && y < self.height,
        }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(9, 9)
    }
}

// ---------------------------------------------------------------------------
// GameConfig
// ---------------------------------------------------------------------------

/// Configuration for the game actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Grid shape and bounds policy.
    pub grid: Grid,

    /// Store key holding the serialized grid.
    pub state_key: String,

    /// Clear the stored grid when the actor starts.
    ///
    /// Session ids don't survive a restart, so positions left over from a
    /// previous process belong to nobody and block their cells.
    pub reset_on_start: bool,

    /// Capacity of the actor's command channel.
    pub channel_size: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid: Grid::default(),
            state_key: "game".to_string(),
            reset_on_start: false,
            channel_size: 64,
        }
    }
}
