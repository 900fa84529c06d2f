//! Nine Men's Morris ("Mill") rules engine with a heuristic AI opponent.
//!
//! # Board Layout
//!
//! ```text
//! 24 positions on three concentric rings of 8 nodes each.
//! Ring r (0 = outer, 1 = middle, 2 = inner), index i (0-7):
//!
//!   id = 8 * r + i
//!
//!   outer:   0  1  2  3  4  5  6  7
//!   middle:  8  9 10 11 12 13 14 15
//!   inner:  16 17 18 19 20 21 22 23
//!
//! Every node links to its two ring neighbours. Even indices (0, 2, 4, 6)
//! are spokes and also link radially to the same index on the adjacent
//! ring(s), so the middle ring's spoke nodes have four neighbours.
//! ```
//!
//! # Mill Lines
//!
//! ```text
//! Per ring (offset 8 * r): {0,1,2} {2,3,4} {4,5,6} {6,7,0}
//! Spokes:                  {0,8,16} {2,10,18} {4,12,20} {6,14,22}
//! ```
//!
//! # Structure
//!
//! - [`Board`]: fixed topology, mill lines, and mutable occupancy.
//! - [`Game`]: turn order, per-player derived [`Phase`], the must-remove
//!   sub-state, win detection, and the command surface.
//! - [`AiPlayer`]: one-ply heuristic move selection for placement, movement,
//!   flying, and forced removal.

pub mod ai;
pub mod board;
pub mod error;
pub mod game;

#[cfg(feature = "wasm")]
pub mod wasm;

use serde::{Deserialize, Serialize};

pub use crate::ai::{AiPlayer, TieBreak};
pub use crate::board::{Board, MillLine, Node, Trial};
pub use crate::error::{MillError, MillResult};
pub use crate::game::{
    Action, Game, GameMode, Outcome, Phase, PlayerState, Snapshot, StateChange,
};

// ============================================================================
// RULE CONSTANTS
// ============================================================================

/// Number of positions on the board.
pub const NUM_POSITIONS: usize = 24;

/// Number of nodes on each ring.
pub const RING_SIZE: u8 = 8;

/// Number of rings.
pub const NUM_RINGS: u8 = 3;

/// Pieces each player starts with.
pub const PIECES_PER_PLAYER: u8 = 9;

/// A player with this many pieces or fewer (after placement) may fly.
pub const FLYING_THRESHOLD: u8 = 3;

/// A player with fewer pieces than this has lost.
pub const LOSING_THRESHOLD: u8 = 3;

// ============================================================================
// PLAYER & POSITION
// ============================================================================

/// Player identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    One = 1,
    Two = 2,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Convert from u8 (1 or 2) to Player.
    #[inline]
    pub fn from_bits(bits: u8) -> Option<Player> {
        match bits {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }

    /// Zero-based index for per-player arrays.
    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }
}

/// Position on the board (0-23).
///
/// `Pos(id)` does not validate; use [`Pos::new`] at API boundaries.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
pub struct Pos(pub u8);

impl Pos {
    /// Validate a raw position id.
    #[inline]
    pub fn new(id: u8) -> MillResult<Pos> {
        let pos = Pos(id);
        if pos.is_valid() {
            Ok(pos)
        } else {
            Err(MillError::InvalidPosition(id))
        }
    }

    /// Create a position from ring (0-2) and index within the ring (0-7).
    #[inline]
    pub fn from_ring_index(ring: u8, index: u8) -> Pos {
        debug_assert!(ring < NUM_RINGS && index < RING_SIZE);
        Pos(ring * RING_SIZE + index)
    }

    /// Ring (0 = outer, 1 = middle, 2 = inner).
    #[inline]
    pub fn ring(self) -> u8 {
        self.0 / RING_SIZE
    }

    /// Index within the ring (0-7).
    #[inline]
    pub fn index(self) -> u8 {
        self.0 % RING_SIZE
    }

    /// Whether this node lies on one of the four radial spokes.
    #[inline]
    pub fn is_spoke(self) -> bool {
        self.index() % 2 == 0
    }

    /// Check if this is a valid position (0-23).
    #[inline]
    pub fn is_valid(self) -> bool {
        (self.0 as usize) < NUM_POSITIONS
    }

    /// Iterate over all 24 positions.
    pub fn all() -> impl Iterator<Item = Pos> {
        (0..NUM_POSITIONS as u8).map(Pos)
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
