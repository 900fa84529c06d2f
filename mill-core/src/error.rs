//! Error types for the mill engine.
//!
//! Rule violations (occupied targets, protected mill pieces, wrong phase) are
//! not errors: commands report them as [`crate::Outcome::Ignored`]. Errors are
//! reserved for caller bugs.

use crate::{Player, Pos};

/// Errors that can occur when driving the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MillError {
    /// A position id outside 0-23 reached a command.
    #[error("invalid position id {0} (expected 0-23)")]
    InvalidPosition(u8),

    /// A mutating command was issued after the game ended without a reset.
    #[error("game is over (winner: {winner:?}); reset before issuing commands")]
    GameOver { winner: Option<Player> },

    /// A node lists a neighbour that does not list it back.
    #[error("one-way connection {from} -> {to}")]
    OneWayConnection { from: Pos, to: Pos },

    /// A node lists a neighbour id that does not exist.
    #[error("connection {from} -> {to} points outside the board")]
    DanglingConnection { from: Pos, to: Pos },
}

/// Result type alias for engine operations.
pub type MillResult<T> = Result<T, MillError>;
