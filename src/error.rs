//! Error types for the checkers engine
//!
//! Every failure is a caller error surfaced synchronously; nothing here is
//! retried internally.

use thiserror::Error;

use crate::types::{Coord, Player};

/// Errors that can occur in the rules engine and search
#[derive(Error, Debug)]
pub enum CheckersError {
    /// Coordinate outside [0, N)
    #[error("coordinates ({x}, {y}) out of bounds for board with size {size}")]
    OutOfBounds { x: usize, y: usize, size: usize },

    /// Piece placed on a light square
    #[error("cell {coord} is not a playable square")]
    NotPlayable { coord: Coord },

    /// Rejected configuration (overlapping player zones, bad depth, ...)
    #[error("illegal configuration: {message}")]
    IllegalConfiguration { message: String },

    /// Destination that cannot have come from the move generator
    #[error("illegal move from {from} to {to}: {reason}")]
    IllegalMove { from: Coord, to: Coord, reason: String },

    /// Search requested for a player without a legal move
    #[error("player {player} has no legal moves")]
    NoLegalMoves { player: Player },

    /// A background search is still outstanding
    #[error("a search is already in progress")]
    SearchPending,

    /// The search thread could not be started
    #[error("cannot start search thread: {0}")]
    Spawn(#[from] std::io::Error),

    /// The search thread ended without reporting
    #[error("search thread ended without a result")]
    SearchAborted,

    /// Persisted state could not be decoded
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl CheckersError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        CheckersError::IllegalConfiguration { message: message.into() }
    }

    pub(crate) fn illegal_move(from: Coord, to: Coord, reason: impl Into<String>) -> Self {
        CheckersError::IllegalMove { from, to, reason: reason.into() }
    }
}

/// Result type alias for checkers engine operations
pub type CheckersResult<T> = Result<T, CheckersError>;
