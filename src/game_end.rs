//! Checkers Engine - Game End Detection
//!
//! Decides after each applied move whether the game is over, and why.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::Board;
use crate::move_generator::{MovableEntries, MoveGenerator};
use crate::types::Player;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEndReason {
    /// Opponent has no pieces remaining
    OpponentNoPiecesRemaining,
    /// Opponent has pieces but none of them can move
    OpponentNoMovablePiecesRemaining,
    /// Too many consecutive king-only moves without a capture
    DrawTooManyKingOnlyMoves,
    /// A lone king on each side with nothing to capture
    DrawKingVsKing,
}

impl GameEndReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameEndReason::OpponentNoPiecesRemaining => "opponent has no pieces remaining",
            GameEndReason::OpponentNoMovablePiecesRemaining => "opponent has no movable pieces remaining",
            GameEndReason::DrawTooManyKingOnlyMoves => "too many king-only moves",
            GameEndReason::DrawKingVsKing => "king versus king",
        }
    }
}

impl fmt::Display for GameEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a game ended. `winner` is None for a draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEnd {
    pub winner: Option<Player>,
    pub reason: GameEndReason,
}

impl GameEnd {
    pub fn is_draw(&self) -> bool {
        self.winner.is_none()
    }
}

/// Check whether the game is over with the board's side to move next
pub fn check_game_end(board: &Board) -> Option<GameEnd> {
    check_game_end_for(board, board.to_move())
}

/// Check whether the game is over with `to_move` about to move
pub fn check_game_end_for(board: &Board, to_move: Player) -> Option<GameEnd> {
    let entries = MoveGenerator::new().movable_entries(board, to_move);
    check_with_entries(board, to_move, &entries)
}

/// Same as [`check_game_end_for`] when the movable entries of `to_move`
/// are already known
pub fn check_with_entries(board: &Board, to_move: Player, entries: &MovableEntries) -> Option<GameEnd> {
    // Priority 1: a side without pieces has lost
    for player in [to_move, to_move.opponent()] {
        if board.piece_count(player) == 0 {
            return Some(GameEnd {
                winner: Some(player.opponent()),
                reason: GameEndReason::OpponentNoPiecesRemaining,
            });
        }
    }

    // Priority 2: the side to move is blocked
    if entries.is_empty() {
        return Some(GameEnd {
            winner: Some(to_move.opponent()),
            reason: GameEndReason::OpponentNoMovablePiecesRemaining,
        });
    }

    let kings_only = [Player::White, Player::Black]
        .iter()
        .all(|&p| board.man_count(p) == 0);
    if !kings_only {
        return None;
    }

    // Priority 3: king-only shuffling
    if board.quiet_king_moves() >= board.config().king_only_move_limit {
        return Some(GameEnd {
            winner: None,
            reason: GameEndReason::DrawTooManyKingOnlyMoves,
        });
    }

    // Priority 4: lone king against lone king
    let lone_kings = board.king_count(Player::White) == 1 && board.king_count(Player::Black) == 1;
    if lone_kings {
        let gen = MoveGenerator::new();
        let capture_available = entries.values().flatten().any(|d| d.is_capture())
            || gen.has_capture(board, to_move.opponent());
        if !capture_available {
            return Some(GameEnd {
                winner: None,
                reason: GameEndReason::DrawKingVsKing,
            });
        }
    }

    None
}
