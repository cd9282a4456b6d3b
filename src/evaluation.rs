//! Checkers Engine - Position Evaluation Module
//!
//! This module provides static evaluation of checkers positions considering:
//! - Material balance (men and kings)
//! - Advancement of men towards the promotion row
//! - Central control
//! - Back-row guard against enemy promotion
//!
//! Every term is computed per side and the result is the difference, so
//! swapping perspectives always negates the score.

use crate::board::{Board, Destination};
use crate::types::*;

// ============================================================================
// PIECE VALUES
// ============================================================================

pub const MAN_VALUE: i32 = 100;
pub const KING_VALUE: i32 = 300;

// ============================================================================
// POSITIONAL BONUSES
// ============================================================================

/// Per row a man has advanced from its own back row
const ADVANCEMENT_BONUS: i32 = 4;

/// Per step away from the nearest side edge, for any piece
const CENTER_BONUS: i32 = 3;

/// Men still guarding their own back row
const BACK_ROW_GUARD_BONUS: i32 = 10;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Distance to the nearest side edge (x = 0 or x = N-1)
#[inline]
fn edge_distance(coord: Coord, size: usize) -> i32 {
    coord.x.min(size - 1 - coord.x) as i32
}

/// Material plus positional score of one side's pieces
fn side_score(board: &Board, player: Player) -> i32 {
    let size = board.size();
    let mut score = 0;

    for (coord, piece) in board.pieces(player) {
        score += CENTER_BONUS * edge_distance(coord, size);

        match piece.rank {
            Rank::King => score += KING_VALUE,
            Rank::Man => {
                let advancement = player.advancement(coord.y, size);
                score += MAN_VALUE + ADVANCEMENT_BONUS * advancement as i32;
                if advancement == 0 {
                    score += BACK_ROW_GUARD_BONUS;
                }
            }
        }
    }

    score
}

// ============================================================================
// MAIN EVALUATION FUNCTION
// ============================================================================

/// Evaluate the position from `perspective`'s point of view (positive =
/// `perspective` is better)
pub fn evaluate(board: &Board, perspective: Player) -> i32 {
    side_score(board, perspective) - side_score(board, perspective.opponent())
}

/// Material-only balance, used by the console to report a position
pub fn material(board: &Board, perspective: Player) -> i32 {
    let value = |p: Player| {
        board.man_count(p) as i32 * MAN_VALUE + board.king_count(p) as i32 * KING_VALUE
    };
    value(perspective) - value(perspective.opponent())
}

/// Score a destination for move ordering (captures, promotions)
pub fn evaluate_move(board: &Board, source: Coord, destination: &Destination) -> i32 {
    let mut score = 0;

    for &captured in &destination.captured {
        score += match board.piece_at(captured) {
            Some(p) if p.is_king() => KING_VALUE,
            Some(_) => MAN_VALUE,
            None => 0,
        };
    }

    if let Some(piece) = board.piece_at(source) {
        if !piece.is_king() && destination.landing.y == piece.owner.promotion_row(board.size()) {
            score += KING_VALUE - MAN_VALUE;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;

    #[test]
    fn opening_is_balanced() {
        let board = Board::new(10, 4).unwrap();
        assert_eq!(evaluate(&board, Player::White), 0);
        assert_eq!(evaluate(&board, Player::Black), 0);
    }

    #[test]
    fn swapping_players_negates() {
        let mut board = Board::empty(GameConfig::with_size(8, 3)).unwrap();
        board.place(Coord::new(2, 3), Piece::man(Player::White)).unwrap();
        board.place(Coord::new(5, 6), Piece::king(Player::White)).unwrap();
        board.place(Coord::new(1, 6), Piece::man(Player::Black)).unwrap();

        let white = evaluate(&board, Player::White);
        assert!(white > 0);
        assert_eq!(evaluate(&board, Player::Black), -white);
        assert_eq!(material(&board, Player::White), KING_VALUE);
    }

    #[test]
    fn king_outweighs_man() {
        let mut a = Board::empty(GameConfig::with_size(8, 3)).unwrap();
        a.place(Coord::new(3, 4), Piece::king(Player::White)).unwrap();
        let mut b = Board::empty(GameConfig::with_size(8, 3)).unwrap();
        b.place(Coord::new(3, 4), Piece::man(Player::White)).unwrap();
        assert!(evaluate(&a, Player::White) > evaluate(&b, Player::White));
    }

    #[test]
    fn captures_and_promotions_order_first() {
        let mut board = Board::empty(GameConfig::with_size(8, 3)).unwrap();
        board.place(Coord::new(1, 6), Piece::man(Player::White)).unwrap();
        board.place(Coord::new(3, 4), Piece::king(Player::Black)).unwrap();

        let quiet = Destination::simple(Coord::new(2, 7));
        assert_eq!(evaluate_move(&board, Coord::new(1, 6), &quiet), KING_VALUE - MAN_VALUE);
        let capture = Destination::capture(Coord::new(2, 3), vec![Coord::new(3, 4)], vec![]);
        assert_eq!(evaluate_move(&board, Coord::new(4, 5), &capture), KING_VALUE);
    }
}
