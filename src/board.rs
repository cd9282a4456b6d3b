//! Checkers Engine - Board Representation Module
//!
//! This module provides the core data structures for representing a
//! checkers board and the destinations pieces can reach. The board is a
//! pure state container: it owns cell occupancy, applies destinations
//! handed to it and promotes men, but never decides legality itself.

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::error::{CheckersError, CheckersResult};
use crate::types::*;

/// Candidate end-state for a piece leaving a source cell
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    /// Final landing cell
    pub landing: Coord,
    /// Opponent cells jumped, in jump order
    pub captured: Vec<Coord>,
    /// Intermediate landing cells of a capture chain (final landing excluded)
    pub path: Vec<Coord>,
}

impl Destination {
    /// A non-capturing move
    pub fn simple(landing: Coord) -> Self {
        Destination { landing, captured: Vec::new(), path: Vec::new() }
    }

    /// Chain of captures ending on `landing`
    pub fn capture(landing: Coord, captured: Vec<Coord>, path: Vec<Coord>) -> Self {
        Destination { landing, captured, path }
    }

    #[inline]
    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }

    #[inline]
    pub fn capture_count(&self) -> usize {
        self.captured.len()
    }

    /// Notation used by the text protocol: `c3-d4` or `c3xe5`
    pub fn notation(&self, source: Coord) -> String {
        let sep = if self.is_capture() { 'x' } else { '-' };
        format!("{}{}{}", square_name(source), sep, square_name(self.landing))
    }
}

/// Record of an applied move, returned by [`Board::apply`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvent {
    pub mover: Player,
    pub source: Coord,
    pub landing: Coord,
    pub path: Vec<Coord>,
    pub captured: Vec<Coord>,
    pub promoted: bool,
}

impl MoveEvent {
    /// True for the source == landing revert of an aborted drag
    pub fn is_noop(&self) -> bool {
        self.source == self.landing
    }
}

/// A single square of the board
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub coord: Coord,
    pub piece: Option<Piece>,
}

impl Cell {
    #[inline]
    pub fn owner(&self) -> Option<Player> {
        self.piece.map(|p| p.owner)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.piece.is_none()
    }

    #[inline]
    pub fn is_playable(&self) -> bool {
        self.coord.is_playable()
    }
}

/// Checkers board representation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    config: GameConfig,
    /// N*N cells indexed by y*N+x
    cells: Vec<Cell>,
    to_move: Player,
    /// Consecutive plies made by a king without capturing
    quiet_king_moves: u32,
}

impl Board {
    /// Create a board of the given geometry with default rules
    pub fn new(size: usize, player_rows: usize) -> CheckersResult<Self> {
        Board::from_config(GameConfig::with_size(size, player_rows))
    }

    /// Create a board in the starting layout for a configuration
    pub fn from_config(config: GameConfig) -> CheckersResult<Self> {
        config.validate()?;
        Ok(Board::layout(config, true))
    }

    /// Create a board with no pieces, for setting up positions
    pub fn empty(config: GameConfig) -> CheckersResult<Self> {
        config.validate()?;
        Ok(Board::layout(config, false))
    }

    /// Build cells for an already validated configuration
    fn layout(config: GameConfig, populate: bool) -> Self {
        let size = config.size;
        let rows = config.player_rows;
        let cells = (0..size * size)
            .map(|i| {
                let coord = Coord::new(i % size, i / size);
                let piece = if !populate || !coord.is_playable() {
                    None
                } else if coord.y < rows {
                    Some(Piece::man(Player::White))
                } else if coord.y >= size - rows {
                    Some(Piece::man(Player::Black))
                } else {
                    None
                };
                Cell { coord, piece }
            })
            .collect();

        Board {
            config,
            cells,
            to_move: Player::White,
            quiet_king_moves: 0,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.config.size
    }

    #[inline]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Side expected to move next
    #[inline]
    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn set_to_move(&mut self, player: Player) {
        self.to_move = player;
    }

    #[inline]
    pub fn quiet_king_moves(&self) -> u32 {
        self.quiet_king_moves
    }

    fn check_bounds(&self, x: usize, y: usize) -> CheckersResult<Coord> {
        let size = self.size();
        if x >= size || y >= size {
            return Err(CheckersError::OutOfBounds { x, y, size });
        }
        Ok(Coord::new(x, y))
    }

    /// Cell at the coordinate
    pub fn cell_at(&self, x: usize, y: usize) -> CheckersResult<&Cell> {
        let coord = self.check_bounds(x, y)?;
        Ok(&self.cells[coord.index(self.size())])
    }

    /// Piece at the coordinate, None when empty or off the board
    #[inline]
    pub fn piece_at(&self, coord: Coord) -> Option<Piece> {
        if coord.x >= self.size() || coord.y >= self.size() {
            return None;
        }
        self.cells[coord.index(self.size())].piece
    }

    /// All cells in row-major order
    pub fn iter(&self) -> std::slice::Iter<'_, Cell> {
        self.cells.iter()
    }

    /// Occupied cells of one player in row-major order
    pub fn pieces(&self, player: Player) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        self.cells
            .iter()
            .filter_map(move |c| c.piece.filter(|p| p.owner == player).map(|p| (c.coord, p)))
    }

    pub fn piece_count(&self, player: Player) -> usize {
        self.pieces(player).count()
    }

    pub fn king_count(&self, player: Player) -> usize {
        self.pieces(player).filter(|(_, p)| p.is_king()).count()
    }

    pub fn man_count(&self, player: Player) -> usize {
        self.pieces(player).filter(|(_, p)| !p.is_king()).count()
    }

    pub fn total_pieces(&self) -> usize {
        self.cells.iter().filter(|c| c.piece.is_some()).count()
    }

    /// Put a piece on a playable cell, replacing whatever stood there
    pub fn place(&mut self, coord: Coord, piece: Piece) -> CheckersResult<()> {
        let coord = self.check_bounds(coord.x, coord.y)?;
        if !coord.is_playable() {
            return Err(CheckersError::NotPlayable { coord });
        }
        let index = coord.index(self.size());
        let replaced_own = self.cells[index].owner() == Some(piece.owner);
        if !replaced_own && self.piece_count(piece.owner) >= self.config.allotment() {
            return Err(CheckersError::configuration(format!(
                "{} already holds its full allotment of {} pieces",
                piece.owner,
                self.config.allotment()
            )));
        }
        self.cells[index].piece = Some(piece);
        Ok(())
    }

    /// Remove whatever stands on the cell
    pub fn clear(&mut self, coord: Coord) -> CheckersResult<Option<Piece>> {
        let coord = self.check_bounds(coord.x, coord.y)?;
        let index = coord.index(self.size());
        Ok(self.cells[index].piece.take())
    }

    /// Execute a destination produced by the move generator.
    ///
    /// Only structural sanity is checked (occupied source, vacant playable
    /// landing, opponent pieces on captured cells) so that a bad caller
    /// cannot corrupt the board; full legality is the move generator's job.
    /// Mutates exactly the source, the landing and every captured cell.
    pub fn apply(&mut self, source: Coord, destination: &Destination) -> CheckersResult<MoveEvent> {
        let size = self.size();
        let source = self.check_bounds(source.x, source.y)?;
        let landing = self.check_bounds(destination.landing.x, destination.landing.y)?;

        let mut piece = self.cells[source.index(size)]
            .piece
            .ok_or_else(|| CheckersError::illegal_move(source, landing, "no piece on source cell"))?;

        let mut event = MoveEvent {
            mover: piece.owner,
            source,
            landing,
            path: destination.path.clone(),
            captured: destination.captured.clone(),
            promoted: false,
        };

        // Reverting a drag; a king's capture loop may still end where it began
        if landing == source && !destination.is_capture() {
            return Ok(event);
        }

        if !landing.is_playable() {
            return Err(CheckersError::illegal_move(source, landing, "landing is not a playable cell"));
        }
        if landing != source && self.cells[landing.index(size)].piece.is_some() {
            return Err(CheckersError::illegal_move(source, landing, "landing cell is occupied"));
        }
        for (i, captured) in destination.captured.iter().enumerate() {
            let captured = self.check_bounds(captured.x, captured.y)?;
            let victim = self.cells[captured.index(size)].owner();
            if victim != Some(piece.owner.opponent()) {
                return Err(CheckersError::illegal_move(
                    source,
                    landing,
                    format!("{} does not hold an opponent piece", captured),
                ));
            }
            if destination.captured[..i].contains(&captured) {
                return Err(CheckersError::illegal_move(
                    source,
                    landing,
                    format!("{} captured twice", captured),
                ));
            }
        }

        // Move the piece and clear the captured cells
        self.cells[source.index(size)].piece = None;
        for captured in &destination.captured {
            self.cells[captured.index(size)].piece = None;
        }

        let was_king = piece.is_king();
        if landing.y == piece.owner.promotion_row(size) && !was_king {
            piece.promote();
            event.promoted = true;
        }
        self.cells[landing.index(size)].piece = Some(piece);

        if was_king && !destination.is_capture() {
            self.quiet_king_moves += 1;
        } else {
            self.quiet_king_moves = 0;
        }
        self.to_move = piece.owner.opponent();

        trace!(
            "{} {} captured={} promoted={}",
            event.mover,
            destination.notation(source),
            event.captured.len(),
            event.promoted
        );

        Ok(event)
    }

    /// Serialize configuration, occupancy, side to move and counters
    pub fn to_snapshot(&self) -> CheckersResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Restore a board from [`Board::to_snapshot`] output, re-checking
    /// every board invariant
    pub fn from_snapshot(json: &str) -> CheckersResult<Self> {
        let board: Board = serde_json::from_str(json)?;
        board.validate_layout()?;
        Ok(board)
    }

    fn validate_layout(&self) -> CheckersResult<()> {
        self.config.validate()?;
        let size = self.size();
        if self.cells.len() != size * size {
            return Err(CheckersError::configuration(format!(
                "expected {} cells, found {}",
                size * size,
                self.cells.len()
            )));
        }
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.coord.index(size) != i || cell.coord.x >= size {
                return Err(CheckersError::configuration(format!(
                    "cell {} stored at index {}",
                    cell.coord, i
                )));
            }
            if cell.piece.is_some() && !cell.coord.is_playable() {
                return Err(CheckersError::NotPlayable { coord: cell.coord });
            }
        }
        for player in [Player::White, Player::Black] {
            if self.piece_count(player) > self.config.allotment() {
                return Err(CheckersError::configuration(format!(
                    "{} has more than {} pieces",
                    player,
                    self.config.allotment()
                )));
            }
        }
        Ok(())
    }

    /// Display the board as a string, highest row on top
    pub fn display(&self) -> String {
        let size = self.size();
        let separator = format!("   +{}", "---+".repeat(size));
        let mut lines = Vec::with_capacity(size * 2 + 2);
        lines.push(separator.clone());

        for y in (0..size).rev() {
            let mut row = format!("{:>2} |", y + 1);
            for x in 0..size {
                let cell = &self.cells[Coord::new(x, y).index(size)];
                match cell.piece {
                    Some(piece) => row.push_str(&format!(" {} |", piece.symbol())),
                    None if cell.is_playable() => row.push_str(" . |"),
                    None => row.push_str("   |"),
                }
            }
            lines.push(row);
            lines.push(separator.clone());
        }

        let mut footer = String::from("    ");
        for &file in &FILE_NAMES[..size] {
            footer.push_str(&format!(" {}  ", file as char));
        }
        lines.push(footer.trim_end().to_string());

        lines.join("\n")
    }
}

impl Default for Board {
    /// Starting layout under the default configuration
    fn default() -> Self {
        Board::layout(GameConfig::default(), true)
    }
}

impl<'a> IntoIterator for &'a Board {
    type Item = &'a Cell;
    type IntoIter = std::slice::Iter<'a, Cell>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> GameConfig {
        GameConfig::with_size(8, 3)
    }

    #[test]
    fn initial_layout() {
        let board = Board::new(8, 3).unwrap();
        let white: Vec<Coord> = board.pieces(Player::White).map(|(c, _)| c).collect();
        let black: Vec<Coord> = board.pieces(Player::Black).map(|(c, _)| c).collect();

        assert_eq!(white.len(), 12);
        assert_eq!(black.len(), 12);
        assert_eq!(white[0], Coord::new(1, 0));
        assert_eq!(white[4], Coord::new(0, 1));
        assert_eq!(black[0], Coord::new(0, 5));
        assert_eq!(black[11], Coord::new(6, 7));
        assert!(board.iter().all(|c| c.is_empty() || c.is_playable()));
        assert!(board.pieces(Player::White).all(|(_, p)| p.rank == Rank::Man));
    }

    #[test]
    fn zero_player_rows_is_empty() {
        let board = Board::new(10, 0).unwrap();
        assert_eq!(board.total_pieces(), 0);
    }

    #[test]
    fn overlapping_rows_rejected() {
        assert!(matches!(
            Board::new(12, 6),
            Err(CheckersError::IllegalConfiguration { .. })
        ));
    }

    #[test]
    fn iterates_row_major_and_restartable() {
        let board = Board::new(4, 1).unwrap();
        let first: Vec<Coord> = board.iter().map(|c| c.coord).collect();
        let second: Vec<Coord> = (&board).into_iter().map(|c| c.coord).collect();
        assert_eq!(first.len(), 16);
        assert_eq!(first[0], Coord::new(0, 0));
        assert_eq!(first[1], Coord::new(1, 0));
        assert_eq!(first[4], Coord::new(0, 1));
        assert_eq!(first, second);
    }

    #[test]
    fn cell_at_bounds() {
        let board = Board::new(10, 4).unwrap();
        assert_eq!(board.cell_at(9, 0).unwrap().coord, Coord::new(9, 0));
        assert!(matches!(
            board.cell_at(10, 0),
            Err(CheckersError::OutOfBounds { x: 10, y: 0, size: 10 })
        ));
        assert!(board.cell_at(0, 100).is_err());
    }

    #[test]
    fn place_rejects_light_squares() {
        let mut board = Board::empty(small_config()).unwrap();
        assert!(matches!(
            board.place(Coord::new(0, 0), Piece::man(Player::White)),
            Err(CheckersError::NotPlayable { .. })
        ));
        assert!(board.place(Coord::new(1, 0), Piece::man(Player::White)).is_ok());
    }

    #[test]
    fn place_respects_allotment() {
        let mut board = Board::new(8, 3).unwrap();
        assert!(board.place(Coord::new(3, 4), Piece::man(Player::White)).is_err());
        // replacing one of the player's own pieces keeps the count
        assert!(board.place(Coord::new(1, 0), Piece::king(Player::White)).is_ok());
    }

    #[test]
    fn clear_frees_the_cell() {
        let mut board = Board::new(8, 3).unwrap();
        let coord = Coord::new(1, 0);

        assert_eq!(board.clear(coord).unwrap(), Some(Piece::man(Player::White)));
        assert!(board.cell_at(1, 0).unwrap().is_empty());
        assert_eq!(board.piece_count(Player::White), 11);
        assert_eq!(board.clear(coord).unwrap(), None);
        assert!(matches!(board.clear(Coord::new(8, 0)), Err(CheckersError::OutOfBounds { .. })));

        // the freed allotment can be placed again
        assert!(board.place(Coord::new(3, 4), Piece::man(Player::White)).is_ok());
    }

    #[test]
    fn apply_simple_move() {
        let mut board = Board::new(8, 3).unwrap();
        let event = board.apply(Coord::new(1, 2), &Destination::simple(Coord::new(0, 3))).unwrap();

        assert_eq!(event.mover, Player::White);
        assert!(!event.promoted);
        assert!(board.piece_at(Coord::new(1, 2)).is_none());
        assert_eq!(board.piece_at(Coord::new(0, 3)), Some(Piece::man(Player::White)));
        assert_eq!(board.to_move(), Player::Black);
    }

    #[test]
    fn apply_capture_removes_pieces() {
        let mut board = Board::empty(small_config()).unwrap();
        board.place(Coord::new(2, 3), Piece::man(Player::White)).unwrap();
        board.place(Coord::new(3, 4), Piece::man(Player::Black)).unwrap();
        board.place(Coord::new(5, 6), Piece::man(Player::Black)).unwrap();

        let dst = Destination::capture(
            Coord::new(6, 7),
            vec![Coord::new(3, 4), Coord::new(5, 6)],
            vec![Coord::new(4, 5)],
        );
        let event = board.apply(Coord::new(2, 3), &dst).unwrap();

        assert_eq!(board.piece_count(Player::Black), 0);
        assert!(event.promoted);
        assert_eq!(board.piece_at(Coord::new(6, 7)), Some(Piece::king(Player::White)));
    }

    #[test]
    fn apply_noop_keeps_state() {
        let mut board = Board::new(8, 3).unwrap();
        let before = board.clone();
        let event = board.apply(Coord::new(1, 2), &Destination::simple(Coord::new(1, 2))).unwrap();
        assert!(event.is_noop());
        assert_eq!(board, before);
    }

    #[test]
    fn apply_rejects_structural_errors() {
        let mut board = Board::new(8, 3).unwrap();
        // empty source
        assert!(matches!(
            board.apply(Coord::new(0, 3), &Destination::simple(Coord::new(1, 4))),
            Err(CheckersError::IllegalMove { .. })
        ));
        // occupied landing
        assert!(board.apply(Coord::new(1, 0), &Destination::simple(Coord::new(0, 1))).is_err());
        // light landing square
        assert!(board.apply(Coord::new(1, 2), &Destination::simple(Coord::new(1, 3))).is_err());
        // captured cell without an opponent
        let bogus = Destination::capture(Coord::new(3, 4), vec![Coord::new(2, 3)], vec![]);
        assert!(board.apply(Coord::new(1, 2), &bogus).is_err());
        // nothing changed
        assert_eq!(board, Board::new(8, 3).unwrap());
    }

    #[test]
    fn kings_count_quiet_moves() {
        let mut board = Board::empty(small_config()).unwrap();
        board.place(Coord::new(1, 0), Piece::king(Player::White)).unwrap();
        board.place(Coord::new(6, 7), Piece::king(Player::Black)).unwrap();

        board.apply(Coord::new(1, 0), &Destination::simple(Coord::new(2, 1))).unwrap();
        board.apply(Coord::new(6, 7), &Destination::simple(Coord::new(5, 6))).unwrap();
        assert_eq!(board.quiet_king_moves(), 2);

        board.place(Coord::new(3, 2), Piece::man(Player::White)).unwrap();
        board.apply(Coord::new(3, 2), &Destination::simple(Coord::new(4, 3))).unwrap();
        assert_eq!(board.quiet_king_moves(), 0);
    }

    #[test]
    fn promotion_only_on_far_row() {
        let mut board = Board::empty(small_config()).unwrap();
        board.place(Coord::new(1, 6), Piece::man(Player::White)).unwrap();
        board.place(Coord::new(2, 1), Piece::man(Player::Black)).unwrap();

        let white = board.apply(Coord::new(1, 6), &Destination::simple(Coord::new(0, 7))).unwrap();
        assert!(white.promoted);
        let black = board.apply(Coord::new(2, 1), &Destination::simple(Coord::new(1, 0))).unwrap();
        assert!(black.promoted);
        assert_eq!(board.king_count(Player::Black), 1);

        // an existing king returning to the far row is not promoted again
        board.apply(Coord::new(0, 7), &Destination::simple(Coord::new(1, 6))).unwrap();
        board.apply(Coord::new(1, 0), &Destination::simple(Coord::new(0, 1))).unwrap();
        board.apply(Coord::new(1, 6), &Destination::simple(Coord::new(0, 7))).unwrap();
        let again = board.apply(Coord::new(0, 1), &Destination::simple(Coord::new(1, 0))).unwrap();
        assert!(!again.promoted);
        assert_eq!(board.king_count(Player::Black), 1);
    }

    #[test]
    fn snapshot_restores_board() {
        let mut board = Board::new(8, 3).unwrap();
        board.apply(Coord::new(1, 2), &Destination::simple(Coord::new(0, 3))).unwrap();
        let restored = Board::from_snapshot(&board.to_snapshot().unwrap()).unwrap();
        assert_eq!(restored, board);
        assert_eq!(restored.to_move(), Player::Black);
    }

    #[test]
    fn snapshot_rejects_corrupt_layout() {
        let board = Board::new(8, 3).unwrap();
        let json = board.to_snapshot().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["cells"][0]["piece"] = serde_json::json!({"owner": "White", "rank": "Man"});
        assert!(matches!(
            Board::from_snapshot(&value.to_string()),
            Err(CheckersError::NotPlayable { .. })
        ));
        assert!(matches!(Board::from_snapshot("[]"), Err(CheckersError::Snapshot(_))));
    }

    #[test]
    fn display_shows_pieces() {
        let board = Board::new(8, 3).unwrap();
        let text = board.display();
        assert!(text.contains(" 8 | b |"));
        assert!(text.contains(" 1 |   | w |"));
        assert!(text.lines().last().unwrap().contains('h'));
    }
}
