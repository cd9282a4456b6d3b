//! Checkers Engine - Type definitions and constants
//!
//! This module provides the core type definitions for representing players,
//! pieces and cell coordinates, plus the diagonal direction tables and the
//! algebraic cell notation used by the text protocol.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// File names for algebraic notation (boards up to 26 wide)
pub const FILE_NAMES: &[u8; 26] = b"abcdefghijklmnopqrstuvwxyz";

/// Diagonal steps as (dx, dy)
pub const DIAGONALS: [(isize, isize); 4] = [(1, 1), (-1, 1), (1, -1), (-1, -1)];

/// One of the two sides. `White` starts on the low rows (y = 0..) and
/// advances towards increasing y; `Black` starts on the high rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    White,
    Black,
}

impl Player {
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::White => Player::Black,
            Player::Black => Player::White,
        }
    }

    /// Sign of the y step that moves this player's men forward
    #[inline]
    pub fn forward(self) -> isize {
        match self {
            Player::White => 1,
            Player::Black => -1,
        }
    }

    /// Row on which this player's men are promoted
    #[inline]
    pub fn promotion_row(self, size: usize) -> usize {
        match self {
            Player::White => size - 1,
            Player::Black => 0,
        }
    }

    /// Number of rows a cell on row `y` lies ahead of this player's back row
    #[inline]
    pub fn advancement(self, y: usize, size: usize) -> usize {
        match self {
            Player::White => y,
            Player::Black => size - 1 - y,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Player::White => "white",
            Player::Black => "black",
        }
    }

    pub fn parse(name: &str) -> Option<Player> {
        match name.to_ascii_lowercase().as_str() {
            "white" | "w" => Some(Player::White),
            "black" | "b" => Some(Player::Black),
            _ => None,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Man,
    King,
}

/// A piece standing on a playable cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub owner: Player,
    pub rank: Rank,
}

impl Piece {
    pub const fn man(owner: Player) -> Self {
        Piece { owner, rank: Rank::Man }
    }

    pub const fn king(owner: Player) -> Self {
        Piece { owner, rank: Rank::King }
    }

    #[inline]
    pub fn is_king(&self) -> bool {
        self.rank == Rank::King
    }

    /// Promote to king. Promoting a king leaves it unchanged.
    pub fn promote(&mut self) {
        self.rank = Rank::King;
    }

    /// Diagram character: `w`/`b` for men, `W`/`B` for kings
    pub fn symbol(&self) -> char {
        match (self.owner, self.rank) {
            (Player::White, Rank::Man) => 'w',
            (Player::White, Rank::King) => 'W',
            (Player::Black, Rank::Man) => 'b',
            (Player::Black, Rank::King) => 'B',
        }
    }
}

/// Cell coordinate. Identity is coordinate equality; ordering is row-major
/// (by y, then x), which is also the board's iteration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Coord { x, y }
    }

    /// Dark-square test: only these cells ever hold pieces
    #[inline]
    pub fn is_playable(&self) -> bool {
        (self.x % 2) ^ (self.y % 2) == 1
    }

    /// Step `distance` cells along (dx, dy); None when leaving an N×N board
    #[inline]
    pub fn offset(&self, dx: isize, dy: isize, distance: usize, size: usize) -> Option<Coord> {
        let d = distance as isize;
        let x = self.x as isize + dx * d;
        let y = self.y as isize + dy * d;
        if x < 0 || y < 0 || x >= size as isize || y >= size as isize {
            return None;
        }
        Some(Coord::new(x as usize, y as usize))
    }

    #[inline]
    pub fn index(&self, size: usize) -> usize {
        self.y * size + self.x
    }
}

impl Ord for Coord {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Coord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&square_name(*self))
    }
}

/// Convert a coordinate to algebraic notation (e.g. (2, 0) -> "c1")
pub fn square_name(coord: Coord) -> String {
    match FILE_NAMES.get(coord.x) {
        Some(&file) => format!("{}{}", file as char, coord.y + 1),
        None => format!("({},{})", coord.x, coord.y),
    }
}

/// Convert algebraic notation to a coordinate. Bounds against a concrete
/// board size are checked by the board, not here.
pub fn parse_square(name: &str) -> Option<Coord> {
    let mut chars = name.chars();
    let file = chars.next()?.to_ascii_lowercase();
    let x = FILE_NAMES.iter().position(|&f| f as char == file)?;
    let rank: usize = chars.as_str().parse().ok()?;
    if rank == 0 {
        return None;
    }
    Some(Coord::new(x, rank - 1))
}
