//! Checkers Engine - Rules and Computer Player
//!
//! A draughts/checkers engine written in Rust with support for:
//! - Square boards from 4x4 to 26x26 with configurable starting rows
//! - Rule variants: mandatory capture, longest-chain capture, backward
//!   moves and captures, flying kings
//! - Multi-jump capture chains
//! - Win and draw detection
//! - Minimax search with alpha-beta pruning, run on a background thread
//! - JSON snapshots of a game in progress
//! - A line-oriented text protocol

pub mod types;
pub mod error;
pub mod config;
pub mod board;
pub mod move_generator;
pub mod game_end;
pub mod evaluation;
pub mod search;
pub mod worker;
pub mod console;

pub use board::{Board, Cell, Destination, MoveEvent};
pub use config::{CapturePolicy, GameConfig};
pub use error::{CheckersError, CheckersResult};
pub use game_end::{check_game_end, GameEnd, GameEndReason};
pub use move_generator::{MovableEntries, MoveGenerator};
pub use search::{choose_move, SearchEngine, SearchOutcome, TieBreak};
pub use types::{Coord, Piece, Player, Rank};
pub use worker::{SearchEvent, SearchWorker};
