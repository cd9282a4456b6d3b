//! Checkers Engine - Game configuration
//!
//! The rule variant, board geometry and AI strength for one game. A
//! configuration is fixed for the lifetime of a board; changing it means
//! building a new board.

use serde::{Deserialize, Serialize};

use crate::error::{CheckersError, CheckersResult};

pub const MIN_SIZE: usize = 4;
pub const MAX_SIZE: usize = 26;
pub const MAX_SEARCH_DEPTH: u32 = 10;

/// Neutral rows that must separate the two starting zones
const MIN_NEUTRAL_ROWS: usize = 2;

/// Which capture chains survive when capturing is mandatory
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapturePolicy {
    /// Any maximal chain may be played
    #[default]
    AnyChain,
    /// Only chains of the greatest length available anywhere on the board
    LongestChain,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub size: usize,
    pub player_rows: usize,
    pub mandatory_capture: bool,
    pub capture_policy: CapturePolicy,
    pub auto_capture_single_option: bool,
    pub can_move_backwards: bool,
    pub can_capture_backwards: bool,
    pub flying_king: bool,
    pub search_depth: u32,
    /// Consecutive non-capturing king plies, once both sides hold only
    /// kings, after which the game is drawn
    pub king_only_move_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            size: 10,
            player_rows: 4,
            mandatory_capture: true,
            capture_policy: CapturePolicy::AnyChain,
            auto_capture_single_option: false,
            can_move_backwards: false,
            can_capture_backwards: true,
            flying_king: true,
            search_depth: 4,
            king_only_move_limit: 25,
        }
    }
}

impl GameConfig {
    /// Default rules on a board of the given geometry
    pub fn with_size(size: usize, player_rows: usize) -> Self {
        GameConfig { size, player_rows, ..GameConfig::default() }
    }

    pub fn validate(&self) -> CheckersResult<()> {
        if !(MIN_SIZE..=MAX_SIZE).contains(&self.size) {
            return Err(CheckersError::configuration(format!(
                "grid size {} outside {}..={}",
                self.size, MIN_SIZE, MAX_SIZE
            )));
        }
        if self.size < self.player_rows * 2 + MIN_NEUTRAL_ROWS {
            return Err(CheckersError::configuration(format!(
                "{} player rows leave fewer than {} empty rows on a {}x{} board",
                self.player_rows, MIN_NEUTRAL_ROWS, self.size, self.size
            )));
        }
        if self.search_depth == 0 || self.search_depth > MAX_SEARCH_DEPTH {
            return Err(CheckersError::configuration(format!(
                "search depth {} outside 1..={}",
                self.search_depth, MAX_SEARCH_DEPTH
            )));
        }
        if self.king_only_move_limit == 0 {
            return Err(CheckersError::configuration("king-only move limit must be positive"));
        }
        Ok(())
    }

    /// Pieces each player starts with
    pub fn allotment(&self) -> usize {
        // Every row holds exactly size/2 dark squares when size is even;
        // odd sizes alternate between floor and ceil.
        (0..self.player_rows)
            .map(|y| (0..self.size).filter(|x| (x % 2) ^ (y % 2) == 1).count())
            .sum()
    }

    pub fn from_json(json: &str) -> CheckersResult<Self> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> CheckersResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}
