//! Checkers Engine - Search Engine Module
//!
//! This module implements the move choice for the computer player:
//! - Depth-limited negamax with alpha-beta pruning (a whole capture chain
//!   is one ply)
//! - Plain minimax when pruning is switched off, for verification
//! - Capture-first move ordering
//! - Deterministic or seeded-random tie-breaking between equal root moves

use log::debug;
use rand::prelude::*;
use std::time::{Duration, Instant};

use crate::board::{Board, Destination};
use crate::config::MAX_SEARCH_DEPTH;
use crate::error::{CheckersError, CheckersResult};
use crate::evaluation::{evaluate, evaluate_move};
use crate::game_end::{check_with_entries, GameEnd};
use crate::move_generator::MoveGenerator;
use crate::types::*;

// Constants for search
pub const INFINITY: i32 = 1_000_000;
pub const WIN_SCORE: i32 = 100_000;

/// How to pick between root moves with the same score
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TieBreak {
    /// The first best move in generation order after capture-first ordering
    #[default]
    FirstFound,
    /// Uniformly among all best moves, from a seeded generator
    Random { seed: u64 },
}

/// Result of a completed search
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOutcome {
    pub source: Coord,
    pub destination: Destination,
    /// Root value from the searching player's point of view
    pub score: i32,
    pub nodes: u64,
    pub elapsed: Duration,
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

pub struct SearchEngine {
    move_generator: MoveGenerator,
    pub nodes_searched: u64,
    pub cutoffs: u64,

    // Configurable options
    pub use_alpha_beta: bool,
    pub tie_break: TieBreak,

    rng: StdRng,
    search_start_time: Instant,
}

impl SearchEngine {
    pub fn new() -> Self {
        SearchEngine::with_tie_break(TieBreak::FirstFound)
    }

    pub fn with_tie_break(tie_break: TieBreak) -> Self {
        let seed = match tie_break {
            TieBreak::Random { seed } => seed,
            TieBreak::FirstFound => 0,
        };
        SearchEngine {
            move_generator: MoveGenerator::new(),
            nodes_searched: 0,
            cutoffs: 0,
            use_alpha_beta: true,
            tie_break,
            rng: StdRng::seed_from_u64(seed),
            search_start_time: Instant::now(),
        }
    }

    /// Choose a move for `ai` against `human`, searching `depth` plies
    pub fn choose_move(
        &mut self,
        board: &Board,
        ai: Player,
        human: Player,
        depth: u32,
    ) -> CheckersResult<(Coord, Destination)> {
        let outcome = self.search(board, ai, human, depth)?;
        Ok((outcome.source, outcome.destination))
    }

    /// Full search returning the score and statistics with the move
    pub fn search(
        &mut self,
        board: &Board,
        ai: Player,
        human: Player,
        depth: u32,
    ) -> CheckersResult<SearchOutcome> {
        if ai == human {
            return Err(CheckersError::configuration("AI and human must be different players"));
        }
        if depth == 0 || depth > MAX_SEARCH_DEPTH {
            return Err(CheckersError::configuration(format!(
                "search depth {} outside 1..={}",
                depth, MAX_SEARCH_DEPTH
            )));
        }

        self.nodes_searched = 0;
        self.cutoffs = 0;
        self.search_start_time = Instant::now();

        let moves = self.order_moves(board, self.move_generator.legal_moves(board, ai));
        if moves.is_empty() {
            return Err(CheckersError::NoLegalMoves { player: ai });
        }

        let random_ties = matches!(self.tie_break, TieBreak::Random { .. });
        let mut alpha = -INFINITY;
        let beta = INFINITY;
        let mut best_score = -INFINITY;
        let mut best_moves: Vec<(Coord, Destination)> = Vec::new();

        for (source, destination) in moves {
            let mut child = board.clone();
            child.apply(source, &destination)?;

            // One below alpha keeps equal siblings exact so ties can be collected
            let window_alpha = if random_ties && alpha > -INFINITY { alpha - 1 } else { alpha };
            let score = -self.alphabeta(&child, depth - 1, -beta, -window_alpha, 1, human);

            if score > best_score {
                best_score = score;
                best_moves.clear();
                best_moves.push((source, destination));
            } else if score == best_score && random_ties {
                best_moves.push((source, destination));
            }

            if self.use_alpha_beta && score > alpha {
                alpha = score;
            }
        }

        let pick = if best_moves.len() > 1 { self.rng.gen_range(0..best_moves.len()) } else { 0 };
        let (source, destination) = best_moves.swap_remove(pick);
        let elapsed = self.search_start_time.elapsed();

        debug!(
            "search {} depth {} score {} nodes {} cutoffs {} time {}ms best {}",
            ai,
            depth,
            best_score,
            self.nodes_searched,
            self.cutoffs,
            elapsed.as_millis(),
            destination.notation(source)
        );

        Ok(SearchOutcome {
            source,
            destination,
            score: best_score,
            nodes: self.nodes_searched,
            elapsed,
        })
    }

    /// Value of `board` for `mover` (about to move), searched `depth`
    /// plies. With pruning disabled the bounds are ignored and this is
    /// plain minimax.
    pub fn alphabeta(
        &mut self,
        board: &Board,
        depth: u32,
        mut alpha: i32,
        beta: i32,
        ply: i32,
        mover: Player,
    ) -> i32 {
        self.nodes_searched += 1;

        let entries = self.move_generator.movable_entries(board, mover);
        if let Some(end) = check_with_entries(board, mover, &entries) {
            return terminal_score(&end, mover, ply);
        }

        if depth == 0 {
            return evaluate(board, mover);
        }

        let moves: Vec<(Coord, Destination)> = entries
            .into_iter()
            .flat_map(|(source, dsts)| dsts.into_iter().map(move |d| (source, d)))
            .collect();
        let ordered_moves = self.order_moves(board, moves);

        let mut best_score = -INFINITY;
        for (source, destination) in ordered_moves {
            let mut child = board.clone();
            if child.apply(source, &destination).is_err() {
                continue;
            }

            let score = -self.alphabeta(&child, depth - 1, -beta, -alpha, ply + 1, mover.opponent());

            if score > best_score {
                best_score = score;
            }
            if self.use_alpha_beta {
                if score > alpha {
                    alpha = score;
                }
                if alpha >= beta {
                    self.cutoffs += 1;
                    break;
                }
            }
        }

        best_score
    }

    /// Captures first (most material first), then promotions; stable so
    /// equal moves keep generation order
    fn order_moves(&self, board: &Board, moves: Vec<(Coord, Destination)>) -> Vec<(Coord, Destination)> {
        let mut scored_moves: Vec<((Coord, Destination), i32)> = moves
            .into_iter()
            .map(|(source, destination)| {
                let score = evaluate_move(board, source, &destination);
                ((source, destination), score)
            })
            .collect();

        scored_moves.sort_by(|a, b| b.1.cmp(&a.1));
        scored_moves.into_iter().map(|(m, _)| m).collect()
    }
}

impl Default for SearchEngine {
    fn default() -> Self {
        SearchEngine::new()
    }
}

/// Score of a finished game for `mover`; quicker wins score higher
fn terminal_score(end: &GameEnd, mover: Player, ply: i32) -> i32 {
    match end.winner {
        Some(winner) if winner == mover => WIN_SCORE - ply,
        Some(_) => -(WIN_SCORE - ply),
        None => 0,
    }
}

/// Convenience wrapper: search with a fresh engine and default options
pub fn choose_move(board: &Board, ai: Player, human: Player, depth: u32) -> CheckersResult<(Coord, Destination)> {
    SearchEngine::new().choose_move(board, ai, human, depth)
}
