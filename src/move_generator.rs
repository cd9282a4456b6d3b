//! Checkers Engine - Move Generator Module
//!
//! This module computes every legal destination for a player's pieces,
//! including multi-jump capture chains, and applies the configured rule
//! variant (mandatory capture, capture policy, backward moves and
//! captures, flying kings).

use std::collections::{BTreeMap, HashSet};

use crate::board::{Board, Destination};
use crate::config::{CapturePolicy, GameConfig};
use crate::error::CheckersResult;
use crate::types::*;

/// Legal destinations keyed by source cell, in row-major source order
pub type MovableEntries = BTreeMap<Coord, Vec<Destination>>;

/// Move generator for checkers positions
pub struct MoveGenerator;

impl MoveGenerator {
    /// Create a new move generator
    pub fn new() -> Self {
        MoveGenerator
    }

    /// Generate all legal destinations for every piece of `player`
    pub fn movable_entries(&self, board: &Board, player: Player) -> MovableEntries {
        let rules = board.config();
        let mut captures = MovableEntries::new();

        // Check for captures first
        for (source, piece) in board.pieces(player) {
            let chains = self.captures_from(board, source, piece);
            if !chains.is_empty() {
                captures.insert(source, chains);
            }
        }

        if rules.mandatory_capture && rules.capture_policy == CapturePolicy::LongestChain {
            let longest = captures
                .values()
                .flatten()
                .map(Destination::capture_count)
                .max()
                .unwrap_or(0);
            captures.retain(|_, chains| {
                chains.retain(|d| d.capture_count() == longest);
                !chains.is_empty()
            });
        }

        if rules.mandatory_capture && !captures.is_empty() {
            return captures;
        }

        // Simple moves first, then any captures from the same source
        let mut entries = MovableEntries::new();
        for (source, piece) in board.pieces(player) {
            let mut destinations = self.simple_moves_from(board, source, piece);
            if let Some(chains) = captures.remove(&source) {
                destinations.extend(chains);
            }
            if !destinations.is_empty() {
                entries.insert(source, destinations);
            }
        }

        entries
    }

    /// Flatten movable entries into (source, destination) pairs
    pub fn legal_moves(&self, board: &Board, player: Player) -> Vec<(Coord, Destination)> {
        self.movable_entries(board, player)
            .into_iter()
            .flat_map(|(source, dsts)| dsts.into_iter().map(move |d| (source, d)))
            .collect()
    }

    /// Legal destinations of the piece on `source` (empty for an empty cell)
    pub fn destinations_from(&self, board: &Board, source: Coord) -> Vec<Destination> {
        match board.piece_at(source) {
            Some(piece) => self
                .movable_entries(board, piece.owner)
                .remove(&source)
                .unwrap_or_default(),
            None => Vec::new(),
        }
    }

    /// True iff `target` is a legal landing cell for the piece on `source`.
    /// A cell is always an allowed destination of itself (reverting a drag).
    pub fn destination_allowed(&self, board: &Board, source: Coord, target: Coord) -> bool {
        if source == target {
            return true;
        }
        self.destinations_from(board, source)
            .iter()
            .any(|d| d.landing == target)
    }

    /// True iff `destination` is exactly one of the computed destinations
    pub fn is_legal(&self, board: &Board, source: Coord, destination: &Destination) -> bool {
        if source == destination.landing && !destination.is_capture() {
            return true;
        }
        self.destinations_from(board, source).contains(destination)
    }

    /// Resolve a raw landing cell to its full destination. When several
    /// chains land on the same cell the one capturing most wins, first
    /// generated on ties.
    pub fn get_destination(&self, board: &Board, source: Coord, target: Coord) -> Option<Destination> {
        if source == target {
            return Some(Destination::simple(source));
        }

        let mut best: Option<Destination> = None;
        for destination in self.destinations_from(board, source) {
            if destination.landing != target {
                continue;
            }
            let better = best
                .as_ref()
                .map_or(true, |b| destination.capture_count() > b.capture_count());
            if better {
                best = Some(destination);
            }
        }
        best
    }

    /// Whether any piece of `player` can capture
    pub fn has_capture(&self, board: &Board, player: Player) -> bool {
        let rules = board.config();
        board.pieces(player).any(|(source, piece)| {
            DIAGONALS.iter().any(|&(dx, dy)| {
                may_capture_towards(rules, piece, dy)
                    && self.jump_targets(board, source, piece, source, dx, dy, &[]).is_some()
            })
        })
    }

    /// The single capturing destination of `player`, if exactly one exists.
    /// Auto-capture only applies while capturing is compulsory.
    pub fn forced_capture(&self, board: &Board, player: Player) -> Option<(Coord, Destination)> {
        let rules = board.config();
        if !(rules.mandatory_capture && rules.auto_capture_single_option) {
            return None;
        }
        let mut captures = self
            .legal_moves(board, player)
            .into_iter()
            .filter(|(_, d)| d.is_capture());
        let only = captures.next()?;
        if captures.next().is_some() {
            return None;
        }
        Some(only)
    }

    /// Count leaf nodes of the legal-move tree
    pub fn perft(&self, board: &Board, player: Player, depth: usize) -> CheckersResult<u64> {
        if depth == 0 {
            return Ok(1);
        }

        let moves = self.legal_moves(board, player);
        if depth == 1 {
            return Ok(moves.len() as u64);
        }

        let mut nodes = 0u64;
        for (source, destination) in moves {
            let mut child = board.clone();
            child.apply(source, &destination)?;
            nodes += self.perft(&child, player.opponent(), depth - 1)?;
        }

        Ok(nodes)
    }

    /// Generate non-capturing moves from the given cell
    fn simple_moves_from(&self, board: &Board, source: Coord, piece: Piece) -> Vec<Destination> {
        let rules = board.config();
        let size = board.size();
        let flying = piece.is_king() && rules.flying_king;
        let mut moves = Vec::new();

        for &(dx, dy) in &DIAGONALS {
            if !piece.is_king() && !rules.can_move_backwards && dy != piece.owner.forward() {
                continue;
            }

            let mut distance = 1;
            while let Some(target) = source.offset(dx, dy, distance, size) {
                if board.piece_at(target).is_some() {
                    break;
                }
                moves.push(Destination::simple(target));
                if !flying {
                    break;
                }
                distance += 1;
            }
        }

        moves
    }

    /// Enumerate every maximal capture chain starting on `source`
    fn captures_from(&self, board: &Board, source: Coord, piece: Piece) -> Vec<Destination> {
        let mut chains = Vec::new();
        let mut captured = Vec::new();
        let mut path = Vec::new();
        self.extend_chain(board, source, piece, source, &mut captured, &mut path, &mut chains);

        // Different jump orders can reach the same landing over the same pieces
        let mut seen = HashSet::new();
        chains.retain(|d: &Destination| {
            let mut key = d.captured.clone();
            key.sort();
            seen.insert((d.landing, key))
        });

        chains
    }

    #[allow(clippy::too_many_arguments)]
    fn extend_chain(
        &self,
        board: &Board,
        origin: Coord,
        piece: Piece,
        at: Coord,
        captured: &mut Vec<Coord>,
        path: &mut Vec<Coord>,
        chains: &mut Vec<Destination>,
    ) {
        let rules = board.config();
        let mut extended = false;

        for &(dx, dy) in &DIAGONALS {
            if !may_capture_towards(rules, piece, dy) {
                continue;
            }
            let Some((victim, landings)) = self.jump_targets(board, origin, piece, at, dx, dy, captured) else {
                continue;
            };

            for landing in landings {
                extended = true;
                captured.push(victim);
                path.push(landing);
                self.extend_chain(board, origin, piece, landing, captured, path, chains);
                path.pop();
                captured.pop();
            }
        }

        if !extended && !captured.is_empty() {
            let hops = &path[..path.len() - 1];
            chains.push(Destination::capture(at, captured.clone(), hops.to_vec()));
        }
    }

    /// Find the piece that can be jumped from `at` along (dx, dy) and the
    /// cells it can be jumped to. Pieces already captured in this chain
    /// still block but cannot be jumped again; the chain's origin counts
    /// as vacant.
    #[allow(clippy::too_many_arguments)]
    fn jump_targets(
        &self,
        board: &Board,
        origin: Coord,
        piece: Piece,
        at: Coord,
        dx: isize,
        dy: isize,
        captured: &[Coord],
    ) -> Option<(Coord, Vec<Coord>)> {
        let size = board.size();
        let flying = piece.is_king() && board.config().flying_king;
        let vacant = |c: Coord| c == origin || board.piece_at(c).is_none();

        let mut distance = 1;
        let victim = loop {
            let c = at.offset(dx, dy, distance, size)?;
            if !vacant(c) {
                break c;
            }
            if !flying {
                return None;
            }
            distance += 1;
        };

        let target = board.piece_at(victim)?;
        if target.owner == piece.owner || captured.contains(&victim) {
            return None;
        }

        let mut landings = Vec::new();
        let mut step = distance + 1;
        while let Some(c) = at.offset(dx, dy, step, size) {
            if !vacant(c) {
                break;
            }
            landings.push(c);
            if !flying {
                break;
            }
            step += 1;
        }

        if landings.is_empty() {
            None
        } else {
            Some((victim, landings))
        }
    }
}

impl Default for MoveGenerator {
    fn default() -> Self {
        MoveGenerator::new()
    }
}

/// Men capture forwards only unless backward captures are enabled
#[inline]
fn may_capture_towards(rules: &GameConfig, piece: Piece, dy: isize) -> bool {
    piece.is_king() || rules.can_capture_backwards || dy == piece.owner.forward()
}
