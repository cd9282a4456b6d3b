//! Checkers Engine - Background Search Module
//!
//! Runs the search engine off the interactive thread. Each request gets its
//! own board snapshot and a fresh engine; the result comes back over a
//! channel. Only one search may be outstanding at a time.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crate::board::Board;
use crate::error::{CheckersError, CheckersResult};
use crate::search::{SearchEngine, SearchOutcome, TieBreak};
use crate::types::Player;

/// Message delivered when a background search completes
#[derive(Debug)]
pub enum SearchEvent {
    Finished(SearchOutcome),
    Failed(CheckersError),
}

/// Clears the pending flag when the search thread exits, even on panic
struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SearchWorker {
    pending: Arc<AtomicBool>,
    searches_started: u64,
    handle: Option<JoinHandle<()>>,
}

impl SearchWorker {
    pub fn new() -> Self {
        SearchWorker {
            pending: Arc::new(AtomicBool::new(false)),
            searches_started: 0,
            handle: None,
        }
    }

    /// True while a search is running; callers refuse human input meanwhile
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Start a search on a copy of `board`. The receiver yields exactly one
    /// event. The flag stays set until that event has been sent.
    pub fn start(
        &mut self,
        board: &Board,
        ai: Player,
        human: Player,
        depth: u32,
        tie_break: TieBreak,
    ) -> CheckersResult<Receiver<SearchEvent>> {
        if self
            .pending
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("search requested while another is outstanding");
            return Err(CheckersError::SearchPending);
        }

        self.searches_started += 1;
        let snapshot = board.clone();
        let (sender, receiver) = mpsc::channel();
        let guard = PendingGuard(Arc::clone(&self.pending));

        let spawned = thread::Builder::new()
            .name(format!("search-{}", self.searches_started))
            .spawn(move || {
                let mut engine = SearchEngine::with_tie_break(tie_break);
                let event = match engine.search(&snapshot, ai, human, depth) {
                    Ok(outcome) => SearchEvent::Finished(outcome),
                    Err(err) => SearchEvent::Failed(err),
                };
                if sender.send(event).is_err() {
                    debug!("search result discarded, receiver gone");
                }
                drop(guard);
            });

        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(receiver)
            }
            Err(err) => {
                warn!("failed to spawn search thread: {}", err);
                self.pending.store(false, Ordering::SeqCst);
                Err(CheckersError::Spawn(err))
            }
        }
    }

    /// Run a search and wait for its result
    pub fn run_blocking(
        &mut self,
        board: &Board,
        ai: Player,
        human: Player,
        depth: u32,
        tie_break: TieBreak,
    ) -> CheckersResult<SearchOutcome> {
        let receiver = self.start(board, ai, human, depth, tie_break)?;
        self.wait(&receiver)
    }

    /// Block on the event from `start`, then reap the search thread so the
    /// pending flag is clear once this returns
    pub fn wait(&mut self, receiver: &Receiver<SearchEvent>) -> CheckersResult<SearchOutcome> {
        let event = receiver.recv();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
        match event {
            Ok(SearchEvent::Finished(outcome)) => Ok(outcome),
            Ok(SearchEvent::Failed(err)) => Err(err),
            Err(_) => Err(CheckersError::SearchAborted),
        }
    }
}

impl Default for SearchWorker {
    fn default() -> Self {
        SearchWorker::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivers_result() {
        let board = Board::new(8, 3).unwrap();
        let mut worker = SearchWorker::new();
        let outcome = worker
            .run_blocking(&board, Player::White, Player::Black, 2, TieBreak::FirstFound)
            .unwrap();
        assert_eq!(outcome.source.y, 2);
    }

    #[test]
    fn second_request_is_refused_while_pending() {
        let board = Board::new(8, 3).unwrap();
        let mut worker = SearchWorker::new();
        worker.pending.store(true, Ordering::SeqCst);

        let refused = worker.start(&board, Player::White, Player::Black, 1, TieBreak::FirstFound);
        assert!(matches!(refused, Err(CheckersError::SearchPending)));
        assert!(worker.is_pending());
        assert_eq!(worker.searches_started, 0);

        worker.pending.store(false, Ordering::SeqCst);
        assert!(worker
            .run_blocking(&board, Player::White, Player::Black, 1, TieBreak::FirstFound)
            .is_ok());
    }

    #[test]
    fn flag_is_clear_once_the_result_is_in_hand() {
        let board = Board::new(8, 3).unwrap();
        let mut worker = SearchWorker::new();
        let receiver = worker
            .start(&board, Player::White, Player::Black, 2, TieBreak::FirstFound)
            .unwrap();

        let outcome = worker.wait(&receiver).unwrap();
        assert_eq!(outcome.source.y, 2);
        assert!(!worker.is_pending());
        assert!(worker
            .start(&board, Player::White, Player::Black, 1, TieBreak::FirstFound)
            .is_ok());
    }

    #[test]
    fn pending_clears_after_failure() {
        let board = Board::new(8, 3).unwrap();
        let mut worker = SearchWorker::new();
        let result = worker.run_blocking(&board, Player::White, Player::White, 2, TieBreak::FirstFound);
        assert!(result.is_err());

        assert!(!worker.is_pending());
        assert!(worker
            .run_blocking(&board, Player::White, Player::Black, 1, TieBreak::FirstFound)
            .is_ok());
    }
}
