//! Authoritative game state: rules engine, board orientation, and the
//! "ply viewed" cursor used for scrubbing through move history.

use crate::error::InvalidHistoryError;
use crate::rules::{MoveResult, RulesEngine};
use crate::types::Color;
use serde::Serialize;
use tracing::{debug, instrument};

/// View of the state handed to observers after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    /// Plies played in the live position.
    pub ply_count: usize,
    /// Scrubbing cursor, `0..=ply_count`.
    pub ply_viewed: usize,
    /// Side shown at the bottom of the board.
    pub orientation: Color,
    /// Side to move in the live position.
    pub turn: Color,
    /// FEN of the live position.
    pub fen: String,
    /// Whether the live position is terminal.
    pub game_over: bool,
}

type Observer = Box<dyn FnMut(&StateSnapshot)>;

/// Game state owned by one console session.
///
/// `ply_viewed` is a UI cursor only. Whose turn it is always comes from the
/// rules engine's live position.
pub struct GameState<R: RulesEngine> {
    engine: R,
    orientation: Color,
    ply_viewed: usize,
    observers: Vec<Observer>,
}

impl<R: RulesEngine> GameState<R> {
    /// Wraps a rules engine. Orientation starts as white, cursor at the
    /// engine's current tip.
    pub fn new(engine: R) -> Self {
        let ply_viewed = engine.ply_count();
        Self {
            engine,
            orientation: Color::White,
            ply_viewed,
            observers: Vec::new(),
        }
    }

    /// Registers an observer called after every mutation, in registration order.
    pub fn observe(&mut self, observer: impl FnMut(&StateSnapshot) + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Clears to the initial position, or loads `history` and jumps the
    /// cursor to its last ply.
    ///
    /// # Errors
    ///
    /// Returns the engine's [`InvalidHistoryError`] if `history` is rejected.
    /// Nothing is mutated in that case.
    pub fn reset(&mut self, history: Option<&str>) -> Result<(), InvalidHistoryError> {
        self.reset_facing(history, self.orientation)
    }

    /// Like [`reset`](Self::reset), also turning the board so `orientation`
    /// is at the bottom. Observers get a single snapshot with both applied.
    ///
    /// # Errors
    ///
    /// Returns the engine's [`InvalidHistoryError`] if `history` is rejected.
    /// The orientation is left unchanged in that case.
    #[instrument(skip(self, history), fields(has_history = history.is_some()))]
    pub fn reset_facing(
        &mut self,
        history: Option<&str>,
        orientation: Color,
    ) -> Result<(), InvalidHistoryError> {
        match history {
            Some(pgn) => {
                self.engine.load_pgn(pgn, true)?;
                self.ply_viewed = self.engine.ply_count();
            }
            None => {
                self.engine.reset();
                self.ply_viewed = 0;
            }
        }
        self.orientation = orientation;
        debug!(ply_viewed = self.ply_viewed, %orientation, "State reset");
        self.notify();
        Ok(())
    }

    /// Submits a move to the rules engine.
    ///
    /// On success the cursor follows the tip if it was on the tip before the
    /// move. An illegal move changes nothing and notifies nobody.
    pub fn apply_move(&mut self, token: &str) -> Option<MoveResult> {
        let result = self.engine.make_move(token)?;
        if self.ply_viewed + 1 == self.engine.ply_count() {
            self.ply_viewed += 1;
        }
        self.notify();
        Some(result)
    }

    /// Takes back one ply, clamping the cursor to the new tip.
    ///
    /// A no-op on empty history apart from notifying observers.
    pub fn undo_move(&mut self) -> Option<MoveResult> {
        let undone = self.engine.undo();
        self.ply_viewed = self.ply_viewed.min(self.engine.ply_count());
        self.notify();
        undone
    }

    /// Moves the scrubbing cursor, clamped to `0..=ply_count`. Returns the
    /// cursor actually set.
    pub fn view_ply(&mut self, ply: usize) -> usize {
        self.ply_viewed = ply.min(self.engine.ply_count());
        self.notify();
        self.ply_viewed
    }

    /// Sets the board orientation.
    pub fn set_orientation(&mut self, orientation: Color) {
        self.orientation = orientation;
        self.notify();
    }

    /// Plies played in the live position.
    pub fn ply_count(&self) -> usize {
        self.engine.ply_count()
    }

    /// Current scrubbing cursor.
    pub fn ply_viewed(&self) -> usize {
        self.ply_viewed
    }

    /// Side shown at the bottom of the board.
    pub fn orientation(&self) -> Color {
        self.orientation
    }

    /// FEN of the live position.
    pub fn fen(&self) -> String {
        self.engine.fen()
    }

    /// The rules engine.
    pub fn engine(&self) -> &R {
        &self.engine
    }

    /// Builds the snapshot observers receive.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            ply_count: self.engine.ply_count(),
            ply_viewed: self.ply_viewed,
            orientation: self.orientation,
            turn: self.engine.turn(),
            fen: self.engine.fen(),
            game_over: self.engine.is_game_over(),
        }
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for observer in &mut self.observers {
            observer(&snapshot);
        }
    }
}

impl<R: RulesEngine + std::fmt::Debug> std::fmt::Debug for GameState<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("engine", &self.engine)
            .field("orientation", &self.orientation)
            .field("ply_viewed", &self.ply_viewed)
            .field("observers", &self.observers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::StandardChess;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn cursor_follows_tip_only_when_on_it() {
        let mut state = GameState::new(StandardChess::new());
        state.apply_move("e4").unwrap();
        assert_eq!(state.ply_viewed(), 1);

        state.view_ply(0);
        state.apply_move("e5").unwrap();
        assert_eq!(state.ply_viewed(), 0);
        assert_eq!(state.ply_count(), 2);
    }

    #[test]
    fn undo_clamps_cursor() {
        let mut state = GameState::new(StandardChess::new());
        state.apply_move("e4").unwrap();
        state.apply_move("e5").unwrap();
        assert_eq!(state.ply_viewed(), 2);
        state.undo_move();
        assert_eq!(state.ply_viewed(), 1);
    }

    #[test]
    fn view_ply_is_clamped() {
        let mut state = GameState::new(StandardChess::new());
        state.apply_move("e4").unwrap();
        assert_eq!(state.view_ply(7), 1);
    }

    #[test]
    fn observers_run_in_order_after_each_mutation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut state = GameState::new(StandardChess::new());
        for tag in ["first", "second"] {
            let seen = Rc::clone(&seen);
            state.observe(move |snap| seen.borrow_mut().push((tag, snap.ply_count)));
        }

        state.apply_move("e4").unwrap();
        assert!(state.apply_move("e4").is_none());
        state.reset(None).unwrap();

        assert_eq!(
            *seen.borrow(),
            vec![("first", 1), ("second", 1), ("first", 0), ("second", 0)]
        );
    }

    #[test]
    fn rejected_history_leaves_state_alone() {
        let mut state = GameState::new(StandardChess::new());
        state.apply_move("e4").unwrap();
        assert!(state.reset(Some("1. e4 e4")).is_err());
        assert!(state.reset_facing(Some("1. e4 e4"), Color::Black).is_err());
        assert_eq!(state.ply_count(), 1);
        assert_eq!(state.ply_viewed(), 1);
        assert_eq!(state.orientation(), Color::White);
    }

    #[test]
    fn reset_facing_notifies_once_with_new_orientation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut state = GameState::new(StandardChess::new());
        state.apply_move("e4").unwrap();
        let sink = Rc::clone(&seen);
        state.observe(move |snap| sink.borrow_mut().push((snap.ply_count, snap.orientation)));

        state.reset_facing(None, Color::Black).unwrap();

        assert_eq!(*seen.borrow(), vec![(0, Color::Black)]);
    }
}
