//! Error types for the chess console.
//!
//! Illegal moves are not errors: they travel through the `IllegalMove` event
//! and a `None` move result. Only malformed resume data, configuration
//! problems and protocol misuse surface here.

use derive_more::{Display, Error, From};
use tracing::instrument;

/// Resume data (PGN) was rejected by the rules engine.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid history: {} at {}:{}", message, file, line)]
pub struct InvalidHistoryError {
    /// Error message.
    pub message: String,
    /// Zero-based ply at which the history stopped being legal, if known.
    pub ply: Option<usize>,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl InvalidHistoryError {
    /// Creates a new history error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            ply: None,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Creates a history error pointing at the offending ply.
    #[track_caller]
    pub fn at_ply(ply: usize, token: &str) -> Self {
        let mut err = Self::new(format!("move {:?} is not legal at ply {}", token, ply));
        err.ply = Some(ply);
        err
    }
}

/// An orchestrator operation was called outside the state that permits it.
///
/// This is a programming error in the caller, never a user mistake.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Protocol violation: {} at {}:{}", message, file, line)]
pub struct ProtocolViolation {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProtocolViolation {
    /// Creates a new protocol violation with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

/// Any error a console operation can return.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum ConsoleError {
    /// Resume data was rejected.
    #[display("{}", _0)]
    InvalidHistory(InvalidHistoryError),

    /// Operation called in the wrong state.
    #[display("{}", _0)]
    Protocol(ProtocolViolation),

    /// Settings could not be loaded.
    #[display("{}", _0)]
    Config(ConfigError),
}
