//! Engine error types.

use derive_more::{Display, Error};
use serde::Serialize;
use tracing::instrument;

/// Stable, machine-readable error kind.
///
/// The variant name is the wire form and must not change.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, strum::EnumIter,
)]
pub enum EngineErrorKind {
    /// Square number outside 0-8.
    InvalidSquare,
    /// Join code missing or malformed.
    InvalidJoinCode,
    /// No session with that id or join code.
    NotFound,
    /// Both seats are taken.
    GameFull,
    /// Another session already uses the join code.
    CodeTaken,
    /// Target square already holds a symbol.
    SquareOccupied,
    /// A concurrent writer claimed the same move number or square first.
    MoveConflict,
    /// The requester's seat does not hold the symbol due to move.
    NotYourTurn,
    /// The requester holds neither seat.
    NotAPlayer,
    /// The session has already finished.
    GameFinished,
    /// No unique join code could be generated.
    ExhaustedRetries,
    /// The storage collaborator failed.
    StorageUnavailable,
}

/// Broad class of an error, used to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorCategory {
    /// Malformed input the caller can correct.
    Validation,
    /// Unknown id or code.
    NotFound,
    /// Caller lost a race or holds stale state and should re-fetch.
    Conflict,
    /// Caller is not allowed to act on this session.
    Forbidden,
    /// Session is in its terminal state.
    GameFinished,
    /// Engine or storage cannot serve the request right now.
    Unavailable,
}

impl EngineErrorKind {
    /// Category this kind belongs to.
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::InvalidSquare | Self::InvalidJoinCode => ErrorCategory::Validation,
            Self::NotFound => ErrorCategory::NotFound,
            Self::GameFull
            | Self::CodeTaken
            | Self::SquareOccupied
            | Self::MoveConflict
            | Self::NotYourTurn => {
                ErrorCategory::Conflict
            }
            Self::NotAPlayer => ErrorCategory::Forbidden,
            Self::GameFinished => ErrorCategory::GameFinished,
            Self::ExhaustedRetries | Self::StorageUnavailable => ErrorCategory::Unavailable,
        }
    }
}

/// Engine error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("{}: {} at {}:{}", kind, message, file, line)]
pub struct EngineError {
    /// What went wrong, in machine-readable form.
    pub kind: EngineErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl EngineError {
    /// Creates a new error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Shorthand for a [`EngineErrorKind::NotFound`] error.
    #[track_caller]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::NotFound, message)
    }

    /// Shorthand for a [`EngineErrorKind::StorageUnavailable`] error.
    #[track_caller]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::StorageUnavailable, message)
    }

    /// Category of this error.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}
