//! Outcome detection: win, draw, or still open.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::is_full;
use crate::{Board, Position, Square, Symbol};

/// The eight winning lines, in the order they are checked.
pub const WIN_PATTERNS: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [
        Position::MiddleLeft,
        Position::Center,
        Position::MiddleRight,
    ],
    [
        Position::BottomLeft,
        Position::BottomCenter,
        Position::BottomRight,
    ],
    // Columns
    [
        Position::TopLeft,
        Position::MiddleLeft,
        Position::BottomLeft,
    ],
    [
        Position::TopCenter,
        Position::Center,
        Position::BottomCenter,
    ],
    [
        Position::TopRight,
        Position::MiddleRight,
        Position::BottomRight,
    ],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// Result of inspecting a board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// No line completed and at least one square is empty.
    None,
    /// `symbol` holds all three squares of `pattern`.
    Win {
        /// The completed line.
        pattern: [Position; 3],
        /// Symbol occupying the line.
        symbol: Symbol,
    },
    /// Every square is occupied and no line is complete.
    Draw,
}

impl Outcome {
    /// Whether the board is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::None)
    }

    /// Winning symbol, if any.
    pub fn winner(&self) -> Option<Symbol> {
        match self {
            Outcome::Win { symbol, .. } => Some(*symbol),
            _ => None,
        }
    }

    /// Winning line as board indices, if any.
    pub fn pattern_indices(&self) -> Option<[usize; 3]> {
        match self {
            Outcome::Win { pattern, .. } => Some(pattern.map(Position::to_index)),
            _ => None,
        }
    }
}

/// Inspects the board for a completed line or a draw.
///
/// Lines are checked in [`WIN_PATTERNS`] order and the first complete
/// line wins.
#[instrument(skip(board), fields(board = %board.to_compact()))]
pub fn detect(board: &Board) -> Outcome {
    for pattern in WIN_PATTERNS {
        let [a, b, c] = pattern;
        if let Square::Occupied(symbol) = board.get(a)
            && board.get(b) == Square::Occupied(symbol)
            && board.get(c) == Square::Occupied(symbol)
        {
            return Outcome::Win { pattern, symbol };
        }
    }

    if is_full(board) {
        Outcome::Draw
    } else {
        Outcome::None
    }
}
