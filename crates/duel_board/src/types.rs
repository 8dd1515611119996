//! Core domain types for the board.

use serde::{Deserialize, Serialize};

use crate::Position;

/// Symbol placed by a seat.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    strum::EnumString,
)]
pub enum Symbol {
    /// Symbol X (always the creator's seat, moves first).
    X,
    /// Symbol O.
    O,
}

/// A square on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Square {
    /// Empty square.
    Empty,
    /// Square holding a symbol.
    Occupied(Symbol),
}

impl Square {
    /// Returns the symbol on this square, if any.
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            Square::Empty => None,
            Square::Occupied(symbol) => Some(symbol),
        }
    }

    /// Single-character form used for compact storage (`-`, `X`, `O`).
    pub fn to_char(self) -> char {
        match self {
            Square::Empty => '-',
            Square::Occupied(Symbol::X) => 'X',
            Square::Occupied(Symbol::O) => 'O',
        }
    }

    /// Parses the single-character storage form.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '-' => Some(Square::Empty),
            'X' => Some(Square::Occupied(Symbol::X)),
            'O' => Some(Square::Occupied(Symbol::O)),
            _ => None,
        }
    }
}

/// 3x3 board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// Squares in row-major order (0-8).
    squares: [Square; 9],
}

impl Board {
    /// Creates a new empty board.
    pub fn new() -> Self {
        Self {
            squares: [Square::Empty; 9],
        }
    }

    /// Gets the square at the given position.
    pub fn get(&self, pos: Position) -> Square {
        self.squares[pos.to_index()]
    }

    /// Sets the square at the given position.
    pub fn set(&mut self, pos: Position, square: Square) {
        self.squares[pos.to_index()] = square;
    }

    /// Checks if a square is empty.
    pub fn is_empty(&self, pos: Position) -> bool {
        self.get(pos) == Square::Empty
    }

    /// Returns all squares.
    pub fn squares(&self) -> &[Square; 9] {
        &self.squares
    }

    /// Number of squares holding `symbol`.
    pub fn count(&self, symbol: Symbol) -> usize {
        self.squares
            .iter()
            .filter(|s| **s == Square::Occupied(symbol))
            .count()
    }

    /// Symbol that moves next, derived from the symbol counts alone.
    ///
    /// X moves whenever it has placed no more symbols than O.
    pub fn next_symbol(&self) -> Symbol {
        if self.count(Symbol::X) <= self.count(Symbol::O) {
            Symbol::X
        } else {
            Symbol::O
        }
    }

    /// Compact nine-character form, e.g. `"XO-------"`.
    pub fn to_compact(&self) -> String {
        self.squares.iter().map(|s| s.to_char()).collect()
    }

    /// Parses the compact nine-character form.
    pub fn from_compact(s: &str) -> Option<Self> {
        let mut board = Self::new();
        let mut len = 0;
        for (idx, c) in s.chars().enumerate() {
            let pos = Position::from_index(idx)?;
            board.set(pos, Square::from_char(c)?);
            len += 1;
        }
        (len == 9).then_some(board)
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
