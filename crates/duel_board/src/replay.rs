//! Rebuilding a board from an ordered move history.

use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{Board, Position, Square, Symbol};

/// One symbol placed on one square; the board-relevant part of a ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Where the symbol goes.
    pub position: Position,
    /// The symbol placed.
    pub symbol: Symbol,
}

impl Placement {
    /// Creates a new placement.
    pub fn new(position: Position, symbol: Symbol) -> Self {
        Self { position, symbol }
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.symbol, self.position.label())
    }
}

/// Error raised when a placement cannot be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PlacementError {
    /// The square already holds a symbol.
    #[display("Square {} is already occupied", _0)]
    SquareOccupied(Position),
}

impl std::error::Error for PlacementError {}

impl Board {
    /// Places a symbol on an empty square.
    pub fn place(&mut self, placement: Placement) -> Result<(), PlacementError> {
        if !self.is_empty(placement.position) {
            return Err(PlacementError::SquareOccupied(placement.position));
        }
        self.set(placement.position, Square::Occupied(placement.symbol));
        Ok(())
    }

    /// Folds placements, in order, onto an empty board.
    ///
    /// The caller supplies placements in move order. A placement onto an
    /// occupied square means the history is corrupt and is reported rather
    /// than overwritten.
    #[instrument(skip(placements))]
    pub fn replay<I>(placements: I) -> Result<Self, PlacementError>
    where
        I: IntoIterator<Item = Placement>,
    {
        let mut board = Board::new();
        for placement in placements {
            board.place(placement).inspect_err(|e| {
                warn!(error = %e, %placement, "History places onto an occupied square");
            })?;
        }
        Ok(board)
    }
}
