//! Append-only move ledger.
//!
//! The ledger is the only source of truth for a board. Every board the
//! engine reasons about comes from [`replay_moves`] over ledger entries in
//! move-number order.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use duel_board::{Board, Placement, Position, Symbol};
use tracing::{instrument, warn};

use crate::{EngineError, GameId, PlayerId};

/// A committed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct Move {
    pub(crate) game_id: GameId,
    pub(crate) move_number: i32,
    pub(crate) player_id: PlayerId,
    pub(crate) symbol: Symbol,
    pub(crate) position: Position,
    pub(crate) created_at: NaiveDateTime,
}

impl Move {
    /// The board-relevant part of this entry.
    pub fn placement(&self) -> Placement {
        Placement::new(self.position, self.symbol)
    }
}

/// A ledger entry about to be appended.
#[derive(Debug, Clone, Getters, new)]
pub struct NewMove {
    move_number: i32,
    player_id: PlayerId,
    symbol: Symbol,
    position: Position,
    created_at: NaiveDateTime,
}

impl NewMove {
    /// Builds the committed entry for `game_id`.
    pub(crate) fn into_move(self, game_id: GameId) -> Move {
        Move {
            game_id,
            move_number: self.move_number,
            player_id: self.player_id,
            symbol: self.symbol,
            position: self.position,
            created_at: self.created_at,
        }
    }
}

/// Ordered, append-only move history for sessions.
///
/// Implementations enforce uniqueness of `(game, move_number)` and
/// `(game, square)` themselves; callers checking first is not enough
/// under concurrency.
pub trait MoveLedger {
    /// All entries for `game_id` in move-number order.
    fn moves(&mut self, game_id: GameId) -> Result<Vec<Move>, EngineError>;

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// [`SquareOccupied`](crate::EngineErrorKind::SquareOccupied) if an entry
    /// already holds the square, [`MoveConflict`](crate::EngineErrorKind::MoveConflict)
    /// if the move number is not the next one.
    fn append(&mut self, game_id: GameId, entry: NewMove) -> Result<Move, EngineError>;

    /// Current board for `game_id`.
    fn replay(&mut self, game_id: GameId) -> Result<Board, EngineError> {
        let moves = self.moves(game_id)?;
        replay_moves(&moves)
    }
}

/// Folds ledger entries onto an empty board.
///
/// # Errors
///
/// Returns a storage error if the entries are not numbered 1, 2, 3, ... or
/// if two entries share a square. Either means stored history is corrupt.
#[instrument(skip(moves), fields(count = moves.len()))]
pub fn replay_moves(moves: &[Move]) -> Result<Board, EngineError> {
    for (expected, entry) in (1..).zip(moves) {
        if entry.move_number != expected {
            warn!(
                game_id = %entry.game_id,
                expected,
                found = entry.move_number,
                "Ledger is not contiguous"
            );
            return Err(EngineError::storage(format!(
                "Ledger for game {} has move {} where {} was expected",
                entry.game_id, entry.move_number, expected
            )));
        }
    }

    Board::replay(moves.iter().map(Move::placement))
        .map_err(|e| EngineError::storage(format!("Corrupt ledger: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineErrorKind;

    fn entry(number: i32, symbol: Symbol, position: Position) -> Move {
        NewMove::new(
            number,
            PlayerId(1),
            symbol,
            position,
            chrono::Utc::now().naive_utc(),
        )
        .into_move(GameId(1))
    }

    #[test]
    fn test_replay_contiguous_ledger() {
        let board = replay_moves(&[
            entry(1, Symbol::X, Position::Center),
            entry(2, Symbol::O, Position::TopLeft),
        ])
        .expect("valid ledger");
        assert_eq!(board.to_compact(), "O---X----");
    }

    #[test]
    fn test_replay_rejects_gap() {
        let err = replay_moves(&[
            entry(1, Symbol::X, Position::Center),
            entry(3, Symbol::O, Position::TopLeft),
        ])
        .expect_err("gap");
        assert_eq!(err.kind, EngineErrorKind::StorageUnavailable);
    }

    #[test]
    fn test_replay_rejects_shared_square() {
        let err = replay_moves(&[
            entry(1, Symbol::X, Position::Center),
            entry(2, Symbol::O, Position::Center),
        ])
        .expect_err("shared square");
        assert!(err.message.contains("Corrupt ledger"));
    }
}
