//! Move resolution.

use duel_board::{Position, detect};
use tracing::{debug, info, instrument, warn};

use crate::engine::now;
use crate::{
    Engine, EngineError, EngineErrorKind, GameId, GameSession, NewMove, PlayerId, SessionStore,
    TurnPolicy, replay_moves,
};

impl<S: SessionStore> Engine<S> {
    /// Places the next symbol on `square` for `player`.
    ///
    /// The symbol is derived from the ledger: X when X has placed no more
    /// symbols than O, otherwise O. Under [`TurnPolicy::SeatBound`] the
    /// requester's seat must hold that symbol.
    ///
    /// The ledger append and the updated session commit together; on any
    /// error neither changes.
    ///
    /// # Errors
    ///
    /// Checked in this order: [`NotFound`](EngineErrorKind::NotFound),
    /// [`NotAPlayer`](EngineErrorKind::NotAPlayer),
    /// [`GameFinished`](EngineErrorKind::GameFinished),
    /// [`InvalidSquare`](EngineErrorKind::InvalidSquare),
    /// [`SquareOccupied`](EngineErrorKind::SquareOccupied),
    /// [`NotYourTurn`](EngineErrorKind::NotYourTurn).
    #[instrument(skip(self), fields(game_id = %game_id, player = %player))]
    pub fn apply_move(
        &self,
        game_id: GameId,
        player: PlayerId,
        square: i64,
    ) -> Result<GameSession, EngineError> {
        let policy = *self.config.turn_policy();

        self.store
            .with_exclusive_access(game_id, |mut session, writer| {
                let Some(seat) = session.seat_of(player) else {
                    warn!("Move from player without a seat");
                    return Err(EngineError::new(
                        EngineErrorKind::NotAPlayer,
                        format!("Player {player} is not seated in game {game_id}"),
                    ));
                };

                if session.is_finished() {
                    return Err(EngineError::new(
                        EngineErrorKind::GameFinished,
                        format!("Game {game_id} has already finished"),
                    ));
                }

                let position = Position::from_square(square).ok_or_else(|| {
                    EngineError::new(
                        EngineErrorKind::InvalidSquare,
                        format!("Square must be between 0 and 8, got {square}"),
                    )
                })?;

                let ledger = writer.moves(game_id)?;
                let mut board = replay_moves(&ledger)?;
                if !board.is_empty(position) {
                    return Err(EngineError::new(
                        EngineErrorKind::SquareOccupied,
                        format!("Square {square} already occupied"),
                    ));
                }

                let symbol = board.next_symbol();
                if policy == TurnPolicy::SeatBound && seat != symbol {
                    return Err(EngineError::new(
                        EngineErrorKind::NotYourTurn,
                        format!("It is {symbol}'s turn; player {player} holds {seat}"),
                    ));
                }

                let move_number = i32::try_from(ledger.len())
                    .map_err(|_| EngineError::storage("Ledger too long"))?
                    + 1;
                let timestamp = now();
                let entry = writer.append(
                    game_id,
                    NewMove::new(move_number, player, symbol, position, timestamp),
                )?;
                debug!(move_number, %symbol, %position, "Move appended");

                board
                    .place(entry.placement())
                    .map_err(|e| EngineError::storage(format!("Ledger and board disagree: {e}")))?;
                let outcome = detect(&board);
                session.record_move(board, outcome, timestamp);
                writer.save(&session)?;

                info!(
                    move_number,
                    %symbol,
                    status = %session.status(),
                    winner = ?session.winner(),
                    "Move applied"
                );
                Ok(session)
            })
    }
}
