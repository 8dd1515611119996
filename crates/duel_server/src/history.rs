//! Per-player game history.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use duel_board::Symbol;
use serde::Serialize;
use tracing::{info, instrument};

use crate::{Engine, EngineError, GameId, GameSession, JoinCode, Move, PlayerId, SessionStore};

/// One move as shown in a player's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMove {
    move_number: i32,
    symbol: Symbol,
    square: usize,
    /// Display label of the mover. There is no user directory, so this is
    /// the player id as text.
    player_label: String,
}

impl From<&Move> for HistoryMove {
    fn from(entry: &Move) -> Self {
        Self {
            move_number: *entry.move_number(),
            symbol: *entry.symbol(),
            square: entry.position().to_index(),
            player_label: entry.player_id().to_string(),
        }
    }
}

/// One session a player sat in, with its full ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    game_id: GameId,
    join_code: JoinCode,
    winner: Option<Symbol>,
    created_at: NaiveDateTime,
    moves: Vec<HistoryMove>,
}

impl HistoryEntry {
    fn build(session: GameSession, moves: &[Move]) -> Self {
        Self {
            game_id: session.id,
            join_code: session.join_code,
            winner: session.winner,
            created_at: session.created_at,
            moves: moves.iter().map(HistoryMove::from).collect(),
        }
    }
}

impl<S: SessionStore> Engine<S> {
    /// Every session `player` sat in, oldest first, each with its moves in order.
    #[instrument(skip(self), fields(player = %player))]
    pub fn history(&self, player: PlayerId) -> Result<Vec<HistoryEntry>, EngineError> {
        let history: Vec<_> = self
            .store
            .history_for_player(player)?
            .into_iter()
            .map(|(session, moves)| HistoryEntry::build(session, &moves))
            .collect();
        info!(games = history.len(), "History loaded");
        Ok(history)
    }
}
