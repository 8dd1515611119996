//! Wire representation of a session.

use chrono::NaiveDateTime;
use duel_board::Symbol;
use serde::Serialize;

use crate::{GameId, GameSession, JoinCode, PlayerId, SessionStatus};

/// Session as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    /// Session id.
    pub id: GameId,
    /// Code the second player joins with.
    pub join_code: JoinCode,
    /// Creator, seated as X.
    pub player_x: PlayerId,
    /// Joiner, seated as O.
    pub player_o: Option<PlayerId>,
    /// Nine cells in row-major order: `"X"`, `"O"`, or `""`.
    pub board: Vec<String>,
    /// Symbol due to move; `None` once finished.
    pub current_symbol_to_move: Option<Symbol>,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Winning symbol, if any.
    pub winner: Option<Symbol>,
    /// Board indices of the winning line.
    pub winning_pattern: Option<[usize; 3]>,
    /// Creation time (UTC).
    pub created_at: NaiveDateTime,
    /// Last change (UTC).
    pub updated_at: NaiveDateTime,
}

impl From<&GameSession> for SessionView {
    fn from(session: &GameSession) -> Self {
        Self {
            id: *session.id(),
            join_code: session.join_code().clone(),
            player_x: *session.player_x(),
            player_o: *session.player_o(),
            board: session
                .board()
                .squares()
                .iter()
                .map(|s| s.symbol().map(|sym| sym.to_string()).unwrap_or_default())
                .collect(),
            current_symbol_to_move: session.current_symbol_to_move(),
            status: *session.status(),
            winner: *session.winner(),
            winning_pattern: session
                .winning_pattern()
                .map(|pattern| pattern.map(|p| p.to_index())),
            created_at: *session.created_at(),
            updated_at: *session.updated_at(),
        }
    }
}
