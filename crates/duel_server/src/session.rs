//! Game session records.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_more::{Display, From};
use derive_new::new;
use duel_board::{Board, Outcome, Position, Symbol};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::{EngineError, EngineErrorKind};

/// Unique identifier for a game session.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct GameId(pub i32);

/// Opaque player identity. The engine only compares these for equality.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
)]
#[serde(transparent)]
pub struct PlayerId(pub i32);

/// Length of a join code.
pub const JOIN_CODE_LEN: usize = 6;

/// Human-shareable code used to join a session.
///
/// Always stored uppercase; parsing normalizes user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Display)]
#[serde(transparent)]
pub struct JoinCode(String);

impl JoinCode {
    /// Parses a code as a person would type it: surrounding whitespace is
    /// ignored and letters are compared case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`EngineErrorKind::InvalidJoinCode`] if the code is blank or
    /// not six ASCII letters and digits.
    #[instrument]
    pub fn parse(input: &str) -> Result<Self, EngineError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(EngineError::new(
                EngineErrorKind::InvalidJoinCode,
                "Join code required",
            ));
        }
        if trimmed.len() != JOIN_CODE_LEN || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(EngineError::new(
                EngineErrorKind::InvalidJoinCode,
                format!("Join code must be {JOIN_CODE_LEN} letters or digits"),
            ));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Renders three bytes as an uppercase hex code, e.g. `[0xab, 0x01, 0xff]` as `AB01FF`.
    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02X}")).collect())
    }

    /// Returns the code as stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Lifecycle status of a session.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionStatus {
    /// Only the creator is seated.
    #[display("waiting")]
    Waiting,
    /// Play is under way.
    #[display("ongoing")]
    Ongoing,
    /// Won or drawn; no further moves are accepted.
    #[display("finished")]
    Finished,
}

/// A game session.
///
/// `board`, `status`, `winner`, and `winning_pattern` are a projection of
/// the session's move ledger. They change only through [`GameSession::record_move`],
/// which the move resolver calls in the same unit of work as the ledger append.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct GameSession {
    pub(crate) id: GameId,
    pub(crate) join_code: JoinCode,
    pub(crate) player_x: PlayerId,
    pub(crate) player_o: Option<PlayerId>,
    pub(crate) status: SessionStatus,
    pub(crate) winner: Option<Symbol>,
    pub(crate) winning_pattern: Option<[Position; 3]>,
    pub(crate) board: Board,
    pub(crate) created_at: NaiveDateTime,
    pub(crate) updated_at: NaiveDateTime,
}

impl GameSession {
    /// Symbol of the seat held by `player`, if any.
    pub fn seat_of(&self, player: PlayerId) -> Option<Symbol> {
        if self.player_x == player {
            Some(Symbol::X)
        } else if self.player_o == Some(player) {
            Some(Symbol::O)
        } else {
            None
        }
    }

    /// Whether `player` holds either seat.
    pub fn is_seated(&self, player: PlayerId) -> bool {
        self.seat_of(player).is_some()
    }

    /// Whether no further moves are accepted.
    pub fn is_finished(&self) -> bool {
        self.status == SessionStatus::Finished
    }

    /// Symbol due to move next, or `None` once the session has finished.
    pub fn current_symbol_to_move(&self) -> Option<Symbol> {
        (!self.is_finished()).then(|| self.board.next_symbol())
    }

    /// Seats `player` as O.
    pub(crate) fn seat_o(&mut self, player: PlayerId, now: NaiveDateTime) {
        self.player_o = Some(player);
        self.status = SessionStatus::Ongoing;
        self.updated_at = now;
    }

    /// Replaces the projection with the board after a move and its outcome.
    #[instrument(skip(self, board), fields(session_id = %self.id))]
    pub(crate) fn record_move(&mut self, board: Board, outcome: Outcome, now: NaiveDateTime) {
        if outcome.is_terminal() {
            self.status = SessionStatus::Finished;
            self.winner = outcome.winner();
            self.winning_pattern = match outcome {
                Outcome::Win { pattern, .. } => Some(pattern),
                _ => None,
            };
        } else {
            self.status = SessionStatus::Ongoing;
        }
        debug!(status = %self.status, winner = ?self.winner, "Projection updated");
        self.board = board;
        self.updated_at = now;
    }
}

/// A session about to be stored; the store assigns its id.
#[derive(Debug, Clone, Getters, new)]
pub struct NewSession {
    join_code: JoinCode,
    player_x: PlayerId,
    created_at: NaiveDateTime,
}

impl NewSession {
    /// Builds the stored record once the store has assigned an id.
    pub(crate) fn into_session(self, id: GameId) -> GameSession {
        GameSession {
            id,
            join_code: self.join_code,
            player_x: self.player_x,
            player_o: None,
            status: SessionStatus::Waiting,
            winner: None,
            winning_pattern: None,
            board: Board::new(),
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}
