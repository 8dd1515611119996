//! Database row models and their mapping to engine records.

use chrono::NaiveDateTime;
use derive_getters::Getters;
use derive_new::new;
use diesel::prelude::*;
use duel_board::{Board, Position, Symbol};
use tracing::instrument;

use crate::db::{DbError, schema};
use crate::{GameId, GameSession, JoinCode, Move, NewMove, NewSession, PlayerId, SessionStatus};

/// Game session row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable, Getters)]
#[diesel(table_name = schema::games)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct GameRow {
    id: i32,
    join_code: String,
    player_x: i32,
    player_o: Option<i32>,
    status: String,
    winner: Option<String>,
    winning_pattern: Option<String>,
    board: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl GameRow {
    /// Converts the stored row into a session record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if any column holds a value the engine never writes.
    #[instrument(skip(self), fields(game_id = self.id))]
    pub fn into_session(self) -> Result<GameSession, DbError> {
        let status = self
            .status
            .parse::<SessionStatus>()
            .map_err(|_| DbError::new(format!("Invalid status: '{}'", self.status)))?;
        let winner = self.winner.as_deref().map(parse_symbol).transpose()?;
        let winning_pattern = self
            .winning_pattern
            .as_deref()
            .map(parse_pattern)
            .transpose()?;
        let board = Board::from_compact(&self.board)
            .ok_or_else(|| DbError::new(format!("Invalid board: '{}'", self.board)))?;

        Ok(GameSession {
            id: GameId(self.id),
            join_code: JoinCode::parse(&self.join_code)
                .map_err(|e| DbError::new(format!("Invalid join code: {}", e.message)))?,
            player_x: PlayerId(self.player_x),
            player_o: self.player_o.map(PlayerId),
            status,
            winner,
            winning_pattern,
            board,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insertable game row.
#[derive(Debug, Clone, Insertable, new)]
#[diesel(table_name = schema::games)]
pub struct NewGameRow {
    join_code: String,
    player_x: i32,
    status: String,
    board: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl From<&NewSession> for NewGameRow {
    fn from(session: &NewSession) -> Self {
        Self::new(
            session.join_code().as_str().to_string(),
            session.player_x().0,
            SessionStatus::Waiting.to_string(),
            Board::new().to_compact(),
            *session.created_at(),
            *session.created_at(),
        )
    }
}

/// Full replacement of the mutable columns of a game row.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = schema::games)]
#[diesel(treat_none_as_null = true)]
pub struct GameChanges {
    player_o: Option<i32>,
    status: String,
    winner: Option<String>,
    winning_pattern: Option<String>,
    board: String,
    updated_at: NaiveDateTime,
}

impl From<&GameSession> for GameChanges {
    fn from(session: &GameSession) -> Self {
        Self {
            player_o: session.player_o().map(|p| p.0),
            status: session.status().to_string(),
            winner: session.winner().map(|s| s.to_string()),
            winning_pattern: session.winning_pattern().map(format_pattern),
            board: session.board().to_compact(),
            updated_at: *session.updated_at(),
        }
    }
}

/// Ledger row.
#[derive(Debug, Clone, Queryable, Identifiable, Associations, Selectable, Getters)]
#[diesel(table_name = schema::game_moves)]
#[diesel(belongs_to(GameRow, foreign_key = game_id))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct MoveRow {
    id: i32,
    game_id: i32,
    move_number: i32,
    player_id: i32,
    symbol: String,
    square: i32,
    created_at: NaiveDateTime,
}

impl MoveRow {
    /// Converts the stored row into a ledger entry.
    #[instrument(skip(self), fields(game_id = self.game_id, move_number = self.move_number))]
    pub fn into_move(self) -> Result<Move, DbError> {
        let position = Position::from_square(i64::from(self.square))
            .ok_or_else(|| DbError::new(format!("Invalid square: {}", self.square)))?;
        Ok(Move {
            game_id: GameId(self.game_id),
            move_number: self.move_number,
            player_id: PlayerId(self.player_id),
            symbol: parse_symbol(&self.symbol)?,
            position,
            created_at: self.created_at,
        })
    }
}

/// Insertable ledger row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = schema::game_moves)]
pub struct NewMoveRow {
    game_id: i32,
    move_number: i32,
    player_id: i32,
    symbol: String,
    square: i32,
    created_at: NaiveDateTime,
}

impl NewMoveRow {
    /// Row for appending `entry` to the ledger of `game_id`.
    pub fn from_entry(game_id: GameId, entry: &NewMove) -> Self {
        Self {
            game_id: game_id.0,
            move_number: *entry.move_number(),
            player_id: entry.player_id().0,
            symbol: entry.symbol().to_string(),
            square: entry.position().to_index() as i32,
            created_at: *entry.created_at(),
        }
    }
}

fn parse_symbol(s: &str) -> Result<Symbol, DbError> {
    s.parse::<Symbol>()
        .map_err(|_| DbError::new(format!("Invalid symbol: '{}'", s)))
}

fn format_pattern(pattern: [Position; 3]) -> String {
    pattern
        .iter()
        .map(|p| p.to_index().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn parse_pattern(s: &str) -> Result<[Position; 3], DbError> {
    let invalid = || DbError::new(format!("Invalid winning pattern: '{}'", s));
    let positions = s
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<usize>()
                .ok()
                .and_then(Position::from_index)
                .ok_or_else(invalid)
        })
        .collect::<Result<Vec<_>, _>>()?;
    <[Position; 3]>::try_from(positions).map_err(|_| invalid())
}
