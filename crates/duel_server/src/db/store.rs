//! SQLite-backed session store.
//!
//! Every exclusive section runs inside `BEGIN IMMEDIATE`, which takes
//! SQLite's single writer lock for the database file. That serializes
//! mutations across every process sharing the file, not just this one.
//! Uniqueness of join codes and of `(game, move_number)` / `(game, square)`
//! is enforced by the schema.

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tracing::{debug, info, instrument, warn};

use crate::db::models::{GameChanges, GameRow, MoveRow, NewGameRow, NewMoveRow};
use crate::db::{DbError, schema};
use crate::store::{SessionStore, SessionWriter};
use crate::{
    EngineError, EngineErrorKind, GameId, GameSession, JoinCode, Move, MoveLedger, NewMove,
    NewSession, PlayerId,
};

/// Schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Default time a writer waits for the database lock.
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Session store backed by a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: String,
    busy_timeout_ms: u64,
}

impl SqliteStore {
    /// Opens the database at `db_path`, creating it if needed, and applies
    /// pending migrations.
    ///
    /// A file path is required: every operation opens its own connection,
    /// so `":memory:"` would give each one a separate, empty database.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if the database cannot be opened or migrated.
    #[instrument(skip(db_path), fields(db_path = %db_path.as_ref()))]
    pub fn open(db_path: impl AsRef<str>, busy_timeout_ms: u64) -> Result<Self, DbError> {
        let store = Self {
            db_path: db_path.as_ref().to_string(),
            busy_timeout_ms,
        };
        store.run_migrations()?;
        info!(path = %store.db_path, busy_timeout_ms, "SQLite session store ready");
        Ok(store)
    }

    /// Path of the database file.
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// Applies pending migrations, returning how many ran.
    ///
    /// # Errors
    ///
    /// Returns [`DbError`] if a migration fails.
    #[instrument(skip(self))]
    pub fn run_migrations(&self) -> Result<usize, DbError> {
        let mut conn = self.connection()?;
        // WAL lets readers proceed while a writer holds the lock; the setting persists in the file.
        conn.batch_execute("PRAGMA journal_mode = WAL;")?;
        let applied = conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| DbError::new(format!("Migration failed: {}", e)))?;
        info!(count = applied.len(), "Migrations applied");
        Ok(applied.len())
    }

    /// Establishes a database connection.
    #[instrument(skip(self))]
    fn connection(&self) -> Result<SqliteConnection, DbError> {
        debug!(path = %self.db_path, "Establishing connection");
        let mut conn = SqliteConnection::establish(&self.db_path)
            .inspect_err(|e| warn!(path = %self.db_path, error = %e, "Connection failed"))?;
        conn.batch_execute(&format!(
            "PRAGMA busy_timeout = {}; PRAGMA foreign_keys = ON;",
            self.busy_timeout_ms
        ))?;
        Ok(conn)
    }
}

fn load_session(
    conn: &mut SqliteConnection,
    id: GameId,
) -> Result<Option<GameSession>, EngineError> {
    let row: Option<GameRow> = schema::games::table
        .find(id.0)
        .select(GameRow::as_select())
        .first(conn)
        .optional()?;
    Ok(row.map(GameRow::into_session).transpose()?)
}

fn load_moves(conn: &mut SqliteConnection, id: GameId) -> Result<Vec<Move>, EngineError> {
    let rows: Vec<MoveRow> = schema::game_moves::table
        .filter(schema::game_moves::game_id.eq(id.0))
        .order(schema::game_moves::move_number.asc())
        .select(MoveRow::as_select())
        .load(conn)?;
    Ok(rows
        .into_iter()
        .map(MoveRow::into_move)
        .collect::<Result<Vec<_>, _>>()?)
}

fn is_unique_violation(err: &DieselError) -> bool {
    matches!(
        err,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}

impl SessionStore for SqliteStore {
    #[instrument(skip(self, session), fields(code = %session.join_code()))]
    fn create(&self, session: NewSession) -> Result<GameSession, EngineError> {
        let mut conn = self.connection()?;

        let row: GameRow = diesel::insert_into(schema::games::table)
            .values(NewGameRow::from(&session))
            .returning(GameRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| {
                if is_unique_violation(&e) {
                    warn!("Join code already in use");
                    EngineError::new(
                        EngineErrorKind::CodeTaken,
                        format!("Join code {} already in use", session.join_code()),
                    )
                } else {
                    EngineError::from(e)
                }
            })?;

        let stored = row.into_session()?;
        info!(session_id = %stored.id(), "Session stored");
        Ok(stored)
    }

    #[instrument(skip(self))]
    fn get_by_id(&self, id: GameId) -> Result<Option<GameSession>, EngineError> {
        let mut conn = self.connection()?;
        load_session(&mut conn, id)
    }

    #[instrument(skip(self), fields(code = %code))]
    fn get_by_code(&self, code: &JoinCode) -> Result<Option<GameSession>, EngineError> {
        let mut conn = self.connection()?;
        let row: Option<GameRow> = schema::games::table
            .filter(schema::games::join_code.eq(code.as_str()))
            .select(GameRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(GameRow::into_session).transpose()?)
    }

    #[instrument(skip(self))]
    fn moves(&self, id: GameId) -> Result<Vec<Move>, EngineError> {
        let mut conn = self.connection()?;
        load_moves(&mut conn, id)
    }

    #[instrument(skip(self))]
    fn history_for_player(
        &self,
        player: PlayerId,
    ) -> Result<Vec<(GameSession, Vec<Move>)>, EngineError> {
        let mut conn = self.connection()?;
        conn.transaction::<_, EngineError, _>(|conn| {
            let games: Vec<GameRow> = schema::games::table
                .filter(
                    schema::games::player_x
                        .eq(player.0)
                        .or(schema::games::player_o.eq(player.0)),
                )
                .order(schema::games::id.asc())
                .select(GameRow::as_select())
                .load(conn)?;

            let moves: Vec<Vec<MoveRow>> = MoveRow::belonging_to(&games)
                .order(schema::game_moves::move_number.asc())
                .select(MoveRow::as_select())
                .load::<MoveRow>(conn)?
                .grouped_by(&games);

            let history = games
                .into_iter()
                .zip(moves)
                .map(|(game, rows)| {
                    let session = game.into_session()?;
                    let moves = rows
                        .into_iter()
                        .map(MoveRow::into_move)
                        .collect::<Result<Vec<_>, _>>()?;
                    Ok((session, moves))
                })
                .collect::<Result<Vec<_>, DbError>>()?;

            debug!(count = history.len(), "History collected");
            Ok(history)
        })
    }

    #[instrument(skip(self, f))]
    fn with_exclusive_access<T, F>(&self, id: GameId, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(GameSession, &mut dyn SessionWriter) -> Result<T, EngineError>,
    {
        let mut conn = self.connection()?;
        conn.immediate_transaction::<T, EngineError, _>(|conn| {
            debug!(session_id = %id, "Exclusive access acquired");
            let session = load_session(conn, id)?
                .ok_or_else(|| EngineError::not_found(format!("No game found with id {id}")))?;
            let mut unit = TransactionWriter { conn, game_id: id };
            f(session, &mut unit)
        })
    }
}

/// Writes issued on the connection holding the immediate transaction.
struct TransactionWriter<'a> {
    conn: &'a mut SqliteConnection,
    game_id: GameId,
}

impl TransactionWriter<'_> {
    fn check_scope(&self, game_id: GameId) -> Result<(), EngineError> {
        if game_id == self.game_id {
            Ok(())
        } else {
            Err(EngineError::storage(format!(
                "Game {game_id} is outside the exclusive section for game {}",
                self.game_id
            )))
        }
    }
}

impl MoveLedger for TransactionWriter<'_> {
    fn moves(&mut self, game_id: GameId) -> Result<Vec<Move>, EngineError> {
        self.check_scope(game_id)?;
        load_moves(self.conn, game_id)
    }

    #[instrument(skip(self, entry), fields(move_number = entry.move_number(), square = %entry.position()))]
    fn append(&mut self, game_id: GameId, entry: NewMove) -> Result<Move, EngineError> {
        self.check_scope(game_id)?;

        let row: MoveRow = diesel::insert_into(schema::game_moves::table)
            .values(NewMoveRow::from_entry(game_id, &entry))
            .returning(MoveRow::as_returning())
            .get_result(self.conn)
            .map_err(|e| {
                let square_taken = matches!(
                    &e,
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)
                        if info.message().contains("square")
                );
                if square_taken {
                    warn!("Square already in ledger");
                    EngineError::new(
                        EngineErrorKind::SquareOccupied,
                        format!("Square {} already occupied", entry.position().to_index()),
                    )
                } else if is_unique_violation(&e) {
                    warn!("Move number collides");
                    EngineError::new(
                        EngineErrorKind::MoveConflict,
                        format!("Move number {} already recorded", entry.move_number()),
                    )
                } else {
                    EngineError::from(e)
                }
            })?;

        Ok(row.into_move()?)
    }
}

impl SessionWriter for TransactionWriter<'_> {
    #[instrument(skip(self, session), fields(session_id = %session.id()))]
    fn save(&mut self, session: &GameSession) -> Result<(), EngineError> {
        self.check_scope(*session.id())?;
        let updated = diesel::update(schema::games::table.find(session.id().0))
            .set(GameChanges::from(session))
            .execute(self.conn)?;
        if updated != 1 {
            return Err(EngineError::storage(format!(
                "Expected to update one row for game {}, updated {updated}",
                session.id()
            )));
        }
        Ok(())
    }
}
