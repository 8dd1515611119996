//! In-process session store.
//!
//! Valid for a single server instance. Exclusivity comes from a registry of
//! per-session mutexes; sessions never share a lock, so different games
//! proceed in parallel.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, info, instrument, warn};

use super::{SessionStore, SessionWriter};
use crate::{
    EngineError, EngineErrorKind, GameId, GameSession, JoinCode, Move, MoveLedger, NewMove,
    NewSession, PlayerId,
};

#[derive(Debug, Default)]
struct Tables {
    sessions: BTreeMap<GameId, GameSession>,
    moves: HashMap<GameId, Vec<Move>>,
    last_id: i32,
}

/// Session store backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    locks: Mutex<HashMap<GameId, Arc<Mutex<()>>>>,
}

fn poisoned(what: &str) -> EngineError {
    EngineError::storage(format!("{what} lock poisoned"))
}

impl MemoryStore {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating in-memory session store");
        Self::default()
    }

    /// Mutex guarding mutation of session `id`, registered by `create`.
    fn gate(&self, id: GameId) -> Result<Arc<Mutex<()>>, EngineError> {
        let locks = self.locks.lock().map_err(|_| poisoned("registry"))?;
        locks
            .get(&id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("No game found with id {id}")))
    }
}

impl SessionStore for MemoryStore {
    #[instrument(skip(self, session), fields(code = %session.join_code()))]
    fn create(&self, session: NewSession) -> Result<GameSession, EngineError> {
        let mut tables = self.tables.write().map_err(|_| poisoned("table"))?;

        if tables
            .sessions
            .values()
            .any(|s| s.join_code() == session.join_code())
        {
            warn!("Join code already in use");
            return Err(EngineError::new(
                EngineErrorKind::CodeTaken,
                format!("Join code {} already in use", session.join_code()),
            ));
        }

        tables.last_id += 1;
        let id = GameId(tables.last_id);
        let stored = session.into_session(id);
        tables.sessions.insert(id, stored.clone());
        tables.moves.insert(id, Vec::new());
        self.locks
            .lock()
            .map_err(|_| poisoned("registry"))?
            .insert(id, Arc::default());

        info!(session_id = %id, "Session stored");
        Ok(stored)
    }

    #[instrument(skip(self))]
    fn get_by_id(&self, id: GameId) -> Result<Option<GameSession>, EngineError> {
        let tables = self.tables.read().map_err(|_| poisoned("table"))?;
        Ok(tables.sessions.get(&id).cloned())
    }

    #[instrument(skip(self), fields(code = %code))]
    fn get_by_code(&self, code: &JoinCode) -> Result<Option<GameSession>, EngineError> {
        let tables = self.tables.read().map_err(|_| poisoned("table"))?;
        Ok(tables
            .sessions
            .values()
            .find(|s| s.join_code() == code)
            .cloned())
    }

    #[instrument(skip(self))]
    fn moves(&self, id: GameId) -> Result<Vec<Move>, EngineError> {
        let tables = self.tables.read().map_err(|_| poisoned("table"))?;
        Ok(tables.moves.get(&id).cloned().unwrap_or_default())
    }

    #[instrument(skip(self))]
    fn history_for_player(
        &self,
        player: PlayerId,
    ) -> Result<Vec<(GameSession, Vec<Move>)>, EngineError> {
        let tables = self.tables.read().map_err(|_| poisoned("table"))?;
        let history: Vec<_> = tables
            .sessions
            .values()
            .filter(|s| s.is_seated(player))
            .map(|s| {
                let moves = tables.moves.get(s.id()).cloned().unwrap_or_default();
                (s.clone(), moves)
            })
            .collect();
        debug!(count = history.len(), "History collected");
        Ok(history)
    }

    #[instrument(skip(self, f))]
    fn with_exclusive_access<T, F>(&self, id: GameId, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(GameSession, &mut dyn SessionWriter) -> Result<T, EngineError>,
    {
        let gate = self.gate(id)?;
        let _held = gate.lock().map_err(|_| poisoned("session"))?;
        debug!(session_id = %id, "Exclusive access acquired");

        let session = self
            .get_by_id(id)?
            .ok_or_else(|| EngineError::not_found(format!("No game found with id {id}")))?;

        let mut unit = StagedWrites {
            game_id: id,
            committed: self.moves(id)?,
            staged_moves: Vec::new(),
            staged_session: None,
        };

        let result = f(session, &mut unit)?;

        if unit.staged_session.is_some() || !unit.staged_moves.is_empty() {
            let mut tables = self.tables.write().map_err(|_| poisoned("table"))?;
            if let Some(session) = unit.staged_session {
                tables.sessions.insert(id, session);
            }
            let appended = unit.staged_moves.len();
            tables
                .moves
                .entry(id)
                .or_default()
                .extend(unit.staged_moves);
            debug!(session_id = %id, appended, "Staged writes committed");
        }

        Ok(result)
    }
}

/// Writes buffered inside an exclusive section, published on success.
struct StagedWrites {
    game_id: GameId,
    committed: Vec<Move>,
    staged_moves: Vec<Move>,
    staged_session: Option<GameSession>,
}

impl StagedWrites {
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

impl MoveLedger for StagedWrites {
    fn moves(&mut self, game_id: GameId) -> Result<Vec<Move>, EngineError> {
        self.check_scope(game_id)?;
        Ok(self
            .committed
            .iter()
            .chain(&self.staged_moves)
            .cloned()
            .collect())
    }

    #[instrument(skip(self, entry), fields(move_number = entry.move_number(), square = %entry.position()))]
    fn append(&mut self, game_id: GameId, entry: NewMove) -> Result<Move, EngineError> {
        self.check_scope(game_id)?;
        if self
            .committed
            .iter()
            .chain(&self.staged_moves)
            .any(|m| m.position() == entry.position())
        {
            warn!("Square already in ledger");
            return Err(EngineError::new(
                EngineErrorKind::SquareOccupied,
                format!("Square {} already occupied", entry.position().to_index()),
            ));
        }

        let len = self.committed.len() + self.staged_moves.len();
        let next = i32::try_from(len).map_err(|_| EngineError::storage("Ledger too long"))? + 1;
        if *entry.move_number() != next {
            warn!(expected = next, "Move number collides");
            return Err(EngineError::new(
                EngineErrorKind::MoveConflict,
                format!(
                    "Move number {} conflicts with ledger (next is {next})",
                    entry.move_number()
                ),
            ));
        }

        let stored = entry.into_move(game_id);
        self.staged_moves.push(stored.clone());
        Ok(stored)
    }
}

impl SessionWriter for StagedWrites {
    fn save(&mut self, session: &GameSession) -> Result<(), EngineError> {
        self.check_scope(*session.id())?;
        self.staged_session = Some(session.clone());
        Ok(())
    }
}
