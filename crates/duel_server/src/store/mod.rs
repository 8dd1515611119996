//! Session storage.
//!
//! [`SessionStore`] is the seam between the engine and persistence. The
//! lifecycle manager and move resolver only ever mutate a session inside
//! [`SessionStore::with_exclusive_access`], so they behave the same over the
//! in-memory backend (per-session mutex registry) and the SQLite backend
//! (`BEGIN IMMEDIATE` transactions).

mod memory;

pub use memory::MemoryStore;

use crate::{EngineError, GameId, GameSession, JoinCode, Move, MoveLedger, NewSession, PlayerId};

/// Write handle for one session, valid only inside an exclusive section.
///
/// Nothing written through it is visible to other callers until the
/// section returns `Ok`; on `Err` every write is discarded.
pub trait SessionWriter: MoveLedger {
    /// Replaces the stored session record.
    fn save(&mut self, session: &GameSession) -> Result<(), EngineError>;
}

/// Identity- and code-indexed access to sessions.
pub trait SessionStore: Send + Sync {
    /// Stores a new session in `waiting` status and assigns its id.
    ///
    /// # Errors
    ///
    /// [`CodeTaken`](crate::EngineErrorKind::CodeTaken) if the join code is
    /// already in use.
    fn create(&self, session: NewSession) -> Result<GameSession, EngineError>;

    /// Looks a session up by id.
    fn get_by_id(&self, id: GameId) -> Result<Option<GameSession>, EngineError>;

    /// Looks a session up by its (normalized) join code.
    fn get_by_code(&self, code: &JoinCode) -> Result<Option<GameSession>, EngineError>;

    /// Committed ledger of a session, in move-number order.
    fn moves(&self, id: GameId) -> Result<Vec<Move>, EngineError>;

    /// Every session in which `player` holds a seat, ordered by id, each
    /// with its ledger. Read as one consistent snapshot.
    fn history_for_player(
        &self,
        player: PlayerId,
    ) -> Result<Vec<(GameSession, Vec<Move>)>, EngineError>;

    /// Runs `f` against session `id` with no other exclusive section for the
    /// same id running concurrently.
    ///
    /// `f` receives the session as committed by the previous section. Its
    /// writes commit atomically when it returns `Ok`.
    ///
    /// # Errors
    ///
    /// [`NotFound`](crate::EngineErrorKind::NotFound) if there is no such
    /// session, otherwise whatever `f` or the commit returns.
    fn with_exclusive_access<T, F>(&self, id: GameId, f: F) -> Result<T, EngineError>
    where
        F: FnOnce(GameSession, &mut dyn SessionWriter) -> Result<T, EngineError>;
}
