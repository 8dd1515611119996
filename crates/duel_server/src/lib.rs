//! Duel Server - server-authoritative tic-tac-toe sessions.
//!
//! The [`Engine`] owns session lifecycle, move resolution, and history. It
//! never trusts a client with board state: every board it reasons about is
//! replayed from the session's move ledger, and every mutation happens
//! inside [`SessionStore::with_exclusive_access`].
//!
//! # Example
//!
//! ```
//! use duel_server::{Engine, EngineConfig, MemoryStore, PlayerId, SessionStatus};
//!
//! let engine = Engine::new(MemoryStore::new(), EngineConfig::default());
//! let session = engine.create_session(PlayerId(1)).unwrap();
//! let (session, _) = engine.join_session(session.join_code().as_str(), PlayerId(2)).unwrap();
//! assert_eq!(*session.status(), SessionStatus::Ongoing);
//!
//! let session = engine.apply_move(*session.id(), PlayerId(1), 4).unwrap();
//! assert_eq!(session.board().to_compact(), "----X----");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod db;
mod engine;
mod error;
mod history;
mod http;
mod join_code;
mod ledger;
mod lifecycle;
mod resolver;
mod session;
mod store;
mod view;

pub use config::{ConfigError, EngineConfig, ServerConfig, StoreBackend, TurnPolicy};
pub use db::{DEFAULT_BUSY_TIMEOUT_MS, DbError, MIGRATIONS, SqliteStore};
pub use engine::Engine;
pub use error::{EngineError, EngineErrorKind, ErrorCategory};
pub use history::{HistoryEntry, HistoryMove};
pub use http::{
    ApiError, CreateGameRequest, HealthResponse, HistoryResponse, JoinGameRequest, MoveRequest,
    SessionMessage, SessionResponse, router,
};
pub use join_code::{CodeGenerator, RandomCodes};
pub use ledger::{Move, MoveLedger, NewMove, replay_moves};
pub use lifecycle::JoinOutcome;
pub use session::{GameId, GameSession, JOIN_CODE_LEN, JoinCode, NewSession, PlayerId, SessionStatus};
pub use store::{MemoryStore, SessionStore, SessionWriter};
pub use view::SessionView;
