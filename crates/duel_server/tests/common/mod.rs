//! Shared fixtures for engine integration tests.

#![allow(dead_code, unused_macros)]

use duel_server::{
    Engine, EngineConfig, GameSession, MemoryStore, PlayerId, SessionStore, SqliteStore,
};
use tempfile::TempDir;

pub const CREATOR: PlayerId = PlayerId(1);
pub const JOINER: PlayerId = PlayerId(2);
pub const STRANGER: PlayerId = PlayerId(99);

/// Engine over a fresh in-memory store.
pub fn memory_engine(config: EngineConfig) -> Engine<MemoryStore> {
    Engine::new(MemoryStore::new(), config)
}

/// Engine over a fresh SQLite file. The directory must stay in scope to
/// keep the database alive.
pub fn sqlite_engine(config: EngineConfig) -> (TempDir, Engine<SqliteStore>) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir
        .path()
        .join("duel.db")
        .to_str()
        .expect("Invalid path")
        .to_string();
    let store = SqliteStore::open(db_path, 5_000).expect("Failed to open store");
    (dir, Engine::new(store, config))
}

/// Creates a session and seats [`JOINER`] as O.
pub fn started_session<S: SessionStore>(engine: &Engine<S>) -> GameSession {
    let session = engine.create_session(CREATOR).expect("Create failed");
    let (session, _) = engine
        .join_session(session.join_code().as_str(), JOINER)
        .expect("Join failed");
    session
}

/// Runs each named scenario `fn name<S: SessionStore>(&Engine<S>)` against
/// both backends with the default configuration.
macro_rules! on_both_backends {
    ($($name:ident),* $(,)?) => {
        mod memory {
            $(
                #[test]
                fn $name() {
                    let engine = $crate::common::memory_engine(Default::default());
                    super::$name(&engine);
                }
            )*
        }

        mod sqlite {
            $(
                #[test]
                fn $name() {
                    let (_dir, engine) = $crate::common::sqlite_engine(Default::default());
                    super::$name(&engine);
                }
            )*
        }
    };
}
