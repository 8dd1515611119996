//! Tests for the session store contract, run against both backends.

use chrono::Utc;
use duel_board::{Position, Symbol};
use duel_server::{
    EngineError, EngineErrorKind, GameSession, JoinCode, MemoryStore, NewMove, NewSession,
    PlayerId, SessionStore, SqliteStore,
};
use tempfile::TempDir;

fn open_sqlite(dir: &TempDir) -> SqliteStore {
    let path = dir.path().join("store.db");
    SqliteStore::open(path.to_str().expect("Invalid path"), 5_000).expect("Open failed")
}

fn new_session(code: &str) -> NewSession {
    session_for(code, PlayerId(1))
}

fn session_for(code: &str, creator: PlayerId) -> NewSession {
    NewSession::new(
        JoinCode::parse(code).expect("Valid code"),
        creator,
        Utc::now().naive_utc(),
    )
}

fn entry(number: i32, symbol: Symbol, position: Position) -> NewMove {
    NewMove::new(number, PlayerId(1), symbol, position, Utc::now().naive_utc())
}

fn check_create_and_lookup(store: &impl SessionStore) {
    let created = store.create(new_session("ABC123")).expect("Create failed");
    let by_id = store.get_by_id(*created.id()).expect("Lookup failed");
    let by_code = store
        .get_by_code(&JoinCode::parse("abc123").expect("Valid code"))
        .expect("Lookup failed");
    assert_eq!(by_id.as_ref(), Some(&created));
    assert_eq!(by_code.as_ref(), Some(&created));

    let err = store
        .create(new_session("ABC123"))
        .expect_err("Duplicate code");
    assert_eq!(err.kind, EngineErrorKind::CodeTaken);

    let missing = store
        .get_by_code(&JoinCode::parse("FFFFFF").expect("Valid code"))
        .expect("Lookup failed");
    assert!(missing.is_none());
}

fn check_failed_section_discards_writes(store: &impl SessionStore) {
    let created = store.create(new_session("D15CA2")).expect("Create failed");
    let id = *created.id();

    let err = store
        .with_exclusive_access(id, |session, writer| -> Result<(), EngineError> {
            writer.append(id, entry(1, Symbol::X, Position::Center))?;
            writer.save(&session)?;
            Err(EngineError::new(EngineErrorKind::GameFinished, "abort"))
        })
        .expect_err("Section aborts");
    assert_eq!(err.kind, EngineErrorKind::GameFinished);

    assert!(store.moves(id).expect("Ledger read failed").is_empty());
    assert_eq!(store.get_by_id(id).expect("Lookup failed"), Some(created));
}

fn check_ledger_uniqueness(store: &impl SessionStore) {
    let created = store.create(new_session("0DD123")).expect("Create failed");
    let id = *created.id();

    let result: Result<GameSession, EngineError> = store.with_exclusive_access(id, |session, writer| {
        writer.append(id, entry(1, Symbol::X, Position::Center))?;
        let taken = writer
            .append(id, entry(2, Symbol::O, Position::Center))
            .expect_err("Square reused");
        assert_eq!(taken.kind, EngineErrorKind::SquareOccupied);
        let renumbered = writer
            .append(id, entry(1, Symbol::O, Position::TopLeft))
            .expect_err("Move number reused");
        assert_eq!(renumbered.kind, EngineErrorKind::MoveConflict);
        assert_eq!(writer.replay(id)?.to_compact(), "----X----");
        Ok(session)
    });
    result.expect("Section failed");

    let ledger = store.moves(id).expect("Ledger read failed");
    assert_eq!(ledger.len(), 1);
    assert_eq!(*ledger[0].position(), Position::Center);
}

fn check_missing_session(store: &impl SessionStore) {
    let err = store
        .with_exclusive_access(duel_server::GameId(9_999), |session, _| Ok(session))
        .expect_err("No such session");
    assert_eq!(err.kind, EngineErrorKind::NotFound);
}

fn check_history_is_ordered(store: &impl SessionStore) {
    let first = store
        .create(session_for("AAAAA1", PlayerId(7)))
        .expect("Create failed");
    store
        .create(session_for("AAAAA2", PlayerId(50)))
        .expect("Create failed");
    let second = store
        .create(session_for("AAAAA3", PlayerId(7)))
        .expect("Create failed");

    let history = store.history_for_player(PlayerId(7)).expect("History failed");
    let ids: Vec<_> = history.iter().map(|(s, _)| *s.id()).collect();
    assert_eq!(ids, vec![*first.id(), *second.id()]);
}

fn run_all(store: &impl SessionStore) {
    check_create_and_lookup(store);
    check_failed_section_discards_writes(store);
    check_ledger_uniqueness(store);
    check_missing_session(store);
    check_history_is_ordered(store);
}

#[test]
fn test_memory_store_contract() {
    run_all(&MemoryStore::new());
}

#[test]
fn test_sqlite_store_contract() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    run_all(&open_sqlite(&dir));
}

#[test]
fn test_sqlite_data_survives_reopen() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let created = open_sqlite(&dir)
        .create(new_session("CAFE01"))
        .expect("Create failed");

    let reopened = open_sqlite(&dir);
    assert_eq!(
        reopened.run_migrations().expect("Migrations failed"),
        0,
        "schema already current"
    );
    assert_eq!(
        reopened.get_by_id(*created.id()).expect("Lookup failed"),
        Some(created)
    );
}

#[test]
fn test_sqlite_open_fails_for_unreachable_path() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("missing").join("nested").join("duel.db");
    let err = SqliteStore::open(path.to_str().expect("Invalid path"), 5_000)
        .expect_err("Parent directory is missing");
    assert!(err.message.starts_with("Connection error"), "{err}");
}
