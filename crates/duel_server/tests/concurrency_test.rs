//! Tests for exclusive access under concurrent requests.

mod common;

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;

use common::{CREATOR, JOINER, memory_engine, sqlite_engine, started_session};
use duel_server::{
    Engine, EngineConfig, EngineErrorKind, PlayerId, SessionStore, replay_moves,
};

const THREADS: usize = 8;

/// Runs `work(i)` on `THREADS` threads released together.
fn race<S, T, F>(engine: &Arc<Engine<S>>, work: F) -> Vec<T>
where
    S: SessionStore + 'static,
    T: Send + 'static,
    F: Fn(&Engine<S>, usize) -> T + Send + Sync + 'static,
{
    let barrier = Arc::new(Barrier::new(THREADS));
    let work = Arc::new(work);
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let engine = Arc::clone(engine);
            let barrier = Arc::clone(&barrier);
            let work = Arc::clone(&work);
            thread::spawn(move || {
                barrier.wait();
                work(&engine, i)
            })
        })
        .collect();
    handles
        .into_iter()
        .map(|h| h.join().expect("Worker panicked"))
        .collect()
}

fn concurrent_joiners_get_one_seat<S: SessionStore + 'static>(engine: Arc<Engine<S>>) {
    let session = engine.create_session(CREATOR).expect("Create failed");
    let code = session.join_code().as_str().to_string();

    let results = race(&engine, move |engine, i| {
        engine
            .join_session(&code, PlayerId(100 + i as i32))
            .map(|(session, _)| session)
    });

    let seated: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(seated.len(), 1, "exactly one joiner wins the O seat");
    for result in &results {
        if let Err(e) = result {
            assert_eq!(e.kind, EngineErrorKind::GameFull);
        }
    }

    let stored = engine.get_session(*session.id()).expect("Get failed");
    assert_eq!(stored.player_o(), seated[0].player_o());
}

fn concurrent_moves_on_one_square<S: SessionStore + 'static>(engine: Arc<Engine<S>>) {
    let session = started_session(&engine);
    let id = *session.id();

    let results = race(&engine, move |engine, i| {
        let player = if i % 2 == 0 { CREATOR } else { JOINER };
        engine.apply_move(id, player, 4)
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for result in &results {
        if let Err(e) = result {
            assert!(
                matches!(e.kind, EngineErrorKind::SquareOccupied | EngineErrorKind::MoveConflict),
                "unexpected error {e}"
            );
        }
    }
    assert_eq!(engine.store().moves(id).expect("Ledger read failed").len(), 1);
}

fn concurrent_moves_keep_ledger_consistent<S: SessionStore + 'static>(engine: Arc<Engine<S>>) {
    let session = started_session(&engine);
    let id = *session.id();

    // Each thread targets its own square; some land after the game ends.
    let results = race(&engine, move |engine, i| {
        let player = if i % 2 == 0 { CREATOR } else { JOINER };
        engine.apply_move(id, player, i as i64)
    });
    for result in &results {
        if let Err(e) = result {
            assert_eq!(e.kind, EngineErrorKind::GameFinished, "unexpected error {e}");
        }
    }

    let ledger = engine.store().moves(id).expect("Ledger read failed");
    let numbers: Vec<i32> = ledger.iter().map(|m| *m.move_number()).collect();
    let expected: Vec<i32> = (1..=ledger.len() as i32).collect();
    assert_eq!(numbers, expected);

    let squares: HashSet<_> = ledger.iter().map(|m| *m.position()).collect();
    assert_eq!(squares.len(), ledger.len());

    let stored = engine.get_session(id).expect("Get failed");
    assert_eq!(&replay_moves(&ledger).expect("Replay failed"), stored.board());
    assert_eq!(
        results.iter().filter(|r| r.is_ok()).count(),
        ledger.len()
    );
}

#[test]
fn test_memory_concurrent_joiners_get_one_seat() {
    concurrent_joiners_get_one_seat(Arc::new(memory_engine(EngineConfig::default())));
}

#[test]
fn test_sqlite_concurrent_joiners_get_one_seat() {
    let (_dir, engine) = sqlite_engine(EngineConfig::default());
    concurrent_joiners_get_one_seat(Arc::new(engine));
}

#[test]
fn test_memory_concurrent_moves_on_one_square() {
    concurrent_moves_on_one_square(Arc::new(memory_engine(EngineConfig::default())));
}

#[test]
fn test_sqlite_concurrent_moves_on_one_square() {
    let (_dir, engine) = sqlite_engine(EngineConfig::default());
    concurrent_moves_on_one_square(Arc::new(engine));
}

#[test]
fn test_memory_concurrent_moves_keep_ledger_consistent() {
    concurrent_moves_keep_ledger_consistent(Arc::new(memory_engine(EngineConfig::default())));
}

#[test]
fn test_sqlite_concurrent_moves_keep_ledger_consistent() {
    let (_dir, engine) = sqlite_engine(EngineConfig::default());
    concurrent_moves_keep_ledger_consistent(Arc::new(engine));
}

#[test]
fn test_sessions_progress_independently() {
    let engine = Arc::new(memory_engine(EngineConfig::default()));
    let ids: Vec<_> = (0..THREADS)
        .map(|_| *started_session(&engine).id())
        .collect();
    let ids = Arc::new(ids);

    let results = race(&engine, move |engine, i| engine.apply_move(ids[i], CREATOR, 4));
    assert!(results.iter().all(|r| r.is_ok()));
}
