//! Tests for the HTTP adapter.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use duel_server::{Engine, EngineConfig, MemoryStore, router};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(Engine::new(MemoryStore::new(), EngineConfig::default())))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        })
        .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Request failed");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_full_game_over_http() {
    let app = app();

    let (status, created) = send(&app, "POST", "/api/games", Some(json!({"creatorId": 1}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["message"], "Game created");
    let session = &created["session"];
    assert_eq!(session["status"], "waiting");
    assert_eq!(session["playerX"], 1);
    assert_eq!(session["playerO"], Value::Null);
    assert_eq!(session["board"], json!(["", "", "", "", "", "", "", "", ""]));
    assert_eq!(session["currentSymbolToMove"], "X");
    let id = session["id"].as_i64().expect("numeric id");
    let code = session["joinCode"].as_str().expect("code").to_ascii_lowercase();

    let (status, joined) = send(
        &app,
        "POST",
        "/api/games/join",
        Some(json!({"code": code, "playerId": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(joined["message"], "Joined game as player O");
    assert_eq!(joined["session"]["status"], "ongoing");
    assert_eq!(joined["session"]["playerO"], 2);

    let (status, rejoined) = send(
        &app,
        "POST",
        "/api/games/join",
        Some(json!({"code": code, "playerId": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rejoined["message"], "Rejoined game");
    assert_eq!(rejoined["session"], joined["session"]);

    let moves_uri = format!("/api/games/{id}/moves");
    let mut last = Value::Null;
    for (player, square) in [(1, 0), (2, 4), (1, 1), (2, 3), (1, 2)] {
        let (status, body) = send(
            &app,
            "POST",
            &moves_uri,
            Some(json!({"playerId": player, "square": square})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "move {square}: {body}");
        last = body;
    }

    let session = &last["session"];
    assert_eq!(session["board"], json!(["X", "X", "X", "O", "O", "", "", "", ""]));
    assert_eq!(session["status"], "finished");
    assert_eq!(session["winner"], "X");
    assert_eq!(session["winningPattern"], json!([0, 1, 2]));
    assert_eq!(session["currentSymbolToMove"], Value::Null);

    let (status, fetched) = send(&app, "GET", &format!("/api/games/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["session"], last["session"]);

    let (status, history) = send(&app, "GET", "/api/players/2/history", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history["history"][0]["moves"].as_array().map(Vec::len), Some(5));
}

#[tokio::test]
async fn test_errors_use_kind_and_status() {
    let app = app();
    let (_, created) = send(&app, "POST", "/api/games", Some(json!({"creatorId": 1}))).await;
    let id = created["session"]["id"].as_i64().expect("numeric id");
    let moves_uri = format!("/api/games/{id}/moves");

    let (status, body) = send(&app, "GET", "/api/games/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "NotFound");

    let (status, body) = send(
        &app,
        "POST",
        &moves_uri,
        Some(json!({"playerId": 5, "square": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["kind"], "NotAPlayer");

    let (status, body) = send(
        &app,
        "POST",
        &moves_uri,
        Some(json!({"playerId": 1, "square": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "InvalidSquare");

    send(&app, "POST", &moves_uri, Some(json!({"playerId": 1, "square": 4}))).await;
    let (status, body) = send(
        &app,
        "POST",
        &moves_uri,
        Some(json!({"playerId": 1, "square": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "SquareOccupied");

    let (status, body) = send(
        &app,
        "POST",
        "/api/games/join",
        Some(json!({"code": "", "playerId": 2})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "InvalidJoinCode");
}

#[tokio::test]
async fn test_malformed_requests_are_rejected() {
    let app = app();

    let (status, body) = send(&app, "POST", "/api/games", Some(json!({"creator": 1}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "InvalidRequest");

    let (status, body) = send(&app, "GET", "/api/games/not-a-number", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "InvalidRequest");
}
