//! HTTP adapter over the engine.
//!
//! Player identity comes from the request body or path; authenticating it
//! is left to whatever sits in front of this router. Engine calls block on
//! storage, so each runs on tokio's blocking pool.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tracing::{debug, error, instrument, warn};

use crate::{
    Engine, EngineError, ErrorCategory, GameId, HistoryEntry, JoinOutcome, PlayerId, SessionStore,
    SessionView,
};

/// Builds the API router.
#[instrument(skip(engine))]
pub fn router<S>(engine: Arc<Engine<S>>) -> Router
where
    S: SessionStore + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/api/games", post(create_game::<S>))
        .route("/api/games/join", post(join_game::<S>))
        .route("/api/games/{id}", get(get_game::<S>))
        .route("/api/games/{id}/moves", post(make_move::<S>))
        .route("/api/players/{player_id}/history", get(player_history::<S>))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(engine)
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"`.
    pub status: String,
}

/// Body of `POST /api/games`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGameRequest {
    /// Player opening the session.
    pub creator_id: PlayerId,
}

/// Body of `POST /api/games/join`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    /// Join code as typed by the player.
    pub code: String,
    /// Player joining.
    pub player_id: PlayerId,
}

/// Body of `POST /api/games/{id}/moves`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    /// Player moving.
    pub player_id: PlayerId,
    /// Target square, 0-8 in row-major order.
    pub square: i64,
}

/// Session with a human-readable note.
#[derive(Debug, Clone, Serialize)]
pub struct SessionMessage {
    /// What happened.
    pub message: String,
    /// Resulting session.
    pub session: SessionView,
}

/// Bare session response.
#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    /// Current session.
    pub session: SessionView,
}

/// History response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    /// Sessions oldest first.
    pub history: Vec<HistoryEntry>,
}

/// Error returned by every handler, rendered as `{"error": {"kind", "message"}}`.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    kind: String,
    message: String,
}

impl ApiError {
    fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "InvalidRequest".to_string(),
            message: message.into(),
        }
    }
}

fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::Validation | ErrorCategory::Conflict | ErrorCategory::GameFinished => {
            StatusCode::BAD_REQUEST
        }
        ErrorCategory::NotFound => StatusCode::NOT_FOUND,
        ErrorCategory::Forbidden => StatusCode::FORBIDDEN,
        ErrorCategory::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self {
            status: status_for(err.category()),
            kind: err.kind.to_string(),
            message: err.message,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::invalid_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            error!(status = %self.status, kind = %self.kind, message = %self.message, "Request failed");
        } else {
            warn!(status = %self.status, kind = %self.kind, message = %self.message, "Request rejected");
        }
        (
            self.status,
            Json(serde_json::json!({
                "error": {
                    "kind": self.kind,
                    "message": self.message,
                }
            })),
        )
            .into_response()
    }
}

/// Runs an engine call on the blocking pool.
async fn blocking<S, T, F>(engine: Arc<Engine<S>>, call: F) -> Result<T, ApiError>
where
    S: SessionStore + 'static,
    T: Send + 'static,
    F: FnOnce(&Engine<S>) -> Result<T, EngineError> + Send + 'static,
{
    let result = tokio::task::spawn_blocking(move || call(&engine))
        .await
        .map_err(|e| EngineError::storage(format!("Engine task failed: {e}")))?;
    Ok(result?)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

#[instrument(skip_all)]
async fn create_game<S: SessionStore + 'static>(
    State(engine): State<Arc<Engine<S>>>,
    body: Result<Json<CreateGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionMessage>), ApiError> {
    let Json(request) = body?;
    debug!(creator = %request.creator_id, "Create game request");
    let session = blocking(engine, move |e| e.create_session(request.creator_id)).await?;
    Ok((
        StatusCode::CREATED,
        Json(SessionMessage {
            message: "Game created".to_string(),
            session: SessionView::from(&session),
        }),
    ))
}

#[instrument(skip_all)]
async fn join_game<S: SessionStore + 'static>(
    State(engine): State<Arc<Engine<S>>>,
    body: Result<Json<JoinGameRequest>, JsonRejection>,
) -> Result<Json<SessionMessage>, ApiError> {
    let Json(request) = body?;
    debug!(player = %request.player_id, "Join game request");
    let (session, outcome) = blocking(engine, move |e| {
        e.join_session(&request.code, request.player_id)
    })
    .await?;
    let message = match outcome {
        JoinOutcome::Joined => "Joined game as player O",
        JoinOutcome::Rejoined => "Rejoined game",
    };
    Ok(Json(SessionMessage {
        message: message.to_string(),
        session: SessionView::from(&session),
    }))
}

#[instrument(skip_all)]
async fn get_game<S: SessionStore + 'static>(
    State(engine): State<Arc<Engine<S>>>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Path(id) = id?;
    let session = blocking(engine, move |e| e.get_session(GameId(id))).await?;
    Ok(Json(SessionResponse {
        session: SessionView::from(&session),
    }))
}

#[instrument(skip_all)]
async fn make_move<S: SessionStore + 'static>(
    State(engine): State<Arc<Engine<S>>>,
    id: Result<Path<i32>, PathRejection>,
    body: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<SessionResponse>, ApiError> {
    let Path(id) = id?;
    let Json(request) = body?;
    debug!(game_id = id, player = %request.player_id, square = request.square, "Move request");
    let session = blocking(engine, move |e| {
        e.apply_move(GameId(id), request.player_id, request.square)
    })
    .await?;
    Ok(Json(SessionResponse {
        session: SessionView::from(&session),
    }))
}

#[instrument(skip_all)]
async fn player_history<S: SessionStore + 'static>(
    State(engine): State<Arc<Engine<S>>>,
    player_id: Result<Path<i32>, PathRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Path(player_id) = player_id?;
    let history = blocking(engine, move |e| e.history(PlayerId(player_id))).await?;
    Ok(Json(HistoryResponse { history }))
}
