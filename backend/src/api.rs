//! HTTP routes
//!
//! Thin axum layer over [`SessionManager`]. Request bodies are accepted
//! loosely (strings and raw JSON numbers) and validated here so that a bad
//! `type`, `color` or `depth` comes back as a structured `InvalidParameter`
//! instead of an extractor rejection.

use std::sync::Arc;

use axum::{
    extract::{Json, Query, State},
    routing::{get, post},
    Router,
};
use chess_engine::Position;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::debug;

use crate::error::{SessionError, SessionResult};
use crate::manager::{SessionManager, StartGame};
use crate::session::{GameMode, GameSnapshot, Players, Side};

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

#[derive(Debug, Deserialize)]
pub struct StartGameRequest {
    pub game_id: Option<String>,
    #[serde(rename = "type")]
    pub game_type: Option<String>,
    pub color: Option<String>,
    pub depth: Option<Value>,
    pub fen: Option<String>,
    pub white_player: Option<String>,
    pub black_player: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MakeMoveRequest {
    pub game_id: String,
    #[serde(rename = "move")]
    pub mv: Option<String>,
    pub depth: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct EngineMoveRequest {
    pub game_id: String,
    pub depth: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct GameIdRequest {
    pub game_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveResponse {
    pub game_id: String,
    pub board: String,
    pub result: String,
    pub ai_move: Option<String>,
}

impl From<GameSnapshot> for MoveResponse {
    fn from(snapshot: GameSnapshot) -> Self {
        Self {
            game_id: snapshot.game_id,
            board: snapshot.board,
            result: snapshot.result,
            ai_move: snapshot.ai_move,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct PvpMoveRequest {
    pub board: String,
    #[serde(rename = "move")]
    pub mv: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PvpMoveResponse {
    pub board: String,
    pub result: String,
    pub current_player: Side,
}

pub fn router(manager: Arc<SessionManager>) -> Router {
    let state = AppState { manager };

    Router::new()
        .route("/health", get(health))
        .route("/start_game", post(start_game))
        .route("/make_move", post(make_move))
        .route("/engine_move", post(engine_move))
        .route("/game_state", get(game_state))
        .route("/end_game", post(end_game))
        .route("/pvp/move", post(pvp_move))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn start_game(
    State(state): State<AppState>,
    Json(payload): Json<StartGameRequest>,
) -> SessionResult<Json<MoveResponse>> {
    let request = start_request(payload, state.manager.limits().max_depth)?;
    let snapshot = state.manager.start_game(request).await?;
    Ok(Json(snapshot.into()))
}

async fn make_move(
    State(state): State<AppState>,
    Json(payload): Json<MakeMoveRequest>,
) -> SessionResult<Json<MoveResponse>> {
    let depth = parse_depth(payload.depth.as_ref())?;
    let snapshot = state
        .manager
        .play_turn(&payload.game_id, payload.mv.as_deref(), depth)
        .await?;
    Ok(Json(snapshot.into()))
}

async fn engine_move(
    State(state): State<AppState>,
    Json(payload): Json<EngineMoveRequest>,
) -> SessionResult<Json<MoveResponse>> {
    let depth = parse_depth(payload.depth.as_ref())?;
    let snapshot = state
        .manager
        .request_engine_move(&payload.game_id, depth)
        .await?;
    Ok(Json(snapshot.into()))
}

async fn game_state(
    State(state): State<AppState>,
    Query(query): Query<GameIdRequest>,
) -> SessionResult<Json<GameSnapshot>> {
    Ok(Json(state.manager.query_state(&query.game_id).await?))
}

async fn end_game(
    State(state): State<AppState>,
    Json(payload): Json<GameIdRequest>,
) -> SessionResult<Json<MessageResponse>> {
    state.manager.end_game(&payload.game_id).await?;
    Ok(Json(MessageResponse {
        message: format!("Game {} ended", payload.game_id),
    }))
}

/// Apply a move to a client-held position without creating a session.
async fn pvp_move(Json(payload): Json<PvpMoveRequest>) -> SessionResult<Json<PvpMoveResponse>> {
    let position = Position::from_fen(&payload.board)?;
    let mv = position.parse_move(&payload.mv)?;
    let next = position.play(&mv)?;

    debug!(mv = %payload.mv, board = %next, "stateless move applied");
    Ok(Json(PvpMoveResponse {
        board: next.fen(),
        result: next.status().outcome().as_str().to_string(),
        current_player: next.turn().into(),
    }))
}

fn start_request(payload: StartGameRequest, max_depth: u8) -> SessionResult<StartGame> {
    let mode = payload
        .game_type
        .as_deref()
        .map(str::parse::<GameMode>)
        .transpose()?
        .unwrap_or(GameMode::Ai);

    // A color that is present must be valid even where it is not used
    let color = payload.color.as_deref().map(str::parse::<Side>).transpose()?;
    let color = match mode {
        GameMode::Ai => Some(color.ok_or_else(|| {
            SessionError::InvalidParameter("color is required for ai games".to_string())
        })?),
        GameMode::Player => None,
    };

    let depth = parse_depth(payload.depth.as_ref())?;
    if let Some(depth) = depth {
        if depth < 1 || depth > i64::from(max_depth) {
            return Err(SessionError::InvalidParameter(format!(
                "depth must be between 1 and {max_depth}"
            )));
        }
    }

    Ok(StartGame {
        game_id: payload.game_id,
        mode,
        color,
        depth,
        fen: payload.fen,
        players: Players {
            white: payload.white_player,
            black: payload.black_player,
        },
    })
}

/// Accept a depth given either as a JSON integer or a numeric string.
fn parse_depth(value: Option<&Value>) -> SessionResult<Option<i64>> {
    let Some(value) = value.filter(|value| !value.is_null()) else {
        return Ok(None);
    };

    let parsed = match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.map(Some).ok_or_else(|| {
        SessionError::InvalidParameter(format!("invalid depth {value}, expected an integer"))
    })
}
