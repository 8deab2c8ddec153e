use std::str::FromStr;

use async_trait::async_trait;
use chess_engine::{GameOutcome, Position};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{SessionStore, StoreError};
use crate::session::{GameMode, GameSession, Players, Side};

const CREATE_GAMES_TABLE: &str = "CREATE TABLE IF NOT EXISTS games (
    id TEXT PRIMARY KEY,
    mode TEXT NOT NULL,
    human_color TEXT,
    engine_color TEXT,
    depth INTEGER NOT NULL,
    fen TEXT NOT NULL,
    start_fen TEXT NOT NULL,
    moves TEXT NOT NULL,
    history TEXT NOT NULL,
    outcome TEXT NOT NULL,
    ended INTEGER NOT NULL,
    white_player TEXT,
    black_player TEXT,
    created_at DATETIME NOT NULL,
    updated_at DATETIME NOT NULL
);";

const SELECT_GAME: &str = "SELECT id, mode, human_color, engine_color, depth, fen, start_fen,
    moves, history, outcome, ended, white_player, black_player, created_at, updated_at
    FROM games WHERE id = ?";

const INSERT_GAME: &str = "INSERT INTO games (id, mode, human_color, engine_color, depth, fen,
    start_fen, moves, history, outcome, ended, white_player, black_player, created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

const UPSERT_GAME: &str = "INSERT OR REPLACE INTO games (id, mode, human_color, engine_color,
    depth, fen, start_fen, moves, history, outcome, ended, white_player, black_player,
    created_at, updated_at)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)";

/// Sessions persisted in an SQLite `games` table.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// Open (creating if missing) the database at `database_url` and make
    /// sure the schema exists.
    ///
    /// In-memory databases are private to a connection, so they get a pool of
    /// exactly one connection that is never recycled.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;
        info!(database_url, "connected to session database");
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the schema if needed.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_GAMES_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    async fn write(&self, statement: &str, session: &GameSession) -> Result<(), StoreError> {
        let moves = serde_json::to_string(&session.moves).map_err(|e| corrupt(&session.id, e))?;
        let history =
            serde_json::to_string(&session.history).map_err(|e| corrupt(&session.id, e))?;

        sqlx::query(statement)
            .bind(&session.id)
            .bind(session.mode.as_str())
            .bind(session.human_color.map(Side::as_str))
            .bind(session.engine_color.map(Side::as_str))
            .bind(i64::from(session.depth))
            .bind(session.position.fen())
            .bind(&session.start_fen)
            .bind(moves)
            .bind(history)
            .bind(session.outcome.as_str())
            .bind(session.is_ended())
            .bind(session.players.white.as_deref())
            .bind(session.players.black.as_deref())
            .bind(session.created_at)
            .bind(session.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn corrupt(id: &str, reason: impl ToString) -> StoreError {
    StoreError::Corrupt {
        id: id.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_side(id: &str, value: Option<String>) -> Result<Option<Side>, StoreError> {
    value
        .map(|s| s.parse::<Side>().map_err(|e| corrupt(id, e)))
        .transpose()
}

fn session_from_row(row: &SqliteRow) -> Result<GameSession, StoreError> {
    let id: String = row.try_get("id")?;

    let mode = row
        .try_get::<String, _>("mode")?
        .parse::<GameMode>()
        .map_err(|e| corrupt(&id, e))?;
    let human_color = parse_side(&id, row.try_get("human_color")?)?;
    let engine_color = parse_side(&id, row.try_get("engine_color")?)?;
    let depth = u8::try_from(row.try_get::<i64, _>("depth")?).map_err(|e| corrupt(&id, e))?;
    let position =
        Position::from_fen(&row.try_get::<String, _>("fen")?).map_err(|e| corrupt(&id, e))?;
    let moves: Vec<String> =
        serde_json::from_str(&row.try_get::<String, _>("moves")?).map_err(|e| corrupt(&id, e))?;
    let history: Vec<String> = serde_json::from_str(&row.try_get::<String, _>("history")?)
        .map_err(|e| corrupt(&id, e))?;
    let outcome = row
        .try_get::<String, _>("outcome")?
        .parse::<GameOutcome>()
        .map_err(|e| corrupt(&id, e))?;
    let ended: bool = row.try_get("ended")?;
    if ended != outcome.is_decided() {
        return Err(corrupt(
            &id,
            format!("ended flag {ended} disagrees with outcome '{outcome}'"),
        ));
    }
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(GameSession {
        mode,
        human_color,
        engine_color,
        depth,
        position,
        start_fen: row.try_get("start_fen")?,
        moves,
        history,
        outcome,
        players: Players {
            white: row.try_get("white_player")?,
            black: row.try_get("black_player")?,
        },
        created_at,
        updated_at,
        id,
    })
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, id: &str) -> Result<Option<GameSession>, StoreError> {
        debug!(game_id = id, "loading session");
        let row = sqlx::query(SELECT_GAME)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn insert(&self, session: &GameSession) -> Result<(), StoreError> {
        match self.write(INSERT_GAME, session).await {
            Ok(()) => Ok(()),
            Err(StoreError::Database(err))
                if err
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation()) =>
            {
                Err(StoreError::Duplicate(session.id.clone()))
            }
            Err(err) => Err(err),
        }
    }

    async fn put(&self, session: &GameSession) -> Result<(), StoreError> {
        debug!(game_id = %session.id, moves = session.moves.len(), "saving session");
        self.write(UPSERT_GAME, session).await?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM games WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
