//! Game session lifecycle
//!
//! [`SessionManager`] is the only component that mutates sessions. Each game
//! moves through `Created -> (HumanTurn | EngineTurn) <-> ... -> Ended`:
//!
//! | Operation             | Fails with                                             |
//! |-----------------------|--------------------------------------------------------|
//! | `start_game`          | `InvalidParameter`, `DuplicateSession`                 |
//! | `submit_move`         | `SessionNotFound`, `SessionEnded`, `NotYourTurn`, `IllegalMove`, `InvalidParameter` |
//! | `request_engine_move` | `SessionNotFound`, `SessionEnded`, `NotYourTurn`, `NoLegalMove` |
//! | `query_state`         | `SessionNotFound`                                      |
//! | `end_game`            | `SessionNotFound`                                      |
//!
//! Engine searches are CPU-bound and run on tokio's blocking pool so they do
//! not stall request handling for other games.

use std::sync::Arc;

use chess_engine::constants::{DEFAULT_SEARCH_DEPTH, MAX_SEARCH_DEPTH};
use chess_engine::move_gen::to_uci;
use chess_engine::search::{clamp_depth, find_best_move};
use chess_engine::Position;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{SessionError, SessionResult};
use crate::locks::SessionLocks;
use crate::session::{GameMode, GameSession, GameSnapshot, Players, Side};
use crate::store::{SessionStore, StoreError};

/// Depth bounds for engine searches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Depth used when a game is started without one
    pub default_depth: u8,
    /// Largest depth a game may request, at most [`MAX_SEARCH_DEPTH`]
    pub max_depth: u8,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            default_depth: DEFAULT_SEARCH_DEPTH,
            max_depth: MAX_SEARCH_DEPTH,
        }
    }
}

/// Parameters of a new game
#[derive(Debug, Clone)]
pub struct StartGame {
    /// Caller-chosen id; a UUID is generated when absent
    pub game_id: Option<String>,
    pub mode: GameMode,
    /// Human's color; required in `ai` mode, ignored in `player` mode
    pub color: Option<Side>,
    pub depth: Option<i64>,
    /// Custom starting position
    pub fen: Option<String>,
    pub players: Players,
}

impl StartGame {
    pub fn new(mode: GameMode) -> Self {
        Self {
            game_id: None,
            mode,
            color: None,
            depth: None,
            fen: None,
            players: Players::default(),
        }
    }

    pub fn with_id(mut self, game_id: impl Into<String>) -> Self {
        self.game_id = Some(game_id.into());
        self
    }

    pub fn with_color(mut self, color: Side) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_depth(mut self, depth: i64) -> Self {
        self.depth = Some(depth);
        self
    }

    pub fn with_fen(mut self, fen: impl Into<String>) -> Self {
        self.fen = Some(fen.into());
        self
    }
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    locks: SessionLocks,
    limits: SearchLimits,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, limits: SearchLimits) -> Self {
        Self {
            store,
            locks: SessionLocks::new(),
            limits,
        }
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    /// Create a game. If the engine owns the side to move, its opening move
    /// is played before the session is stored.
    pub async fn start_game(&self, request: StartGame) -> SessionResult<GameSnapshot> {
        let game_id = match request.game_id {
            Some(id) if id.trim().is_empty() => {
                return Err(SessionError::InvalidParameter(
                    "game_id must not be empty".to_string(),
                ))
            }
            Some(id) => id.trim().to_string(),
            None => Uuid::new_v4().to_string(),
        };

        let depth = match request.depth {
            None => self.limits.default_depth,
            Some(depth) if depth < 1 => {
                return Err(SessionError::InvalidParameter(format!(
                    "invalid depth {depth}, must be at least 1"
                )))
            }
            Some(depth) if depth > i64::from(self.limits.max_depth) => {
                return Err(SessionError::InvalidParameter(format!(
                    "depth cannot be greater than {}",
                    self.limits.max_depth
                )))
            }
            Some(depth) => depth as u8,
        };

        let human_color = match request.mode {
            GameMode::Ai => Some(request.color.ok_or_else(|| {
                SessionError::InvalidParameter("color is required for ai games".to_string())
            })?),
            GameMode::Player => None,
        };

        let position = match request.fen.as_deref() {
            Some(fen) => Position::from_fen(fen)?,
            None => Position::new(),
        };

        let _guard = self.locks.lock(&game_id).await;
        if self.store.get(&game_id).await?.is_some() {
            return Err(SessionError::DuplicateSession { game_id });
        }

        let mut session = GameSession::new(
            game_id,
            request.mode,
            human_color,
            depth,
            position,
            request.players,
        );

        let engine_move = if session.is_engine_turn() && !session.is_ended() {
            self.search_and_play(&mut session, depth).await?
        } else {
            None
        };

        self.store.insert(&session).await.map_err(|err| match err {
            StoreError::Duplicate(game_id) => SessionError::DuplicateSession { game_id },
            other => SessionError::Storage(other),
        })?;

        info!(
            game_id = %session.id,
            mode = %session.mode,
            human = ?session.human_color,
            depth,
            engine_move = engine_move.as_deref().unwrap_or("none"),
            "game started"
        );
        Ok(session.snapshot(engine_move))
    }

    /// Apply a human move.
    pub async fn submit_move(&self, game_id: &str, uci: &str) -> SessionResult<GameSnapshot> {
        let _guard = self.locks.lock(game_id).await;
        let mut session = self.load_active(game_id).await?;

        self.apply_human_move(&mut session, uci)?;
        self.store.put(&session).await?;

        Ok(session.snapshot(None))
    }

    /// Let the engine play its move. `depth` defaults to the game's depth and
    /// is clamped to the configured maximum.
    pub async fn request_engine_move(
        &self,
        game_id: &str,
        depth: Option<i64>,
    ) -> SessionResult<GameSnapshot> {
        let _guard = self.locks.lock(game_id).await;
        let mut session = self.load_active(game_id).await?;

        let engine_move = self.apply_engine_move(&mut session, depth).await?;
        Ok(session.snapshot(Some(engine_move)))
    }

    /// One client turn as the HTTP layer sees it.
    ///
    /// With a move: play it, then in `ai` games let the engine answer
    /// straight away unless the game just ended. Without a move: only valid
    /// when the engine is to move, which then plays.
    pub async fn play_turn(
        &self,
        game_id: &str,
        uci: Option<&str>,
        depth: Option<i64>,
    ) -> SessionResult<GameSnapshot> {
        let _guard = self.locks.lock(game_id).await;
        let mut session = self.load_active(game_id).await?;

        let Some(uci) = uci else {
            if session.is_engine_turn() {
                let engine_move = self.apply_engine_move(&mut session, depth).await?;
                return Ok(session.snapshot(Some(engine_move)));
            }
            return Err(SessionError::InvalidParameter("move is required".to_string()));
        };

        self.apply_human_move(&mut session, uci)?;
        // Persist before searching so the human move survives a failed search
        self.store.put(&session).await?;

        let engine_move = if !session.is_ended() && session.is_engine_turn() {
            Some(self.apply_engine_move(&mut session, depth).await?)
        } else {
            None
        };

        Ok(session.snapshot(engine_move))
    }

    /// Current position and outcome.
    pub async fn query_state(&self, game_id: &str) -> SessionResult<GameSnapshot> {
        self.load(game_id).await.map(|session| session.snapshot(None))
    }

    /// Remove a game.
    pub async fn end_game(&self, game_id: &str) -> SessionResult<()> {
        let _guard = self.locks.lock(game_id).await;
        if !self.store.delete(game_id).await? {
            return Err(SessionError::SessionNotFound {
                game_id: game_id.to_string(),
            });
        }
        info!(game_id, "game ended and removed");
        Ok(())
    }

    async fn load(&self, game_id: &str) -> SessionResult<GameSession> {
        self.store
            .get(game_id)
            .await?
            .ok_or_else(|| SessionError::SessionNotFound {
                game_id: game_id.to_string(),
            })
    }

    async fn load_active(&self, game_id: &str) -> SessionResult<GameSession> {
        let session = self.load(game_id).await?;
        if session.is_ended() {
            return Err(SessionError::SessionEnded {
                game_id: game_id.to_string(),
            });
        }
        Ok(session)
    }

    fn apply_human_move(&self, session: &mut GameSession, uci: &str) -> SessionResult<()> {
        if !session.is_human_turn() {
            return Err(SessionError::NotYourTurn {
                to_move: session.side_to_move(),
            });
        }

        let mv = session.position.parse_move(uci)?;
        let status = session.apply(&mv)?;
        info!(
            game_id = %session.id,
            mv = uci,
            result = %session.outcome,
            ?status,
            "human move applied"
        );
        Ok(())
    }

    /// Engine plays and the session is saved. Fails with `NoLegalMove`
    /// (after saving the terminal outcome) when there is nothing to play.
    async fn apply_engine_move(
        &self,
        session: &mut GameSession,
        depth: Option<i64>,
    ) -> SessionResult<String> {
        if session.mode != GameMode::Ai || !session.is_engine_turn() {
            return Err(SessionError::NotYourTurn {
                to_move: session.side_to_move(),
            });
        }

        let depth = match depth {
            None => session.depth,
            Some(depth) if depth < 1 => {
                return Err(SessionError::InvalidParameter(format!(
                    "invalid depth {depth}, must be at least 1"
                )))
            }
            Some(depth) => u8::try_from(depth).unwrap_or(u8::MAX),
        };
        let depth = clamp_depth(depth, self.limits.max_depth);

        let played = self.search_and_play(session, depth).await?;
        self.store.put(session).await?;

        played.ok_or_else(|| SessionError::NoLegalMove {
            game_id: session.id.clone(),
        })
    }

    /// Search the session's position and apply the chosen move. Returns
    /// `None` (with the outcome refreshed) if the search found no move.
    async fn search_and_play(
        &self,
        session: &mut GameSession,
        depth: u8,
    ) -> SessionResult<Option<String>> {
        let position = session.position.clone();
        let result = tokio::task::spawn_blocking(move || find_best_move(&position, depth))
            .await
            .map_err(|err| SessionError::Internal(format!("search task failed: {err}")))?;

        debug!(
            game_id = %session.id,
            depth,
            score = result.score,
            nodes = result.stats.nodes,
            "engine search complete"
        );

        match result.best_move {
            Some(mv) => {
                session.apply(&mv)?;
                let uci = to_uci(&mv);
                info!(game_id = %session.id, mv = %uci, result = %session.outcome, "engine move applied");
                Ok(Some(uci))
            }
            // Only a terminal position yields no move. Loaded sessions are
            // already marked ended by then; this covers a stale outcome.
            None => {
                session.refresh_outcome();
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySessionStore, SessionStore};
    use chess_engine::GameOutcome;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn manager() -> SessionManager {
        SessionManager::new(Arc::new(MemorySessionStore::new()), SearchLimits::default())
    }

    async fn ai_game(manager: &SessionManager, id: &str, human: Side, depth: i64) -> GameSnapshot {
        manager
            .start_game(
                StartGame::new(GameMode::Ai)
                    .with_id(id)
                    .with_color(human)
                    .with_depth(depth),
            )
            .await
            .expect("game starts")
    }

    #[tokio::test]
    async fn test_start_as_white_waits_for_human() {
        let manager = manager();
        let snapshot = ai_game(&manager, "g1", Side::White, 1).await;

        assert_eq!(snapshot.game_id, "g1");
        assert_eq!(snapshot.board, START_FEN);
        assert_eq!(snapshot.result, "*");
        assert_eq!(snapshot.ai_move, None);

        let state = manager.query_state("g1").await.unwrap();
        assert_eq!(state.board, START_FEN);
    }

    #[tokio::test]
    async fn test_start_as_black_engine_opens() {
        let manager = manager();
        let snapshot = ai_game(&manager, "g2", Side::Black, 1).await;

        assert_eq!(snapshot.ai_move.as_deref(), Some("b1a3"));
        assert_eq!(snapshot.turn, Side::Black);

        let state = manager.query_state("g2").await.unwrap();
        assert_eq!(state.board, snapshot.board);
        assert_eq!(state.moves, vec!["b1a3".to_string()]);
    }

    #[tokio::test]
    async fn test_start_validation() {
        let manager = manager();

        let missing_color = manager.start_game(StartGame::new(GameMode::Ai)).await;
        assert!(matches!(missing_color, Err(SessionError::InvalidParameter(_))));

        for depth in [0, -3, 11] {
            let result = manager
                .start_game(
                    StartGame::new(GameMode::Ai)
                        .with_color(Side::White)
                        .with_depth(depth),
                )
                .await;
            assert!(
                matches!(result, Err(SessionError::InvalidParameter(_))),
                "depth {depth} should be rejected"
            );
        }

        let empty_id = manager
            .start_game(StartGame::new(GameMode::Player).with_id("  "))
            .await;
        assert!(matches!(empty_id, Err(SessionError::InvalidParameter(_))));

        let bad_fen = manager
            .start_game(StartGame::new(GameMode::Player).with_fen("8/8/8/8/8/8/8/8 w - - 0 1"))
            .await;
        assert!(matches!(bad_fen, Err(SessionError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_generated_ids_are_unique() {
        let manager = manager();
        let a = manager.start_game(StartGame::new(GameMode::Player)).await.unwrap();
        let b = manager.start_game(StartGame::new(GameMode::Player)).await.unwrap();
        assert_ne!(a.game_id, b.game_id);
        assert!(Uuid::parse_str(&a.game_id).is_ok());
    }

    #[tokio::test]
    async fn test_duplicate_id_is_rejected() {
        let manager = manager();
        ai_game(&manager, "dup", Side::White, 2).await;
        let again = manager
            .start_game(StartGame::new(GameMode::Player).with_id("dup"))
            .await;
        assert!(matches!(again, Err(SessionError::DuplicateSession { .. })));
    }

    #[tokio::test]
    async fn test_submit_e2e4() {
        let manager = manager();
        ai_game(&manager, "g1", Side::White, 1).await;

        let snapshot = manager.submit_move("g1", "e2e4").await.unwrap();
        assert_eq!(
            snapshot.board,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(snapshot.turn, Side::Black);
        assert_eq!(snapshot.ai_move, None);
    }

    #[tokio::test]
    async fn test_illegal_move_leaves_position_unchanged() {
        let manager = manager();
        ai_game(&manager, "g1", Side::White, 1).await;

        let result = manager.submit_move("g1", "e2e5").await;
        assert!(matches!(result, Err(SessionError::IllegalMove { .. })));

        let malformed = manager.submit_move("g1", "e2").await;
        assert!(matches!(malformed, Err(SessionError::InvalidParameter(_))));

        let state = manager.query_state("g1").await.unwrap();
        assert_eq!(state.board, START_FEN);
        assert!(state.moves.is_empty());
    }

    #[tokio::test]
    async fn test_turn_ownership_in_ai_games() {
        let manager = manager();
        ai_game(&manager, "g1", Side::White, 1).await;

        // Engine may not move on the human's turn
        let early = manager.request_engine_move("g1", None).await;
        assert!(matches!(
            early,
            Err(SessionError::NotYourTurn {
                to_move: Side::White
            })
        ));

        manager.submit_move("g1", "e2e4").await.unwrap();

        // Human may not move on the engine's turn
        let again = manager.submit_move("g1", "e7e5").await;
        assert!(matches!(
            again,
            Err(SessionError::NotYourTurn {
                to_move: Side::Black
            })
        ));

        let reply = manager.request_engine_move("g1", Some(1)).await.unwrap();
        assert!(reply.ai_move.is_some());
        assert_eq!(reply.turn, Side::White);
    }

    #[tokio::test]
    async fn test_player_mode_has_no_engine() {
        let manager = manager();
        manager
            .start_game(StartGame::new(GameMode::Player).with_id("pvp"))
            .await
            .unwrap();

        manager.submit_move("pvp", "e2e4").await.unwrap();
        manager.submit_move("pvp", "e7e5").await.unwrap();

        let engine = manager.request_engine_move("pvp", None).await;
        assert!(matches!(engine, Err(SessionError::NotYourTurn { .. })));
    }

    #[tokio::test]
    async fn test_play_turn_gets_engine_reply() {
        let manager = manager();
        ai_game(&manager, "g1", Side::White, 1).await;

        let snapshot = manager.play_turn("g1", Some("e2e4"), None).await.unwrap();
        assert!(snapshot.ai_move.is_some());
        assert_eq!(snapshot.turn, Side::White);
        assert_eq!(snapshot.moves.len(), 2);

        let missing = manager.play_turn("g1", None, None).await;
        assert!(matches!(missing, Err(SessionError::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn test_mate_ends_the_game() {
        let manager = manager();
        manager
            .start_game(StartGame::new(GameMode::Player).with_id("fools"))
            .await
            .unwrap();

        for uci in ["f2f3", "e7e5", "g2g4"] {
            manager.submit_move("fools", uci).await.unwrap();
        }
        let mate = manager.submit_move("fools", "d8h4").await.unwrap();
        assert_eq!(mate.result, GameOutcome::Black.as_str());

        let after = manager.submit_move("fools", "a2a3").await;
        assert!(matches!(after, Err(SessionError::SessionEnded { .. })));
        let state = manager.query_state("fools").await.unwrap();
        assert_eq!(state.result, "black");
    }

    #[tokio::test]
    async fn test_engine_opens_from_custom_position() {
        let manager = manager();
        let snapshot = manager
            .start_game(
                StartGame::new(GameMode::Ai)
                    .with_id("queen")
                    .with_color(Side::Black)
                    .with_depth(1)
                    .with_fen("4k3/8/8/3q4/8/8/3Q4/4K3 w - - 0 1"),
            )
            .await
            .unwrap();

        assert_eq!(snapshot.ai_move.as_deref(), Some("d2d5"));
        assert_eq!(snapshot.board, "4k3/8/8/3Q4/8/8/8/4K3 b - - 0 1");
    }

    async fn assert_ended(manager: &SessionManager, game_id: &str) {
        assert!(matches!(
            manager.submit_move(game_id, "a2a3").await,
            Err(SessionError::SessionEnded { .. })
        ));
        assert!(matches!(
            manager.request_engine_move(game_id, None).await,
            Err(SessionError::SessionEnded { .. })
        ));
        assert!(matches!(
            manager.play_turn(game_id, None, None).await,
            Err(SessionError::SessionEnded { .. })
        ));
        assert!(matches!(
            manager.play_turn(game_id, Some("a2a3"), None).await,
            Err(SessionError::SessionEnded { .. })
        ));
    }

    #[tokio::test]
    async fn test_human_mate_ends_ai_game() {
        let manager = manager();
        manager
            .start_game(
                StartGame::new(GameMode::Ai)
                    .with_id("backrank")
                    .with_color(Side::White)
                    .with_depth(1)
                    .with_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1"),
            )
            .await
            .unwrap();

        let mate = manager.play_turn("backrank", Some("a1a8"), None).await.unwrap();
        assert_eq!(mate.result, "white");
        assert!(mate.ended);
        assert_eq!(mate.ai_move, None);

        assert_ended(&manager, "backrank").await;

        let state = manager.query_state("backrank").await.unwrap();
        assert_eq!(state.result, "white");
        assert_eq!(state.moves, vec!["a1a8".to_string()]);
    }

    #[tokio::test]
    async fn test_engine_move_ends_ai_game() {
        let manager = manager();
        // Taking the last black piece leaves king and knight against king
        let started = manager
            .start_game(
                StartGame::new(GameMode::Ai)
                    .with_id("bare")
                    .with_color(Side::Black)
                    .with_depth(1)
                    .with_fen("4k3/8/8/8/8/8/3r4/1N2K3 w - - 0 1"),
            )
            .await
            .unwrap();

        assert_eq!(started.ai_move.as_deref(), Some("b1d2"));
        assert_eq!(started.result, "draw");
        assert!(started.ended);

        assert_ended(&manager, "bare").await;
        assert_eq!(manager.query_state("bare").await.unwrap().result, "draw");
    }

    #[tokio::test]
    async fn test_engine_without_moves_records_outcome() {
        let store = Arc::new(MemorySessionStore::new());
        let manager = SessionManager::new(store.clone(), SearchLimits::default());

        // Black to move is stalemated; the stored outcome is out of date
        let mut session = GameSession::new(
            "stale".to_string(),
            GameMode::Ai,
            Some(Side::White),
            2,
            Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap(),
            Players::default(),
        );
        assert!(session.is_engine_turn());
        session.outcome = GameOutcome::InProgress;

        let result = manager.apply_engine_move(&mut session, None).await;
        assert!(matches!(result, Err(SessionError::NoLegalMove { .. })));
        assert_eq!(session.outcome, GameOutcome::Draw);

        let stored = store.get("stale").await.unwrap().expect("session saved");
        assert_eq!(stored.outcome, GameOutcome::Draw);
        assert!(stored.moves.is_empty());
    }

    #[tokio::test]
    async fn test_end_game_removes_session() {
        let manager = manager();
        ai_game(&manager, "g1", Side::White, 1).await;

        manager.end_game("g1").await.unwrap();
        assert!(matches!(
            manager.query_state("g1").await,
            Err(SessionError::SessionNotFound { .. })
        ));
        assert!(matches!(
            manager.end_game("g1").await,
            Err(SessionError::SessionNotFound { .. })
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_moves_apply_once() {
        let manager = Arc::new(manager());
        manager
            .start_game(StartGame::new(GameMode::Player).with_id("race"))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.submit_move("race", "e2e4").await })
            })
            .collect();

        let mut accepted = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert!(matches!(err, SessionError::IllegalMove { .. })),
            }
        }
        assert_eq!(accepted, 1);

        let state = manager.query_state("race").await.unwrap();
        assert_eq!(state.moves, vec!["e2e4".to_string()]);
    }
}
