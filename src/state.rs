//! Application state: session table, name pools, store client, and the
//! last-known-good leaderboard document.
//!
//! This module owns:
//!   - the session store (uuid-keyed rounds plus chat-keyed rounds)
//!   - the immutable name pools built at startup
//!   - the optional remote store client
//!   - the cached leaderboard document served when the store is unreachable
//!
//! Recording a score always merges into the cached document first; persist
//! failures are reported as warnings, never as errors, so a flaky store can
//! never block the round flow.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{error, info, instrument};

use crate::config::AppConfig;
use crate::domain::{Difficulty, GameMode, LeaderboardDoc, ScoreEntry};
use crate::engine::{Command, Event, Session};
use crate::leaderboard::{self, RankRules};
use crate::pools::{load_pools, PoolSet};
use crate::store::ScoreStore;
use uuid::Uuid;

/// What one command produced, plus everything a transport needs to render it.
#[derive(Debug)]
pub struct CommandOutcome {
    pub event: Event,
    /// Snapshot of the session after the transition.
    pub session: Session,
    /// 1-based leaderboard placement, when the round ended and was recorded.
    pub placement: Option<usize>,
    /// Store trouble the player should hear about (stale or unsaved standings).
    pub warning: Option<String>,
}

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, Session>>>,
    pub pools: Arc<PoolSet>,
    pub store: Option<ScoreStore>,
    /// Last document we successfully loaded or merged into.
    pub board: Arc<RwLock<LeaderboardDoc>>,
    pub rules: RankRules,
}

impl AppState {
    /// Build state from config: load pools, init the optional store client.
    #[instrument(level = "info", skip_all)]
    pub fn new(cfg: &AppConfig) -> Self {
        let pools = load_pools(cfg.pools.dir.as_deref());

        let store = ScoreStore::from_config(cfg.store_config().as_ref());
        if store.is_some() {
            info!(target: "pitwall_backend", "Remote leaderboard store enabled.");
        } else {
            info!(target: "pitwall_backend", "No leaderboard store configured. Standings stay in memory.");
        }

        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            pools: Arc::new(pools),
            store,
            board: Arc::new(RwLock::new(LeaderboardDoc::default())),
            rules: cfg.rules.clone(),
        }
    }

    /// Start a round and register it under a fresh session id.
    #[instrument(level = "info", skip(self, username), fields(%mode, %difficulty, timed))]
    pub async fn start_session(
        &self,
        mode: GameMode,
        difficulty: Difficulty,
        timed: bool,
        username: String,
    ) -> Result<(String, Session), String> {
        let pool = self.pools.get(mode, difficulty);
        let (session, _event) =
            Session::start(mode, difficulty, timed, username, pool, &mut rand::thread_rng())?;
        let id = Uuid::new_v4().to_string();
        self.sessions.write().await.insert(id.clone(), session.clone());
        info!(target: "quiz", session = %id, %mode, %difficulty, timed, "Round started");
        Ok((id, session))
    }

    /// Start a chat round keyed by the chat id instead of a fresh uuid: one
    /// active round per chat, and a new /play replaces the previous one.
    #[instrument(level = "info", skip(self, username), fields(session = %key, %mode, %difficulty))]
    pub async fn start_chat_session(
        &self,
        key: String,
        mode: GameMode,
        difficulty: Difficulty,
        username: String,
    ) -> Result<Session, String> {
        let pool = self.pools.get(mode, difficulty);
        let (session, _event) =
            Session::start(mode, difficulty, false, username, pool, &mut rand::thread_rng())?;
        info!(target: "quiz", session = %key, %mode, %difficulty, "Chat round started");
        self.sessions.write().await.insert(key, session.clone());
        Ok(session)
    }

    /// Apply one engine command to a stored session. When the command ends
    /// the round and the session carries a username, the final score is
    /// recorded on the leaderboard as part of the same call.
    #[instrument(level = "debug", skip(self, cmd), fields(session = %session_id))]
    pub async fn apply_command(&self, session_id: &str, cmd: Command) -> Result<CommandOutcome, String> {
        let (event, snapshot) = {
            let mut sessions = self.sessions.write().await;
            let session = sessions
                .get_mut(session_id)
                .ok_or_else(|| format!("Unknown sessionId: {}", session_id))?;
            let pool = self.pools.get(session.mode, session.difficulty);
            let event = session.apply(cmd, pool, &mut rand::thread_rng())?;
            (event, session.clone())
        };

        let mut placement = None;
        let mut warning = None;
        if let Event::Over { final_score, .. } = &event {
            if !snapshot.username.is_empty() {
                let (p, w) = self
                    .record_score(snapshot.mode, Some(snapshot.difficulty), &snapshot.username, *final_score)
                    .await;
                placement = p;
                warning = w;
            }
        }

        Ok(CommandOutcome { event, session: snapshot, placement, warning })
    }

    pub async fn has_session(&self, session_id: &str) -> bool {
        self.sessions.read().await.contains_key(session_id)
    }

    pub async fn remove_session(&self, session_id: &str) {
        self.sessions.write().await.remove(session_id);
    }

    /// Load-merge-persist one result. Returns the 1-based placement (if the
    /// row made the table) and an optional player-facing warning.
    #[instrument(level = "info", skip(self, username), fields(%mode, difficulty = ?difficulty, score))]
    pub async fn record_score(
        &self,
        mode: GameMode,
        difficulty: Option<Difficulty>,
        username: &str,
        score: u32,
    ) -> (Option<usize>, Option<String>) {
        let mut warning = None;

        // Freshest remote copy first so we merge against other players'
        // recent results; on failure merge into the cached document.
        let mut doc = match &self.store {
            Some(store) => match store.load().await {
                Ok(doc) => doc,
                Err(e) => {
                    error!(target: "quiz", error = %e, "Leaderboard load failed; merging into cached standings");
                    warning = Some("Leaderboard is unreachable; standings may be stale.".to_string());
                    self.board.read().await.clone()
                }
            },
            None => self.board.read().await.clone(),
        };

        let placement = leaderboard::merge(&mut doc, mode, difficulty, username, score, &self.rules);
        *self.board.write().await = doc.clone();

        if let Some(store) = &self.store {
            if let Err(e) = store.persist(&doc).await {
                error!(target: "quiz", error = %e, "Leaderboard persist failed; result kept in memory only");
                warning = Some("Your result could not be saved remotely.".to_string());
            }
        }

        info!(target: "quiz", user = %username, %mode, score, placement = ?placement, "Score recorded");
        (placement, warning)
    }

    /// Current standings for one mode, refreshed from the store when
    /// possible. Serves the cached (possibly empty) document with a warning
    /// on store trouble, never an error.
    #[instrument(level = "info", skip(self), fields(%mode))]
    pub async fn standings(&self, mode: GameMode) -> (Vec<ScoreEntry>, Option<String>) {
        let mut warning = None;
        if let Some(store) = &self.store {
            match store.load().await {
                Ok(doc) => {
                    *self.board.write().await = doc;
                }
                Err(e) => {
                    error!(target: "quiz", error = %e, "Leaderboard load failed; serving cached standings");
                    warning = Some("Leaderboard is unreachable; showing the last known standings.".to_string());
                }
            }
        }
        let entries = { self.board.read().await.entries(mode).clone() };
        (entries, warning)
    }
}
