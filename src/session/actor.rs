//! Actor module - per-match concurrency wrapper
//!
//! Wraps the rules engine in an actor: one exclusive lock serializes every
//! mutation, a tokio task drives the gravity tick, and each successful
//! mutation offers a snapshot to a bounded outward channel. Offers never
//! block; when the channel is saturated the stale snapshot is dropped and
//! a later one supersedes it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::{Game, GameStatus, Snapshot, StepOutcome};
use crate::session::protocol::InputType;
use crate::types::{EVENT_CHANNEL_CAPACITY, ROTATE_CCW, ROTATE_CW};

/// Events flowing from a match to its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchEvent {
    StateUpdate(Snapshot),
    GameOver { score: i32 },
}

struct MatchState {
    game: Game,
    /// Dropped exactly once, on game over or external stop. Dropping it
    /// closes the outward stream.
    events_tx: Option<mpsc::Sender<MatchEvent>>,
}

impl MatchState {
    /// Non-blocking offer of the current snapshot. A full channel drops
    /// the snapshot; a later mutation will produce a fresher one.
    fn broadcast(&mut self) {
        if self.game.status() == GameStatus::Finished {
            return;
        }
        if let Some(tx) = self.events_tx.as_ref() {
            let snapshot = self.game.snapshot();
            if tx.try_send(MatchEvent::StateUpdate(snapshot)).is_err() {
                debug!("event channel full, dropping stale snapshot");
            }
        }
    }

    /// Terminal path: deliver the game-over event and close the stream.
    /// Unlike snapshots, game over is a discrete fact rather than a
    /// superseded state, so it is sent from its own task and waits out a
    /// saturated channel instead of being dropped. The sender drops
    /// after the send, closing the stream.
    fn finish_with_game_over(&mut self) {
        let score = self.game.score();
        if let Some(tx) = self.events_tx.take() {
            tokio::spawn(async move {
                let _ = tx.send(MatchEvent::GameOver { score }).await;
            });
        }
    }

    fn apply(&mut self, outcome: StepOutcome) {
        if outcome == StepOutcome::GameOver {
            self.finish_with_game_over();
        } else if outcome.changed() {
            self.broadcast();
        }
    }
}

/// One running match: rules engine, gravity ticker and event stream.
/// Owned by exactly one session; dropped (or stopped) when the session
/// ends.
pub struct Match {
    id: String,
    state: Arc<Mutex<MatchState>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl Match {
    pub fn new(id: impl Into<String>, game: Game) -> Self {
        Self {
            id: id.into(),
            state: Arc::new(Mutex::new(MatchState {
                game,
                events_tx: None,
            })),
            ticker: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> GameStatus {
        self.lock_state().game.status()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock_state().game.snapshot()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MatchState> {
        // The lock is never held across an await, so poisoning only
        // follows a panic in the engine itself.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Start the match: spawn the first piece, open the event stream and
    /// begin the gravity ticker. Returns the receiving end of the event
    /// stream, or `None` unless the match is still Waiting; the event
    /// stream has exactly one consumer, so only the first caller gets it.
    pub fn start(&self, tick: Duration) -> Option<mpsc::Receiver<MatchEvent>> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        {
            let mut state = self.lock_state();
            if state.game.status() != GameStatus::Waiting {
                return None;
            }
            state.events_tx = Some(tx);
            state.game.start();
            state.broadcast();
        }
        info!(match_id = %self.id, tick_ms = tick.as_millis() as u64, "match started");

        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            // First gravity step lands one full interval after start.
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let mut state = match state.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                if state.game.status() != GameStatus::Running {
                    break;
                }
                let outcome = state.game.apply_gravity();
                state.apply(outcome);
            }
        });
        *self.lock_ticker() = Some(handle);

        Some(rx)
    }

    fn lock_ticker(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        match self.ticker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Route one player input into the engine. Unspecified inputs are
    /// dropped.
    pub fn handle_input(&self, input: InputType) {
        let mut state = self.lock_state();
        let outcome = match input {
            InputType::Left => state.game.move_left(),
            InputType::Right => state.game.move_right(),
            InputType::RotateCw => state.game.rotate(ROTATE_CW),
            InputType::RotateCcw => state.game.rotate(ROTATE_CCW),
            InputType::SoftDrop => state.game.apply_gravity(),
            InputType::HardDrop => state.game.hard_drop(),
            InputType::Unspecified => StepOutcome::Ignored,
        };
        state.apply(outcome);
    }

    /// Stop the match: terminal status, ticker cancelled, event stream
    /// closed. Idempotent; safe to call after a game-over already ended
    /// the match.
    pub fn stop(&self) {
        {
            let mut state = self.lock_state();
            state.game.finish();
            state.events_tx.take();
        }
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
        }
        info!(match_id = %self.id, "match stopped");
    }

    /// Whether the gravity ticker task is still alive. Test hook for
    /// leak detection.
    pub fn ticker_running(&self) -> bool {
        self.lock_ticker()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for Match {
    fn drop(&mut self) {
        if let Some(handle) = self.lock_ticker().take() {
            handle.abort();
        }
    }
}

type GameFactory = Box<dyn Fn() -> Game + Send + Sync>;

/// Live matches keyed by id. A join gets the existing match or creates a
/// fresh one; a finished match still in the map counts as absent. Entries
/// are released when their session ends, so an empty registry means no
/// leaked tickers.
pub struct MatchRegistry {
    matches: Mutex<HashMap<String, Arc<Match>>>,
    factory: GameFactory,
}

impl MatchRegistry {
    pub fn new() -> Self {
        Self::with_factory(Game::new)
    }

    /// Registry whose matches start from caller-supplied games, for
    /// scripted board or bag setups.
    pub fn with_factory(factory: impl Fn() -> Game + Send + Sync + 'static) -> Self {
        Self {
            matches: Mutex::new(HashMap::new()),
            factory: Box::new(factory),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Match>>> {
        match self.matches.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Get the match for `id`, creating it if absent. A finished match is
    /// replaced by a fresh one, so a room id can be reused after game
    /// over.
    pub fn join(&self, id: &str) -> Arc<Match> {
        let mut matches = self.lock();
        match matches.get(id) {
            Some(existing) if existing.status() != GameStatus::Finished => Arc::clone(existing),
            _ => {
                let created = Arc::new(Match::new(id, (self.factory)()));
                matches.insert(id.to_string(), Arc::clone(&created));
                created
            }
        }
    }

    /// Remove the entry for this match, unless the id has since been
    /// rebound to a different match.
    pub fn release(&self, game_match: &Arc<Match>) {
        let mut matches = self.lock();
        if let Some(existing) = matches.get(game_match.id()) {
            if Arc::ptr_eq(existing, game_match) {
                matches.remove(game_match.id());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for MatchRegistry {
    fn default() -> Self {
        Self::new()
    }
}
