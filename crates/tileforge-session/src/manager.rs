//! The session store: every live game, keyed by id.
//!
//! # Concurrency
//!
//! The map is split into shards, each behind its own `RwLock`. A shard
//! lock is held only long enough to look up or insert a game's handle;
//! the game itself sits behind a per-game `Mutex`. So:
//!
//! - two requests for the **same** game serialize on that game's mutex,
//!   and the second sees the fully applied result of the first;
//! - requests for **different** games never wait on each other, apart
//!   from a brief shared read of a shard.
//!
//! Each game also owns its tile generator, so no RNG is shared either.

use std::collections::HashMap;
use std::collections::hash_map::{Entry, RandomState};
use std::hash::BuildHasher;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard, RwLock};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tileforge_board::Direction;
use tileforge_protocol::GameId;

use crate::{GameState, SessionConfig, SessionError};

/// A live game plus what it needs to keep playing.
struct GameSession {
    state: GameState,
    rng: StdRng,
    last_touched: Instant,
    /// Set once the game has left the map. A request that fetched the
    /// handle before that must not act on it.
    evicted: bool,
}

impl GameSession {
    fn new(state: GameState, rng: StdRng) -> Self {
        Self {
            state,
            rng,
            last_touched: Instant::now(),
            evicted: false,
        }
    }

    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }
}

type SessionHandle = Arc<Mutex<GameSession>>;
type SessionGuard<'a> = MutexGuard<'a, GameSession>;
type Shard = RwLock<HashMap<GameId, SessionHandle>>;

/// Owns all live games and serializes mutation per game.
///
/// ## Lifecycle
///
/// ```text
/// create() ──→ [Created] ──apply_move()──→ [InProgress] ──→ [Won] / [Over]
///                  ↑                                            │
///                  └────────────────── restart() ───────────────┘
///
/// idle for idle_ttl ──→ evict_idle() ──→ gone (NotFound)
/// ```
///
/// All methods take `&self`; share the store with `Arc<SessionStore>`.
pub struct SessionStore {
    shards: Box<[Shard]>,
    hasher: RandomState,
    config: SessionConfig,
    /// Live game count, used for the capacity check.
    live: AtomicUsize,
    /// Games created so far; offsets `rng_seed` per game.
    seeded: AtomicU64,
}

impl SessionStore {
    /// Creates an empty store.
    pub fn new(config: SessionConfig) -> Self {
        let shards = (0..config.shards.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();
        Self {
            shards,
            hasher: RandomState::new(),
            config,
            live: AtomicUsize::new(0),
            seeded: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Starts a new game with a fresh id.
    ///
    /// `size` of `None` uses the configured default.
    ///
    /// # Errors
    /// - [`SessionError::InvalidSize`] — size outside the configured range
    /// - [`SessionError::CapacityExceeded`] — `max_sessions` games are live
    pub fn create(&self, size: Option<i64>) -> Result<GameState, SessionError> {
        let size = self.config.resolve_size(size)?;
        let mut rng = self.next_rng();
        self.reserve_slot()?;

        let mut id = GameId::generate();
        loop {
            let mut shard = self.shard(&id).write();
            if let Entry::Vacant(entry) = shard.entry(id.clone()) {
                let state = match GameState::new(id.clone(), size, &mut rng) {
                    Ok(state) => state,
                    Err(e) => {
                        drop(shard);
                        self.release_slots(1);
                        return Err(e.into());
                    }
                };
                entry.insert(Arc::new(Mutex::new(GameSession::new(state.clone(), rng))));
                tracing::info!(game_id = %id, size, "game created");
                return Ok(state);
            }
            drop(shard);
            id = GameId::generate();
        }
    }

    /// Returns the current state of a game.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no game has this id.
    pub fn get(&self, id: &GameId) -> Result<GameState, SessionError> {
        let handle = self.handle(id)?;
        let mut session = lock_live(&handle, id)?;
        session.touch();
        Ok(session.state.clone())
    }

    /// Applies one move to a game and returns its new state.
    ///
    /// A move that changes nothing is not an error: the unchanged state
    /// comes back and no tile is spawned.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] — unknown id
    /// - [`SessionError::MoveRejected`] — the game is `over`, or `won`
    ///   while `continue_after_win` is off
    pub fn apply_move(
        &self,
        id: &GameId,
        direction: Direction,
    ) -> Result<GameState, SessionError> {
        let handle = self.handle(id)?;
        self.apply_to(&handle, id, direction)
    }

    /// Applies a move through a handle fetched earlier.
    fn apply_to(
        &self,
        handle: &SessionHandle,
        id: &GameId,
        direction: Direction,
    ) -> Result<GameState, SessionError> {
        let mut guard = lock_live(handle, id)?;
        let session = &mut *guard;

        let phase = session.state.phase();
        if !phase.accepts_moves(self.config.continue_after_win) {
            tracing::debug!(game_id = %id, %phase, %direction, "move rejected");
            return Err(SessionError::MoveRejected {
                id: id.clone(),
                phase,
            });
        }

        let report = session
            .state
            .apply(direction, &mut session.rng, self.config.win_tile);
        session.touch();

        let state = &session.state;
        tracing::debug!(
            game_id = %id,
            %direction,
            moved = report.moved,
            score_delta = report.score_delta,
            score = state.score,
            "move applied"
        );
        if report.just_won {
            tracing::info!(game_id = %id, score = state.score, moves = state.moves, "game won");
        }
        if report.just_over {
            tracing::info!(game_id = %id, score = state.score, moves = state.moves, "game over");
        }

        Ok(state.clone())
    }

    /// Replaces a game with a fresh board of the given size, keeping its id.
    ///
    /// If no game has this id yet, a new one is started under it.
    ///
    /// # Errors
    /// - [`SessionError::InvalidSize`] — size outside the configured range
    /// - [`SessionError::CapacityExceeded`] — the id is new and
    ///   `max_sessions` games are live
    pub fn restart(
        &self,
        id: &GameId,
        size: Option<i64>,
    ) -> Result<GameState, SessionError> {
        let size = self.config.resolve_size(size)?;

        loop {
            // A game evicted between lookup and lock is gone from the map,
            // so the next pass creates a fresh one under the same id.
            if let Some(handle) = self.lookup(id) {
                match self.reset(&handle, id, size) {
                    Err(SessionError::NotFound(_)) => {}
                    result => return result,
                }
            }

            let mut rng = self.next_rng();
            let state = GameState::new(id.clone(), size, &mut rng)?;
            self.reserve_slot()?;

            let inserted = match self.shard(id).write().entry(id.clone()) {
                Entry::Occupied(_) => false,
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(Mutex::new(GameSession::new(state.clone(), rng))));
                    true
                }
            };
            if inserted {
                tracing::info!(game_id = %id, size, "game created on restart of unknown id");
                return Ok(state);
            }
            // Another request bound this id first; restart that game instead.
            self.release_slots(1);
        }
    }

    /// Removes a game, returning its final state.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if no game has this id.
    pub fn remove(&self, id: &GameId) -> Result<GameState, SessionError> {
        let handle = self
            .shard(id)
            .write()
            .remove(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        self.release_slots(1);
        tracing::info!(game_id = %id, "game removed");
        let mut session = handle.lock();
        session.evicted = true;
        Ok(session.state.clone())
    }

    /// Removes every game that has not been touched for longer than `ttl`.
    ///
    /// Games whose lock is held right now are in use and are skipped.
    /// Returns the ids that were removed.
    pub fn evict_idle(&self, ttl: Duration) -> Vec<GameId> {
        let mut evicted = Vec::new();
        for shard in self.shards.iter() {
            shard.write().retain(|id, handle| {
                let idle = handle.try_lock().is_some_and(|mut session| {
                    let idle = session.last_touched.elapsed() > ttl;
                    session.evicted |= idle;
                    idle
                });
                if idle {
                    evicted.push(id.clone());
                }
                !idle
            });
        }

        if !evicted.is_empty() {
            self.release_slots(evicted.len());
            tracing::info!(
                evicted = evicted.len(),
                remaining = self.len(),
                "evicted idle games"
            );
        }
        evicted
    }

    /// Returns `true` if a game with this id exists.
    pub fn contains(&self, id: &GameId) -> bool {
        self.shard(id).read().contains_key(id)
    }

    /// Number of live games.
    pub fn len(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Returns `true` if there are no games.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- internals ----------------------------------------------------------

    fn shard(&self, id: &GameId) -> &Shard {
        let index = self.hasher.hash_one(id) as usize % self.shards.len();
        &self.shards[index]
    }

    fn lookup(&self, id: &GameId) -> Option<SessionHandle> {
        self.shard(id).read().get(id).cloned()
    }

    fn handle(&self, id: &GameId) -> Result<SessionHandle, SessionError> {
        self.lookup(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))
    }

    /// Rebuilds a game in place under its own lock.
    fn reset(
        &self,
        handle: &SessionHandle,
        id: &GameId,
        size: usize,
    ) -> Result<GameState, SessionError> {
        let mut guard = lock_live(handle, id)?;
        let session = &mut *guard;
        let previous = session.state.phase();
        session.state = GameState::new(session.state.id.clone(), size, &mut session.rng)?;
        session.touch();
        tracing::info!(game_id = %session.state.id, size, %previous, "game restarted");
        Ok(session.state.clone())
    }

    fn next_rng(&self) -> StdRng {
        match self.config.rng_seed {
            Some(seed) => {
                let n = self.seeded.fetch_add(1, Ordering::Relaxed);
                StdRng::seed_from_u64(seed.wrapping_add(n))
            }
            None => StdRng::from_os_rng(),
        }
    }

    fn reserve_slot(&self) -> Result<(), SessionError> {
        let max = self.config.max_sessions;
        self.live
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < max).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| {
                tracing::warn!(max_sessions = max, "session capacity reached");
                SessionError::CapacityExceeded(max)
            })
    }

    fn release_slots(&self, count: usize) {
        self.live.fetch_sub(count, Ordering::AcqRel);
    }
}

/// Locks a game, refusing one that has already left the map.
fn lock_live<'a>(handle: &'a SessionHandle, id: &GameId) -> Result<SessionGuard<'a>, SessionError> {
    let session = handle.lock();
    if session.evicted {
        return Err(SessionError::NotFound(id.clone()));
    }
    Ok(session)
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for `SessionStore`, named
    //! `test_{function}_{scenario}_{expected}`.
    //!
    //! Stores are seeded so tile placement is reproducible. Time-based
    //! eviction uses a zero TTL (everything idle) or an hour (nothing idle)
    //! instead of sleeping.

    use tileforge_board::{Board, GamePhase};

    use super::*;

    fn seeded_store() -> SessionStore {
        SessionStore::new(SessionConfig {
            rng_seed: Some(2048),
            ..SessionConfig::default()
        })
    }

    fn gid(raw: &str) -> GameId {
        GameId::parse(raw).unwrap()
    }

    /// Overwrites a game's board directly, for setting up end states.
    fn force_board(store: &SessionStore, id: &GameId, rows: Vec<Vec<u64>>) {
        let handle = store.handle(id).unwrap();
        let mut session = handle.lock();
        let score = session.state.score;
        session.state = GameState::from_board(
            id.clone(),
            Board::from_rows(rows).unwrap(),
            score,
            store.config().win_tile,
        );
        session.state.moves = 1;
    }

    // =====================================================================
    // create()
    // =====================================================================

    #[test]
    fn test_create_default_size_two_tiles_zero_score() {
        let store = seeded_store();

        let game = store.create(None).unwrap();

        assert_eq!(game.size(), 4);
        assert_eq!(game.board.tile_count(), 2);
        assert_eq!(game.score, 0);
        assert!(!game.won && !game.over);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_create_each_game_gets_unique_id() {
        let store = seeded_store();
        let a = store.create(Some(3)).unwrap();
        let b = store.create(Some(3)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_create_invalid_size_returns_error_and_stores_nothing() {
        let store = seeded_store();

        let result = store.create(Some(9));

        assert!(matches!(result, Err(SessionError::InvalidSize { size: 9, .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn test_create_seeded_store_matches_seeded_game() {
        let store = seeded_store();
        let game = store.create(Some(5)).unwrap();

        let mut rng = StdRng::seed_from_u64(2048);
        let expected = GameState::new(game.id.clone(), 5, &mut rng).unwrap();

        assert_eq!(game.board, expected.board);
    }

    #[test]
    fn test_create_over_capacity_returns_capacity_exceeded() {
        let store = SessionStore::new(SessionConfig {
            max_sessions: 2,
            ..SessionConfig::default()
        });
        store.create(None).unwrap();
        store.create(None).unwrap();

        let result = store.create(None);

        assert!(matches!(result, Err(SessionError::CapacityExceeded(2))));
        assert_eq!(store.len(), 2);
    }

    // =====================================================================
    // get()
    // =====================================================================

    #[test]
    fn test_get_unknown_id_returns_not_found() {
        let store = seeded_store();
        let result = store.get(&gid("missing"));
        assert!(matches!(result, Err(SessionError::NotFound(ref id)) if id.as_str() == "missing"));
    }

    #[test]
    fn test_get_returns_what_create_returned() {
        let store = seeded_store();
        let created = store.create(None).unwrap();
        assert_eq!(store.get(&created.id).unwrap(), created);
    }

    // =====================================================================
    // apply_move()
    // =====================================================================

    #[test]
    fn test_apply_move_unknown_id_returns_not_found() {
        let store = seeded_store();
        let result = store.apply_move(&gid("nope"), Direction::Up);
        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_apply_move_merges_and_persists() {
        let store = seeded_store();
        let id = store.create(Some(4)).unwrap().id;
        force_board(
            &store,
            &id,
            vec![
                vec![2, 2, 4, 0],
                vec![0, 0, 0, 0],
                vec![0, 0, 0, 0],
                vec![0, 0, 0, 0],
            ],
        );

        let after = store.apply_move(&id, Direction::Left).unwrap();

        assert_eq!(&after.board.rows()[0][..2], &[4, 4]);
        assert_eq!(after.score, 4);
        assert_eq!(after.board.tile_count(), 3, "two tiles after merge plus one spawn");
        assert_eq!(store.get(&id).unwrap(), after);
    }

    #[test]
    fn test_apply_move_blocked_direction_returns_unchanged_state() {
        let store = seeded_store();
        let id = store.create(Some(3)).unwrap().id;
        force_board(&store, &id, vec![vec![2, 4, 8], vec![0, 0, 0], vec![0, 0, 0]]);
        let before = store.get(&id).unwrap();

        let after = store.apply_move(&id, Direction::Up).unwrap();

        assert_eq!(after, before);
    }

    #[test]
    fn test_apply_move_after_over_returns_move_rejected() {
        let store = seeded_store();
        let id = store.create(Some(3)).unwrap().id;
        force_board(&store, &id, vec![vec![2, 4, 2], vec![4, 2, 4], vec![2, 4, 2]]);
        assert!(store.get(&id).unwrap().over);

        let result = store.apply_move(&id, Direction::Left);

        assert!(matches!(
            result,
            Err(SessionError::MoveRejected { phase: GamePhase::Over, .. })
        ));
    }

    #[test]
    fn test_apply_move_after_won_returns_move_rejected() {
        let store = seeded_store();
        let id = store.create(Some(3)).unwrap().id;
        force_board(&store, &id, vec![vec![2048, 0, 0], vec![0, 0, 0], vec![0, 0, 2]]);

        let result = store.apply_move(&id, Direction::Left);

        assert!(matches!(
            result,
            Err(SessionError::MoveRejected { phase: GamePhase::Won, .. })
        ));
    }

    #[test]
    fn test_apply_move_after_won_allowed_when_continuing() {
        let store = SessionStore::new(SessionConfig {
            continue_after_win: true,
            rng_seed: Some(1),
            ..SessionConfig::default()
        });
        let id = store.create(Some(3)).unwrap().id;
        force_board(&store, &id, vec![vec![2048, 0, 0], vec![0, 0, 0], vec![0, 0, 2]]);

        let after = store.apply_move(&id, Direction::Left).unwrap();

        assert!(after.won, "won stays set while play continues");
        assert_eq!(after.board.get(2, 0), 2);
    }

    #[test]
    fn test_apply_move_rejected_request_leaves_state_intact() {
        let store = seeded_store();
        let id = store.create(Some(3)).unwrap().id;
        force_board(&store, &id, vec![vec![2, 4, 2], vec![4, 2, 4], vec![2, 4, 2]]);
        let before = store.get(&id).unwrap();

        let _ = store.apply_move(&id, Direction::Down);

        assert_eq!(store.get(&id).unwrap(), before);
    }

    // =====================================================================
    // restart()
    // =====================================================================

    #[test]
    fn test_restart_existing_keeps_id_and_resets() {
        let store = seeded_store();
        let id = store.create(Some(4)).unwrap().id;
        force_board(
            &store,
            &id,
            vec![
                vec![2048, 4, 8, 16],
                vec![0, 0, 0, 0],
                vec![0, 0, 0, 0],
                vec![0, 0, 0, 0],
            ],
        );

        let fresh = store.restart(&id, Some(5)).unwrap();

        assert_eq!(fresh.id, id);
        assert_eq!(fresh.size(), 5);
        assert_eq!(fresh.board.tile_count(), 2);
        assert_eq!(fresh.score, 0);
        assert!(!fresh.won && !fresh.over);
        assert_eq!(fresh.phase(), GamePhase::Created);
        assert_eq!(store.get(&id).unwrap(), fresh);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_restart_unknown_id_creates_game_under_that_id() {
        let store = seeded_store();
        let id = gid("client-chosen-id");

        let game = store.restart(&id, None).unwrap();

        assert_eq!(game.id, id);
        assert_eq!(game.size(), 4);
        assert!(store.contains(&id));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_restart_invalid_size_leaves_game_untouched() {
        let store = seeded_store();
        let created = store.create(Some(4)).unwrap();

        let result = store.restart(&created.id, Some(1));

        assert!(matches!(result, Err(SessionError::InvalidSize { .. })));
        assert_eq!(store.get(&created.id).unwrap(), created);
    }

    // =====================================================================
    // remove() / evict_idle()
    // =====================================================================

    #[test]
    fn test_remove_then_get_returns_not_found() {
        let store = seeded_store();
        let id = store.create(None).unwrap().id;

        store.remove(&id).unwrap();

        assert!(matches!(store.get(&id), Err(SessionError::NotFound(_))));
        assert!(store.is_empty());
        assert!(matches!(store.remove(&id), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_evict_idle_zero_ttl_removes_everything() {
        let store = seeded_store();
        let a = store.create(None).unwrap().id;
        let b = store.create(None).unwrap().id;
        std::thread::sleep(Duration::from_millis(2));

        let mut evicted = store.evict_idle(Duration::ZERO);
        evicted.sort_by(|x, y| x.as_str().cmp(y.as_str()));
        let mut expected = vec![a, b];
        expected.sort_by(|x, y| x.as_str().cmp(y.as_str()));

        assert_eq!(evicted, expected);
        assert!(store.is_empty());
    }

    #[test]
    fn test_evict_idle_long_ttl_keeps_everything() {
        let store = seeded_store();
        store.create(None).unwrap();

        let evicted = store.evict_idle(Duration::from_secs(3600));

        assert!(evicted.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_evict_idle_skips_game_in_use() {
        let store = seeded_store();
        let id = store.create(None).unwrap().id;
        let handle = store.handle(&id).unwrap();
        let _busy = handle.lock();

        let evicted = store.evict_idle(Duration::ZERO);

        assert!(evicted.is_empty());
        assert!(store.contains(&id));
    }

    #[test]
    fn test_evict_idle_handle_fetched_before_eviction_refuses_move() {
        let store = seeded_store();
        let id = store.create(None).unwrap().id;
        let stale = store.handle(&id).unwrap();
        std::thread::sleep(Duration::from_millis(2));

        assert_eq!(store.evict_idle(Duration::ZERO), vec![id.clone()]);
        let result = store.apply_to(&stale, &id, Direction::Left);

        assert!(matches!(result, Err(SessionError::NotFound(_))));
        assert!(matches!(store.get(&id), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_evict_idle_handle_fetched_before_eviction_refuses_reset() {
        let store = seeded_store();
        let id = store.create(None).unwrap().id;
        let stale = store.handle(&id).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        store.evict_idle(Duration::ZERO);

        let result = store.reset(&stale, &id, 4);

        assert!(matches!(result, Err(SessionError::NotFound(_))));
        assert!(!store.contains(&id));
    }

    #[test]
    fn test_restart_after_eviction_creates_fresh_game_in_map() {
        let store = seeded_store();
        let id = store.create(None).unwrap().id;
        std::thread::sleep(Duration::from_millis(2));
        store.evict_idle(Duration::ZERO);

        let game = store.restart(&id, Some(3)).unwrap();

        assert_eq!(game.id, id);
        assert_eq!(store.get(&id).unwrap(), game);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_handle_fetched_before_removal_refuses_move() {
        let store = seeded_store();
        let id = store.create(None).unwrap().id;
        let stale = store.handle(&id).unwrap();

        let removed = store.remove(&id).unwrap();
        let result = store.apply_to(&stale, &id, Direction::Up);

        assert!(matches!(result, Err(SessionError::NotFound(_))));
        assert_eq!(stale.lock().state, removed, "removed game must stay untouched");
    }

    #[test]
    fn test_evict_idle_frees_capacity() {
        let store = SessionStore::new(SessionConfig {
            max_sessions: 1,
            ..SessionConfig::default()
        });
        store.create(None).unwrap();
        assert!(store.create(None).is_err());
        std::thread::sleep(Duration::from_millis(2));

        store.evict_idle(Duration::ZERO);

        assert!(store.create(None).is_ok());
    }
}
