//! Session operations against shared storage.
//!
//! A [`GameService`] holds no per-session state. Every call loads the session
//! from the store, applies one rule transition and writes it back with a
//! conditional swap. Two service instances over the same store therefore
//! behave exactly like one, which is how two polling browsers stay in sync.
//!
//! ## Conflicts
//!
//! When the swap loses a race the call reloads the session and runs the
//! transition again against the fresh state. A join racing another join
//! thus sees the session already `active` and fails with `InvalidState`
//! instead of overwriting the first guest.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cards::generate_deck;
use crate::core::{Clock, GameError, GameRng, PlayerSeat, SessionConfig, SystemClock};
use crate::rules::{self, MoveOutcome};
use crate::session::{Session, SessionId, ShortCode};
use crate::store::{KvStore, SessionRepository};

/// How a joining player names the session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinTarget {
    /// The session id from a shared link.
    Id(String),
    /// The short code typed in by hand.
    Code(String),
}

/// Result of an accepted move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveResult {
    pub session: Session,
    pub outcome: MoveOutcome,
}

impl MoveResult {
    #[must_use]
    pub fn game_ended(&self) -> bool {
        self.outcome.game_ended()
    }
}

/// The five session operations.
pub struct GameService<S> {
    repo: SessionRepository<S>,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    rng: Mutex<GameRng>,
}

impl<S: KvStore> GameService<S> {
    /// Service with default configuration, wall clock and entropy-seeded RNG.
    pub fn new(store: S) -> Self {
        GameServiceBuilder::new(store).build()
    }

    /// Start configuring a service.
    pub fn builder(store: S) -> GameServiceBuilder<S> {
        GameServiceBuilder::new(store)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn repository(&self) -> &SessionRepository<S> {
        &self.repo
    }

    /// Open a new session for `host_player` and wait for a guest.
    pub fn create_session(&self, host_player: &str) -> Result<(SessionId, Session), GameError> {
        let host = rules::normalize_name(host_player, "Host player name is required")?;
        let (id, cards) = self.with_rng(|rng| (SessionId::generate(rng), generate_deck(rng)));

        let mut session = Session::new(id, host, cards, self.clock.now());
        if self.config.short_codes {
            session.short_code = Some(self.allocate_code(id)?);
        }

        if let Err(err) = self.repo.insert(&session) {
            if let Some(code) = &session.short_code {
                if let Err(release) = self.repo.release_code(code) {
                    warn!(session_id = %id, %code, error = %release, "could not release short code");
                }
            }
            return Err(err);
        }

        info!(
            session_id = %id,
            host = %session.host_player,
            code = ?session.short_code.as_ref().map(ShortCode::as_str),
            "session created"
        );
        Ok((id, session))
    }

    /// Admit `guest_player` to a waiting session and start the game.
    pub fn join_session(&self, target: &JoinTarget, guest_player: &str) -> Result<Session, GameError> {
        let guest = rules::normalize_name(guest_player, "Guest player name is required")?;
        let id = self.resolve(target)?;

        let (session, ()) = self.update(id, "join", |session, now| rules::join(session, &guest, now))?;

        info!(session_id = %id, guest = %guest, "guest joined");
        Ok(session)
    }

    /// Current stored state of a session.
    pub fn fetch_session(&self, session_id: &str) -> Result<Session, GameError> {
        let id = parse_id(session_id)?;
        self.repo
            .load(id)?
            .map(|stored| stored.session)
            .ok_or_else(game_not_found)
    }

    /// Flip `card_index` for `seat`.
    pub fn apply_move(&self, session_id: &str, seat: PlayerSeat, card_index: usize) -> Result<MoveResult, GameError> {
        let id = parse_id(session_id)?;

        let (session, outcome) = self.update(id, "move", |session, now| {
            rules::apply_move(session, seat, card_index, now)
        })?;

        match &outcome {
            MoveOutcome::Won { winner } => info!(session_id = %id, %winner, "game won"),
            other => debug!(session_id = %id, %seat, card_index, outcome = ?other, "move applied"),
        }
        Ok(MoveResult { session, outcome })
    }

    /// Turn the cards of a failed streak face-down again. Does nothing (and
    /// writes nothing) if no mismatch is pending.
    pub fn clear_mismatch(&self, session_id: &str) -> Result<Session, GameError> {
        let id = parse_id(session_id)?;

        let (session, cleared) = self.update(id, "clear", |session, now| Ok(rules::clear_mismatch(session, now)))?;

        if cleared {
            debug!(session_id = %id, "mismatch cleared");
        }
        Ok(session)
    }

    fn resolve(&self, target: &JoinTarget) -> Result<SessionId, GameError> {
        match target {
            JoinTarget::Id(raw) => parse_id(raw),
            JoinTarget::Code(raw) => {
                let code = ShortCode::parse(raw, self.config.short_code_len)?;
                self.repo
                    .resolve_code(&code)?
                    .ok_or_else(|| GameError::not_found("Invalid game code"))
            }
        }
    }

    fn allocate_code(&self, id: SessionId) -> Result<ShortCode, GameError> {
        for _ in 0..self.config.short_code_attempts {
            let code = self.with_rng(|rng| ShortCode::generate(rng, self.config.short_code_len));
            if self.repo.register_code(&code, id)? {
                return Ok(code);
            }
            debug!(session_id = %id, %code, "short code taken, drawing another");
        }
        Err(GameError::internal("no free short code available"))
    }

    /// Load, transition and conditionally write back one session.
    ///
    /// A transition that leaves the session unchanged is not written.
    fn update<T>(
        &self,
        id: SessionId,
        op: &'static str,
        mut transition: impl FnMut(&mut Session, DateTime<Utc>) -> Result<T, GameError>,
    ) -> Result<(Session, T), GameError> {
        for attempt in 1..=self.config.write_attempts {
            let stored = self.repo.load(id)?.ok_or_else(game_not_found)?;

            let mut next = stored.session.clone();
            let value = transition(&mut next, self.clock.now())?;

            if next == stored.session || self.repo.replace(&stored, &next)? {
                return Ok((next, value));
            }
            warn!(session_id = %id, op, attempt, "session changed during update, retrying");
        }
        Err(GameError::internal(format!(
            "session {id} kept changing during {op}, gave up after {} attempts",
            self.config.write_attempts
        )))
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut GameRng) -> T) -> T {
        f(&mut self.rng.lock())
    }
}

fn parse_id(raw: &str) -> Result<SessionId, GameError> {
    if raw.trim().is_empty() {
        return Err(GameError::invalid_input("Game ID is required"));
    }
    SessionId::parse(raw).ok_or_else(game_not_found)
}

fn game_not_found() -> GameError {
    GameError::not_found("Game not found")
}

/// Builder for [`GameService`].
pub struct GameServiceBuilder<S> {
    store: S,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
    rng: Option<GameRng>,
}

impl<S: KvStore> GameServiceBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: SessionConfig::default(),
            clock: Arc::new(SystemClock),
            rng: None,
        }
    }

    #[must_use]
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Seed the RNG for reproducible decks, ids and codes.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.rng = Some(GameRng::new(seed));
        self
    }

    pub fn build(self) -> GameService<S> {
        GameService {
            repo: SessionRepository::new(self.store, self.config.session_ttl),
            config: self.config,
            clock: self.clock,
            rng: Mutex::new(self.rng.unwrap_or_else(GameRng::from_entropy)),
        }
    }
}
