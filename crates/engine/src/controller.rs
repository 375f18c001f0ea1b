//! Game session controller - the single entry point for callers
//!
//! The controller owns the canonical session, the player profile and the
//! injected collaborators (event sink, clock). Each action computes a new
//! session from the current one with pure functions, checks the invariants,
//! commits it, and only then notifies the sink. A rejected action commits
//! nothing and emits nothing.
//!
//! # State machine
//!
//! ```text
//! Initial --start--> Playing <--pause/resume--> Paused
//! Playing --no queued block fits--> GameOver
//! any --invariant violation--> Error
//! any --restart--> Playing
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::achievements::Achievement;
use crate::core::line_clear::{clear_full_lines, ClearResult};
use crate::core::placement::{check_placement, placed_cells};
use crate::core::scoring::{calculate_level, score_placement, ScoreDelta};
use crate::core::{Clock, EngineError, EngineResult, GameData, SystemClock};
use crate::events::{EventSink, GameEvent, NullSink};
use crate::powerups::{apply_power_up, PowerUpStep};
use crate::profile::PlayerProfile;
use crate::session::{GameSession, Hint, Ruleset, SettleOutcome};
use crate::snapshot::SessionSnapshot;
use crate::types::{Difficulty, GameCommand, GameMode, GameStatus, PowerUpKind};

/// Result of a successful placement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementStep {
    pub session: GameSession,
    pub block_id: u32,
    pub shape_id: u16,
    pub clear: ClearResult,
    pub delta: ScoreDelta,
    pub settle: SettleOutcome,
}

/// Place a queued block; pure with respect to `session`
pub fn place_block(
    ruleset: &Ruleset,
    session: &GameSession,
    block_id: u32,
    row: i16,
    col: i16,
) -> EngineResult<PlacementStep> {
    if session.status() != GameStatus::Playing {
        return Err(EngineError::not_playable("no game in progress"));
    }
    let Some(block) = session.block(block_id).copied() else {
        return Err(EngineError::invalid_placement("block is not in the queue")
            .with_details(format!("block_id={}", block_id)));
    };
    if block.is_locked {
        return Err(EngineError::invalid_placement("block is locked")
            .with_details(format!("block_id={}", block_id)));
    }
    let shape = ruleset.shape(block.shape_id).ok_or_else(|| {
        EngineError::invariant_violation("queued block has no shape")
            .with_details(format!("shape_id={}", block.shape_id))
    })?;
    check_placement(session.grid(), shape, row, col).map_err(|e| {
        let (r, c) = e.cell();
        EngineError::invalid_placement(e.message())
            .with_details(format!("{} at row={} col={}", e.code(), r, c))
    })?;

    let filled = session.grid().with_cells_set(placed_cells(shape, row, col));
    let (grid, clear) = clear_full_lines(&filled);
    let (scoring, delta) = score_placement(
        ruleset.config(),
        session.score_state(),
        &clear,
        grid.is_empty(),
    );

    let mut next = session.clone();
    next.undo = Some(session.undo_point());
    next.grid = grid;
    next.queue.retain(|b| b.id != block_id);
    next.score = session.score().saturating_add(delta.total);
    next.lines_cleared = session.lines_cleared().saturating_add(clear.total_lines);
    next.level = calculate_level(next.lines_cleared, ruleset.config().lines_per_level)
        .max(session.level());
    next.scoring = scoring;
    next.blocks_placed = session.blocks_placed().saturating_add(1);
    if delta.is_perfect_clear() {
        next.perfect_clears = session.perfect_clears().saturating_add(1);
    }
    next.zen_rerolls = 0;
    let (next, settle) = next.settle(ruleset);

    Ok(PlacementStep {
        session: next,
        block_id,
        shape_id: block.shape_id,
        clear,
        delta,
        settle,
    })
}

/// What a successful power-up returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerUpOutcome {
    pub session: Arc<GameSession>,
    pub hint: Option<Hint>,
    pub cells_cleared: u32,
}

/// What a successful placement returned to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceOutcome {
    pub session: Arc<GameSession>,
    pub clear: ClearResult,
    pub delta: ScoreDelta,
}

/// Orchestrates sessions, the profile and outbound events
pub struct GameSessionController<S: EventSink = NullSink> {
    ruleset: Arc<Ruleset>,
    session: Arc<GameSession>,
    profile: PlayerProfile,
    sink: S,
    clock: Box<dyn Clock>,
    /// Profile totals from before the action the undo slot would revert
    undo_data: Option<GameData>,
}

impl GameSessionController<NullSink> {
    /// Controller with a fresh `Initial` session
    pub fn new(ruleset: Ruleset, difficulty: Difficulty, mode: GameMode, seed: u32) -> Self {
        let session = GameSession::new(&ruleset, difficulty, mode, seed);
        Self {
            ruleset: Arc::new(ruleset),
            session: Arc::new(session),
            profile: PlayerProfile::default(),
            sink: NullSink,
            clock: Box::new(SystemClock),
            undo_data: None,
        }
    }

    pub fn from_config(config: &EngineConfig) -> EngineResult<Self> {
        let ruleset = Ruleset::new(config.rules.clone())?;
        Ok(Self::new(ruleset, config.difficulty, config.mode, config.seed))
    }

    /// Controller around an existing session, which must satisfy the invariants
    pub fn from_session(ruleset: Ruleset, session: GameSession) -> EngineResult<Self> {
        session.check_invariants(&ruleset)?;
        Ok(Self {
            ruleset: Arc::new(ruleset),
            session: Arc::new(session),
            profile: PlayerProfile::default(),
            sink: NullSink,
            clock: Box::new(SystemClock),
            undo_data: None,
        })
    }
}

impl<S: EventSink> GameSessionController<S> {
    pub fn with_sink<T: EventSink>(self, sink: T) -> GameSessionController<T> {
        GameSessionController {
            ruleset: self.ruleset,
            session: self.session,
            profile: self.profile,
            sink,
            clock: self.clock,
            undo_data: self.undo_data,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_profile(mut self, profile: PlayerProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn session(&self) -> &Arc<GameSession> {
        &self.session
    }

    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }

    pub fn profile(&self) -> &PlayerProfile {
        &self.profile
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Persistable view of the current session
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::from_session(&self.session)
    }

    /// Replace the current session with a persisted one
    ///
    /// A live session is settled right away, so a stuck queue is refilled
    /// or ends the game. On `CorruptSnapshot` the current session is kept.
    pub fn load_snapshot(&mut self, snapshot: &SessionSnapshot) -> EngineResult<Arc<GameSession>> {
        let loaded = snapshot.to_session(&self.ruleset)?;
        let from = self.session.status();
        let to = loaded.status();
        self.session = Arc::new(loaded);
        self.undo_data = None;
        if from != to {
            self.sink.emit(&GameEvent::StatusChanged { from, to });
        }

        if matches!(to, GameStatus::Playing | GameStatus::Paused) {
            let (settled, _) = (*self.session).clone().settle(&self.ruleset);
            let (from, session) = self.commit(settled)?;
            self.publish(from, Vec::new());
            return Ok(session);
        }
        Ok(self.session.clone())
    }

    /// Dispatch a command from the input layer
    pub fn apply(&mut self, command: GameCommand) -> EngineResult<Arc<GameSession>> {
        match command {
            GameCommand::PlaceBlock { block_id, row, col } => {
                self.place_block(block_id, row, col).map(|o| o.session)
            }
            GameCommand::UsePowerUp { kind, target } => {
                self.use_power_up(kind, target).map(|o| o.session)
            }
            GameCommand::Pause => self.pause(),
            GameCommand::Resume => self.resume(),
            GameCommand::Restart => Ok(self.restart()),
        }
    }

    pub fn start(&mut self) -> EngineResult<Arc<GameSession>> {
        if self.session.status() != GameStatus::Initial {
            return Err(EngineError::not_playable("game already started"));
        }
        let (next, _) = (*self.session)
            .clone()
            .with_status(GameStatus::Playing)
            .settle(&self.ruleset);
        let (from, session) = self.commit(next)?;
        self.publish(from, Vec::new());
        Ok(session)
    }

    pub fn place_block(&mut self, block_id: u32, row: i16, col: i16) -> EngineResult<PlaceOutcome> {
        let step = place_block(&self.ruleset, &self.session, block_id, row, col)
            .map_err(|e| self.reject(e))?;
        let delta = step.delta;
        let clear = step.clear.clone();

        let mut events = vec![GameEvent::BlockPlace {
            block_id: step.block_id,
            shape_id: step.shape_id,
            row,
            col,
            points: delta.place_points,
        }];
        if clear.total_lines > 0 {
            events.push(GameEvent::LinesCleared {
                lines: clear.total_lines,
                rows: clear.rows_cleared,
                cols: clear.cols_cleared,
                points: delta.line_points,
            });
            let combo = step.session.combo_count();
            if combo >= 2 {
                events.push(GameEvent::ComboAchieved {
                    combo,
                    bonus: delta.combo_bonus,
                });
            }
        }
        if let Some(streak) = delta.streak_threshold {
            events.push(GameEvent::StreakBonus {
                streak,
                bonus: delta.streak_bonus,
            });
        }
        if delta.is_perfect_clear() {
            events.push(GameEvent::PerfectClear {
                bonus: delta.perfect_clear_bonus,
            });
        }

        let before = self.profile.data();
        let (from, session) = self.commit(step.session)?;
        self.undo_data = Some(before);
        self.profile.record_placement(
            clear.total_lines,
            session.combo_count(),
            delta.is_perfect_clear(),
            session.score(),
        );
        self.publish(from, events);

        Ok(PlaceOutcome {
            session,
            clear,
            delta,
        })
    }

    pub fn use_power_up(
        &mut self,
        kind: PowerUpKind,
        target: Option<(i16, i16)>,
    ) -> EngineResult<PowerUpOutcome> {
        let PowerUpStep {
            session: next,
            hint,
            cells_cleared,
            ..
        } = apply_power_up(&self.ruleset, &self.session, kind, target)
            .map_err(|e| self.reject(e))?;

        let remaining = match kind {
            PowerUpKind::Undo => next.remaining_undos() as u32,
            _ => next.power_ups().count(kind),
        };
        let before = self.profile.data();
        let (from, session) = self.commit(next)?;
        match kind {
            PowerUpKind::Undo => {
                if let Some(earlier) = self.undo_data.take() {
                    self.profile.rewind(earlier);
                }
            }
            PowerUpKind::Shuffle | PowerUpKind::Bomb => self.undo_data = Some(before),
            PowerUpKind::Hint => {}
        }
        self.profile.record_power_up();
        self.publish(from, vec![GameEvent::PowerUpUsed { kind, remaining }]);

        Ok(PowerUpOutcome {
            session,
            hint,
            cells_cleared,
        })
    }

    pub fn pause(&mut self) -> EngineResult<Arc<GameSession>> {
        if self.session.status() != GameStatus::Playing {
            return Err(EngineError::not_playable("only a running game can pause"));
        }
        self.set_status(GameStatus::Paused)
    }

    pub fn resume(&mut self) -> EngineResult<Arc<GameSession>> {
        if self.session.status() != GameStatus::Paused {
            return Err(EngineError::not_playable("game is not paused"));
        }
        self.set_status(GameStatus::Playing)
    }

    /// End the current game by choice
    pub fn abandon(&mut self) -> EngineResult<Arc<GameSession>> {
        if !matches!(
            self.session.status(),
            GameStatus::Playing | GameStatus::Paused
        ) {
            return Err(EngineError::not_playable("no game to abandon"));
        }
        self.set_status(GameStatus::GameOver)
    }

    /// Advance power-up cooldowns; a no-op unless playing
    pub fn tick(&mut self, elapsed_ms: u64) -> Arc<GameSession> {
        if self.session.status() != GameStatus::Playing || elapsed_ms == 0 {
            return self.session.clone();
        }
        let mut next = (*self.session).clone();
        next.power_ups = next.power_ups.tick(elapsed_ms);
        self.session = Arc::new(next);
        self.session.clone()
    }

    /// Start a new game from any state
    ///
    /// A game still in progress, or stopped by an error, counts as played.
    pub fn restart(&mut self) -> Arc<GameSession> {
        let old = self.session.clone();
        if matches!(
            old.status(),
            GameStatus::Playing | GameStatus::Paused | GameStatus::Error
        ) {
            self.profile.record_game_end(old.score());
        }

        let seed = old.generator().rng_state();
        let (next, _) = GameSession::new(&self.ruleset, old.difficulty(), old.mode(), seed)
            .with_status(GameStatus::Playing)
            .settle(&self.ruleset);
        self.session = Arc::new(next);
        self.undo_data = None;
        self.publish(old.status(), Vec::new());
        self.session.clone()
    }

    /// Claim a repeatable achievement
    pub fn claim_achievement(&mut self, id: &str) -> EngineResult<Achievement> {
        self.profile.claim(id).cloned()
    }

    fn set_status(&mut self, status: GameStatus) -> EngineResult<Arc<GameSession>> {
        let next = (*self.session).clone().with_status(status);
        let (from, session) = self.commit(next)?;
        self.publish(from, Vec::new());
        Ok(session)
    }

    /// Install `next` if it passes the invariant checks
    ///
    /// Returns the previous status with the committed session. On a violation
    /// the last good state is kept with `Error` status.
    fn commit(&mut self, next: GameSession) -> EngineResult<(GameStatus, Arc<GameSession>)> {
        let from = self.session.status();
        if let Err(e) = next.check_invariants(&self.ruleset) {
            return Err(self.reject(e));
        }
        self.session = Arc::new(next);
        Ok((from, self.session.clone()))
    }

    /// Pass a rejection through; an invariant violation also moves the
    /// last good session to `Error`
    fn reject(&mut self, e: EngineError) -> EngineError {
        if !e.is_fatal() {
            return e;
        }
        eprintln!("[Engine] invariant violation: {}", e);
        let from = self.session.status();
        let failed = (*self.session).clone().with_status(GameStatus::Error);
        self.session = Arc::new(failed);
        self.undo_data = None;
        self.sink.emit(&GameEvent::StatusChanged {
            from,
            to: GameStatus::Error,
        });
        e
    }

    /// Notify the sink about a committed transition and refresh achievements
    fn publish(&mut self, from: GameStatus, events: Vec<GameEvent>) {
        for event in &events {
            self.sink.emit(event);
        }

        let session = self.session.clone();
        let to = session.status();
        if to != from {
            if to == GameStatus::GameOver {
                self.profile.record_game_end(session.score());
                self.sink.emit(&GameEvent::GameOver {
                    score: session.score(),
                    lines: session.lines_cleared(),
                    level: session.level(),
                });
            }
            self.sink.emit(&GameEvent::StatusChanged { from, to });
        }

        for id in self.profile.evaluate(self.clock.as_ref()) {
            self.sink.emit(&GameEvent::AchievementUnlocked { id });
        }
    }
}
