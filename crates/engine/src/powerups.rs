//! Power-up module - inventory, cooldowns and the four effects
//!
//! | Kind | Gate | Effect | Undo point |
//! |------|------|--------|------------|
//! | Undo | `remaining_undos` | restore the previous session | cleared |
//! | Hint | inventory | report the first legal move | kept |
//! | Shuffle | inventory | regenerate the queue | recorded |
//! | Bomb | inventory | empty a square around a target | recorded |
//!
//! Every use starts that kind's cooldown, which only `tick` winds down.
//! A rejected use leaves the session exactly as it was.

use crate::core::rules::PowerUpTable;
use crate::core::{EngineError, EngineResult};
use crate::session::{GameSession, Hint, Ruleset, SettleOutcome};
use crate::snapshot::power_up_name;
use crate::types::{GameStatus, PowerUpKind};

/// Per-kind counts, remaining cooldowns and usage totals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PowerUpInventory {
    counts: PowerUpTable<u32>,
    cooldowns_ms: PowerUpTable<u64>,
    used: PowerUpTable<u32>,
}

impl PowerUpInventory {
    pub fn new(counts: PowerUpTable<u32>) -> Self {
        Self {
            counts,
            ..Self::default()
        }
    }

    pub fn from_parts(
        counts: PowerUpTable<u32>,
        cooldowns_ms: PowerUpTable<u64>,
        used: PowerUpTable<u32>,
    ) -> Self {
        Self {
            counts,
            cooldowns_ms,
            used,
        }
    }

    pub fn counts(&self) -> PowerUpTable<u32> {
        self.counts
    }

    pub fn cooldowns_ms(&self) -> PowerUpTable<u64> {
        self.cooldowns_ms
    }

    pub fn used(&self) -> PowerUpTable<u32> {
        self.used
    }

    pub fn count(&self, kind: PowerUpKind) -> u32 {
        self.counts.get(kind)
    }

    pub fn cooldown_remaining_ms(&self, kind: PowerUpKind) -> u64 {
        self.cooldowns_ms.get(kind)
    }

    pub fn times_used(&self, kind: PowerUpKind) -> u32 {
        self.used.get(kind)
    }

    pub fn total_used(&self) -> u32 {
        PowerUpKind::ALL.iter().map(|&k| self.used.get(k)).sum()
    }

    pub fn with_count(mut self, kind: PowerUpKind, count: u32) -> Self {
        self.counts.set(kind, count);
        self
    }

    /// Cooldowns advanced by `elapsed_ms`
    pub fn tick(self, elapsed_ms: u64) -> Self {
        let mut next = self;
        for kind in PowerUpKind::ALL {
            let left = self.cooldowns_ms.get(kind).saturating_sub(elapsed_ms);
            next.cooldowns_ms.set(kind, left);
        }
        next
    }

    /// One use recorded: count spent (undo is counted by the session), cooldown started
    fn consumed(self, kind: PowerUpKind, cooldown_ms: u64) -> Self {
        let mut next = self;
        if kind != PowerUpKind::Undo {
            next.counts.set(kind, self.counts.get(kind).saturating_sub(1));
        }
        next.cooldowns_ms.set(kind, cooldown_ms);
        next.used.set(kind, self.used.get(kind).saturating_add(1));
        next
    }
}

/// Result of a successful power-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerUpStep {
    pub session: GameSession,
    pub kind: PowerUpKind,
    /// Suggested move, for hints
    pub hint: Option<Hint>,
    /// Occupied cells emptied, for bombs
    pub cells_cleared: u32,
    pub settle: SettleOutcome,
}

/// Reject the use unless the kind has stock and is off cooldown
pub fn check_available(session: &GameSession, kind: PowerUpKind) -> EngineResult<()> {
    let stock = match kind {
        PowerUpKind::Undo => session.remaining_undos() as u32,
        _ => session.power_ups().count(kind),
    };
    if stock == 0 {
        return Err(EngineError::insufficient_power_up("no uses left")
            .with_details(power_up_name(kind).to_string()));
    }
    let left = session.power_ups().cooldown_remaining_ms(kind);
    if left > 0 {
        return Err(EngineError::insufficient_power_up("power-up on cooldown")
            .with_details(format!("{} ready in {} ms", power_up_name(kind), left)));
    }
    Ok(())
}

/// Apply a power-up to a playing session
pub fn apply_power_up(
    ruleset: &Ruleset,
    session: &GameSession,
    kind: PowerUpKind,
    target: Option<(i16, i16)>,
) -> EngineResult<PowerUpStep> {
    if session.status() != GameStatus::Playing {
        return Err(EngineError::not_playable("power-ups need a game in progress"));
    }
    check_available(session, kind)?;

    let cooldown = ruleset.config().power_ups.cooldown_ms.get(kind);
    let power_ups = session.power_ups().consumed(kind, cooldown);
    let mut step = PowerUpStep {
        session: session.clone(),
        kind,
        hint: None,
        cells_cleared: 0,
        settle: SettleOutcome::default(),
    };

    match kind {
        PowerUpKind::Undo => {
            let Some(prior) = session.undo_snapshot() else {
                return Err(EngineError::not_playable("nothing to undo"));
            };
            let mut restored = prior.clone();
            restored.remaining_undos = session.remaining_undos() - 1;
            restored.power_ups = power_ups;
            restored.undo = None;
            step.session = restored;
        }
        PowerUpKind::Hint => {
            let Some(hint) = session.first_move(ruleset) else {
                return Err(EngineError::invalid_placement("no queued block fits anywhere"));
            };
            step.session.power_ups = power_ups;
            step.hint = Some(hint);
        }
        PowerUpKind::Shuffle => {
            let mut next = session.clone();
            next.undo = Some(session.undo_point());
            next.queue = next.draw_queue(ruleset);
            next.scoring = next.scoring.streak_broken();
            next.power_ups = power_ups;
            let (next, settle) = next.settle(ruleset);
            step.session = next;
            step.settle = settle;
        }
        PowerUpKind::Bomb => {
            let Some((row, col)) = target else {
                return Err(EngineError::invalid_placement("bomb needs a target cell"));
            };
            let grid = session.grid();
            if !grid.in_bounds(row, col) {
                return Err(EngineError::invalid_placement("bomb target outside the grid")
                    .with_details(format!("row={} col={}", row, col)));
            }
            let r = ruleset.config().power_ups.bomb_radius as i16;
            let area: Vec<(i16, i16)> = (row - r..=row + r)
                .flat_map(|rr| (col - r..=col + r).map(move |cc| (rr, cc)))
                .filter(|&(rr, cc)| grid.in_bounds(rr, cc))
                .collect();
            step.cells_cleared = area
                .iter()
                .filter(|&&(rr, cc)| grid.is_occupied(rr, cc))
                .count() as u32;

            let mut next = session.clone();
            next.undo = Some(session.undo_point());
            next.grid = grid.with_cells_cleared(area);
            next.scoring = next.scoring.streak_broken();
            next.power_ups = power_ups;
            let (next, settle) = next.settle(ruleset);
            step.session = next;
            step.settle = settle;
        }
    }
    Ok(step)
}
