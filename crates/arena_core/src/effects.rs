//! Per-combatant ledger of timed statuses and stacking damage over time.
//!
//! Entries carry a remaining-tick counter. The engine applies DoT damage
//! and then calls [`StatusLedger::tick`] once at the end of each tick,
//! which decrements every entry and drops the ones that reach zero.

use crate::archetypes::DotKind;
use crate::math::bp_of;

/// Kind of non-damaging timed status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    /// Extra dodge for the bearer.
    DodgeBoost,
    /// Extra proc resistance for the bearer.
    ResistBoost,
    /// Speed points removed from the bearer.
    SpdDebuff,
    /// Extra chance for the bearer's attacks to miss.
    MissChance,
}

/// A buff or debuff with a fixed magnitude.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimedStatus {
    /// Ability or passive that applied it; re-application from the same
    /// source refreshes instead of stacking.
    pub source: &'static str,
    /// What it modifies.
    pub kind: StatusKind,
    /// Basis points, or stat points for [`StatusKind::SpdDebuff`].
    pub magnitude: u32,
    /// Ticks left, counting the current one.
    pub remaining_ticks: u32,
}

/// Stacking damage over time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DotStatus {
    /// Stack identity.
    pub kind: DotKind,
    /// Current stack count.
    pub stacks: u32,
    /// Stack cap.
    pub max_stacks: u32,
    /// Ticks left, counting the current one.
    pub remaining_ticks: u32,
    /// Damage per stack per tick, fixed when the first stack lands.
    pub per_stack_damage: i32,
}

impl DotStatus {
    /// Damage this entry deals this tick.
    #[must_use]
    pub fn per_tick_damage(&self) -> i32 {
        self.per_stack_damage
            .saturating_mul(i32::try_from(self.stacks).unwrap_or(i32::MAX))
    }
}

/// Statuses currently affecting one combatant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StatusLedger {
    timed: Vec<TimedStatus>,
    dots: Vec<DotStatus>,
}

impl StatusLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or refresh a timed status. A zero duration is a no-op.
    pub fn apply_timed(
        &mut self,
        source: &'static str,
        kind: StatusKind,
        magnitude: u32,
        duration: u32,
    ) {
        if duration == 0 {
            return;
        }
        if let Some(existing) = self
            .timed
            .iter_mut()
            .find(|s| s.source == source && s.kind == kind)
        {
            existing.remaining_ticks = duration;
            existing.magnitude = existing.magnitude.max(magnitude);
            return;
        }
        self.timed.push(TimedStatus {
            source,
            kind,
            magnitude,
            remaining_ticks: duration,
        });
    }

    /// Add a DoT stack, or refresh duration when already at the cap.
    ///
    /// Per-stack damage is `max(1, floor(bearer_max_hp * bp))`, fixed on the
    /// first application. Returns the stack count afterwards.
    pub fn apply_dot(
        &mut self,
        kind: DotKind,
        bp: u32,
        duration: u32,
        max_stacks: u32,
        bearer_max_hp: i32,
    ) -> u32 {
        if duration == 0 || max_stacks == 0 {
            return self.dot_stacks(kind);
        }
        if let Some(existing) = self.dots.iter_mut().find(|d| d.kind == kind) {
            if existing.stacks < existing.max_stacks {
                existing.stacks += 1;
            }
            existing.remaining_ticks = duration;
            return existing.stacks;
        }
        self.dots.push(DotStatus {
            kind,
            stacks: 1,
            max_stacks,
            remaining_ticks: duration,
            per_stack_damage: bp_of(bearer_max_hp, bp).max(1),
        });
        1
    }

    /// Sum of magnitudes for a status kind.
    #[must_use]
    pub fn total(&self, kind: StatusKind) -> u32 {
        self.timed
            .iter()
            .filter(|s| s.kind == kind)
            .fold(0u32, |acc, s| acc.saturating_add(s.magnitude))
    }

    /// Stacks of one DoT kind (0 if absent).
    #[must_use]
    pub fn dot_stacks(&self, kind: DotKind) -> u32 {
        self.dots
            .iter()
            .find(|d| d.kind == kind)
            .map_or(0, |d| d.stacks)
    }

    /// Whether any DoT is active.
    #[must_use]
    pub fn has_dot(&self) -> bool {
        !self.dots.is_empty()
    }

    /// Total DoT damage due this tick.
    #[must_use]
    pub fn dot_damage(&self) -> i32 {
        self.dots
            .iter()
            .fold(0i32, |acc, d| acc.saturating_add(d.per_tick_damage()))
    }

    /// Decrement every entry and drop expired ones.
    pub fn tick(&mut self) {
        for s in &mut self.timed {
            s.remaining_ticks = s.remaining_ticks.saturating_sub(1);
        }
        for d in &mut self.dots {
            d.remaining_ticks = d.remaining_ticks.saturating_sub(1);
        }
        self.timed.retain(|s| s.remaining_ticks > 0);
        self.dots.retain(|d| d.remaining_ticks > 0);
    }

    /// Active timed statuses.
    pub fn timed(&self) -> impl Iterator<Item = &TimedStatus> {
        self.timed.iter()
    }

    /// Active DoT entries.
    pub fn dots(&self) -> impl Iterator<Item = &DotStatus> {
        self.dots.iter()
    }

    /// Nothing active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timed.is_empty() && self.dots.is_empty()
    }
}
