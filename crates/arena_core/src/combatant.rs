//! Mutable per-match state of one fighter.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::archetypes::{Archetype, Condition, Effect, PassiveDef, PassiveTrigger};
use crate::config::StatConfig;
use crate::effects::{StatusKind, StatusLedger};
use crate::grid::Position;
use crate::math::BP_SCALE;
use crate::stats::{Build, DerivedStats};

/// Which corner of the match a combatant occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// First build; acts first within each phase.
    A,
    /// Second build.
    B,
}

impl Side {
    /// Both sides in acting order.
    pub const BOTH: [Self; 2] = [Self::A, Self::B];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }

    /// Array index.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "1",
            Self::B => "2",
        })
    }
}

/// A fighter inside a running match. Owned by the engine for one match only.
#[derive(Debug, Clone)]
pub struct Combatant {
    side: Side,
    build: Build,
    derived: DerivedStats,
    archetype: &'static Archetype,
    /// Passive in force; differs from the archetype's after a copy.
    passive: PassiveDef,
    /// Current HP; may go to zero or below on death.
    pub hp: i32,
    /// Current cell.
    pub position: Position,
    /// Timed statuses and DoT stacks.
    pub ledger: StatusLedger,
    opening_resolved: bool,
    used_abilities: [bool; 2],
    stunned_actions: u32,
    stun_spent_tick: Option<u32>,
}

impl Combatant {
    /// Fresh combatant at full HP.
    #[must_use]
    pub fn new(side: Side, build: Build, rules: &StatConfig, position: Position) -> Self {
        let derived = build.derive(rules);
        let archetype = build.animal().archetype();
        Self {
            side,
            build,
            derived,
            archetype,
            passive: archetype.passive,
            hp: derived.max_hp,
            position,
            ledger: StatusLedger::new(),
            opening_resolved: false,
            used_abilities: [false; 2],
            stunned_actions: 0,
            stun_spent_tick: None,
        }
    }

    /// Side.
    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    /// Build this combatant was created from.
    #[must_use]
    pub const fn build(&self) -> &Build {
        &self.build
    }

    /// Derived stats.
    #[must_use]
    pub const fn derived(&self) -> &DerivedStats {
        &self.derived
    }

    /// Archetype (abilities always come from here).
    #[must_use]
    pub const fn archetype(&self) -> &'static Archetype {
        self.archetype
    }

    /// Passive currently in force.
    #[must_use]
    pub const fn passive(&self) -> &PassiveDef {
        &self.passive
    }

    /// Replace the passive in force.
    pub fn adopt_passive(&mut self, passive: PassiveDef) {
        self.passive = passive;
    }

    /// Still standing.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.hp > 0
    }

    /// `hp < pct% of max_hp`, in exact integer arithmetic.
    #[must_use]
    pub fn hp_below_pct(&self, pct: u32) -> bool {
        i64::from(self.hp) * 100 < i64::from(self.derived.max_hp) * i64::from(pct)
    }

    /// Subtract damage.
    pub fn take_damage(&mut self, amount: i32) {
        self.hp = self.hp.saturating_sub(amount);
    }

    /// Raise HP to at least `pct`% of max. Returns whether HP changed.
    pub fn heal_to_floor(&mut self, pct: u32) -> bool {
        let floor = crate::math::percent_of(self.derived.max_hp, pct);
        if self.is_alive() && self.hp < floor {
            self.hp = floor;
            true
        } else {
            false
        }
    }

    /// Speed after debuffs (never below 1).
    #[must_use]
    pub fn effective_spd(&self) -> u32 {
        self.build
            .spd()
            .saturating_sub(self.ledger.total(StatusKind::SpdDebuff))
            .max(1)
    }

    /// Dodge from speed plus active boosts, before clamping.
    #[must_use]
    pub fn dodge_bp(&self, rules: &StatConfig) -> u32 {
        let live = match self.passive_effect_if_active() {
            Some(Effect::DodgeBoost { bp, .. } | Effect::MissChanceBoost { bp, .. }) => bp,
            _ => 0,
        };
        rules
            .dodge_bp(self.effective_spd())
            .saturating_add(self.ledger.total(StatusKind::DodgeBoost))
            .saturating_add(live)
    }

    /// Extra chance for this combatant's own attacks to miss.
    #[must_use]
    pub fn miss_bp(&self) -> u32 {
        self.ledger.total(StatusKind::MissChance)
    }

    /// Proc resistance including boosts, clamped to 100%.
    #[must_use]
    pub fn resist_bp(&self) -> u32 {
        let live = match self.passive_effect_if_active() {
            Some(Effect::ResistBoost { bp, .. }) => bp,
            _ => 0,
        };
        self.derived
            .resist_bp
            .saturating_add(self.ledger.total(StatusKind::ResistBoost))
            .saturating_add(live)
            .min(BP_SCALE)
    }

    /// Grid steps per tick.
    #[must_use]
    pub fn movement_steps(&self) -> u32 {
        match self.passive_effect_if_active() {
            Some(Effect::MovementBonus { extra_steps }) => 1 + extra_steps,
            _ => 1,
        }
    }

    /// Effect of a level-triggered passive whose condition holds without
    /// reference to an opponent (only `Always` and `SelfHpBelow`).
    fn passive_effect_if_active(&self) -> Option<Effect> {
        match self.passive.trigger {
            PassiveTrigger::Conditional(Condition::Always) => Some(self.passive.effect),
            PassiveTrigger::Conditional(Condition::SelfHpBelow(pct)) if self.hp_below_pct(pct) => {
                Some(self.passive.effect)
            }
            _ => None,
        }
    }

    /// Evaluate a condition from this combatant's point of view.
    #[must_use]
    pub fn check(&self, condition: Condition, target: &Self) -> bool {
        match condition {
            Condition::Always => true,
            Condition::SelfHpBelow(pct) => self.hp_below_pct(pct),
            Condition::TargetHpBelow(pct) => target.hp_below_pct(pct),
            Condition::FasterThanTarget => self.effective_spd() > target.effective_spd(),
            Condition::TargetHasDot => target.ledger.has_dot(),
        }
    }

    /// Whether the one-shot opening passive is still pending.
    #[must_use]
    pub const fn opening_pending(&self) -> bool {
        !self.opening_resolved
    }

    /// Mark the opening passive as spent.
    pub fn resolve_opening(&mut self) {
        self.opening_resolved = true;
    }

    /// Whether ability slot `slot` has been spent (single-use only).
    #[must_use]
    pub fn ability_used(&self, slot: usize) -> bool {
        self.used_abilities.get(slot).copied().unwrap_or(true)
    }

    /// Record that ability slot `slot` fired.
    pub fn mark_ability_used(&mut self, slot: usize) {
        if let Some(flag) = self.used_abilities.get_mut(slot) {
            *flag = true;
        }
    }

    /// Queue a stun. Stuns do not accumulate beyond the largest pending one.
    pub fn stun(&mut self, actions: u32) {
        self.stunned_actions = self.stunned_actions.max(actions);
    }

    /// Pending skipped actions.
    #[must_use]
    pub const fn stunned_actions(&self) -> u32 {
        self.stunned_actions
    }

    /// Called whenever this combatant would act on `tick`.
    ///
    /// Consumes one pending stun the first time it is called in a tick and
    /// keeps the combatant idle for the rest of that tick. Returns `true`
    /// when the action must be skipped.
    pub fn skip_action(&mut self, tick: u32) -> bool {
        if self.stun_spent_tick == Some(tick) {
            return true;
        }
        if self.stunned_actions > 0 {
            self.stunned_actions -= 1;
            self.stun_spent_tick = Some(tick);
            return true;
        }
        false
    }

    /// Feed every piece of mutable state into a hasher.
    pub fn hash_state<H: Hasher>(&self, state: &mut H) {
        self.side.hash(state);
        self.build.hash(state);
        self.passive.name.hash(state);
        self.hp.hash(state);
        self.position.hash(state);
        self.ledger.hash(state);
        self.opening_resolved.hash(state);
        self.used_abilities.hash(state);
        self.stunned_actions.hash(state);
        self.stun_spent_tick.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes::Animal;

    fn fighter(animal: Animal, stats: [i64; 4]) -> Combatant {
        let [hp, atk, spd, wil] = stats;
        let build = Build::new(animal, hp, atk, spd, wil).expect("valid");
        Combatant::new(Side::A, build, &StatConfig::default(), Position::new(0, 0))
    }

    #[test]
    fn test_hp_threshold_is_exact() {
        let mut bear = fighter(Animal::Bear, [5, 5, 5, 5]);
        assert_eq!(bear.derived().max_hp, 100);
        bear.hp = 50;
        assert!(!bear.hp_below_pct(50));
        bear.hp = 49;
        assert!(bear.hp_below_pct(50));
    }

    #[test]
    fn test_heal_to_floor_only_raises() {
        let mut bear = fighter(Animal::Bear, [5, 5, 5, 5]);
        bear.hp = 10;
        assert!(bear.heal_to_floor(30));
        assert_eq!(bear.hp, 30);
        assert!(!bear.heal_to_floor(20));
        assert_eq!(bear.hp, 30);
    }

    #[test]
    fn test_stun_consumed_once_per_tick() {
        let mut boar = fighter(Animal::Boar, [5, 5, 5, 5]);
        boar.stun(1);
        assert!(boar.skip_action(4));
        assert!(boar.skip_action(4));
        assert!(!boar.skip_action(5));
        assert_eq!(boar.stunned_actions(), 0);
    }

    #[test]
    fn test_spd_debuff_lowers_dodge() {
        let mut tiger = fighter(Animal::Tiger, [4, 4, 9, 3]);
        let rules = StatConfig::default();
        assert_eq!(tiger.dodge_bp(&rules), 2000);
        tiger
            .ledger
            .apply_timed("Hamstring", StatusKind::SpdDebuff, 3, 3);
        assert_eq!(tiger.effective_spd(), 6);
        assert_eq!(tiger.dodge_bp(&rules), 1250);
    }

    #[test]
    fn test_live_passives() {
        let raven = fighter(Animal::Raven, [5, 5, 5, 5]);
        assert_eq!(raven.resist_bp(), 1650 + 500);

        let eagle = fighter(Animal::Eagle, [5, 5, 5, 5]);
        assert_eq!(eagle.movement_steps(), 2);

        let mut fox = fighter(Animal::Fox, [5, 5, 5, 5]);
        let rules = StatConfig::default();
        assert_eq!(fox.dodge_bp(&rules), 1000);
        fox.hp = 40;
        assert_eq!(fox.dodge_bp(&rules), 2000);
    }
}
