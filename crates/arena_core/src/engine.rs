//! The tick loop.
//!
//! One [`Engine`] runs one match through `Setup → Running → Finished`.
//! Each tick runs these phases in order:
//!
//! 1. movement (A then B) toward the opponent unless adjacent
//! 2. attacks (A then B): attacker procs, dodge, passives and defender
//!    reactive procs on a landed hit, damage, on-hit statuses
//! 3. damage over time, then ledger decay
//! 4. ring damage once the ring is active
//! 5. termination
//!
//! Knockouts are only checked once every phase of the tick has run, so a
//! combatant killed mid-tick still takes that tick's DoT and ring damage.
//! Dead combatants take no further actions.
//! Every random decision draws from the match's single [`MatchRng`] in a
//! fixed order, so the same seed, builds, and config replay bit for bit.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::{debug, trace};

use crate::archetypes::{AbilityTrigger, Effect, PassiveTrigger};
use crate::combatant::{Combatant, Side};
use crate::config::ArenaConfig;
use crate::effects::StatusKind;
use crate::error::Result;
use crate::events::{EndReason, MatchEvent, Winner};
use crate::grid::{Grid, Position, SafeRegion};
use crate::math::{bp_of, probability_from_bp, DamageMultiplier};
use crate::procs::{is_eligible, roll_ability, FiredAbility};
use crate::rng::MatchRng;
use crate::stats::Build;

/// Lifecycle of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPhase {
    /// Built, not yet placed on the board.
    Setup,
    /// Ticking.
    Running,
    /// Over.
    Finished {
        /// Result.
        winner: Winner,
        /// Cause.
        reason: EndReason,
    },
}

/// Optional event recorder; events are only built when recording is on.
#[derive(Debug, Clone, Default)]
struct EventLog(Option<Vec<MatchEvent>>);

impl EventLog {
    fn push(&mut self, event: impl FnOnce() -> MatchEvent) {
        if let Some(events) = self.0.as_mut() {
            events.push(event());
        }
    }
}

/// A single match between two builds.
#[derive(Debug, Clone)]
pub struct Engine {
    config: ArenaConfig,
    grid: Grid,
    seed: u64,
    rng: MatchRng,
    tick: u32,
    phase: MatchPhase,
    fighters: [Combatant; 2],
    log: EventLog,
}

fn pair_mut(fighters: &mut [Combatant; 2], first: Side) -> (&mut Combatant, &mut Combatant) {
    let [a, b] = fighters;
    match first {
        Side::A => (a, b),
        Side::B => (b, a),
    }
}

impl Engine {
    /// Validate inputs and create a match in the `Setup` phase.
    ///
    /// Builds are re-checked against the configuration's allocation rules.
    pub fn new(config: &ArenaConfig, build_a: Build, build_b: Build, seed: u64) -> Result<Self> {
        config.validate()?;
        build_a.check(&config.stats)?;
        build_b.check(&config.stats)?;

        let origin = Position::default();
        Ok(Self {
            config: config.clone(),
            grid: Grid::new(&config.grid),
            seed,
            rng: MatchRng::from_seed(seed),
            tick: 0,
            phase: MatchPhase::Setup,
            fighters: [
                Combatant::new(Side::A, build_a, &config.stats, origin),
                Combatant::new(Side::B, build_b, &config.stats, origin),
            ],
            log: EventLog::default(),
        })
    }

    /// Record every event from here on.
    #[must_use]
    pub fn with_recording(mut self) -> Self {
        self.log = EventLog(Some(Vec::new()));
        self
    }

    /// Place both combatants and resolve match-start passives.
    ///
    /// Consumes exactly one draw (the spawn column). No-op outside `Setup`.
    pub fn start(&mut self) {
        if self.phase != MatchPhase::Setup {
            return;
        }
        let (pos_a, pos_b) = self.grid.spawn(&mut self.rng);
        self.fighters[0].position = pos_a;
        self.fighters[1].position = pos_b;
        for side in Side::BOTH {
            let position = self.fighter(side).position;
            self.log.push(|| MatchEvent::Spawned { side, position });
        }

        for side in Side::BOTH {
            let me = self.fighter(side);
            if me.passive().trigger == PassiveTrigger::MatchStart
                && me.passive().effect == Effect::CopyPassive
            {
                // Always the opponent's native passive, so resolution order is irrelevant.
                let borrowed = self.fighter(side.opponent()).archetype().passive;
                self.fighters[side.index()].adopt_passive(borrowed);
                self.log.push(|| MatchEvent::PassiveCopied {
                    side,
                    passive: borrowed.name.to_string(),
                });
            }
        }

        self.phase = MatchPhase::Running;
    }

    /// Advance one tick. Returns the result once the match is over.
    pub fn step(&mut self) -> Option<Winner> {
        match self.phase {
            MatchPhase::Setup => self.start(),
            MatchPhase::Finished { winner, .. } => return Some(winner),
            MatchPhase::Running => {}
        }

        self.tick += 1;
        trace!(
            tick = self.tick,
            hp_a = self.fighters[0].hp,
            hp_b = self.fighters[1].hp,
            "tick"
        );

        self.movement_phase();
        self.attack_phase();
        self.dot_phase();
        self.ring_phase();

        if let Some(winner) = self.knockout() {
            return Some(self.finish(winner, EndReason::Knockout));
        }

        if self.tick >= self.config.max_ticks {
            let winner = match self.fighters[0].hp.cmp(&self.fighters[1].hp) {
                std::cmp::Ordering::Greater => Winner::A,
                std::cmp::Ordering::Less => Winner::B,
                std::cmp::Ordering::Equal => Winner::Draw,
            };
            return Some(self.finish(winner, EndReason::Timeout));
        }
        None
    }

    /// Run to completion.
    pub fn run(&mut self) -> Winner {
        loop {
            if let Some(winner) = self.step() {
                return winner;
            }
        }
    }

    fn movement_phase(&mut self) {
        let tick = self.tick;
        for side in Side::BOTH {
            let target = self.fighter(side.opponent()).position;
            let (me, _) = pair_mut(&mut self.fighters, side);
            if me.position.is_adjacent(target) {
                continue;
            }
            if me.skip_action(tick) {
                self.log.push(|| MatchEvent::StunnedSkip { tick, side });
                continue;
            }
            for _ in 0..me.movement_steps() {
                if me.position.is_adjacent(target) {
                    break;
                }
                let Some(next) = self.grid.step_toward(me.position, target, &mut self.rng) else {
                    break;
                };
                me.position = next;
                self.log.push(|| MatchEvent::Moved {
                    tick,
                    side,
                    to: next,
                });
            }
        }
    }

    fn attack_phase(&mut self) {
        let tick = self.tick;
        for side in Side::BOTH {
            let (me, foe) = pair_mut(&mut self.fighters, side);
            if !me.is_alive() || !foe.is_alive() || !me.position.is_adjacent(foe.position) {
                continue;
            }
            if me.skip_action(tick) {
                self.log.push(|| MatchEvent::StunnedSkip { tick, side });
                continue;
            }
            self.resolve_attack(side);
        }
    }

    /// One attack: attacker procs, dodge draw, then passives and defender
    /// reactive procs on a landed hit.
    ///
    /// The attacker's passive takes no draw, so checking it only once the hit
    /// has landed leaves the draw order unchanged.
    fn resolve_attack(&mut self, attacker_side: Side) {
        let tick = self.tick;
        let defender_side = attacker_side.opponent();
        let Self {
            config,
            rng,
            fighters,
            log,
            ..
        } = self;
        let (att, def) = pair_mut(fighters, attacker_side);

        let mut damage = DamageMultiplier::ONE;
        let mut on_hit: Vec<(&'static str, Effect)> = Vec::new();

        // Attacker's on-attack procs, slot order.
        let mut attack_procs: Vec<FiredAbility> = Vec::new();
        for slot in 0..2 {
            let ability = att.archetype().abilities[slot];
            if ability.trigger != AbilityTrigger::OnAttack || !is_eligible(att, def, slot, &ability)
            {
                continue;
            }
            if let Some(fired) = roll_ability(att, def, slot, config, rng) {
                log_proc(log, tick, attacker_side, &fired);
                attack_procs.push(fired);
            }
        }
        for fired in &attack_procs {
            match fired.effect {
                Effect::FlatDamageMult { pct } => damage.apply_percent(pct),
                Effect::ConditionalDamageMult { pct, condition } => {
                    if att.check(condition, def) {
                        damage.apply_percent(pct);
                    }
                }
                Effect::DodgeBoost { .. } | Effect::ResistBoost { .. } => {
                    empower(att, fired.name, fired.effect);
                }
                Effect::StackingDot { .. }
                | Effect::Stun { .. }
                | Effect::SpdDebuff { .. }
                | Effect::MissChanceBoost { .. } => on_hit.push((fired.name, fired.effect)),
                // Defensive effects have nothing to act on while attacking.
                _ => {}
            }
        }

        // Dodge: always drawn.
        let dodge_bp = def.dodge_bp(&config.stats).saturating_add(att.miss_bp());
        if rng.chance(probability_from_bp(i64::from(dodge_bp))) {
            log.push(|| MatchEvent::Dodged {
                tick,
                attacker: attacker_side,
            });
            return;
        }

        // Attacker passive. An opening passive stays pending until it applies.
        let passive = *att.passive();
        let passive_armed = match passive.trigger {
            PassiveTrigger::Conditional(condition) => att.check(condition, def),
            PassiveTrigger::OpeningAttack => att.opening_pending(),
            _ => false,
        };
        if passive_armed && offensive_passive(passive.effect, att, def, &mut damage, &mut on_hit) {
            if passive.trigger == PassiveTrigger::OpeningAttack {
                att.resolve_opening();
            }
            log.push(|| MatchEvent::PassiveTriggered {
                tick,
                side: attacker_side,
                passive: passive.name.to_string(),
            });
        }

        // Defender reactive procs.
        let mut reactive: Vec<FiredAbility> = Vec::new();
        for slot in 0..2 {
            let ability = def.archetype().abilities[slot];
            if ability.trigger != AbilityTrigger::OnDefend || !is_eligible(def, att, slot, &ability)
            {
                continue;
            }
            if let Some(fired) = roll_ability(def, att, slot, config, rng) {
                log_proc(log, tick, defender_side, &fired);
                reactive.push(fired);
            }
        }

        // Defender passive.
        let guard = *def.passive();
        let guard_armed = match guard.trigger {
            PassiveTrigger::Conditional(condition) => def.check(condition, att),
            PassiveTrigger::OpeningHitTaken => def.opening_pending(),
            _ => false,
        };
        if guard_armed && defensive_reduction(guard.effect, def, att, &mut damage) {
            if guard.trigger == PassiveTrigger::OpeningHitTaken {
                def.resolve_opening();
            }
            log.push(|| MatchEvent::PassiveTriggered {
                tick,
                side: defender_side,
                passive: guard.name.to_string(),
            });
        }

        let mut heal_floor: Option<u32> = None;
        for fired in &reactive {
            match fired.effect {
                Effect::DamageReductionMult { .. } => {
                    defensive_reduction(fired.effect, def, att, &mut damage);
                }
                Effect::HealToFloor { pct } => {
                    heal_floor = Some(heal_floor.map_or(pct, |h| h.max(pct)));
                }
                Effect::DodgeBoost { .. } | Effect::ResistBoost { .. } => {
                    empower(def, fired.name, fired.effect);
                }
                Effect::StackingDot { .. }
                | Effect::Stun { .. }
                | Effect::SpdDebuff { .. }
                | Effect::MissChanceBoost { .. } => {
                    if afflict(att, fired.name, fired.effect) {
                        log.push(|| MatchEvent::StatusApplied {
                            tick,
                            side: attacker_side,
                            source: fired.name.to_string(),
                        });
                    }
                }
                _ => {}
            }
        }

        let raw = damage.floor_mul(att.derived().base_dmg);
        let dealt = if damage.is_zero() { 0 } else { raw.max(1) };
        def.take_damage(dealt);
        let hp_after = def.hp;
        log.push(|| MatchEvent::Hit {
            tick,
            attacker: attacker_side,
            damage: dealt,
            hp_after,
        });

        for (source, effect) in on_hit {
            if afflict(def, source, effect) {
                log.push(|| MatchEvent::StatusApplied {
                    tick,
                    side: defender_side,
                    source: source.to_string(),
                });
            }
        }

        if let Some(pct) = heal_floor {
            if def.heal_to_floor(pct) {
                let hp_after = def.hp;
                log.push(|| MatchEvent::Healed {
                    tick,
                    side: defender_side,
                    hp_after,
                });
            }
        }
    }

    fn dot_phase(&mut self) {
        let tick = self.tick;
        for side in Side::BOTH {
            let me = &mut self.fighters[side.index()];
            let damage = me.ledger.dot_damage();
            if damage > 0 {
                me.take_damage(damage);
                let hp_after = me.hp;
                self.log.push(|| MatchEvent::DotDamage {
                    tick,
                    side,
                    damage,
                    hp_after,
                });
            }
        }
        for fighter in &mut self.fighters {
            fighter.ledger.tick();
        }
    }

    fn ring_phase(&mut self) {
        let tick = self.tick;
        let Some(region) = self.safe_region() else {
            return;
        };
        for side in Side::BOTH {
            let me = &mut self.fighters[side.index()];
            if region.contains(me.position) {
                continue;
            }
            let damage = bp_of(me.derived().max_hp, self.config.ring.damage_bp).max(1);
            me.take_damage(damage);
            let hp_after = me.hp;
            self.log.push(|| MatchEvent::RingDamage {
                tick,
                side,
                damage,
                hp_after,
            });
        }
    }

    fn knockout(&self) -> Option<Winner> {
        match (self.fighters[0].is_alive(), self.fighters[1].is_alive()) {
            (true, true) => None,
            (false, false) => Some(Winner::Draw),
            (true, false) => Some(Winner::A),
            (false, true) => Some(Winner::B),
        }
    }

    fn finish(&mut self, winner: Winner, reason: EndReason) -> Winner {
        self.phase = MatchPhase::Finished { winner, reason };
        let tick = self.tick;
        self.log.push(|| MatchEvent::Finished {
            tick,
            winner,
            reason,
        });
        debug!(
            seed = self.seed,
            tick,
            %winner,
            ?reason,
            hp_a = self.fighters[0].hp,
            hp_b = self.fighters[1].hp,
            draws = self.rng.draws(),
            "match finished"
        );
        winner
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Ticks completed.
    #[must_use]
    pub const fn tick(&self) -> u32 {
        self.tick
    }

    /// Seed this match was created with.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Configuration in force.
    #[must_use]
    pub const fn config(&self) -> &ArenaConfig {
        &self.config
    }

    /// One combatant.
    #[must_use]
    pub fn fighter(&self, side: Side) -> &Combatant {
        &self.fighters[side.index()]
    }

    /// Draws consumed from the random stream so far.
    #[must_use]
    pub const fn rng_cursor(&self) -> u64 {
        self.rng.draws()
    }

    /// Safe region for the current tick, if the ring is active.
    #[must_use]
    pub fn safe_region(&self) -> Option<SafeRegion> {
        self.grid.safe_region(self.tick, &self.config.ring)
    }

    /// Recorded events (empty unless recording was enabled).
    #[must_use]
    pub fn events(&self) -> &[MatchEvent] {
        self.log.0.as_deref().unwrap_or(&[])
    }

    /// Take the recorded events, leaving recording enabled.
    pub fn take_events(&mut self) -> Vec<MatchEvent> {
        self.log.0.as_mut().map(std::mem::take).unwrap_or_default()
    }

    /// Hash of the complete mutable match state.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        self.tick.hash(&mut hasher);
        self.phase.hash(&mut hasher);
        self.rng.draws().hash(&mut hasher);
        for fighter in &self.fighters {
            fighter.hash_state(&mut hasher);
        }
        hasher.finish()
    }
}

fn log_proc(log: &mut EventLog, tick: u32, side: Side, fired: &FiredAbility) {
    log.push(|| MatchEvent::Proc {
        tick,
        side,
        ability: match fired.copied_from {
            Some(borrowed) => format!("{} ({borrowed})", fired.name),
            None => fired.name.to_string(),
        },
    });
}

/// Fold an attacker's passive into the pending hit. Returns whether it did anything.
fn offensive_passive(
    effect: Effect,
    att: &Combatant,
    def: &Combatant,
    damage: &mut DamageMultiplier,
    on_hit: &mut Vec<(&'static str, Effect)>,
) -> bool {
    match effect {
        Effect::FlatDamageMult { pct } => {
            damage.apply_percent(pct);
            true
        }
        Effect::ConditionalDamageMult { pct, condition } => {
            if att.check(condition, def) {
                damage.apply_percent(pct);
                true
            } else {
                false
            }
        }
        Effect::StackingDot { .. } | Effect::Stun { .. } | Effect::SpdDebuff { .. } => {
            on_hit.push((att.passive().name, effect));
            true
        }
        _ => false,
    }
}

/// Apply a damage reduction owned by the defender, if its condition holds.
fn defensive_reduction(
    effect: Effect,
    def: &Combatant,
    att: &Combatant,
    damage: &mut DamageMultiplier,
) -> bool {
    match effect {
        Effect::DamageReductionMult {
            reduction_pct,
            condition,
        } if def.check(condition, att) => {
            damage.apply_reduction(reduction_pct);
            true
        }
        _ => false,
    }
}

/// Self-buffs.
fn empower(owner: &mut Combatant, source: &'static str, effect: Effect) {
    match effect {
        Effect::DodgeBoost { bp, duration } => {
            owner
                .ledger
                .apply_timed(source, StatusKind::DodgeBoost, bp, duration);
        }
        Effect::ResistBoost { bp, duration } => {
            owner
                .ledger
                .apply_timed(source, StatusKind::ResistBoost, bp, duration);
        }
        _ => {}
    }
}

/// Statuses that land on the opponent. Returns whether anything was applied.
fn afflict(target: &mut Combatant, source: &'static str, effect: Effect) -> bool {
    match effect {
        Effect::StackingDot {
            kind,
            bp,
            duration,
            max_stacks,
        } => {
            let max_hp = target.derived().max_hp;
            target
                .ledger
                .apply_dot(kind, bp, duration, max_stacks, max_hp);
            true
        }
        Effect::Stun { actions } => {
            target.stun(actions);
            true
        }
        Effect::SpdDebuff { amount, duration } => {
            target
                .ledger
                .apply_timed(source, StatusKind::SpdDebuff, amount, duration);
            true
        }
        Effect::MissChanceBoost { bp, duration } => {
            target
                .ledger
                .apply_timed(source, StatusKind::MissChance, bp, duration);
            true
        }
        _ => false,
    }
}
