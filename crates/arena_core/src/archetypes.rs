//! Static archetype catalog.
//!
//! Each animal has one passive and two proc abilities. Everything here is
//! `'static` data; the engine only ever dispatches on [`Effect`] and
//! [`Condition`] variants, so adding an animal means adding a table entry.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

use Condition::{Always, FasterThanTarget, SelfHpBelow, TargetHasDot, TargetHpBelow};
use ProcTier::{Standard, Strong};

/// Animal identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Animal {
    /// Bear.
    Bear,
    /// Buffalo.
    Buffalo,
    /// Boar.
    Boar,
    /// Tiger.
    Tiger,
    /// Wolf.
    Wolf,
    /// Monkey.
    Monkey,
    /// Crocodile.
    Crocodile,
    /// Eagle.
    Eagle,
    /// Snake.
    Snake,
    /// Raven.
    Raven,
    /// Shark.
    Shark,
    /// Owl.
    Owl,
    /// Fox.
    Fox,
    /// Scorpion.
    Scorpion,
}

impl Animal {
    /// Every animal in catalog order.
    pub const ALL: [Self; 14] = [
        Self::Bear,
        Self::Buffalo,
        Self::Boar,
        Self::Tiger,
        Self::Wolf,
        Self::Monkey,
        Self::Crocodile,
        Self::Eagle,
        Self::Snake,
        Self::Raven,
        Self::Shark,
        Self::Owl,
        Self::Fox,
        Self::Scorpion,
    ];

    /// Lowercase identifier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bear => "bear",
            Self::Buffalo => "buffalo",
            Self::Boar => "boar",
            Self::Tiger => "tiger",
            Self::Wolf => "wolf",
            Self::Monkey => "monkey",
            Self::Crocodile => "crocodile",
            Self::Eagle => "eagle",
            Self::Snake => "snake",
            Self::Raven => "raven",
            Self::Shark => "shark",
            Self::Owl => "owl",
            Self::Fox => "fox",
            Self::Scorpion => "scorpion",
        }
    }

    /// Catalog entry for this animal.
    #[must_use]
    pub fn archetype(self) -> &'static Archetype {
        archetype(self)
    }
}

impl fmt::Display for Animal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Animal {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|a| a.name() == wanted)
            .ok_or_else(|| ValidationError::UnknownAnimal {
                name: s.trim().to_string(),
                valid: Self::ALL.map(Self::name).join(", "),
            })
    }
}

/// Proc-rate tier; the actual rates come from the configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcTier {
    /// Utility and moderate damage abilities.
    Standard,
    /// High-impact abilities with a lower base rate.
    Strong,
}

/// Deterministic predicate over the owner and its opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Always true.
    Always,
    /// Owner's HP is below this percentage of its max.
    SelfHpBelow(u32),
    /// Opponent's HP is below this percentage of its max.
    TargetHpBelow(u32),
    /// Owner's effective speed is strictly higher.
    FasterThanTarget,
    /// Opponent carries at least one damage-over-time stack.
    TargetHasDot,
}

/// Identity of a stacking damage-over-time effect.
///
/// Applications with the same kind share one stack counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DotKind {
    /// Poison.
    Venom,
    /// Torn flesh.
    Rend,
    /// Open wound.
    Bleed,
}

/// Closed set of effects the engine knows how to apply.
///
/// Percent fields are whole percent; `bp` fields are basis points;
/// durations count ticks including the tick of application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Effect {
    /// Owner's outgoing hit is multiplied by `pct`%.
    FlatDamageMult {
        /// Multiplier in percent.
        pct: u32,
    },
    /// As [`Effect::FlatDamageMult`], only while `condition` holds.
    ConditionalDamageMult {
        /// Multiplier in percent.
        pct: u32,
        /// Gate evaluated at the moment of the hit.
        condition: Condition,
    },
    /// Incoming hit on the owner loses `reduction_pct`% while `condition` holds.
    DamageReductionMult {
        /// Share of the hit removed; 100 blocks it.
        reduction_pct: u32,
        /// Gate evaluated at the moment of the hit.
        condition: Condition,
    },
    /// Owner's HP is raised to at least `pct`% of max after the hit resolves.
    HealToFloor {
        /// Floor in percent of max HP.
        pct: u32,
    },
    /// Owner's dodge rises by `bp`.
    DodgeBoost {
        /// Extra dodge.
        bp: u32,
        /// Ticks the boost lasts (ignored for passives, which are live).
        duration: u32,
    },
    /// Opponent's effective speed drops by `amount`.
    SpdDebuff {
        /// Speed points removed.
        amount: u32,
        /// Ticks the debuff lasts.
        duration: u32,
    },
    /// Owner's proc resistance rises by `bp`.
    ResistBoost {
        /// Extra resistance.
        bp: u32,
        /// Ticks the boost lasts (ignored for passives).
        duration: u32,
    },
    /// Opponent gains a damage-over-time stack.
    StackingDot {
        /// Which stack counter this feeds.
        kind: DotKind,
        /// Per-stack damage per tick, as a share of the bearer's max HP.
        bp: u32,
        /// Ticks before the stacks expire; refreshed on every application.
        duration: u32,
        /// Stack cap.
        max_stacks: u32,
    },
    /// Opponent skips its next `actions` actions.
    Stun {
        /// Actions skipped.
        actions: u32,
    },
    /// At match start, the owner takes over the opponent's passive.
    CopyPassive,
    /// Owner fires one of the opponent's two abilities at `pct`% strength.
    CopyRandomAbility {
        /// Strength of the copied effect.
        pct: u32,
    },
    /// Attacks made against the owner gain `bp` extra chance to miss.
    ///
    /// As an ability it lands on the opponent as a status that makes the
    /// opponent's own attacks miss more.
    MissChanceBoost {
        /// Extra miss chance.
        bp: u32,
        /// Ticks the status lasts (ignored for passives).
        duration: u32,
    },
    /// Owner may take extra grid steps per tick.
    MovementBonus {
        /// Additional steps.
        extra_steps: u32,
    },
}

impl Effect {
    /// Scale the effect's magnitude to `pct`% (used by copied abilities).
    ///
    /// Multipliers scale their bonus or penalty around ×1, not the raw factor.
    #[must_use]
    pub fn scaled(self, pct: u32) -> Self {
        let scale = |v: u32| v * pct / 100;
        let scale_mult = |v: u32| {
            if v >= 100 {
                100 + scale(v - 100)
            } else {
                100 - scale(100 - v)
            }
        };
        match self {
            Self::FlatDamageMult { pct: m } => Self::FlatDamageMult { pct: scale_mult(m) },
            Self::ConditionalDamageMult { pct: m, condition } => Self::ConditionalDamageMult {
                pct: scale_mult(m),
                condition,
            },
            Self::DamageReductionMult {
                reduction_pct,
                condition,
            } => Self::DamageReductionMult {
                reduction_pct: scale(reduction_pct),
                condition,
            },
            Self::HealToFloor { pct: p } => Self::HealToFloor { pct: scale(p) },
            Self::DodgeBoost { bp, duration } => Self::DodgeBoost {
                bp: scale(bp),
                duration,
            },
            Self::ResistBoost { bp, duration } => Self::ResistBoost {
                bp: scale(bp),
                duration,
            },
            Self::MissChanceBoost { bp, duration } => Self::MissChanceBoost {
                bp: scale(bp),
                duration,
            },
            Self::StackingDot {
                kind,
                bp,
                duration,
                max_stacks,
            } => Self::StackingDot {
                kind,
                bp: scale(bp),
                duration,
                max_stacks,
            },
            other => other,
        }
    }
}

/// When a passive is consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassiveTrigger {
    /// Level-triggered: active whenever the condition holds.
    Conditional(Condition),
    /// Once per match, on the owner's first landed attack.
    OpeningAttack,
    /// Once per match, on the first hit that lands on the owner.
    OpeningHitTaken,
    /// Resolved once during setup.
    MatchStart,
}

/// Passive descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PassiveDef {
    /// Display name.
    pub name: &'static str,
    /// When it applies.
    pub trigger: PassiveTrigger,
    /// What it does.
    pub effect: Effect,
}

/// When an ability rolls for a proc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityTrigger {
    /// Rolled when the owner attacks, before the dodge roll.
    OnAttack,
    /// Rolled when a hit lands on the owner, before damage is applied.
    OnDefend,
}

/// Ability descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AbilityDef {
    /// Display name.
    pub name: &'static str,
    /// Proc tier.
    pub tier: ProcTier,
    /// When it rolls.
    pub trigger: AbilityTrigger,
    /// Must hold for the ability to be eligible at all.
    pub gate: Option<Condition>,
    /// Can fire at most once per match.
    pub single_use: bool,
    /// What it does.
    pub effect: Effect,
}

/// Full definition of one animal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Archetype {
    /// Which animal.
    pub animal: Animal,
    /// Passive.
    pub passive: PassiveDef,
    /// Ability slots 1 and 2, rolled in that order.
    pub abilities: [AbilityDef; 2],
}

const fn passive(name: &'static str, trigger: PassiveTrigger, effect: Effect) -> PassiveDef {
    PassiveDef {
        name,
        trigger,
        effect,
    }
}

const fn on_attack(name: &'static str, tier: ProcTier, effect: Effect) -> AbilityDef {
    AbilityDef {
        name,
        tier,
        trigger: AbilityTrigger::OnAttack,
        gate: None,
        single_use: false,
        effect,
    }
}

const fn on_defend(name: &'static str, tier: ProcTier, effect: Effect) -> AbilityDef {
    AbilityDef {
        name,
        tier,
        trigger: AbilityTrigger::OnDefend,
        gate: None,
        single_use: false,
        effect,
    }
}

const fn gated(mut ability: AbilityDef, gate: Condition) -> AbilityDef {
    ability.gate = Some(gate);
    ability
}

const fn once(mut ability: AbilityDef) -> AbilityDef {
    ability.single_use = true;
    ability
}

const fn mult(pct: u32) -> Effect {
    Effect::FlatDamageMult { pct }
}

const fn reduce(reduction_pct: u32) -> Effect {
    Effect::DamageReductionMult {
        reduction_pct,
        condition: Always,
    }
}

const fn dodge(bp: u32, duration: u32) -> Effect {
    Effect::DodgeBoost { bp, duration }
}

const fn miss(bp: u32, duration: u32) -> Effect {
    Effect::MissChanceBoost { bp, duration }
}

const fn dot(kind: DotKind, bp: u32, duration: u32, max_stacks: u32) -> Effect {
    Effect::StackingDot {
        kind,
        bp,
        duration,
        max_stacks,
    }
}

/// The catalog, indexed in [`Animal::ALL`] order.
pub static CATALOG: [Archetype; 14] = [
    Archetype {
        animal: Animal::Bear,
        passive: passive(
            "Fury Protocol",
            PassiveTrigger::Conditional(SelfHpBelow(50)),
            mult(150),
        ),
        abilities: [
            on_attack("Berserker Rage", Strong, mult(160)),
            once(gated(
                on_defend("Last Stand", Strong, Effect::HealToFloor { pct: 30 }),
                SelfHpBelow(15),
            )),
        ],
    },
    Archetype {
        animal: Animal::Buffalo,
        passive: passive("Thick Hide", PassiveTrigger::OpeningHitTaken, reduce(50)),
        abilities: [
            on_defend("Thick Hide", Standard, reduce(40)),
            once(gated(
                on_defend(
                    "Iron Will",
                    Strong,
                    Effect::ResistBoost {
                        bp: 2000,
                        duration: 5,
                    },
                ),
                SelfHpBelow(50),
            )),
        ],
    },
    Archetype {
        animal: Animal::Boar,
        passive: passive("Charge", PassiveTrigger::OpeningAttack, mult(150)),
        abilities: [
            on_attack("Stampede", Standard, Effect::Stun { actions: 1 }),
            on_attack("Gore", Strong, mult(180)),
        ],
    },
    Archetype {
        animal: Animal::Tiger,
        passive: passive(
            "Ambush Wiring",
            PassiveTrigger::OpeningAttack,
            Effect::ConditionalDamageMult {
                pct: 200,
                condition: FasterThanTarget,
            },
        ),
        abilities: [
            on_attack("Pounce", Standard, mult(170)),
            on_attack(
                "Hamstring",
                Standard,
                Effect::SpdDebuff {
                    amount: 3,
                    duration: 3,
                },
            ),
        ],
    },
    Archetype {
        animal: Animal::Wolf,
        passive: passive(
            "Pack Sense",
            PassiveTrigger::Conditional(TargetHasDot),
            mult(125),
        ),
        abilities: [
            on_attack("Pack Howl", Standard, mult(130)),
            on_attack("Rend", Standard, dot(DotKind::Rend, 500, 3, 2)),
        ],
    },
    Archetype {
        animal: Animal::Monkey,
        passive: passive(
            "Primate Cortex",
            PassiveTrigger::MatchStart,
            Effect::CopyPassive,
        ),
        abilities: [
            on_attack("Chaos Strike", Standard, mult(150)),
            on_attack("Mimic", Strong, Effect::CopyRandomAbility { pct: 75 }),
        ],
    },
    Archetype {
        animal: Animal::Crocodile,
        passive: passive(
            "Death Roll",
            PassiveTrigger::Conditional(TargetHpBelow(25)),
            mult(150),
        ),
        abilities: [
            on_attack(
                "Death Roll",
                Standard,
                Effect::ConditionalDamageMult {
                    pct: 150,
                    condition: TargetHpBelow(50),
                },
            ),
            on_defend("Thick Scales", Standard, reduce(50)),
        ],
    },
    Archetype {
        animal: Animal::Eagle,
        passive: passive(
            "Aerial Strike",
            PassiveTrigger::Conditional(Always),
            Effect::MovementBonus { extra_steps: 1 },
        ),
        abilities: [
            on_attack("Dive", Strong, mult(200)),
            on_defend("Keen Eye", Standard, dodge(2000, 3)),
        ],
    },
    Archetype {
        animal: Animal::Snake,
        passive: passive(
            "Venom Glands",
            PassiveTrigger::OpeningAttack,
            dot(DotKind::Venom, 300, 3, 3),
        ),
        abilities: [
            on_attack("Venom", Standard, dot(DotKind::Venom, 300, 3, 3)),
            on_defend("Coil", Standard, dodge(10_000, 2)),
        ],
    },
    Archetype {
        animal: Animal::Raven,
        passive: passive(
            "Omen",
            PassiveTrigger::Conditional(Always),
            Effect::ResistBoost {
                bp: 500,
                duration: 0,
            },
        ),
        abilities: [
            once(on_defend("Shadow Clone", Standard, reduce(100))),
            on_attack("Curse", Standard, miss(2000, 3)),
        ],
    },
    Archetype {
        animal: Animal::Shark,
        passive: passive(
            "Blood Frenzy",
            PassiveTrigger::Conditional(TargetHpBelow(50)),
            mult(130),
        ),
        abilities: [
            on_attack(
                "Blood Frenzy",
                Strong,
                Effect::ConditionalDamageMult {
                    pct: 200,
                    condition: TargetHpBelow(50),
                },
            ),
            on_attack("Bite", Standard, dot(DotKind::Bleed, 400, 3, 1)),
        ],
    },
    Archetype {
        animal: Animal::Owl,
        passive: passive(
            "Night Vision",
            PassiveTrigger::Conditional(Always),
            miss(500, 0),
        ),
        abilities: [
            on_defend("Foresight", Standard, dodge(3000, 3)),
            on_attack("Silent Strike", Standard, mult(150)),
        ],
    },
    Archetype {
        animal: Animal::Fox,
        passive: passive(
            "Cunning",
            PassiveTrigger::Conditional(SelfHpBelow(50)),
            dodge(1000, 0),
        ),
        abilities: [
            on_defend("Evasion", Standard, dodge(5000, 2)),
            on_defend("Trick", Standard, miss(2500, 3)),
        ],
    },
    Archetype {
        animal: Animal::Scorpion,
        passive: passive(
            "Paralytic Sting",
            PassiveTrigger::OpeningAttack,
            Effect::Stun { actions: 1 },
        ),
        abilities: [
            on_attack("Sting", Standard, Effect::Stun { actions: 1 }),
            on_defend("Exoskeleton", Standard, reduce(60)),
        ],
    },
];

/// Look up an animal's archetype.
#[must_use]
pub fn archetype(animal: Animal) -> &'static Archetype {
    // CATALOG is declared in Animal::ALL order; the test below pins that.
    &CATALOG[animal as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_matches_enum() {
        for animal in Animal::ALL {
            assert_eq!(archetype(animal).animal, animal);
        }
    }

    #[test]
    fn test_parse_animal() {
        assert_eq!("Tiger".parse::<Animal>(), Ok(Animal::Tiger));
        let err = "unicorn".parse::<Animal>().unwrap_err();
        match err {
            ValidationError::UnknownAnimal { name, valid } => {
                assert_eq!(name, "unicorn");
                assert!(valid.contains("scorpion"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_names_unique() {
        let mut names: Vec<_> = Animal::ALL.iter().map(|a| a.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 14);
    }

    #[test]
    fn test_scaled_multiplier_bonus() {
        assert_eq!(mult(200).scaled(75), mult(175));
        assert_eq!(mult(160).scaled(75), mult(145));
        assert_eq!(reduce(60).scaled(75), reduce(45));
        assert_eq!(
            Effect::Stun { actions: 1 }.scaled(75),
            Effect::Stun { actions: 1 }
        );
    }

    #[test]
    fn test_single_use_abilities_flagged() {
        let bear = archetype(Animal::Bear);
        assert!(bear.abilities[1].single_use);
        assert_eq!(bear.abilities[1].gate, Some(SelfHpBelow(15)));
        assert!(!bear.abilities[0].single_use);
    }
}
