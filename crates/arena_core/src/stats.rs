//! Stat allocations and the pure formulas that turn them into combat values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::archetypes::Animal;
use crate::config::StatConfig;
use crate::error::ValidationError;

/// One of the four allocatable stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    /// Hit points.
    Hp,
    /// Attack.
    Atk,
    /// Speed.
    Spd,
    /// Willpower.
    Wil,
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Hp => "hp",
            Self::Atk => "atk",
            Self::Spd => "spd",
            Self::Wil => "wil",
        };
        f.write_str(name)
    }
}

/// An animal plus a validated stat allocation.
///
/// Only constructible through validation, so every `Build` in existence
/// satisfies the allocation rules it was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBuild", into = "RawBuild")]
pub struct Build {
    animal: Animal,
    hp: u32,
    atk: u32,
    spd: u32,
    wil: u32,
}

/// Unvalidated wire form of a [`Build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawBuild {
    animal: Animal,
    hp: i64,
    atk: i64,
    spd: i64,
    wil: i64,
}

impl TryFrom<RawBuild> for Build {
    type Error = ValidationError;

    fn try_from(raw: RawBuild) -> Result<Self, Self::Error> {
        Self::new(raw.animal, raw.hp, raw.atk, raw.spd, raw.wil)
    }
}

impl From<Build> for RawBuild {
    fn from(build: Build) -> Self {
        Self {
            animal: build.animal,
            hp: i64::from(build.hp),
            atk: i64::from(build.atk),
            spd: i64::from(build.spd),
            wil: i64::from(build.wil),
        }
    }
}

impl Build {
    /// Validate against the published allocation rules (sum 20, each at least 1).
    pub fn new(
        animal: Animal,
        hp: i64,
        atk: i64,
        spd: i64,
        wil: i64,
    ) -> Result<Self, ValidationError> {
        Self::with_rules(animal, [hp, atk, spd, wil], &StatConfig::default())
    }

    /// Validate `[hp, atk, spd, wil]` against explicit rules.
    pub fn with_rules(
        animal: Animal,
        stats: [i64; 4],
        rules: &StatConfig,
    ) -> Result<Self, ValidationError> {
        let [hp, atk, spd, wil] = stats;
        let kinds = [StatKind::Hp, StatKind::Atk, StatKind::Spd, StatKind::Wil];
        for (stat, value) in kinds.into_iter().zip(stats) {
            if value < i64::from(rules.min_stat) {
                return Err(ValidationError::StatBelowMinimum {
                    stat,
                    value,
                    minimum: rules.min_stat,
                });
            }
        }

        // Saturates instead of overflowing; any saturated total is rejected below.
        let total = stats.iter().fold(0i64, |acc, &v| acc.saturating_add(v));
        if total != i64::from(rules.stat_total) {
            return Err(ValidationError::StatSum {
                expected: rules.stat_total,
                total,
                hp,
                atk,
                spd,
                wil,
            });
        }

        // Each stat is at least min_stat and the sum fits in u32, so these cannot fail.
        let narrow = |v: i64| u32::try_from(v).unwrap_or(u32::MAX);
        Ok(Self {
            animal,
            hp: narrow(hp),
            atk: narrow(atk),
            spd: narrow(spd),
            wil: narrow(wil),
        })
    }

    /// Re-check this build against a (possibly non-default) rule set.
    pub fn check(&self, rules: &StatConfig) -> Result<(), ValidationError> {
        Self::with_rules(self.animal, self.stats().map(i64::from), rules).map(|_| ())
    }

    /// Archetype of this build.
    #[must_use]
    pub const fn animal(&self) -> Animal {
        self.animal
    }

    /// Allocated hp.
    #[must_use]
    pub const fn hp(&self) -> u32 {
        self.hp
    }

    /// Allocated atk.
    #[must_use]
    pub const fn atk(&self) -> u32 {
        self.atk
    }

    /// Allocated spd.
    #[must_use]
    pub const fn spd(&self) -> u32 {
        self.spd
    }

    /// Allocated wil.
    #[must_use]
    pub const fn wil(&self) -> u32 {
        self.wil
    }

    /// `[hp, atk, spd, wil]`.
    #[must_use]
    pub const fn stats(&self) -> [u32; 4] {
        [self.hp, self.atk, self.spd, self.wil]
    }

    /// Compute derived combat statistics.
    #[must_use]
    pub fn derive(&self, rules: &StatConfig) -> DerivedStats {
        DerivedStats::from_build(self, rules)
    }
}

impl fmt::Display for Build {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}/{}/{}",
            self.animal, self.hp, self.atk, self.spd, self.wil
        )
    }
}

impl FromStr for Build {
    type Err = ValidationError;

    /// Parse `"bear 3 14 2 1"` (also accepts `"bear 3/14/2/1"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(|c: char| c.is_whitespace() || c == '/')
            .filter(|p| !p.is_empty())
            .collect();

        let malformed = |reason: String| ValidationError::MalformedBuild {
            input: s.to_string(),
            reason,
        };

        if parts.len() != 5 {
            return Err(malformed(format!(
                "expected 5 parts (animal hp atk spd wil), got {}",
                parts.len()
            )));
        }

        let animal: Animal = parts[0].parse()?;
        let mut stats = [0i64; 4];
        let kinds = [StatKind::Hp, StatKind::Atk, StatKind::Spd, StatKind::Wil];
        for ((slot, raw), kind) in stats.iter_mut().zip(&parts[1..]).zip(kinds) {
            *slot = raw
                .parse()
                .map_err(|_| malformed(format!("{kind} '{raw}' is not an integer")))?;
        }

        let [hp, atk, spd, wil] = stats;
        Self::new(animal, hp, atk, spd, wil)
    }
}

/// Combat values computed once per match from a [`Build`].
///
/// Percentages are basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DerivedStats {
    /// `hp_base + hp_per_point * hp`.
    pub max_hp: i32,
    /// `floor(2 + 0.85 * atk)`.
    pub base_dmg: i32,
    /// `clamp(2.5% * (spd - 1), 0, 30%)`.
    pub dodge_bp: u32,
    /// `min(3.3% * wil, 60%)`.
    pub resist_bp: u32,
    /// `0.08% * wil`, added to this combatant's own proc rates.
    pub proc_bonus_bp: u32,
}

impl DerivedStats {
    /// Apply the stat formulas.
    #[must_use]
    pub fn from_build(build: &Build, rules: &StatConfig) -> Self {
        let as_i32 = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        let max_hp = rules.hp_base + rules.hp_per_point * as_i32(build.hp);
        // Non-negative operands, so integer division is the floor.
        let base_dmg =
            (rules.dmg_base_hundredths + rules.dmg_per_atk_hundredths * as_i32(build.atk)) / 100;

        Self {
            max_hp,
            base_dmg,
            dodge_bp: rules.dodge_bp(build.spd),
            resist_bp: rules.resist_bp(build.wil),
            proc_bonus_bp: rules.proc_bonus_bp_per_wil.saturating_mul(build.wil),
        }
    }
}
