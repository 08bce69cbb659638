//! Match driver: seed, build, run, report.

use serde::{Deserialize, Serialize};

use crate::combatant::Side;
use crate::config::ArenaConfig;
use crate::engine::Engine;
use crate::error::Result;
use crate::events::{MatchEvent, Winner};
use crate::rng::generate_seed;
use crate::stats::Build;

/// What a finished match reports to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// `1`, `2`, or `draw`.
    pub winner: Winner,
    /// Ticks played.
    pub ticks_elapsed: u32,
    /// Side A's HP at the end (may be negative).
    pub final_hp_a: i32,
    /// Side B's HP at the end (may be negative).
    pub final_hp_b: i32,
    /// Seed the stream was created from.
    pub seed: u64,
}

impl MatchOutcome {
    /// Read the outcome off a finished engine.
    #[must_use]
    pub fn from_engine(engine: &Engine, winner: Winner) -> Self {
        Self {
            winner,
            ticks_elapsed: engine.tick(),
            final_hp_a: engine.fighter(Side::A).hp,
            final_hp_b: engine.fighter(Side::B).hp,
            seed: engine.seed(),
        }
    }
}

/// Run one match to completion.
///
/// With `seed = None` a fresh seed is generated and reported in the outcome.
/// Invalid builds or configuration are rejected before any state is created.
pub fn simulate(
    config: &ArenaConfig,
    build_a: &Build,
    build_b: &Build,
    seed: Option<u64>,
) -> Result<MatchOutcome> {
    let mut engine = Engine::new(config, *build_a, *build_b, seed.unwrap_or_else(generate_seed))?;
    let winner = engine.run();
    Ok(MatchOutcome::from_engine(&engine, winner))
}

/// As [`simulate`], also returning the full event log.
pub fn simulate_recorded(
    config: &ArenaConfig,
    build_a: &Build,
    build_b: &Build,
    seed: Option<u64>,
) -> Result<(MatchOutcome, Vec<MatchEvent>)> {
    let mut engine = Engine::new(config, *build_a, *build_b, seed.unwrap_or_else(generate_seed))?
        .with_recording();
    let winner = engine.run();
    let outcome = MatchOutcome::from_engine(&engine, winner);
    Ok((outcome, engine.take_events()))
}

/// Play `games` matches with seeds `seed_start, seed_start + 1, ...`.
pub fn simulate_many(
    config: &ArenaConfig,
    build_a: &Build,
    build_b: &Build,
    seed_start: u64,
    games: u32,
) -> Result<Vec<MatchOutcome>> {
    (0..u64::from(games))
        .map(|i| simulate(config, build_a, build_b, Some(seed_start.wrapping_add(i))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builds() -> (Build, Build) {
        (
            "bear 3 14 2 1".parse().expect("valid"),
            "buffalo 8 6 4 2".parse().expect("valid"),
        )
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let (a, b) = builds();
        let config = ArenaConfig::default();
        let first = simulate(&config, &a, &b, Some(42)).expect("runs");
        let second = simulate(&config, &a, &b, Some(42)).expect("runs");
        assert_eq!(first, second);
        assert_eq!(first.seed, 42);
        assert!(first.ticks_elapsed >= 1 && first.ticks_elapsed <= 60);
    }

    #[test]
    fn test_generated_seed_is_reported_and_replayable() {
        let (a, b) = builds();
        let config = ArenaConfig::default();
        let first = simulate(&config, &a, &b, None).expect("runs");
        let again = simulate(&config, &a, &b, Some(first.seed)).expect("runs");
        assert_eq!(first, again);
    }

    #[test]
    fn test_recorded_matches_plain() {
        let (a, b) = builds();
        let config = ArenaConfig::default();
        let plain = simulate(&config, &a, &b, Some(9)).expect("runs");
        let (recorded, events) = simulate_recorded(&config, &a, &b, Some(9)).expect("runs");
        assert_eq!(plain, recorded);
        assert!(!events.is_empty());
    }

    #[test]
    fn test_winner_consistent_with_hp() {
        let (a, b) = builds();
        let config = ArenaConfig::default();
        for outcome in simulate_many(&config, &a, &b, 0, 40).expect("runs") {
            match outcome.winner {
                Winner::A => assert!(outcome.final_hp_a > 0),
                Winner::B => assert!(outcome.final_hp_b > 0),
                Winner::Draw => assert!(
                    outcome.final_hp_a == outcome.final_hp_b
                        || (outcome.final_hp_a <= 0 && outcome.final_hp_b <= 0)
                ),
            }
        }
    }
}
