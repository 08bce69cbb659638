//! Best-of-N series between two fixed builds.
//!
//! Series `k` uses seed `seed + k * 100`; its `g`-th game uses
//! `series_seed + g`. A series stops as soon as one side holds a majority.

use arena_core::config::ArenaConfig;
use arena_core::error::{ArenaError, Result};
use arena_core::events::Winner;
use arena_core::simulation::simulate;
use arena_core::stats::Build;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Seed spacing between consecutive series.
pub const SERIES_SEED_STRIDE: u64 = 100;

/// Series parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesConfig {
    /// Maximum games per series (odd).
    pub best_of: u32,
    /// Number of series to play.
    pub series_count: u32,
    /// Seed of series 0.
    pub seed: u64,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            best_of: 7,
            series_count: 10,
            seed: 0,
        }
    }
}

impl SeriesConfig {
    /// Game wins needed to take a series.
    #[must_use]
    pub const fn majority(&self) -> u32 {
        self.best_of / 2 + 1
    }
}

/// Result of a single series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesResult {
    /// Seed the series started from.
    pub series_seed: u64,
    /// Games won by side 1.
    pub wins_1: u32,
    /// Games won by side 2.
    pub wins_2: u32,
    /// Games played (including draws).
    pub games_played: u32,
    /// Side with more game wins, or a draw when level.
    pub winner: Winner,
}

/// Totals over all series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesTally {
    /// Every series in order.
    pub series: Vec<SeriesResult>,
    /// Series won by side 1.
    pub series_wins_1: u32,
    /// Series won by side 2.
    pub series_wins_2: u32,
    /// Games played across all series.
    pub total_games: u32,
}

/// Play one best-of-N series.
pub fn play_series(
    config: &ArenaConfig,
    build_1: &Build,
    build_2: &Build,
    best_of: u32,
    series_seed: u64,
) -> Result<SeriesResult> {
    let majority = best_of / 2 + 1;
    let mut result = SeriesResult {
        series_seed,
        wins_1: 0,
        wins_2: 0,
        games_played: 0,
        winner: Winner::Draw,
    };

    for g in 0..u64::from(best_of) {
        if result.wins_1 >= majority || result.wins_2 >= majority {
            break;
        }
        let outcome = simulate(config, build_1, build_2, Some(series_seed.wrapping_add(g)))?;
        result.games_played += 1;
        match outcome.winner {
            Winner::A => result.wins_1 += 1,
            Winner::B => result.wins_2 += 1,
            Winner::Draw => {}
        }
    }

    result.winner = match result.wins_1.cmp(&result.wins_2) {
        std::cmp::Ordering::Greater => Winner::A,
        std::cmp::Ordering::Less => Winner::B,
        std::cmp::Ordering::Equal => Winner::Draw,
    };
    Ok(result)
}

/// Play `series_count` series.
pub fn run_series(
    config: &ArenaConfig,
    build_1: &Build,
    build_2: &Build,
    series: &SeriesConfig,
) -> Result<SeriesTally> {
    if series.best_of == 0 {
        return Err(ArenaError::InvalidConfig(
            "best_of must be at least 1".to_string(),
        ));
    }

    let mut tally = SeriesTally::default();
    for k in 0..u64::from(series.series_count) {
        let series_seed = series
            .seed
            .wrapping_add(k.wrapping_mul(SERIES_SEED_STRIDE));
        let result = play_series(config, build_1, build_2, series.best_of, series_seed)?;
        debug!(
            series = k,
            wins_1 = result.wins_1,
            wins_2 = result.wins_2,
            winner = %result.winner,
            "series finished"
        );
        match result.winner {
            Winner::A => tally.series_wins_1 += 1,
            Winner::B => tally.series_wins_2 += 1,
            Winner::Draw => {}
        }
        tally.total_games += result.games_played;
        tally.series.push(result);
    }
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_test_utils::fixtures;

    #[test]
    fn test_majority() {
        assert_eq!(SeriesConfig::default().majority(), 4);
        let bo3 = SeriesConfig {
            best_of: 3,
            ..SeriesConfig::default()
        };
        assert_eq!(bo3.majority(), 2);
    }

    #[test]
    fn test_series_stops_at_majority() {
        let config = ArenaConfig::default();
        let tally = run_series(
            &config,
            &fixtures::bear_glass_cannon(),
            &fixtures::buffalo_tank(),
            &SeriesConfig {
                best_of: 7,
                series_count: 8,
                seed: 42,
            },
        )
        .expect("valid builds");

        assert_eq!(tally.series.len(), 8);
        for (k, s) in (0u64..).zip(&tally.series) {
            assert_eq!(s.series_seed, 42 + k * 100);
            assert!(s.games_played <= 7);
            assert!(s.wins_1 <= 4 && s.wins_2 <= 4);
            if s.wins_1 == 4 || s.wins_2 == 4 {
                assert_ne!(s.winner, Winner::Draw);
            }
        }
        assert_eq!(
            tally.total_games,
            tally.series.iter().map(|s| s.games_played).sum::<u32>()
        );
    }

    #[test]
    fn test_series_games_use_series_seeds() {
        let config = ArenaConfig::default();
        let (a, b) = (fixtures::snake_dot(), fixtures::owl_evasive());
        let result = play_series(&config, &a, &b, 1, 900).expect("valid builds");
        let direct = simulate(&config, &a, &b, Some(900)).expect("valid builds");
        assert_eq!(result.games_played, 1);
        assert_eq!(result.winner, direct.winner);
    }

    #[test]
    fn test_zero_best_of_rejected() {
        let series = SeriesConfig {
            best_of: 0,
            ..SeriesConfig::default()
        };
        assert!(run_series(
            &ArenaConfig::default(),
            &fixtures::snake_dot(),
            &fixtures::owl_evasive(),
            &series
        )
        .is_err());
    }
}
