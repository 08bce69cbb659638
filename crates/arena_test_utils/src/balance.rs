//! Matchup statistics for balance checks.
//!
//! Runs many seeded matches of one pairing and summarizes who won.

use arena_core::config::ArenaConfig;
use arena_core::error::Result;
use arena_core::events::Winner;
use arena_core::simulation::{simulate_many, MatchOutcome};
use arena_core::stats::Build;

/// Statistics for a set of matches between the same two builds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchupStats {
    /// Total matches run.
    pub total_matches: u32,
    /// Wins for side A.
    pub wins_a: u32,
    /// Wins for side B.
    pub wins_b: u32,
    /// Draws (timeouts at equal HP or double knockouts).
    pub draws: u32,
    /// Average ticks to resolution.
    pub avg_ticks: f64,
    /// Matches that reached the tick limit.
    pub timeouts: u32,
}

impl MatchupStats {
    /// Summarize a set of outcomes.
    #[must_use]
    pub fn from_outcomes(outcomes: &[MatchOutcome], max_ticks: u32) -> Self {
        let mut stats = Self::default();
        let mut total_ticks = 0u64;
        for outcome in outcomes {
            stats.total_matches += 1;
            total_ticks += u64::from(outcome.ticks_elapsed);
            match outcome.winner {
                Winner::A => stats.wins_a += 1,
                Winner::B => stats.wins_b += 1,
                Winner::Draw => stats.draws += 1,
            }
            if outcome.ticks_elapsed >= max_ticks {
                stats.timeouts += 1;
            }
        }
        if stats.total_matches > 0 {
            stats.avg_ticks = total_ticks as f64 / f64::from(stats.total_matches);
        }
        stats
    }

    /// Win rate for side A (0.0 to 1.0).
    #[must_use]
    pub fn win_rate_a(&self) -> f64 {
        if self.total_matches == 0 {
            return 0.5;
        }
        f64::from(self.wins_a) / f64::from(self.total_matches)
    }

    /// Win rate for side B (0.0 to 1.0).
    #[must_use]
    pub fn win_rate_b(&self) -> f64 {
        if self.total_matches == 0 {
            return 0.5;
        }
        f64::from(self.wins_b) / f64::from(self.total_matches)
    }

    /// Check if the matchup is balanced (within acceptable range).
    #[must_use]
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        let rate = self.win_rate_a();
        rate >= min_rate && rate <= max_rate
    }
}

/// Play `games` seeded matches and summarize them.
pub fn run_matchup(
    config: &ArenaConfig,
    build_a: &Build,
    build_b: &Build,
    seed_start: u64,
    games: u32,
) -> Result<MatchupStats> {
    let outcomes = simulate_many(config, build_a, build_b, seed_start, games)?;
    Ok(MatchupStats::from_outcomes(&outcomes, config.max_ticks))
}
