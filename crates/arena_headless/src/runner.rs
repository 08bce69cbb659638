//! Sequential match runners: one pairing, a round robin, determinism checks.

use arena_core::config::ArenaConfig;
use arena_core::error::Result;
use arena_core::events::MatchEvent;
use arena_core::simulation::{simulate, simulate_recorded};
use arena_core::stats::Build;
use tracing::{debug, info};

use crate::metrics::{rank_builds, MatchRecord, MatchupSummary, RankingEntry, WinRateMatrix};

/// Results of `games` matches between two builds.
#[derive(Debug, Clone)]
pub struct PairingRun {
    /// One record per match, in seed order.
    pub records: Vec<MatchRecord>,
    /// Aggregate counts.
    pub summary: MatchupSummary,
    /// Event log of the first match, when requested.
    pub first_match_log: Option<Vec<MatchEvent>>,
}

/// Play `games` matches with seeds `seed, seed + 1, ...`.
///
/// With `log_first` the first match is recorded and its events returned.
pub fn run_pairing(
    config: &ArenaConfig,
    config_hash: &str,
    build_1: &Build,
    build_2: &Build,
    games: u32,
    seed: u64,
    log_first: bool,
) -> Result<PairingRun> {
    let mut records = Vec::with_capacity(games as usize);
    let mut first_match_log = None;

    for g in 0..u64::from(games) {
        let match_seed = seed.wrapping_add(g);
        let outcome = if g == 0 && log_first {
            let (outcome, events) = simulate_recorded(config, build_1, build_2, Some(match_seed))?;
            first_match_log = Some(events);
            outcome
        } else {
            simulate(config, build_1, build_2, Some(match_seed))?
        };
        records.push(MatchRecord::new(build_1, build_2, &outcome, config_hash));
    }

    let summary = MatchupSummary::from_records(&records);
    debug!(
        build_1 = %build_1,
        build_2 = %build_2,
        wins_1 = summary.wins_1,
        wins_2 = summary.wins_2,
        draws = summary.draws,
        "pairing finished"
    );
    Ok(PairingRun {
        records,
        summary,
        first_match_log,
    })
}

/// Every unordered pair of builds played against each other.
#[derive(Debug, Clone)]
pub struct RoundRobin {
    /// Build labels in input order.
    pub builds: Vec<String>,
    /// One summary per pair, `(i, j)` with `i < j`.
    pub matchups: Vec<MatchupSummary>,
    /// Pairwise win rates.
    pub matrix: WinRateMatrix,
    /// Builds by overall win rate.
    pub ranking: Vec<RankingEntry>,
    /// All match records.
    pub records: Vec<MatchRecord>,
}

/// Seed used by the `k`-th pair (in `(i, j)`, `i < j` order) of a round robin.
#[must_use]
pub fn pair_seed(seed: u64, games: u32, k: u64) -> u64 {
    seed.wrapping_add(k.wrapping_mul(u64::from(games)))
}

/// Unordered pairs `(i, j)` with `i < j`, in round-robin order.
#[must_use]
pub fn pairings(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

/// Play every pair `games` times. Pair seeds advance by `games` per pair.
pub fn round_robin(
    config: &ArenaConfig,
    config_hash: &str,
    builds: &[Build],
    games: u32,
    seed: u64,
) -> Result<RoundRobin> {
    let labels: Vec<String> = builds.iter().map(ToString::to_string).collect();
    let mut matchups = Vec::new();
    let mut records = Vec::new();

    for (k, (i, j)) in (0u64..).zip(pairings(builds.len())) {
        let run = run_pairing(
            config,
            config_hash,
            &builds[i],
            &builds[j],
            games,
            pair_seed(seed, games, k),
            false,
        )?;
        matchups.push(run.summary);
        records.extend(run.records);
    }

    info!(
        builds = builds.len(),
        pairs = matchups.len(),
        matches = records.len(),
        "round robin finished"
    );
    Ok(RoundRobin {
        matrix: WinRateMatrix::from_matchups(&labels, &matchups),
        ranking: rank_builds(&labels, &matchups),
        builds: labels,
        matchups,
        records,
    })
}

/// Play the same match `runs` times and check every outcome is identical.
pub fn verify_determinism(
    config: &ArenaConfig,
    build_1: &Build,
    build_2: &Build,
    seed: u64,
    runs: u32,
) -> Result<bool> {
    let first = simulate(config, build_1, build_2, Some(seed))?;
    for _ in 1..runs {
        if simulate(config, build_1, build_2, Some(seed))? != first {
            return Ok(false);
        }
    }
    Ok(true)
}
