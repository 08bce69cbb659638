//! Parallel batch evaluation.
//!
//! Runs every pairing of a build pool in parallel using rayon and persists
//! both an aggregate summary and the raw match records.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use arena_core::config::ArenaConfig;
use arena_core::events::Winner;
use arena_core::simulation::simulate;
use arena_core::stats::Build;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::metrics::{write_records, BatchSummary, MatchRecord};
use crate::runner::{pair_seed, pairings};

/// File name of the summary inside the output directory.
pub const RESULTS_FILE: &str = "batch_results.json";

/// File name of the JSON-lines record log inside the output directory.
pub const RECORDS_FILE: &str = "matches.jsonl";

/// Configuration for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Build pool; every unordered pair is played
    pub builds: Vec<Build>,
    /// Matches per pairing
    pub games_per_pair: u32,
    /// Maximum parallel matches (0 = use rayon default)
    pub parallel_games: u32,
    /// Output directory for results
    pub output_dir: PathBuf,
    /// Starting seed for deterministic runs
    pub seed_start: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            builds: Vec::new(),
            games_per_pair: 100,
            parallel_games: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
        }
    }
}

impl BatchConfig {
    /// Create config for a build pool
    #[must_use]
    pub fn new(builds: Vec<Build>, games_per_pair: u32) -> Self {
        Self {
            builds,
            games_per_pair,
            ..Default::default()
        }
    }

    /// Set output directory
    #[must_use]
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set thread count
    #[must_use]
    pub fn with_parallelism(mut self, threads: u32) -> Self {
        self.parallel_games = threads;
        self
    }

    /// Total matches this batch will play.
    #[must_use]
    pub fn total_games(&self) -> u32 {
        let pairs = u32::try_from(pairings(self.builds.len()).len()).unwrap_or(u32::MAX);
        pairs.saturating_mul(self.games_per_pair)
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Digest of the rules the batch ran under
    pub config_hash: String,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Individual match records, in pairing then seed order
    #[serde(skip)]
    pub records: Vec<MatchRecord>,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file (records are stored separately)
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Write the summary and the record log into `dir`.
    pub fn save_to_dir(&self, dir: &Path) -> std::io::Result<()> {
        std::fs::create_dir_all(dir)?;
        self.save(&dir.join(RESULTS_FILE))?;
        write_records(&dir.join(RECORDS_FILE), &self.records)
    }
}

/// Error during batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchError {
    /// Match index within the batch
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

/// Progress tracking for batch runs
#[derive(Debug)]
pub struct BatchProgress {
    /// Total matches
    pub total: u32,
    completed: AtomicU32,
    draws: AtomicU32,
    start_time: Instant,
}

impl BatchProgress {
    /// Create new progress tracker
    #[must_use]
    pub fn new(total: u32) -> Self {
        Self {
            total,
            completed: AtomicU32::new(0),
            draws: AtomicU32::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed match
    pub fn record_completion(&self, winner: Winner) -> u32 {
        if winner == Winner::Draw {
            self.draws.fetch_add(1, Ordering::Relaxed);
        }
        self.completed.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Get current completion count
    #[must_use]
    pub fn current(&self) -> u32 {
        self.completed.load(Ordering::Relaxed)
    }

    /// Draws so far
    #[must_use]
    pub fn draws(&self) -> u32 {
        self.draws.load(Ordering::Relaxed)
    }

    /// Get completion percentage
    #[must_use]
    pub fn percentage(&self) -> f64 {
        f64::from(self.current()) / f64::from(self.total.max(1)) * 100.0
    }

    /// Get estimated time remaining
    #[must_use]
    pub fn eta(&self) -> Duration {
        let completed = self.current();
        if completed == 0 {
            return Duration::from_secs(0);
        }
        let per_game = self.start_time.elapsed().as_secs_f64() / f64::from(completed);
        let remaining = self.total.saturating_sub(completed);
        Duration::from_secs_f64(per_game * f64::from(remaining))
    }
}

/// One scheduled match.
#[derive(Debug, Clone, Copy)]
struct Job {
    index: u32,
    build_1: usize,
    build_2: usize,
    seed: u64,
}

fn schedule(config: &BatchConfig) -> Vec<Job> {
    let mut jobs = Vec::new();
    let mut index = 0u32;
    for (k, (i, j)) in (0u64..).zip(pairings(config.builds.len())) {
        let base = pair_seed(config.seed_start, config.games_per_pair, k);
        for g in 0..u64::from(config.games_per_pair) {
            jobs.push(Job {
                index,
                build_1: i,
                build_2: j,
                seed: base.wrapping_add(g),
            });
            index += 1;
        }
    }
    jobs
}

/// Run a batch of matches.
///
/// Seeds follow the round-robin scheme, so a batch produces exactly the
/// records a sequential round robin with the same inputs would.
pub fn run_batch(config: BatchConfig, rules: &ArenaConfig, config_hash: &str) -> BatchResults {
    let start = Instant::now();
    let jobs = schedule(&config);
    let progress = BatchProgress::new(u32::try_from(jobs.len()).unwrap_or(u32::MAX));

    info!(
        builds = config.builds.len(),
        games_per_pair = config.games_per_pair,
        total = progress.total,
        "Starting batch run"
    );

    if config.parallel_games > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build_global()
            .ok(); // Ignore if already set
    }

    let results: Vec<Result<MatchRecord, BatchError>> = jobs
        .into_par_iter()
        .map(|job| {
            let build_1 = &config.builds[job.build_1];
            let build_2 = &config.builds[job.build_2];
            match simulate(rules, build_1, build_2, Some(job.seed)) {
                Ok(outcome) => {
                    let completed = progress.record_completion(outcome.winner);
                    if completed % 1000 == 0 {
                        info!(
                            completed,
                            total = progress.total,
                            percent = format!("{:.1}", progress.percentage()),
                            eta_secs = progress.eta().as_secs(),
                            "Batch progress"
                        );
                    }
                    Ok(MatchRecord::new(build_1, build_2, &outcome, config_hash))
                }
                Err(e) => {
                    warn!("Match {} failed: {}", job.index, e);
                    Err(BatchError {
                        game_index: job.index,
                        seed: job.seed,
                        message: e.to_string(),
                    })
                }
            }
        })
        .collect();

    let (records, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let records: Vec<MatchRecord> = records.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let labels: Vec<String> = config.builds.iter().map(ToString::to_string).collect();
    let summary = BatchSummary::from_records(&labels, &records);
    let duration_seconds = start.elapsed().as_secs_f64();

    debug!(draws = progress.draws(), "batch draws");
    info!(
        "Batch complete: {} matches in {:.1}s ({:.1} matches/sec)",
        records.len(),
        duration_seconds,
        records.len() as f64 / duration_seconds.max(1e-9)
    );

    BatchResults {
        config,
        config_hash: config_hash.to_string(),
        summary,
        records,
        duration_seconds,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::read_records;
    use crate::runner::round_robin;
    use arena_test_utils::fixtures;

    fn pool() -> Vec<Build> {
        vec![
            fixtures::bear_glass_cannon(),
            fixtures::buffalo_tank(),
            fixtures::snake_dot(),
        ]
    }

    #[test]
    fn test_batch_config_builder() {
        let config = BatchConfig::new(pool(), 50)
            .with_output(PathBuf::from("/tmp/results"))
            .with_seed(12345);

        assert_eq!(config.games_per_pair, 50);
        assert_eq!(config.seed_start, 12345);
        assert_eq!(config.total_games(), 150);
    }

    #[test]
    fn test_progress_tracking() {
        let progress = BatchProgress::new(100);
        assert_eq!(progress.current(), 0);
        assert!(progress.percentage().abs() < f64::EPSILON);

        progress.record_completion(Winner::A);
        progress.record_completion(Winner::Draw);
        assert_eq!(progress.record_completion(Winner::B), 3);

        assert_eq!(progress.current(), 3);
        assert_eq!(progress.draws(), 1);
    }

    #[test]
    fn test_batch_matches_sequential_round_robin() {
        let rules = ArenaConfig::default();
        let results = run_batch(BatchConfig::new(pool(), 6).with_seed(7), &rules, "88c1a2b2");
        let sequential = round_robin(&rules, "88c1a2b2", &pool(), 6, 7).expect("valid builds");

        assert!(results.errors.is_empty());
        assert_eq!(results.records, sequential.records);
        assert_eq!(results.summary.matchups, sequential.matchups);
        assert_eq!(results.summary.total_games, 18);
    }

    #[test]
    fn test_batch_results_save_load() {
        let rules = ArenaConfig::default();
        let results = run_batch(BatchConfig::new(pool(), 4), &rules, "88c1a2b2");

        let dir = tempfile::tempdir().expect("tempdir");
        results.save_to_dir(dir.path()).expect("save");
        assert!(dir.path().join(RESULTS_FILE).exists());

        let loaded = BatchResults::load(&dir.path().join(RESULTS_FILE)).expect("load");
        assert_eq!(loaded.summary.total_games, 12);
        assert_eq!(loaded.config.builds, pool());
        assert_eq!(loaded.config_hash, "88c1a2b2");

        let records = read_records(&dir.path().join(RECORDS_FILE)).expect("records");
        assert_eq!(records, results.records);
    }
}
