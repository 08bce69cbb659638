//! Headless match runner for batch evaluation and CI verification.
//!
//! Drives [`arena_core`] without any interactive surface:
//!
//! - **Pairings**: many seeded matches between two builds
//! - **Round robins and batches**: every pair of a build pool, sequentially
//!   or in parallel with rayon
//! - **Series**: best-of-N play between fixed builds
//! - **Verification**: determinism checks and replay re-runs
//!
//! Results go to stdout, logs to stderr. Batches persist a JSON summary plus
//! a JSON-lines record per match.
//!
//! # Example
//!
//! ```bash
//! # Head to head
//! cargo run -p arena_headless -- run --build1 "bear 3 14 2 1" --build2 "buffalo 8 6 4 2" --games 100 --seed 42
//!
//! # Parallel batch over a pool
//! cargo run -p arena_headless -- batch --builds "bear 3 14 2 1" "wolf 5 10 3 2" "owl 4 5 8 3" --output results/
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod metrics;
pub mod rules;
pub mod runner;
pub mod series;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, MatchRecord, MatchupSummary, WinRateMatrix};
pub use rules::{load_rules, LoadedRules};
pub use runner::{round_robin, run_pairing, verify_determinism, PairingRun, RoundRobin};
pub use series::{run_series, SeriesConfig, SeriesTally};
