//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a match produces identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! The arena is a scoring oracle: the same seed, builds, and configuration
//! must produce a bit-identical outcome on every machine, every run.
//! Sources of non-determinism include:
//!
//! - **Floating-point math**: percentages are integer basis points and draws
//!   are fixed-point ([`arena_core::math::Fixed`]).
//!
//! - **Draw order**: every stochastic decision consumes the single match
//!   stream in a fixed order; an extra or skipped draw shifts every later
//!   decision. [`find_first_divergence`] pinpoints the tick where it happens.
//!
//! - **System randomness**: only [`arena_core::rng::generate_seed`] touches
//!   it, and the seed it returns is reported.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual formulas and ledger rules
//! 2. **Property tests**: random valid builds still produce deterministic outcomes
//! 3. **Integration tests**: full matches are reproducible
//! 4. **Parallel tests**: running N matches on N threads all agree

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use arena_core::config::ArenaConfig;
use arena_core::engine::Engine;
use arena_core::simulation::{simulate, MatchOutcome};
use arena_core::stats::Build;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of ticks simulated.
    pub ticks: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic engine).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert determinism, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Match is non-deterministic!\n\
                 Runs: {}\n\
                 Ticks: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.ticks,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a stateful process multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `ticks` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance state by one step
/// * `hash` - Function to compute state hash
///
/// # Example
///
/// ```ignore
/// use arena_test_utils::determinism::verify_determinism;
///
/// let result = verify_determinism(
///     5,
///     60,
///     || fixtures::engine(fixtures::bear_glass_cannon(), fixtures::buffalo_tank(), 42),
///     |engine| { engine.step(); },
///     |engine| engine.state_hash(),
/// );
/// result.assert_deterministic();
/// ```
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    ticks: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..ticks {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        ticks,
    }
}

/// Play the same match `runs` times and compare final engine state hashes.
///
/// # Panics
///
/// Panics if the builds are invalid for `config`.
pub fn verify_match_determinism(
    config: &ArenaConfig,
    build_a: Build,
    build_b: Build,
    seed: u64,
    runs: usize,
) -> DeterminismResult {
    verify_determinism(
        runs,
        u64::from(config.max_ticks),
        || Engine::new(config, build_a, build_b, seed).expect("valid match inputs"),
        |engine| {
            engine.step();
        },
        Engine::state_hash,
    )
}

/// Result of parallel match runs.
#[derive(Debug, Clone)]
pub struct ParallelMatchResult {
    /// Outcome from each thread.
    pub outcomes: Vec<MatchOutcome>,
    /// Number of threads used.
    pub num_runs: usize,
}

impl ParallelMatchResult {
    /// Check if all runs produced identical outcomes.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.outcomes.windows(2).all(|w| w[0] == w[1])
    }

    /// Assert all runs matched.
    ///
    /// # Panics
    ///
    /// Panics if runs produced different outcomes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic() {
            panic!(
                "Parallel matches diverged!\n\
                 Runs: {}\n\
                 Outcomes: {:?}",
                self.num_runs, self.outcomes
            );
        }
    }
}

/// Play the same match on `num_runs` scoped threads at once.
///
/// Catches anything that depends on thread scheduling or shared state.
///
/// # Panics
///
/// Panics if the match inputs are invalid or a worker thread panics.
pub fn run_parallel_matches_scoped(
    config: &ArenaConfig,
    build_a: Build,
    build_b: Build,
    seed: u64,
    num_runs: usize,
) -> ParallelMatchResult {
    let outcomes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_runs)
            .map(|_| {
                s.spawn(|| {
                    simulate(config, &build_a, &build_b, Some(seed)).expect("valid match inputs")
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().expect("match thread panicked"))
            .collect()
    });

    ParallelMatchResult { outcomes, num_runs }
}

/// Step two identical engines side by side and report the first tick at
/// which their state hashes differ.
///
/// # Returns
///
/// `None` if they never diverge, `Some(tick)` otherwise (0 means the
/// freshly built engines already differ).
pub fn find_first_divergence<F>(setup_fn: F) -> Option<u32>
where
    F: Fn() -> Engine,
{
    let mut first = setup_fn();
    let mut second = setup_fn();

    if first.state_hash() != second.state_hash() {
        return Some(0);
    }

    loop {
        let done_a = first.step().is_some();
        let done_b = second.step().is_some();

        if first.state_hash() != second.state_hash() || done_a != done_b {
            return Some(first.tick());
        }
        if done_a {
            return None;
        }
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for arena inputs.
///
/// These generate random but reproducible builds for property-based tests.
pub mod strategies {
    use arena_core::archetypes::Animal;
    use arena_core::stats::Build;
    use proptest::prelude::*;

    /// Any catalog animal.
    pub fn arb_animal() -> impl Strategy<Value = Animal> {
        proptest::sample::select(Animal::ALL.to_vec())
    }

    /// A valid `[hp, atk, spd, wil]` allocation: each at least 1, sum 20.
    pub fn arb_allocation() -> impl Strategy<Value = [i64; 4]> {
        // Three cut points in 1..=19 split the 20 points into four positive parts.
        proptest::collection::btree_set(1i64..20, 3).prop_map(|cuts| {
            let c: Vec<i64> = cuts.into_iter().collect();
            [c[0], c[1] - c[0], c[2] - c[1], 20 - c[2]]
        })
    }

    /// A valid build.
    pub fn arb_build() -> impl Strategy<Value = Build> {
        (arb_animal(), arb_allocation()).prop_map(|(animal, [hp, atk, spd, wil])| {
            Build::new(animal, hp, atk, spd, wil).expect("allocation strategy yields valid builds")
        })
    }

    /// Four integers that may or may not be a valid allocation.
    pub fn arb_raw_stats() -> impl Strategy<Value = [i64; 4]> {
        prop::array::uniform4(-3i64..25)
    }

    /// Match seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use proptest::prelude::*;

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_reference_match_determinism() {
        verify_match_determinism(
            &ArenaConfig::default(),
            fixtures::bear_glass_cannon(),
            fixtures::buffalo_tank(),
            42,
            5,
        )
        .assert_deterministic();
    }

    #[test]
    fn test_parallel_matches_agree() {
        run_parallel_matches_scoped(
            &ArenaConfig::default(),
            fixtures::bear_glass_cannon(),
            fixtures::buffalo_tank(),
            42,
            8,
        )
        .assert_deterministic();
    }

    #[test]
    fn test_no_divergence() {
        let divergence = find_first_divergence(|| {
            fixtures::engine(fixtures::snake_dot(), fixtures::owl_evasive(), 1234)
        });
        assert!(divergence.is_none(), "Expected no divergence");
    }

    #[test]
    fn test_divergence_detected_for_different_seeds() {
        let seeds = std::sync::atomic::AtomicU64::new(0);
        let divergence = find_first_divergence(|| {
            let seed = seeds.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
            fixtures::engine(fixtures::bear_glass_cannon(), fixtures::buffalo_tank(), seed)
        });
        assert!(divergence.is_some());
    }

    proptest! {
        #[test]
        fn prop_allocations_are_valid(stats in strategies::arb_allocation()) {
            prop_assert_eq!(stats.iter().sum::<i64>(), 20);
            prop_assert!(stats.iter().all(|&s| s >= 1));
        }
    }
}
