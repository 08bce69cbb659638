//! Test fixtures and helpers.
//!
//! Reference builds and ready-made engines for consistent testing.

use arena_core::config::ArenaConfig;
use arena_core::engine::Engine;
use arena_core::stats::Build;

/// Parse a build string, panicking on bad input.
///
/// # Panics
///
/// Panics if `text` is not a valid build.
#[must_use]
pub fn build(text: &str) -> Build {
    text.parse()
        .unwrap_or_else(|e| panic!("invalid fixture build {text:?}: {e}"))
}

/// All-in attack bear: `bear 3 14 2 1`.
#[must_use]
pub fn bear_glass_cannon() -> Build {
    build("bear 3 14 2 1")
}

/// Sturdy buffalo: `buffalo 8 6 4 2`.
#[must_use]
pub fn buffalo_tank() -> Build {
    build("buffalo 8 6 4 2")
}

/// Poison-focused snake: `snake 4 6 5 5`.
#[must_use]
pub fn snake_dot() -> Build {
    build("snake 4 6 5 5")
}

/// Speed-heavy owl: `owl 4 5 8 3`.
#[must_use]
pub fn owl_evasive() -> Build {
    build("owl 4 5 8 3")
}

/// Flat 5/5/5/5 build for any animal.
#[must_use]
pub fn balanced(animal: &str) -> Build {
    build(&format!("{animal} 5 5 5 5"))
}

/// The embedded published configuration.
///
/// # Panics
///
/// Panics if the embedded configuration fails to parse.
#[must_use]
pub fn published_config() -> ArenaConfig {
    ArenaConfig::published().expect("embedded config parses")
}

/// An engine in `Setup` under the default rules.
///
/// # Panics
///
/// Panics if the builds are rejected.
#[must_use]
pub fn engine(build_a: Build, build_b: Build, seed: u64) -> Engine {
    Engine::new(&ArenaConfig::default(), build_a, build_b, seed).expect("valid fixture match")
}
