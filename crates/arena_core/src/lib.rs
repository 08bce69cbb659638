//! # Arena Core
//!
//! Deterministic 1v1 combat engine for Moreau Arena.
//!
//! Two combatants, each an animal archetype with a 20-point stat allocation,
//! fight on a bounded grid for a fixed number of ticks. The engine reports a
//! winner (or draw) and a tick count, and is used as a scoring oracle, so it
//! is strictly reproducible:
//!
//! - No floating-point math (integer basis points and fixed-point draws)
//! - No system randomness inside a match (one seeded ChaCha8 stream)
//! - No global state (the configuration is passed in explicitly)
//!
//! ## Crate Structure
//!
//! - [`stats`] - Build validation and derived-stat formulas
//! - [`archetypes`] - Static animal catalog (passives and abilities)
//! - [`procs`] - Proc eligibility and probability
//! - [`effects`] - Timed statuses and stacking damage over time
//! - [`engine`] - The tick loop
//! - [`simulation`] - Match driver
//! - [`config`] - Hash-verified configuration
//! - [`replay`] - Recorded matches

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod archetypes;
pub mod combatant;
pub mod config;
pub mod effects;
pub mod engine;
pub mod error;
pub mod events;
pub mod grid;
pub mod math;
pub mod procs;
pub mod replay;
pub mod rng;
pub mod simulation;
pub mod stats;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::archetypes::{Animal, Archetype, Effect, ProcTier};
    pub use crate::combatant::Side;
    pub use crate::config::{ArenaConfig, PUBLISHED_CONFIG_HASH};
    pub use crate::engine::{Engine, MatchPhase};
    pub use crate::error::{ArenaError, ConfigIntegrityError, Result, ValidationError};
    pub use crate::events::{EndReason, MatchEvent, Winner};
    pub use crate::math::Fixed;
    pub use crate::replay::MatchReplay;
    pub use crate::simulation::{simulate, simulate_many, simulate_recorded, MatchOutcome};
    pub use crate::stats::{Build, DerivedStats};
}
