//! # Arena Test Utilities
//!
//! Shared testing utilities for the arena crates:
//! - Determinism test harness
//! - Reference builds and engine helpers
//! - Matchup statistics
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod balance;
pub mod determinism;
pub mod fixtures;

/// Re-export proptest for convenience.
pub use proptest;
