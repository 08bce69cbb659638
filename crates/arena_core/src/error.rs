//! Error types for the arena engine.

use thiserror::Error;

use crate::stats::StatKind;

/// Result type alias using [`ArenaError`].
pub type Result<T> = std::result::Result<T, ArenaError>;

/// A build was rejected before any match state was created.
///
/// Messages carry the offending values so callers can surface them verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The four stats do not add up to the required total.
    #[error(
        "stats must sum to {expected}, got {total} (hp={hp}, atk={atk}, spd={spd}, wil={wil})"
    )]
    StatSum {
        /// Required total.
        expected: u32,
        /// Actual sum.
        total: i64,
        /// Submitted hp.
        hp: i64,
        /// Submitted atk.
        atk: i64,
        /// Submitted spd.
        spd: i64,
        /// Submitted wil.
        wil: i64,
    },

    /// A single stat is below the allowed minimum.
    #[error("stat {stat} must be at least {minimum}, got {value}")]
    StatBelowMinimum {
        /// Which stat.
        stat: StatKind,
        /// Submitted value.
        value: i64,
        /// Allowed minimum.
        minimum: u32,
    },

    /// The animal name is not in the archetype catalog.
    #[error("unknown animal '{name}', expected one of: {valid}")]
    UnknownAnimal {
        /// Name as submitted.
        name: String,
        /// Comma separated list of valid names.
        valid: String,
    },

    /// The build string could not be split into an animal and four integers.
    #[error("malformed build '{input}': {reason}")]
    MalformedBuild {
        /// Raw input.
        input: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// The loaded configuration does not match its published digest.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("config hash mismatch: expected {expected}, got {actual}")]
pub struct ConfigIntegrityError {
    /// Published SHA-256 hex digest.
    pub expected: String,
    /// Digest of the bytes actually loaded.
    pub actual: String,
}

/// Top-level error type for the arena engine.
#[derive(Debug, Error)]
pub enum ArenaError {
    /// Invalid build.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Configuration digest mismatch.
    #[error(transparent)]
    ConfigIntegrity(#[from] ConfigIntegrityError),

    /// Configuration parsed but is structurally unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] ron::error::SpannedError),

    /// Filesystem error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Binary (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Replay written by an incompatible format version.
    #[error("replay version mismatch: expected {expected}, got {actual}")]
    ReplayVersion {
        /// Version this build understands.
        expected: u32,
        /// Version found in the file.
        actual: u32,
    },
}
