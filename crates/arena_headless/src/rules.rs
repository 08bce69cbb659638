//! Loading the rule set a run is scored under.

use std::path::Path;

use arena_core::config::{ArenaConfig, PUBLISHED_CONFIG_HASH};
use arena_core::error::Result;
use tracing::info;

/// Configuration plus the digest it was verified against.
#[derive(Debug, Clone)]
pub struct LoadedRules {
    /// Parsed configuration.
    pub config: ArenaConfig,
    /// Full SHA-256 hex digest of the file bytes.
    pub hash: String,
}

impl LoadedRules {
    /// First eight hex characters of the digest.
    #[must_use]
    pub fn short_hash(&self) -> &str {
        arena_core::config::short_hash(&self.hash)
    }
}

/// Load the embedded published rules, or a file checked against
/// `expected_hash` (the published digest when omitted).
pub fn load_rules(path: Option<&Path>, expected_hash: Option<&str>) -> Result<LoadedRules> {
    let expected = expected_hash.unwrap_or(PUBLISHED_CONFIG_HASH);
    let config = match path {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            ArenaConfig::load_verified(path, expected)?
        }
        None => ArenaConfig::published()?,
    };
    Ok(LoadedRules {
        config,
        hash: expected.to_ascii_lowercase(),
    })
}
