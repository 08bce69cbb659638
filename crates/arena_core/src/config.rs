//! Frozen, hash-verified arena configuration.
//!
//! Every tunable constant of the engine lives here and is passed into the
//! match driver explicitly. The published configuration ships embedded in
//! the crate alongside the SHA-256 digest of its exact file bytes, so a
//! benchmark run can prove which rules it was scored under.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::archetypes::ProcTier;
use crate::error::{ArenaError, ConfigIntegrityError, Result};

/// The published configuration file, byte for byte.
pub const PUBLISHED_CONFIG: &str = include_str!("../data/arena.ron");

/// SHA-256 hex digest of [`PUBLISHED_CONFIG`].
pub const PUBLISHED_CONFIG_HASH: &str =
    "88c1a2b2af9be97d5a29f8ddb0bca0ef726bf22d9dd29c6e0efc41f2f7dcd436";

/// Stat allocation rules and derived-stat formula constants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatConfig {
    /// Required sum of the four stats.
    pub stat_total: u32,
    /// Minimum value of each stat.
    pub min_stat: u32,
    /// Max HP before stat points.
    pub hp_base: i32,
    /// Max HP per hp point.
    pub hp_per_point: i32,
    /// Base damage constant, in hundredths.
    pub dmg_base_hundredths: i32,
    /// Base damage per atk point, in hundredths.
    pub dmg_per_atk_hundredths: i32,
    /// Dodge per spd point above 1.
    pub dodge_bp_per_spd: u32,
    /// Dodge ceiling.
    pub dodge_cap_bp: u32,
    /// Proc resistance per wil point.
    pub resist_bp_per_wil: u32,
    /// Proc resistance ceiling.
    pub resist_cap_bp: u32,
    /// Own proc-rate bonus per wil point.
    pub proc_bonus_bp_per_wil: u32,
}

impl Default for StatConfig {
    fn default() -> Self {
        Self {
            stat_total: 20,
            min_stat: 1,
            hp_base: 50,
            hp_per_point: 10,
            dmg_base_hundredths: 200,
            dmg_per_atk_hundredths: 85,
            dodge_bp_per_spd: 250,
            dodge_cap_bp: 3000,
            resist_bp_per_wil: 330,
            resist_cap_bp: 6000,
            proc_bonus_bp_per_wil: 8,
        }
    }
}

impl StatConfig {
    /// Dodge for a given (possibly debuffed) speed value.
    #[must_use]
    pub fn dodge_bp(&self, spd: u32) -> u32 {
        self.dodge_bp_per_spd
            .saturating_mul(spd.saturating_sub(1))
            .min(self.dodge_cap_bp)
    }

    /// Proc resistance for a given wil value.
    #[must_use]
    pub fn resist_bp(&self, wil: u32) -> u32 {
        self.resist_bp_per_wil
            .saturating_mul(wil)
            .min(self.resist_cap_bp)
    }
}

/// Base proc rates per ability tier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcConfig {
    /// Standard-tier abilities.
    pub standard_bp: u32,
    /// Strong-tier abilities fire less often.
    pub strong_bp: u32,
}

impl Default for ProcConfig {
    fn default() -> Self {
        Self {
            standard_bp: 450,
            strong_bp: 350,
        }
    }
}

impl ProcConfig {
    /// Base rate for a tier.
    #[must_use]
    pub const fn rate_bp(&self, tier: ProcTier) -> u32 {
        match tier {
            ProcTier::Standard => self.standard_bp,
            ProcTier::Strong => self.strong_bp,
        }
    }
}

/// Zone-shrink settings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RingConfig {
    /// First tick on which the ring is active.
    pub activation_tick: u32,
    /// Damage per tick outside the safe region, as a share of max HP.
    pub damage_bp: u32,
    /// Ticks between successive one-cell shrinks.
    pub shrink_interval: u32,
    /// The safe square never gets smaller than this on either axis.
    pub min_safe_size: u32,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            activation_tick: 30,
            damage_bp: 200,
            shrink_interval: 5,
            min_safe_size: 4,
        }
    }
}

/// Board dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridConfig {
    /// Columns.
    pub width: u32,
    /// Rows.
    pub height: u32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArenaConfig {
    /// Stat rules and formulas.
    pub stats: StatConfig,
    /// Proc tiers.
    pub procs: ProcConfig,
    /// Ring mechanic.
    pub ring: RingConfig,
    /// Board.
    pub grid: GridConfig,
    /// Hard tick limit; the match is decided on HP when it is reached.
    pub max_ticks: u32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            stats: StatConfig::default(),
            procs: ProcConfig::default(),
            ring: RingConfig::default(),
            grid: GridConfig::default(),
            max_ticks: 60,
        }
    }
}

impl ArenaConfig {
    /// Load the embedded published configuration, verifying its digest.
    pub fn published() -> Result<Self> {
        Self::from_verified_bytes(PUBLISHED_CONFIG.as_bytes(), PUBLISHED_CONFIG_HASH)
    }

    /// Parse a RON document without digest verification.
    pub fn from_ron_str(source: &str) -> Result<Self> {
        let config: Self = ron::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file and check it against an expected digest before parsing.
    pub fn load_verified<P: AsRef<Path>>(path: P, expected_hash: &str) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_verified_bytes(&bytes, expected_hash)
    }

    /// Verify raw bytes against `expected_hash`, then parse them.
    pub fn from_verified_bytes(bytes: &[u8], expected_hash: &str) -> Result<Self> {
        let actual = config_hash(bytes);
        if !actual.eq_ignore_ascii_case(expected_hash) {
            return Err(ConfigIntegrityError {
                expected: expected_hash.to_string(),
                actual,
            }
            .into());
        }
        debug!(hash = %actual, "config digest verified");
        let source = std::str::from_utf8(bytes)
            .map_err(|e| ArenaError::InvalidConfig(format!("config is not UTF-8: {e}")))?;
        Self::from_ron_str(source)
    }

    /// Reject configurations the engine cannot run.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ArenaError::InvalidConfig(msg.to_string()));
        if self.max_ticks == 0 {
            return invalid("max_ticks must be at least 1");
        }
        if self.grid.width < 3 || self.grid.height < 3 {
            return invalid("grid must be at least 3x3");
        }
        if self.stats.min_stat == 0 {
            return invalid("min_stat must be at least 1");
        }
        if self.stats.stat_total < self.stats.min_stat * 4 {
            return invalid("stat_total cannot satisfy min_stat for all four stats");
        }
        if self.ring.shrink_interval == 0 {
            return invalid("ring shrink_interval must be at least 1");
        }
        Ok(())
    }

    /// Base rate for an ability tier.
    #[must_use]
    pub const fn tier_rate_bp(&self, tier: ProcTier) -> u32 {
        self.procs.rate_bp(tier)
    }
}

/// SHA-256 hex digest of raw config bytes.
#[must_use]
pub fn config_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// First eight hex characters of a digest, as shown in reports.
#[must_use]
pub fn short_hash(hash: &str) -> &str {
    hash.get(..8).unwrap_or(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_published_digest_matches() {
        assert_eq!(config_hash(PUBLISHED_CONFIG.as_bytes()), PUBLISHED_CONFIG_HASH);
        let config = ArenaConfig::published().expect("published config must load");
        assert_eq!(config, ArenaConfig::default());
    }

    #[test]
    fn test_tampered_bytes_rejected() {
        let tampered = PUBLISHED_CONFIG.replace("max_ticks: 60", "max_ticks: 61");
        let err = ArenaConfig::from_verified_bytes(tampered.as_bytes(), PUBLISHED_CONFIG_HASH)
            .unwrap_err();
        match err {
            ArenaError::ConfigIntegrity(e) => {
                assert_eq!(e.expected, PUBLISHED_CONFIG_HASH);
                assert_ne!(e.actual, PUBLISHED_CONFIG_HASH);
            }
            other => panic!("expected integrity error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_zero_ticks() {
        let config = ArenaConfig {
            max_ticks: 0,
            ..ArenaConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ArenaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_stat_formulas_cap() {
        let stats = StatConfig::default();
        assert_eq!(stats.dodge_bp(1), 0);
        assert_eq!(stats.dodge_bp(0), 0);
        assert_eq!(stats.dodge_bp(13), 3000);
        assert_eq!(stats.dodge_bp(17), 3000);
        assert_eq!(stats.resist_bp(18), 5940);
        assert_eq!(stats.resist_bp(19), 6000);
    }

    #[test]
    fn test_short_hash() {
        assert_eq!(short_hash(PUBLISHED_CONFIG_HASH), "88c1a2b2");
        assert_eq!(short_hash("abc"), "abc");
    }

    #[test]
    fn test_load_verified_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arena.ron");
        std::fs::write(&path, PUBLISHED_CONFIG).expect("write");
        let config = ArenaConfig::load_verified(&path, PUBLISHED_CONFIG_HASH).expect("load");
        assert_eq!(config.max_ticks, 60);
    }
}
