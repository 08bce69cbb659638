//! Recorded matches.
//!
//! A replay stores everything needed to recreate a match (seed, builds,
//! config digest) plus the event log and outcome it produced, so a later
//! run can prove the engine still plays it identically.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ArenaConfig;
use crate::error::{ArenaError, Result};
use crate::events::MatchEvent;
use crate::simulation::{simulate_recorded, MatchOutcome};
use crate::stats::Build;

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchReplay {
    /// Replay format version.
    pub version: u32,
    /// Random seed used for the match.
    pub seed: u64,
    /// First build.
    pub build_a: Build,
    /// Second build.
    pub build_b: Build,
    /// Digest of the configuration the match was played under.
    pub config_hash: String,
    /// Full event log.
    pub events: Vec<MatchEvent>,
    /// Result.
    pub outcome: MatchOutcome,
}

/// Result of re-running a replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayVerification {
    /// Outcome matches.
    pub outcome_matches: bool,
    /// Event log matches.
    pub events_match: bool,
    /// Index of the first differing event, if any.
    pub first_divergence: Option<usize>,
}

impl ReplayVerification {
    /// Everything matched.
    #[must_use]
    pub const fn is_identical(&self) -> bool {
        self.outcome_matches && self.events_match
    }
}

impl MatchReplay {
    /// Play a match and record it.
    pub fn record(
        config: &ArenaConfig,
        config_hash: impl Into<String>,
        build_a: Build,
        build_b: Build,
        seed: u64,
    ) -> Result<Self> {
        let (outcome, events) = simulate_recorded(config, &build_a, &build_b, Some(seed))?;
        Ok(Self {
            version: REPLAY_VERSION,
            seed,
            build_a,
            build_b,
            config_hash: config_hash.into(),
            events,
            outcome,
        })
    }

    /// Save the replay to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| ArenaError::Serialization(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }

    /// Load a replay from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let replay: Self = bincode::deserialize(&bytes).map_err(|e| {
            ArenaError::Serialization(format!("Failed to deserialize replay: {e}"))
        })?;

        if replay.version != REPLAY_VERSION {
            return Err(ArenaError::ReplayVersion {
                expected: REPLAY_VERSION,
                actual: replay.version,
            });
        }

        Ok(replay)
    }

    /// Re-run the match under `config` and compare.
    pub fn verify(&self, config: &ArenaConfig) -> Result<ReplayVerification> {
        let (outcome, events) =
            simulate_recorded(config, &self.build_a, &self.build_b, Some(self.seed))?;
        let first_divergence = self
            .events
            .iter()
            .zip(&events)
            .position(|(a, b)| a != b)
            .or_else(|| (self.events.len() != events.len()).then(|| self.events.len().min(events.len())));
        Ok(ReplayVerification {
            outcome_matches: outcome == self.outcome,
            events_match: first_divergence.is_none(),
            first_divergence,
        })
    }

    /// Total duration in ticks.
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.outcome.ticks_elapsed
    }

    /// Events recorded at one tick (setup events count as tick 0).
    #[must_use]
    pub fn events_at_tick(&self, tick: u32) -> Vec<&MatchEvent> {
        self.events
            .iter()
            .filter(|e| event_tick(e) == tick)
            .collect()
    }
}

fn event_tick(event: &MatchEvent) -> u32 {
    match event {
        MatchEvent::Spawned { .. } | MatchEvent::PassiveCopied { .. } => 0,
        MatchEvent::Moved { tick, .. }
        | MatchEvent::StunnedSkip { tick, .. }
        | MatchEvent::Proc { tick, .. }
        | MatchEvent::PassiveTriggered { tick, .. }
        | MatchEvent::Dodged { tick, .. }
        | MatchEvent::Hit { tick, .. }
        | MatchEvent::StatusApplied { tick, .. }
        | MatchEvent::Healed { tick, .. }
        | MatchEvent::DotDamage { tick, .. }
        | MatchEvent::RingDamage { tick, .. }
        | MatchEvent::Finished { tick, .. } => *tick,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PUBLISHED_CONFIG_HASH;

    fn sample() -> MatchReplay {
        MatchReplay::record(
            &ArenaConfig::default(),
            PUBLISHED_CONFIG_HASH,
            "snake 4 6 5 5".parse().expect("valid"),
            "wolf 6 8 3 3".parse().expect("valid"),
            77,
        )
        .expect("records")
    }

    #[test]
    fn test_save_load_verify() {
        let replay = sample();
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("match.replay");
        replay.save(&path).expect("save");
        let loaded = MatchReplay::load(&path).expect("load");
        assert_eq!(loaded, replay);
        assert!(loaded
            .verify(&ArenaConfig::default())
            .expect("verify")
            .is_identical());
    }

    #[test]
    fn test_version_mismatch_rejected() {
        let mut replay = sample();
        replay.version = REPLAY_VERSION + 1;
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("old.replay");
        replay.save(&path).expect("save");
        assert!(matches!(
            MatchReplay::load(&path),
            Err(ArenaError::ReplayVersion { .. })
        ));
    }

    #[test]
    fn test_changed_rules_detected() {
        let replay = sample();
        let mut config = ArenaConfig::default();
        config.stats.dmg_per_atk_hundredths = 120;
        let report = replay.verify(&config).expect("verify");
        assert!(!report.is_identical());
    }

    #[test]
    fn test_events_by_tick() {
        let replay = sample();
        assert_eq!(replay.events_at_tick(0).len(), 2);
        assert!(!replay.events_at_tick(1).is_empty());
    }
}
