//! Match outcomes and the optional per-tick event log.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combatant::Side;
use crate::grid::Position;

/// How a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Winner {
    /// First build won.
    #[serde(rename = "1")]
    A,
    /// Second build won.
    #[serde(rename = "2")]
    B,
    /// Nobody won.
    #[serde(rename = "draw")]
    Draw,
}

impl Winner {
    /// The winning side, if any.
    #[must_use]
    pub const fn side(self) -> Option<Side> {
        match self {
            Self::A => Some(Side::A),
            Self::B => Some(Side::B),
            Self::Draw => None,
        }
    }

    /// Winner when `side` is the one left standing.
    #[must_use]
    pub const fn from_side(side: Side) -> Self {
        match side {
            Side::A => Self::A,
            Side::B => Self::B,
        }
    }
}

impl fmt::Display for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "1",
            Self::B => "2",
            Self::Draw => "draw",
        })
    }
}

/// Why the match stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// At least one combatant reached zero HP.
    Knockout,
    /// The tick limit was reached and HP decided it.
    Timeout,
}

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Opening placement.
    Spawned {
        /// Who.
        side: Side,
        /// Where.
        position: Position,
    },
    /// A Monkey-style passive copy resolved during setup.
    PassiveCopied {
        /// Copier.
        side: Side,
        /// Passive taken.
        passive: String,
    },
    /// One grid step.
    Moved {
        /// Tick.
        tick: u32,
        /// Who.
        side: Side,
        /// New cell.
        to: Position,
    },
    /// A stunned combatant lost its action.
    StunnedSkip {
        /// Tick.
        tick: u32,
        /// Who.
        side: Side,
    },
    /// An ability won its proc roll.
    Proc {
        /// Tick.
        tick: u32,
        /// Owner.
        side: Side,
        /// Ability name.
        ability: String,
    },
    /// A passive contributed to this tick's resolution.
    PassiveTriggered {
        /// Tick.
        tick: u32,
        /// Owner.
        side: Side,
        /// Passive name.
        passive: String,
    },
    /// The defender dodged.
    Dodged {
        /// Tick.
        tick: u32,
        /// Attacker.
        attacker: Side,
    },
    /// A hit landed.
    Hit {
        /// Tick.
        tick: u32,
        /// Attacker.
        attacker: Side,
        /// Damage dealt.
        damage: i32,
        /// Defender HP afterwards.
        hp_after: i32,
    },
    /// A status landed on a combatant.
    StatusApplied {
        /// Tick.
        tick: u32,
        /// Bearer.
        side: Side,
        /// Source ability or passive.
        source: String,
    },
    /// HP raised by a heal-to-floor effect.
    Healed {
        /// Tick.
        tick: u32,
        /// Who.
        side: Side,
        /// HP afterwards.
        hp_after: i32,
    },
    /// Damage over time.
    DotDamage {
        /// Tick.
        tick: u32,
        /// Bearer.
        side: Side,
        /// Damage dealt.
        damage: i32,
        /// HP afterwards.
        hp_after: i32,
    },
    /// Outside the safe region.
    RingDamage {
        /// Tick.
        tick: u32,
        /// Who.
        side: Side,
        /// Damage dealt.
        damage: i32,
        /// HP afterwards.
        hp_after: i32,
    },
    /// Terminal event.
    Finished {
        /// Tick.
        tick: u32,
        /// Result.
        winner: Winner,
        /// Cause.
        reason: EndReason,
    },
}

impl fmt::Display for MatchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawned { side, position } => {
                write!(f, "[setup] {side} spawns at ({}, {})", position.row, position.col)
            }
            Self::PassiveCopied { side, passive } => {
                write!(f, "[setup] {side} copies passive {passive}")
            }
            Self::Moved { tick, side, to } => {
                write!(f, "[t{tick:02}] {side} moves to ({}, {})", to.row, to.col)
            }
            Self::StunnedSkip { tick, side } => write!(f, "[t{tick:02}] {side} is stunned"),
            Self::Proc {
                tick,
                side,
                ability,
            } => write!(f, "[t{tick:02}] {side} procs {ability}"),
            Self::PassiveTriggered {
                tick,
                side,
                passive,
            } => write!(f, "[t{tick:02}] {side} passive {passive}"),
            Self::Dodged { tick, attacker } => {
                write!(f, "[t{tick:02}] {} dodges {attacker}", attacker.opponent())
            }
            Self::Hit {
                tick,
                attacker,
                damage,
                hp_after,
            } => write!(
                f,
                "[t{tick:02}] {attacker} hits for {damage} ({} hp {hp_after})",
                attacker.opponent()
            ),
            Self::StatusApplied { tick, side, source } => {
                write!(f, "[t{tick:02}] {side} afflicted by {source}")
            }
            Self::Healed {
                tick,
                side,
                hp_after,
            } => write!(f, "[t{tick:02}] {side} heals to {hp_after}"),
            Self::DotDamage {
                tick,
                side,
                damage,
                hp_after,
            } => write!(f, "[t{tick:02}] {side} takes {damage} over time (hp {hp_after})"),
            Self::RingDamage {
                tick,
                side,
                damage,
                hp_after,
            } => write!(f, "[t{tick:02}] {side} takes {damage} ring damage (hp {hp_after})"),
            Self::Finished {
                tick,
                winner,
                reason,
            } => write!(f, "[t{tick:02}] finished: winner {winner} ({reason:?})"),
        }
    }
}
