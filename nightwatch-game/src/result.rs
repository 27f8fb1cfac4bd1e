//! End-of-night report.
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a night ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NightOutcome {
    /// The clock reached dawn.
    Survived,
    /// A subject reached the control room.
    Killed { by: String },
    /// The operator abandoned the night.
    Abandoned,
}

impl NightOutcome {
    #[must_use]
    pub const fn is_victory(&self) -> bool {
        matches!(self, Self::Survived)
    }
}

impl fmt::Display for NightOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Survived => write!(f, "survived"),
            Self::Killed { by } => write!(f, "killed by {by}"),
            Self::Abandoned => write!(f, "abandoned"),
        }
    }
}

/// Tool-usage counters accumulated during a night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NightStats {
    pub lures_used: u32,
    pub stuns_used: u32,
    pub door_blocks: u32,
    pub camera_reboots: u32,
    pub breaches_repelled: u32,
    pub cameras_sabotaged: u32,
}

/// Summary handed to the progress store and the achievement collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NightReport {
    pub night: u8,
    pub seed: u64,
    pub outcome: NightOutcome,
    pub power_remaining: f32,
    pub elapsed_secs: f64,
    #[serde(flatten)]
    pub stats: NightStats,
}

impl NightReport {
    /// Whether `self` beats `other` as the best run of a night: victories
    /// first, then more power left, then fewer lures spent.
    #[must_use]
    pub fn beats(&self, other: &Self) -> bool {
        match (self.outcome.is_victory(), other.outcome.is_victory()) {
            (true, false) => true,
            (false, true) => false,
            (true, true) => {
                self.power_remaining > other.power_remaining
                    || ((self.power_remaining - other.power_remaining).abs() < f32::EPSILON
                        && self.stats.lures_used < other.stats.lures_used)
            }
            (false, false) => self.elapsed_secs > other.elapsed_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(outcome: NightOutcome, power: f32, lures: u32) -> NightReport {
        NightReport {
            night: 1,
            seed: 7,
            outcome,
            power_remaining: power,
            elapsed_secs: 360.0,
            stats: NightStats {
                lures_used: lures,
                ..NightStats::default()
            },
        }
    }

    #[test]
    fn victories_beat_losses() {
        let win = report(NightOutcome::Survived, 5.0, 9);
        let loss = report(
            NightOutcome::Killed {
                by: "crawler".into(),
            },
            90.0,
            0,
        );
        assert!(win.beats(&loss));
        assert!(!loss.beats(&win));
    }

    #[test]
    fn ties_fall_back_to_lure_count() {
        let frugal = report(NightOutcome::Survived, 40.0, 1);
        let spendy = report(NightOutcome::Survived, 40.0, 4);
        assert!(frugal.beats(&spendy));
        assert!(!spendy.beats(&frugal));
    }

    #[test]
    fn outcome_display_names_the_killer() {
        let outcome = NightOutcome::Killed {
            by: "hound".into(),
        };
        assert_eq!(outcome.to_string(), "killed by hound");
    }
}
