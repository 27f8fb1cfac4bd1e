//! Breach warning state machine.
//!
//! `Idle -> Warning -> Idle` when the warned door is held shut at expiry,
//! otherwise `Warning -> Breached`, which ends the night.
use serde::{Deserialize, Serialize};

use crate::facility::Direction;

/// A subject waiting at a control-room door.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreachWarning {
    pub direction: Direction,
    /// Index of the subject instance in the night's roster order.
    pub subject: usize,
    /// Archetype id, reported as the cause of death.
    pub subject_id: String,
    pub remaining_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BreachState {
    #[default]
    Idle,
    Warning(BreachWarning),
}

/// Countdown step result, computed without mutating the state.
#[derive(Debug, Clone, PartialEq)]
pub enum BreachTick {
    Idle,
    Pending(BreachWarning),
    Expired(BreachWarning),
}

/// How an expired warning resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreachResolution {
    Repelled { subject: usize, direction: Direction },
    Breached { killed_by: String },
}

impl BreachState {
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Warning(_))
    }

    #[must_use]
    pub const fn warning(&self) -> Option<&BreachWarning> {
        match self {
            Self::Idle => None,
            Self::Warning(w) => Some(w),
        }
    }

    /// Subject currently waiting at a door, if any.
    #[must_use]
    pub fn breaching_subject(&self) -> Option<usize> {
        self.warning().map(|w| w.subject)
    }

    /// Open a warning. Ignored (returns `false`) while one is already active.
    pub fn open(
        &mut self,
        direction: Direction,
        subject: usize,
        subject_id: &str,
        countdown_secs: f64,
    ) -> bool {
        if self.is_active() {
            return false;
        }
        *self = Self::Warning(BreachWarning {
            direction,
            subject,
            subject_id: subject_id.to_string(),
            remaining_secs: countdown_secs,
        });
        true
    }

    /// Countdown after `dt` seconds.
    #[must_use]
    pub fn ticked(&self, dt: f64) -> BreachTick {
        match self {
            Self::Idle => BreachTick::Idle,
            Self::Warning(w) => {
                let mut next = w.clone();
                next.remaining_secs = (w.remaining_secs - dt.max(0.0)).max(0.0);
                if next.remaining_secs <= 0.0 {
                    BreachTick::Expired(next)
                } else {
                    BreachTick::Pending(next)
                }
            }
        }
    }
}

/// Resolve an expired warning against the door held shut at that moment.
#[must_use]
pub fn resolve(warning: &BreachWarning, blocked: Option<Direction>) -> BreachResolution {
    if blocked == Some(warning.direction) {
        BreachResolution::Repelled {
            subject: warning.subject,
            direction: warning.direction,
        }
    } else {
        BreachResolution::Breached {
            killed_by: warning.subject_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warned(direction: Direction) -> BreachState {
        let mut state = BreachState::default();
        assert!(state.open(direction, 2, "hound", 4.0));
        state
    }

    #[test]
    fn second_warning_is_ignored() {
        let mut state = warned(Direction::Left);
        assert!(!state.open(Direction::Right, 0, "crawler", 4.0));
        let w = state.warning().unwrap();
        assert_eq!(w.direction, Direction::Left);
        assert_eq!(w.subject_id, "hound");
    }

    #[test]
    fn countdown_expires_at_zero() {
        let state = warned(Direction::Front);
        let BreachTick::Pending(w) = state.ticked(3.0) else {
            panic!("still pending");
        };
        assert!((w.remaining_secs - 1.0).abs() < 1e-9);
        let state = BreachState::Warning(w);
        assert!(matches!(state.ticked(1.5), BreachTick::Expired(w) if w.remaining_secs <= 0.0));
        assert_eq!(BreachState::Idle.ticked(10.0), BreachTick::Idle);
    }

    #[test]
    fn matching_door_repels() {
        let state = warned(Direction::Left);
        let w = state.warning().unwrap();
        assert_eq!(
            resolve(w, Some(Direction::Left)),
            BreachResolution::Repelled {
                subject: 2,
                direction: Direction::Left
            }
        );
    }

    #[test]
    fn wrong_or_open_door_breaches() {
        let state = warned(Direction::Left);
        let w = state.warning().unwrap();
        let killed = BreachResolution::Breached {
            killed_by: "hound".into(),
        };
        assert_eq!(resolve(w, Some(Direction::Right)), killed);
        assert_eq!(resolve(w, None), killed);
    }
}
