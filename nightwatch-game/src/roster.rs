//! Subject archetype catalog.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::MAX_SUBJECTS;

const DEFAULT_ROSTER_DATA: &str = include_str!("../assets/data/subjects.json");

/// Behavioural profile of an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Behavior {
    Aggressive,
    Sneaky,
    Erratic,
    Methodical,
}

/// Special ability carried by an archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Ability {
    #[default]
    None,
    CameraJam,
    Pack,
    Teleport,
    Invisible,
    PowerDrain,
}

/// Immutable archetype definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Archetype {
    pub id: String,
    pub name: String,
    pub behavior: Behavior,
    /// Movement speed factor; higher acts more often.
    pub speed: f32,
    /// Chance in `[0, 1]` that a lure redirects this subject.
    pub lure_susceptibility: f32,
    /// Seconds shaved off every stun.
    #[serde(default)]
    pub stun_resistance: f32,
    #[serde(default)]
    pub ability: Ability,
    /// First night on which the archetype spawns.
    #[serde(default = "default_first_night")]
    pub first_night: u8,
}

const fn default_first_night() -> u8 {
    1
}

/// Errors raised when the roster violates catalog invariants.
#[derive(Debug, Error, PartialEq)]
pub enum RosterError {
    #[error("roster is empty")]
    Empty,
    #[error("roster has {count} archetypes, at most {max} are supported")]
    TooManySubjects { count: usize, max: usize },
    #[error("archetype id `{0}` is declared more than once")]
    DuplicateId(String),
    #[error("archetype `{id}` has non-positive speed {speed:.2}")]
    InvalidSpeed { id: String, speed: f32 },
    #[error("archetype `{id}` lure susceptibility {value:.2} is outside [0, 1]")]
    InvalidSusceptibility { id: String, value: f32 },
    #[error("archetype `{id}` has negative stun resistance {value:.2}")]
    InvalidStunResistance { id: String, value: f32 },
    #[error("archetype `{0}` has first night 0")]
    InvalidFirstNight(String),
}

/// Ordered archetype catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Roster {
    pub subjects: Vec<Archetype>,
}

impl Roster {
    /// Load roster from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a roster.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Embedded default roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded document is malformed.
    pub fn load_from_static() -> Result<Self, serde_json::Error> {
        Self::from_json(DEFAULT_ROSTER_DATA)
    }

    /// Check catalog invariants.
    ///
    /// # Errors
    ///
    /// Returns the first [`RosterError`] found.
    pub fn validate(&self) -> Result<(), RosterError> {
        if self.subjects.is_empty() {
            return Err(RosterError::Empty);
        }
        if self.subjects.len() > MAX_SUBJECTS {
            return Err(RosterError::TooManySubjects {
                count: self.subjects.len(),
                max: MAX_SUBJECTS,
            });
        }
        let mut seen = HashSet::new();
        for archetype in &self.subjects {
            if !seen.insert(archetype.id.as_str()) {
                return Err(RosterError::DuplicateId(archetype.id.clone()));
            }
            if !(archetype.speed.is_finite() && archetype.speed > 0.0) {
                return Err(RosterError::InvalidSpeed {
                    id: archetype.id.clone(),
                    speed: archetype.speed,
                });
            }
            if !(0.0..=1.0).contains(&archetype.lure_susceptibility) {
                return Err(RosterError::InvalidSusceptibility {
                    id: archetype.id.clone(),
                    value: archetype.lure_susceptibility,
                });
            }
            if archetype.stun_resistance < 0.0 || !archetype.stun_resistance.is_finite() {
                return Err(RosterError::InvalidStunResistance {
                    id: archetype.id.clone(),
                    value: archetype.stun_resistance,
                });
            }
            if archetype.first_night == 0 {
                return Err(RosterError::InvalidFirstNight(archetype.id.clone()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Archetype> {
        self.subjects.iter().find(|a| a.id == id)
    }

    #[must_use]
    pub fn position(&self, id: &str) -> Option<usize> {
        self.subjects.iter().position(|a| a.id == id)
    }

    /// Archetypes eligible on `night`, in catalog order.
    pub fn active_on(&self, night: u8) -> impl Iterator<Item = (usize, &Archetype)> {
        self.subjects
            .iter()
            .enumerate()
            .filter(move |(_, a)| a.first_night <= night)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Archetype> {
        self.subjects.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }
}

impl<'a> IntoIterator for &'a Roster {
    type Item = &'a Archetype;
    type IntoIter = std::slice::Iter<'a, Archetype>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
