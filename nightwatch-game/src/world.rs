//! Validated static configuration shared by every night.
use thiserror::Error;

use crate::facility::{Facility, FacilityData, FacilityError};
use crate::night::{NightTuning, TuningError};
use crate::progress::LoreCatalog;
use crate::roster::{Roster, RosterError};

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("configuration is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid facility: {0}")]
    Facility(#[from] FacilityError),
    #[error("invalid roster: {0}")]
    Roster(#[from] RosterError),
    #[error("invalid tuning: {0}")]
    Tuning(#[from] TuningError),
}

/// Facility, roster, lore and tuning, checked once and then read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub facility: Facility,
    pub roster: Roster,
    pub lore: LoreCatalog,
    pub tuning: NightTuning,
}

impl World {
    /// Validate every piece of configuration and assemble the world.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure.
    pub fn new(
        facility: &FacilityData,
        roster: Roster,
        lore: LoreCatalog,
        tuning: NightTuning,
    ) -> Result<Self, WorldError> {
        let facility = Facility::from_data(facility)?;
        roster.validate()?;
        tuning.validate()?;
        Ok(Self {
            facility,
            roster,
            lore,
            tuning,
        })
    }

    /// World built from the embedded data set with default tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded data fails to parse or validate.
    pub fn load_from_static() -> Result<Self, WorldError> {
        Self::new(
            &FacilityData::load_from_static()?,
            Roster::load_from_static()?,
            LoreCatalog::load_from_static()?,
            NightTuning::default(),
        )
    }

    /// Same world with different tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if `tuning` is out of range.
    pub fn with_tuning(mut self, tuning: NightTuning) -> Result<Self, WorldError> {
        tuning.validate()?;
        self.tuning = tuning;
        Ok(self)
    }
}
