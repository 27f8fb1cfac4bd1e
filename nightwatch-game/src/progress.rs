//! Unlock progression and the lore catalog.
//!
//! The engine reads [`ProgressState`] when a night starts and writes it back
//! when a night ends. Where it is kept is up to the [`ProgressStorage`]
//! implementation; [`MemoryProgressStore`] is the in-process default.
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::convert::Infallible;
use std::rc::Rc;

use crate::constants::MAX_NIGHT;
use crate::result::NightReport;

const DEFAULT_LORE_DATA: &str = include_str!("../assets/data/lore.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoreDocument {
    pub id: String,
    pub title: String,
    /// Night whose completion unlocks the document.
    pub unlocked_by: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoreCatalog {
    pub documents: Vec<LoreDocument>,
}

impl LoreCatalog {
    /// Load catalog from JSON string
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Embedded default catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded document is malformed.
    pub fn load_from_static() -> Result<Self, serde_json::Error> {
        Self::from_json(DEFAULT_LORE_DATA)
    }

    /// Documents unlocked by completing `night`.
    pub fn unlocked_by(&self, night: u8) -> impl Iterator<Item = &LoreDocument> {
        self.documents.iter().filter(move |d| d.unlocked_by == night)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&LoreDocument> {
        self.documents.iter().find(|d| d.id == id)
    }
}

/// Persistent unlock state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressState {
    pub unlocked_nights: BTreeSet<u8>,
    #[serde(default)]
    pub unlocked_lore: BTreeSet<String>,
    #[serde(default)]
    pub best_reports: BTreeMap<u8, NightReport>,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            unlocked_nights: BTreeSet::from([1]),
            unlocked_lore: BTreeSet::new(),
            best_reports: BTreeMap::new(),
        }
    }
}

/// What a single report changed in the progress state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressDelta {
    pub night_unlocked: Option<u8>,
    pub lore_unlocked: Vec<String>,
    pub new_best: bool,
}

impl ProgressState {
    #[must_use]
    pub fn is_unlocked(&self, night: u8) -> bool {
        self.unlocked_nights.contains(&night)
    }

    #[must_use]
    pub fn highest_unlocked(&self) -> u8 {
        self.unlocked_nights.iter().next_back().copied().unwrap_or(1)
    }

    /// Fold a finished night into the progress state. Victories unlock the
    /// next night (up to the last one) and the lore tied to the night.
    pub fn record(&mut self, report: &NightReport, lore: &LoreCatalog) -> ProgressDelta {
        let mut delta = ProgressDelta::default();

        let replace = self
            .best_reports
            .get(&report.night)
            .is_none_or(|best| report.beats(best));
        if replace {
            self.best_reports.insert(report.night, report.clone());
            delta.new_best = true;
        }

        if !report.outcome.is_victory() {
            return delta;
        }

        let next = report.night.saturating_add(1);
        if next <= MAX_NIGHT && self.unlocked_nights.insert(next) {
            delta.night_unlocked = Some(next);
        }
        for doc in lore.unlocked_by(report.night) {
            if self.unlocked_lore.insert(doc.id.clone()) {
                delta.lore_unlocked.push(doc.id.clone());
            }
        }
        delta
    }
}

/// Trait for abstracting progress persistence.
/// Platform-specific implementations should provide this
pub trait ProgressStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load saved progress, `None` when nothing has been saved yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored progress cannot be read.
    fn load_progress(&self) -> Result<Option<ProgressState>, Self::Error>;

    /// Persist progress.
    ///
    /// # Errors
    ///
    /// Returns an error if the progress cannot be written.
    fn save_progress(&self, progress: &ProgressState) -> Result<(), Self::Error>;
}

/// Process-local progress store. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    slot: Rc<RefCell<Option<ProgressState>>>,
}

impl MemoryProgressStore {
    #[must_use]
    pub fn with_progress(progress: ProgressState) -> Self {
        Self {
            slot: Rc::new(RefCell::new(Some(progress))),
        }
    }
}

impl ProgressStorage for MemoryProgressStore {
    type Error = Infallible;

    fn load_progress(&self) -> Result<Option<ProgressState>, Self::Error> {
        Ok(self.slot.borrow().clone())
    }

    fn save_progress(&self, progress: &ProgressState) -> Result<(), Self::Error> {
        self.slot.replace(Some(progress.clone()));
        Ok(())
    }
}
