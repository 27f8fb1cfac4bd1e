//! Nightwatch Game Engine
//!
//! Platform-agnostic core simulation for the Nightwatch night-shift survival
//! game. This crate provides the facility, subject AI, power economy and
//! breach mechanics without UI, audio or platform-specific dependencies.

pub mod ai;
pub mod breach;
pub mod cameras;
pub mod commands;
pub mod constants;
pub mod facility;
pub mod night;
pub mod numbers;
pub mod power;
pub mod progress;
pub mod result;
pub mod rng;
pub mod roster;
pub mod seed;
pub mod state;
pub mod world;

use std::sync::Arc;

// Re-export commonly used types
pub use breach::{BreachResolution, BreachState, BreachWarning};
pub use cameras::{Camera, CameraNetwork, CameraStatus};
pub use commands::{CommandOutcome, Rejection};
pub use facility::{Direction, Facility, FacilityData, FacilityError, RoomData, RoomIdx};
pub use night::{
    AudioCue, NightSession, NightTuning, Notification, Notifications, TuningError, advance_frame,
    run_ai_tick,
};
pub use power::{Cooldowns, Tool};
pub use progress::{
    LoreCatalog, LoreDocument, MemoryProgressStore, ProgressDelta, ProgressState, ProgressStorage,
};
pub use result::{NightOutcome, NightReport, NightStats};
pub use rng::RngBundle;
pub use roster::{Ability, Archetype, Behavior, Roster, RosterError};
pub use seed::{parse_replay_code, replay_code};
pub use state::{GamePhase, GameState, RenderView, SubjectInstance};
pub use world::{World, WorldError};

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the facility layout.
    ///
    /// # Errors
    ///
    /// Returns an error if the facility data cannot be loaded.
    fn load_facility(&self) -> Result<FacilityData, Self::Error>;

    /// Load the subject roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster cannot be loaded.
    fn load_roster(&self) -> Result<Roster, Self::Error>;

    /// Load the lore catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be loaded.
    fn load_lore(&self) -> Result<LoreCatalog, Self::Error>;

    /// Load balance tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the tuning cannot be loaded or parsed.
    fn load_tuning(&self) -> Result<NightTuning, Self::Error>;
}

/// Serves the data set embedded in the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl DataLoader for StaticDataLoader {
    type Error = serde_json::Error;

    fn load_facility(&self) -> Result<FacilityData, Self::Error> {
        FacilityData::load_from_static()
    }

    fn load_roster(&self) -> Result<Roster, Self::Error> {
        Roster::load_from_static()
    }

    fn load_lore(&self) -> Result<LoreCatalog, Self::Error> {
        LoreCatalog::load_from_static()
    }

    fn load_tuning(&self) -> Result<NightTuning, Self::Error> {
        Ok(NightTuning::default())
    }
}

/// Main engine: builds worlds and sessions and keeps progress in sync.
pub struct NightEngine<L, S>
where
    L: DataLoader,
    S: ProgressStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> NightEngine<L, S>
where
    L: DataLoader,
    S: ProgressStorage,
{
    /// Create a new engine with the provided data loader and progress storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Load and validate the world.
    ///
    /// # Errors
    ///
    /// Returns an error if any piece of data cannot be loaded or is invalid.
    pub fn load_world(&self) -> Result<World, anyhow::Error> {
        let facility = self.data_loader.load_facility()?;
        let roster = self.data_loader.load_roster()?;
        let lore = self.data_loader.load_lore()?;
        let tuning = self.data_loader.load_tuning()?;
        Ok(World::new(&facility, roster, lore, tuning)?)
    }

    /// Saved progress, or a fresh profile when nothing was saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read.
    pub fn progress(&self) -> Result<ProgressState, anyhow::Error> {
        Ok(self.storage.load_progress()?.unwrap_or_default())
    }

    /// Construct a session in the menu with the saved unlocks applied.
    ///
    /// # Errors
    ///
    /// Returns an error if the world or the saved progress cannot be loaded.
    pub fn create_session(&self) -> Result<NightSession, anyhow::Error> {
        let world = Arc::new(self.load_world()?);
        let progress = self.progress()?;
        Ok(NightSession::new(world, progress.unlocked_nights))
    }

    /// Advance a session and persist progress if the night ended.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be saved.
    pub fn tick(
        &self,
        session: &mut NightSession,
        dt: f64,
    ) -> Result<Notifications, anyhow::Error> {
        let out = session.tick(dt);
        if let Some(delta) = self.settle(session, &out)? {
            log::debug!("progress updated: {delta:?}");
        }
        Ok(out)
    }

    /// Fold any night-ending notification into the saved progress.
    ///
    /// # Errors
    ///
    /// Returns an error if progress cannot be loaded or saved.
    pub fn settle(
        &self,
        session: &mut NightSession,
        notifications: &[Notification],
    ) -> Result<Option<ProgressDelta>, anyhow::Error> {
        let Some(report) = notifications.iter().find_map(Notification::report) else {
            return Ok(None);
        };
        let (progress, delta) = self.update_progress(report, &session.world().lore)?;
        session.set_unlocked_nights(progress.unlocked_nights);
        Ok(Some(delta))
    }

    /// Record a finished night that was played outside an engine session.
    ///
    /// # Errors
    ///
    /// Returns an error if the lore catalog or the progress cannot be loaded,
    /// or the progress cannot be saved.
    pub fn record_report(&self, report: &NightReport) -> Result<ProgressDelta, anyhow::Error> {
        let lore = self.data_loader.load_lore()?;
        Ok(self.update_progress(report, &lore)?.1)
    }

    fn update_progress(
        &self,
        report: &NightReport,
        lore: &LoreCatalog,
    ) -> Result<(ProgressState, ProgressDelta), anyhow::Error> {
        let mut progress = self.progress()?;
        let delta = progress.record(report, lore);
        self.storage.save_progress(&progress)?;
        Ok((progress, delta))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    #[derive(Clone, Copy, Default)]
    struct ShortNightLoader;

    impl DataLoader for ShortNightLoader {
        type Error = Infallible;

        fn load_facility(&self) -> Result<FacilityData, Self::Error> {
            Ok(FacilityData::load_from_static().unwrap())
        }

        fn load_roster(&self) -> Result<Roster, Self::Error> {
            Ok(Roster::load_from_static().unwrap())
        }

        fn load_lore(&self) -> Result<LoreCatalog, Self::Error> {
            Ok(LoreCatalog::load_from_static().unwrap())
        }

        fn load_tuning(&self) -> Result<NightTuning, Self::Error> {
            Ok(NightTuning {
                night_duration_secs: 12.0,
                base_move_interval_secs: 600.0,
                ..NightTuning::default()
            })
        }
    }

    #[test]
    fn engine_persists_victory_unlocks() {
        let store = MemoryProgressStore::default();
        let engine = NightEngine::new(ShortNightLoader, store.clone());
        let mut session = engine.create_session().unwrap();
        assert_eq!(session.phase(), GamePhase::Menu);
        assert!(session.start_night(1, 42).is_applied());

        let mut ended = false;
        for _ in 0..20 {
            let out = engine.tick(&mut session, 1.0).unwrap();
            if out.iter().any(|n| n.report().is_some()) {
                ended = true;
                break;
            }
        }
        assert!(ended);
        assert_eq!(session.phase(), GamePhase::Victory);

        let saved = store.load_progress().unwrap().expect("progress saved");
        assert!(saved.is_unlocked(2));
        assert!(saved.unlocked_lore.contains("intake-memo"));
        assert!(saved.best_reports.contains_key(&1));

        let fresh = engine.create_session().unwrap();
        assert!(fresh.state().unlocked_nights.contains(&2));
    }

    #[test]
    fn missing_progress_starts_at_night_one() {
        let engine = NightEngine::new(StaticDataLoader, MemoryProgressStore::default());
        let progress = engine.progress().unwrap();
        assert_eq!(progress, ProgressState::default());
        let mut session = engine.create_session().unwrap();
        assert_eq!(
            session.start_night(2, 1).rejection(),
            Some(&Rejection::NightLocked(2))
        );
    }

    #[test]
    fn recorded_losses_keep_later_nights_locked() {
        let store = MemoryProgressStore::default();
        let engine = NightEngine::new(StaticDataLoader, store.clone());
        let report = NightReport {
            night: 1,
            seed: 9,
            outcome: NightOutcome::Killed {
                by: "crawler".into(),
            },
            power_remaining: 40.0,
            elapsed_secs: 80.0,
            stats: NightStats::default(),
        };
        let delta = engine.record_report(&report).unwrap();
        assert!(delta.new_best);
        assert_eq!(delta.night_unlocked, None);
        let saved = store.load_progress().unwrap().unwrap();
        assert!(!saved.is_unlocked(2));
    }

    #[test]
    fn static_loader_builds_a_valid_world() {
        let engine = NightEngine::new(StaticDataLoader, MemoryProgressStore::default());
        let world = engine.load_world().unwrap();
        assert_eq!(world, World::load_from_static().unwrap());
    }
}
