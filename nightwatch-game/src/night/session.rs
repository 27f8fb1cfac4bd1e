use std::collections::BTreeSet;
use std::sync::Arc;

use crate::commands::{self, CommandOutcome, Rejection};
use crate::constants::MAX_NIGHT;
use crate::facility::Direction;
use crate::night::{Notifications, advance_frame, finish_night, run_ai_tick};
use crate::result::{NightOutcome, NightReport};
use crate::state::{GamePhase, GameState, RenderView};
use crate::world::World;

/// Float slack when deciding whether a frame reaches the next AI tick.
const AI_BOUNDARY_SLACK: f64 = 1e-9;

/// Session wrapper binding a world to the mutable state it drives.
///
/// [`NightSession::tick`] is the single driving entry point: continuous
/// integration interleaved with however many AI ticks the elapsed time owes.
#[derive(Debug, Clone)]
pub struct NightSession {
    world: Arc<World>,
    state: GameState,
    ai_accumulator: f64,
}

impl NightSession {
    /// Session in the menu with the given unlocked nights.
    #[must_use]
    pub fn new(world: Arc<World>, unlocked_nights: BTreeSet<u8>) -> Self {
        Self {
            world,
            state: GameState::in_menu(unlocked_nights),
            ai_accumulator: 0.0,
        }
    }

    /// Build a session from an existing game state.
    #[must_use]
    pub fn from_state(world: Arc<World>, state: GameState) -> Self {
        Self {
            world,
            state: state.rehydrate(),
            ai_accumulator: 0.0,
        }
    }

    /// Start (or restart) `night`. Every live entity is rebuilt from scratch.
    pub fn start_night(&mut self, night: u8, seed: u64) -> CommandOutcome {
        if night == 0 || night > MAX_NIGHT {
            return CommandOutcome::Rejected(Rejection::InvalidNight(night));
        }
        if !self.state.unlocked_nights.contains(&night) {
            return CommandOutcome::Rejected(Rejection::NightLocked(night));
        }
        let unlocked = std::mem::take(&mut self.state.unlocked_nights);
        self.state = GameState::for_night(&self.world, night, seed, unlocked);
        self.ai_accumulator = 0.0;
        log::debug!(
            "night {night} started with {} subjects",
            self.state.subjects.len()
        );
        CommandOutcome::Applied(Notifications::new())
    }

    /// Advance real time by `dt` seconds.
    ///
    /// The frame is split at every AI boundary it crosses, so each AI tick
    /// sees the clock, power and breach countdown as they stood at that
    /// moment.
    pub fn tick(&mut self, dt: f64) -> Notifications {
        let mut out = Notifications::new();
        if !self.state.is_playing() {
            return out;
        }
        let mut remaining = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let interval = self.world.tuning.ai_tick_interval_secs;
        if interval <= 0.0 {
            return advance_frame(&self.world, &mut self.state, remaining);
        }

        loop {
            let until_ai = (interval - self.ai_accumulator).max(0.0);
            if remaining + AI_BOUNDARY_SLACK < until_ai {
                if remaining > 0.0 {
                    out.extend(advance_frame(&self.world, &mut self.state, remaining));
                    self.ai_accumulator += remaining;
                }
                break;
            }
            out.extend(advance_frame(&self.world, &mut self.state, until_ai));
            remaining = (remaining - until_ai).max(0.0);
            self.ai_accumulator = 0.0;
            if !self.state.is_playing() {
                break;
            }
            out.extend(run_ai_tick(&self.world, &mut self.state));
            if !self.state.is_playing() {
                break;
            }
        }
        if !self.state.is_playing() {
            self.ai_accumulator = 0.0;
        }
        out
    }

    pub fn place_lure(&mut self, room_id: &str) -> CommandOutcome {
        commands::place_lure(&self.world, &mut self.state, room_id)
    }

    pub fn stun(&mut self, room_id: &str) -> CommandOutcome {
        commands::stun(&self.world, &mut self.state, room_id)
    }

    pub fn block_door(&mut self, direction: Direction) -> CommandOutcome {
        commands::block_door(&mut self.state, direction)
    }

    pub fn release_door(&mut self) -> CommandOutcome {
        commands::release_door(&self.world, &mut self.state)
    }

    pub fn reboot_camera(&mut self, room_id: &str) -> CommandOutcome {
        commands::reboot_camera(&self.world, &mut self.state, room_id)
    }

    /// Force the current night to end, e.g. when the host closes the game.
    pub fn end_game(&mut self, victory: bool, killed_by: Option<&str>) -> CommandOutcome {
        if !self.state.is_playing() {
            return CommandOutcome::Rejected(Rejection::NotPlaying);
        }
        let outcome = match (victory, killed_by) {
            (true, _) => NightOutcome::Survived,
            (false, Some(by)) => NightOutcome::Killed { by: by.to_string() },
            (false, None) => NightOutcome::Abandoned,
        };
        let mut out = Notifications::new();
        finish_night(&mut self.state, outcome, &mut out);
        self.ai_accumulator = 0.0;
        CommandOutcome::Applied(out)
    }

    /// Leave whatever screen is showing. A running night is abandoned
    /// without a report.
    pub fn return_to_menu(&mut self) -> CommandOutcome {
        if self.state.phase == GamePhase::Menu {
            return CommandOutcome::Rejected(Rejection::Redundant);
        }
        self.state.phase = GamePhase::Menu;
        self.ai_accumulator = 0.0;
        CommandOutcome::Applied(Notifications::new())
    }

    pub fn open_lore(&mut self) -> CommandOutcome {
        if self.state.phase != GamePhase::Menu {
            return CommandOutcome::Rejected(Rejection::WrongPhase);
        }
        self.state.phase = GamePhase::Lore;
        CommandOutcome::Applied(Notifications::new())
    }

    /// Report of the last finished night.
    #[must_use]
    pub const fn report(&self) -> Option<&NightReport> {
        self.state.report.as_ref()
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.state.phase
    }

    #[must_use]
    pub fn view(&self) -> RenderView {
        self.state.render_view(&self.world)
    }

    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Borrow the underlying immutable game state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Apply a closure to the mutable game state.
    pub fn with_state_mut<R>(&mut self, f: impl FnOnce(&mut GameState) -> R) -> R {
        f(&mut self.state)
    }

    /// Replace the unlock set, e.g. after loading saved progress.
    pub fn set_unlocked_nights(&mut self, unlocked: BTreeSet<u8>) {
        self.state.unlocked_nights = unlocked;
    }

    /// Consume the session, returning the underlying game state.
    #[must_use]
    pub fn into_state(self) -> GameState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::night::Notification;

    fn session(unlocked: &[u8]) -> NightSession {
        let world = Arc::new(World::load_from_static().unwrap());
        NightSession::new(world, unlocked.iter().copied().collect())
    }

    #[test]
    fn locked_and_invalid_nights_are_rejected() {
        let mut s = session(&[1]);
        assert_eq!(
            s.start_night(2, 1).rejection(),
            Some(&Rejection::NightLocked(2))
        );
        assert_eq!(
            s.start_night(0, 1).rejection(),
            Some(&Rejection::InvalidNight(0))
        );
        assert_eq!(
            s.start_night(MAX_NIGHT + 1, 1).rejection(),
            Some(&Rejection::InvalidNight(MAX_NIGHT + 1))
        );
        assert_eq!(s.phase(), GamePhase::Menu);
        assert!(s.start_night(1, 1).is_applied());
        assert_eq!(s.phase(), GamePhase::Playing);
    }

    #[test]
    fn ai_runs_on_its_own_cadence() {
        let mut s = session(&[1]);
        s.start_night(1, 5);
        let interval = s.world().tuning.ai_tick_interval_secs;
        s.tick(interval * 0.5);
        assert_eq!(s.state().ai_ticks, 0);
        s.tick(interval * 0.5);
        assert_eq!(s.state().ai_ticks, 1);
        s.tick(interval * 3.0);
        assert_eq!(s.state().ai_ticks, 4);
    }

    #[test]
    fn long_frames_give_every_ai_tick_its_own_moment() {
        let mut s = session(&[1]);
        s.start_night(1, 5);
        let crawler = s.state().subject_by_archetype("crawler").unwrap();
        let dock = s.world().facility.room_index("loading_dock").unwrap();
        let main_hall = s.world().facility.room_index("main_hall").unwrap();
        s.with_state_mut(|state| state.subjects[crawler].room = dock);

        // Two crawler moves fit in ten seconds on the first night.
        s.tick(10.0);
        assert_eq!(s.state().ai_ticks, 20);
        assert_eq!(s.state().subjects[crawler].room, main_hall);

        let interval = s.world().tuning.ai_tick_interval_secs;
        let mut single = session(&[1]);
        single.start_night(1, 5);
        let mut sliced = session(&[1]);
        sliced.start_night(1, 5);
        single.tick(interval * 4.0);
        for _ in 0..4 {
            sliced.tick(interval);
        }
        assert_eq!(single.state().ai_ticks, 4);
        assert_eq!(single.state().digest(), sliced.state().digest());
    }

    #[test]
    fn menu_and_lore_screens() {
        let mut s = session(&[1]);
        assert!(s.open_lore().is_applied());
        assert_eq!(s.phase(), GamePhase::Lore);
        assert!(!s.open_lore().is_applied());
        assert!(s.return_to_menu().is_applied());
        assert_eq!(s.phase(), GamePhase::Menu);
        assert!(!s.return_to_menu().is_applied());
    }

    #[test]
    fn leaving_a_night_stops_the_loop() {
        let mut s = session(&[1]);
        s.start_night(1, 9);
        s.tick(1.0);
        assert!(s.return_to_menu().is_applied());
        let frozen = s.state().digest();
        assert!(s.tick(10.0).is_empty());
        assert_eq!(s.state().digest(), frozen);
    }

    #[test]
    fn end_game_reports_the_outcome() {
        let mut s = session(&[1]);
        s.start_night(1, 9);
        let out = s.end_game(false, Some("watcher"));
        assert!(
            out.notifications()
                .iter()
                .any(|n| matches!(n, Notification::NightLost { .. }))
        );
        assert_eq!(s.phase(), GamePhase::GameOver);
        assert_eq!(s.state().killed_by.as_deref(), Some("watcher"));
        assert!(!s.end_game(true, None).is_applied());

        s.start_night(1, 10);
        s.end_game(true, None);
        assert_eq!(s.phase(), GamePhase::Victory);
        assert!(s.state().unlocked_nights.contains(&2));
    }
}
