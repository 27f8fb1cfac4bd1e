//! Night scheduler: continuous integration, the AI cadence and night endings.
//!
//! [`advance_frame`] computes every per-frame update from the state as it was
//! before the frame and only then writes the results back. [`run_ai_tick`]
//! evaluates subjects one at a time in roster order and applies each
//! subject's effects before the next subject decides.

use crate::ai::{self, AiContext, AiEffect};
use crate::breach::{self, BreachResolution, BreachState, BreachTick};
use crate::constants::{MAX_NIGHT, NIGHT_HOURS, THREAT_NIGHT_BASE, THREAT_NIGHT_STEP};
use crate::numbers::{floor_f64_to_u8, usize_to_f32};
use crate::power;
use crate::result::NightOutcome;
use crate::roster::Ability;
use crate::state::{GamePhase, GameState, Lure};
use crate::world::World;

pub mod event;
pub mod session;
mod tuning;

pub use event::{AudioCue, Notification, Notifications};
pub use session::NightSession;
pub use tuning::{NightTuning, TuningError};

/// Advance the continuous clock by `dt` seconds.
pub fn advance_frame(world: &World, state: &mut GameState, dt: f64) -> Notifications {
    let mut out = Notifications::new();
    if !state.is_playing() {
        return out;
    }
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
    let tuning = &world.tuning;

    let clock = (state.clock_secs + dt).min(tuning.night_duration_secs);
    let rate = power::drain_rate(
        tuning,
        state.blocked_door.is_some(),
        drain_boost_active(world, state),
    );
    let mut next_power = power::drained(state.power, rate, dt);
    let (cameras, restored) = state.cameras.advanced(
        dt,
        tuning.camera_reboot_secs,
        tuning.camera_auto_repair_secs,
    );
    let lures: Vec<Lure> = state
        .lures
        .iter()
        .copied()
        .filter(|l| l.expires_at > clock)
        .collect();
    let breach_tick = state.breach.ticked(dt);
    let blocked = state.blocked_door;
    let hour = hour_at(tuning, clock);

    state.clock_secs = clock;
    state.cameras = cameras;
    for room in restored {
        log::debug!("camera in {} back online", world.facility.room_id(room));
        out.push(Notification::CameraRestored { room });
    }
    state.lures = lures;
    for subject in &mut state.subjects {
        if let Some(target) = subject.target
            && !state.lures.iter().any(|l| l.room == target)
        {
            subject.target = None;
        }
    }

    match breach_tick {
        BreachTick::Idle => {}
        BreachTick::Pending(warning) => state.breach = BreachState::Warning(warning),
        BreachTick::Expired(warning) => match breach::resolve(&warning, blocked) {
            BreachResolution::Repelled { subject, direction } => {
                state.breach = BreachState::Idle;
                next_power = power::clamp_power(next_power - tuning.breach_repel_penalty);
                let neutral = world.facility.neutral_room();
                if let Some(s) = state.subjects.get_mut(subject) {
                    s.room = neutral;
                    s.target = None;
                    s.ability_used = false;
                    s.last_move = clock;
                }
                state.stats.breaches_repelled += 1;
                log::debug!("{} repelled at the {direction} door", warning.subject_id);
                out.push(Notification::BreachRepelled {
                    direction,
                    subject_id: warning.subject_id,
                });
            }
            BreachResolution::Breached { killed_by } => {
                state.breach = BreachState::Idle;
                state.power = next_power;
                finish_night(state, NightOutcome::Killed { by: killed_by }, &mut out);
                return out;
            }
        },
    }

    state.power = next_power;
    while state.hour < hour {
        state.hour += 1;
        out.push(Notification::HourChanged { hour: state.hour });
        out.push(Notification::cue(AudioCue::PingSweep));
    }
    state.threat = compute_threat(world, state);

    if clock >= tuning.night_duration_secs {
        finish_night(state, NightOutcome::Survived, &mut out);
    }
    out
}

/// Evaluate every subject once.
pub fn run_ai_tick(world: &World, state: &mut GameState) -> Notifications {
    let mut out = Notifications::new();
    if !state.is_playing() {
        return out;
    }
    state.ai_ticks += 1;
    let now = state.clock_secs;

    for idx in 0..state.subjects.len() {
        let ctx = AiContext {
            world,
            now,
            night: state.night,
            subjects: &state.subjects,
            cameras: &state.cameras,
            breach: &state.breach,
        };
        let Some(effects) = ai::evaluate_subject(&ctx, idx, state.rng.ai()) else {
            continue;
        };
        if let Some(subject) = state.subjects.get_mut(idx) {
            subject.last_move = now;
        }
        for effect in effects {
            apply_ai_effect(world, state, effect, &mut out);
        }
    }

    state.threat = compute_threat(world, state);
    out
}

fn apply_ai_effect(
    world: &World,
    state: &mut GameState,
    effect: AiEffect,
    out: &mut Notifications,
) {
    let now = state.clock_secs;
    match effect {
        AiEffect::Move { subject, to } => {
            if let Some(s) = state.subjects.get_mut(subject) {
                log::trace!("{} -> {}", s.archetype, world.facility.room_id(to));
                s.room = to;
                s.ability_used = false;
                s.last_move = now;
            }
        }
        AiEffect::Teleport {
            subject,
            to,
            ready_at,
        } => {
            if let Some(s) = state.subjects.get_mut(subject) {
                log::debug!("{} teleports to {}", s.archetype, world.facility.room_id(to));
                s.room = to;
                s.ability_used = false;
                s.ability_ready_at = ready_at;
            }
        }
        AiEffect::SabotageCamera { subject, room } => {
            if state.cameras.sabotage(room) {
                let subject_id = state
                    .subjects
                    .get(subject)
                    .map(|s| s.archetype.clone())
                    .unwrap_or_default();
                log::debug!(
                    "{subject_id} knocked out the camera in {}",
                    world.facility.room_id(room)
                );
                state.stats.cameras_sabotaged += 1;
                out.push(Notification::CameraSabotaged { room, subject_id });
                out.push(Notification::cue(AudioCue::StaticBurst));
            }
        }
        AiEffect::MarkAbilityUsed { subject } => {
            if let Some(s) = state.subjects.get_mut(subject) {
                s.ability_used = true;
            }
        }
        AiEffect::ClearLureTarget { subject } => {
            if let Some(s) = state.subjects.get_mut(subject) {
                s.target = None;
            }
        }
        AiEffect::OpenBreach { subject, direction } => {
            let Some(subject_id) = state.subjects.get(subject).map(|s| s.archetype.clone())
            else {
                return;
            };
            if state.breach.open(
                direction,
                subject,
                &subject_id,
                world.tuning.breach_countdown_secs,
            ) {
                log::debug!("breach warning: {subject_id} at the {direction} door");
                out.push(Notification::BreachOpened {
                    direction,
                    subject_id,
                });
                out.push(Notification::cue(AudioCue::BreachAlarm));
            }
        }
        AiEffect::Wait { .. } => {}
    }
}

/// Close the night with `outcome`, build its report and freeze the loop.
pub(crate) fn finish_night(
    state: &mut GameState,
    outcome: NightOutcome,
    out: &mut Notifications,
) {
    let victory = outcome.is_victory();
    if let NightOutcome::Killed { by } = &outcome {
        state.killed_by = Some(by.clone());
    }
    let report = state.build_report(outcome);
    state.report = Some(report.clone());
    if victory {
        state.phase = GamePhase::Victory;
        let next = state.night.saturating_add(1);
        if next <= MAX_NIGHT {
            state.unlocked_nights.insert(next);
        }
        log::debug!("night {} survived", state.night);
        out.push(Notification::cue(AudioCue::Victory));
        out.push(Notification::NightComplete { report });
    } else {
        state.phase = GamePhase::GameOver;
        log::debug!("night {} lost: {}", state.night, report.outcome);
        out.push(Notification::cue(AudioCue::Defeat));
        out.push(Notification::NightLost { report });
    }
}

/// Whether any power-drain subject is close enough to control to boost drain.
#[must_use]
pub fn drain_boost_active(world: &World, state: &GameState) -> bool {
    state.subjects.iter().any(|s| {
        s.active
            && world
                .roster
                .subjects
                .get(s.archetype_idx)
                .is_some_and(|a| a.ability == Ability::PowerDrain)
            && world
                .facility
                .depth(s.room)
                .is_some_and(|d| d <= world.tuning.power_drain_depth)
    })
}

/// Threat intensity from the closest subject and the night number.
#[must_use]
pub fn compute_threat(world: &World, state: &GameState) -> f32 {
    if state.breach.is_active() {
        return 1.0;
    }
    let span = usize_to_f32(world.facility.diameter().max(1));
    let proximity = state
        .subjects
        .iter()
        .filter(|s| s.active)
        .filter_map(|s| world.facility.depth(s.room))
        .map(|depth| (1.0 - usize_to_f32(depth) / span).max(0.0))
        .fold(0.0_f32, f32::max);
    let night_scale = THREAT_NIGHT_BASE + THREAT_NIGHT_STEP * f32::from(state.night);
    (proximity * night_scale).clamp(0.0, 1.0)
}

/// Completed in-fiction hours at `clock` seconds.
#[must_use]
pub fn hour_at(tuning: &NightTuning, clock: f64) -> u8 {
    floor_f64_to_u8(clock / tuning.secs_per_hour()).min(NIGHT_HOURS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facility::Direction;
    use std::collections::BTreeSet;

    fn world() -> World {
        World::load_from_static().unwrap()
    }

    fn night(world: &World, n: u8) -> GameState {
        GameState::for_night(world, n, 31, BTreeSet::from([1]))
    }

    fn room(world: &World, id: &str) -> crate::facility::RoomIdx {
        world.facility.room_index(id).unwrap()
    }

    #[test]
    fn idle_power_drains_at_base_rate() {
        let world = world();
        let mut state = night(&world, 1);
        advance_frame(&world, &mut state, 10.0);
        let expected = 100.0 - world.tuning.base_drain_per_sec * 10.0;
        assert!((state.power - expected).abs() < 1e-3);
    }

    #[test]
    fn blocked_door_adds_drain() {
        let world = world();
        let mut state = night(&world, 1);
        state.blocked_door = Some(Direction::Front);
        advance_frame(&world, &mut state, 10.0);
        let rate = world.tuning.base_drain_per_sec + world.tuning.door_drain_per_sec;
        assert!((state.power - (100.0 - rate * 10.0)).abs() < 1e-3);
    }

    #[test]
    fn nearby_power_drain_subject_doubles_base_drain() {
        let world = world();
        let mut state = night(&world, 4);
        let leech = state.subject_by_archetype("leech").unwrap();
        state.subjects[leech].room = room(&world, "west_hall");
        assert!(drain_boost_active(&world, &state));
        state.subjects[leech].room = room(&world, "cold_storage");
        assert!(!drain_boost_active(&world, &state));
    }

    #[test]
    fn hours_chime_once_each() {
        let world = world();
        let mut state = night(&world, 1);
        let per_hour = world.tuning.secs_per_hour();
        let out = advance_frame(&world, &mut state, per_hour * 2.5);
        let hours: Vec<u8> = out
            .iter()
            .filter_map(|n| match n {
                Notification::HourChanged { hour } => Some(*hour),
                _ => None,
            })
            .collect();
        assert_eq!(hours, vec![1, 2]);
        assert_eq!(event::cues(&out).filter(|c| *c == AudioCue::PingSweep).count(), 2);
        assert_eq!(state.hour, 2);
    }

    #[test]
    fn dawn_wins_and_unlocks_next_night() {
        let world = world();
        let mut state = night(&world, 1);
        let out = advance_frame(&world, &mut state, world.tuning.night_duration_secs + 5.0);
        assert_eq!(state.phase, GamePhase::Victory);
        assert!(state.unlocked_nights.contains(&2));
        assert!(out.iter().any(|n| matches!(n, Notification::NightComplete { .. })));
        assert!((state.clock_secs - world.tuning.night_duration_secs).abs() < 1e-9);

        let frozen = state.digest();
        assert!(advance_frame(&world, &mut state, 1.0).is_empty());
        assert!(run_ai_tick(&world, &mut state).is_empty());
        assert_eq!(state.digest(), frozen);
    }

    #[test]
    fn loss_wins_over_dawn_in_the_same_frame() {
        let world = world();
        let mut state = night(&world, 1);
        state.clock_secs = world.tuning.night_duration_secs - 0.1;
        state.breach.open(Direction::Left, 0, "crawler", 0.05);
        advance_frame(&world, &mut state, 1.0);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.killed_by.as_deref(), Some("crawler"));
    }

    #[test]
    fn repelled_breach_resets_subject_and_charges_penalty() {
        let world = world();
        let mut state = night(&world, 1);
        let crawler = state.subject_by_archetype("crawler").unwrap();
        state.subjects[crawler].room = room(&world, "west_hall");
        state.subjects[crawler].target = Some(room(&world, "archive"));
        state.breach.open(Direction::Left, crawler, "crawler", 1.0);
        state.blocked_door = Some(Direction::Left);
        let out = advance_frame(&world, &mut state, 1.0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert!(!state.breach.is_active());
        assert_eq!(state.subjects[crawler].room, world.facility.neutral_room());
        assert_eq!(state.subjects[crawler].target, None);
        let drained = world.tuning.base_drain_per_sec + world.tuning.door_drain_per_sec;
        let expected = 100.0 - drained - world.tuning.breach_repel_penalty;
        assert!((state.power - expected).abs() < 1e-3);
        assert!(out.iter().any(|n| matches!(n, Notification::BreachRepelled { .. })));
    }

    #[test]
    fn expired_lures_release_their_subjects() {
        let world = world();
        let mut state = night(&world, 1);
        let archive = room(&world, "archive");
        state.lures.push(Lure {
            id: 0,
            room: archive,
            expires_at: 2.0,
        });
        state.subjects[0].target = Some(archive);
        advance_frame(&world, &mut state, 1.0);
        assert_eq!(state.subjects[0].target, Some(archive));
        advance_frame(&world, &mut state, 1.0);
        assert!(state.lures.is_empty());
        assert_eq!(state.subjects[0].target, None);
    }

    #[test]
    fn ai_tick_opens_a_single_breach() {
        let world = world();
        let mut state = night(&world, 1);
        let west = room(&world, "west_hall");
        let east = room(&world, "east_hall");
        state.subjects[0].room = west;
        state.subjects[1].room = east;
        state.subjects[1].ability_used = true;
        state.clock_secs = 100.0;
        let out = run_ai_tick(&world, &mut state);
        let opened = out
            .iter()
            .filter(|n| matches!(n, Notification::BreachOpened { .. }))
            .count();
        assert_eq!(opened, 1);
        assert_eq!(state.breach.breaching_subject(), Some(0));
        assert!((state.threat - 1.0).abs() < f32::EPSILON);
        assert_eq!(state.subjects[0].room, west);
    }

    #[test]
    fn threat_rises_as_subjects_close_in() {
        let world = world();
        let mut state = night(&world, 1);
        for s in &mut state.subjects {
            s.room = room(&world, "loading_dock");
        }
        let far = compute_threat(&world, &state);
        state.subjects[0].room = room(&world, "main_hall");
        let near = compute_threat(&world, &state);
        assert!(near > far);
        assert!((0.0..=1.0).contains(&near));
    }
}
