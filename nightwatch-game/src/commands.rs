//! Player commands.
//!
//! Every command validates all of its preconditions before touching the
//! state, so a rejected command leaves the night exactly as it was.
use rand::Rng;
use smallvec::smallvec;
use thiserror::Error;

use crate::facility::{Direction, RoomIdx};
use crate::night::event::{AudioCue, Notification, Notifications};
use crate::power::{self, Tool};
use crate::state::{GameState, Lure};
use crate::world::World;

/// Why a command was ignored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    #[error("no night is in progress")]
    NotPlaying,
    #[error("command is not available in the current phase")]
    WrongPhase,
    #[error("unknown room `{0}`")]
    UnknownRoom(String),
    #[error("room `{0}` cannot be targeted")]
    InvalidRoom(String),
    #[error("{0:?} is cooling down")]
    CoolingDown(Tool),
    #[error("doors are cooling down")]
    DoorCoolingDown,
    #[error("{tool:?} costs {cost:.1} power, {available:.1} available")]
    InsufficientPower {
        tool: Tool,
        cost: f32,
        available: f32,
    },
    #[error("nothing would change")]
    Redundant,
    #[error("no subject in range")]
    NoTarget,
    #[error("at most {0} lures may be active")]
    LureLimit(usize),
    #[error("night {0} does not exist")]
    InvalidNight(u8),
    #[error("night {0} is locked")]
    NightLocked(u8),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    Applied(Notifications),
    Rejected(Rejection),
}

impl CommandOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Applied(_) => None,
            Self::Rejected(r) => Some(r),
        }
    }

    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        match self {
            Self::Applied(n) => n,
            Self::Rejected(_) => &[],
        }
    }
}

impl From<Result<Notifications, Rejection>> for CommandOutcome {
    fn from(result: Result<Notifications, Rejection>) -> Self {
        match result {
            Ok(notifications) => Self::Applied(notifications),
            Err(rejection) => {
                log::trace!("command rejected: {rejection}");
                Self::Rejected(rejection)
            }
        }
    }
}

fn ensure_playing(state: &GameState) -> Result<(), Rejection> {
    if state.is_playing() {
        Ok(())
    } else {
        Err(Rejection::NotPlaying)
    }
}

fn lookup_room(world: &World, room_id: &str) -> Result<RoomIdx, Rejection> {
    world
        .facility
        .room_index(room_id)
        .ok_or_else(|| Rejection::UnknownRoom(room_id.to_string()))
}

/// Place a lure; each susceptible subject may start heading for it.
pub fn place_lure(world: &World, state: &mut GameState, room_id: &str) -> CommandOutcome {
    try_place_lure(world, state, room_id).into()
}

fn try_place_lure(
    world: &World,
    state: &mut GameState,
    room_id: &str,
) -> Result<Notifications, Rejection> {
    ensure_playing(state)?;
    let room = lookup_room(world, room_id)?;
    if room == world.facility.control_room() {
        return Err(Rejection::InvalidRoom(room_id.to_string()));
    }
    let tuning = &world.tuning;
    if state.lures.len() >= tuning.max_active_lures {
        return Err(Rejection::LureLimit(tuning.max_active_lures));
    }
    let now = state.clock_secs;
    power::check_activation(state.power, &state.cooldowns, Tool::Lure, now, tuning)?;
    power::commit_activation(
        &mut state.power,
        &mut state.cooldowns,
        Tool::Lure,
        now,
        tuning,
    );

    state.lures.push(Lure {
        id: state.next_lure_id,
        room,
        expires_at: now + tuning.lure_duration_secs,
    });
    state.next_lure_id = state.next_lure_id.wrapping_add(1);
    state.stats.lures_used += 1;

    let breaching = state.breach.breaching_subject();
    for (idx, subject) in state.subjects.iter_mut().enumerate() {
        if !subject.active || breaching == Some(idx) {
            continue;
        }
        let Some(archetype) = world.roster.subjects.get(subject.archetype_idx) else {
            continue;
        };
        let roll: f32 = state.rng.tools().random();
        if roll < archetype.lure_susceptibility {
            log::trace!("{} takes the lure in {}", subject.archetype, room_id);
            subject.target = Some(room);
        }
    }
    Ok(smallvec![Notification::cue(AudioCue::Lure)])
}

/// Stun every subject in a room.
pub fn stun(world: &World, state: &mut GameState, room_id: &str) -> CommandOutcome {
    try_stun(world, state, room_id).into()
}

fn try_stun(
    world: &World,
    state: &mut GameState,
    room_id: &str,
) -> Result<Notifications, Rejection> {
    ensure_playing(state)?;
    let room = lookup_room(world, room_id)?;
    let targets: Vec<usize> = state.subjects_in(room).collect();
    if targets.is_empty() {
        return Err(Rejection::NoTarget);
    }
    let tuning = &world.tuning;
    let now = state.clock_secs;
    power::check_activation(state.power, &state.cooldowns, Tool::Stun, now, tuning)?;
    power::commit_activation(
        &mut state.power,
        &mut state.cooldowns,
        Tool::Stun,
        now,
        tuning,
    );

    for idx in targets {
        let Some(subject) = state.subjects.get_mut(idx) else {
            continue;
        };
        let resistance = world
            .roster
            .subjects
            .get(subject.archetype_idx)
            .map_or(0.0, |a| f64::from(a.stun_resistance));
        let duration = (tuning.stun_base_secs - resistance).max(tuning.stun_min_secs);
        subject.stunned_until = subject.stunned_until.max(now + duration);
    }
    state.stats.stuns_used += 1;
    Ok(smallvec![Notification::cue(AudioCue::Shock)])
}

/// Hold one door shut. Only one door can be held at a time.
pub fn block_door(state: &mut GameState, direction: Direction) -> CommandOutcome {
    try_block_door(state, direction).into()
}

fn try_block_door(
    state: &mut GameState,
    direction: Direction,
) -> Result<Notifications, Rejection> {
    ensure_playing(state)?;
    if state.blocked_door.is_some() {
        return Err(Rejection::Redundant);
    }
    if state.clock_secs < state.cooldowns.door_ready_at {
        return Err(Rejection::DoorCoolingDown);
    }
    state.blocked_door = Some(direction);
    state.stats.door_blocks += 1;
    log::debug!("{direction} door blocked");
    Ok(smallvec![Notification::cue(AudioCue::DoorSlam)])
}

/// Open the held door and start the door cooldown.
pub fn release_door(world: &World, state: &mut GameState) -> CommandOutcome {
    try_release_door(world, state).into()
}

fn try_release_door(world: &World, state: &mut GameState) -> Result<Notifications, Rejection> {
    ensure_playing(state)?;
    if state.blocked_door.take().is_none() {
        return Err(Rejection::Redundant);
    }
    state.cooldowns.door_ready_at = state.clock_secs + world.tuning.door_cooldown_secs;
    Ok(Notifications::new())
}

/// Start a fast reboot of an offline camera.
pub fn reboot_camera(world: &World, state: &mut GameState, room_id: &str) -> CommandOutcome {
    try_reboot_camera(world, state, room_id).into()
}

fn try_reboot_camera(
    world: &World,
    state: &mut GameState,
    room_id: &str,
) -> Result<Notifications, Rejection> {
    ensure_playing(state)?;
    let room = lookup_room(world, room_id)?;
    let Some(camera) = state.cameras.get(room) else {
        return Err(Rejection::InvalidRoom(room_id.to_string()));
    };
    if camera.online || camera.rebooting {
        return Err(Rejection::Redundant);
    }
    let tuning = &world.tuning;
    let now = state.clock_secs;
    power::check_activation(state.power, &state.cooldowns, Tool::Reboot, now, tuning)?;
    power::commit_activation(
        &mut state.power,
        &mut state.cooldowns,
        Tool::Reboot,
        now,
        tuning,
    );
    state.cameras.reboot(room);
    state.stats.camera_reboots += 1;
    Ok(Notifications::new())
}
