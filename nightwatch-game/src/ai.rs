//! Per-subject decision step.
//!
//! [`evaluate_subject`] reads the state and returns an ordered list of
//! [`AiEffect`]s. It never mutates the night; the scheduler applies the
//! effects one subject at a time, in roster order.

use rand::Rng;
use rand::seq::IndexedRandom;
use smallvec::SmallVec;

use crate::breach::BreachState;
use crate::cameras::CameraNetwork;
use crate::facility::{Direction, RoomIdx};
use crate::roster::{Ability, Archetype, Behavior};
use crate::state::SubjectInstance;
use crate::world::World;

/// Single state change requested by the AI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AiEffect {
    /// Walk one hop. Followers of a pack leader get their own `Move`.
    Move { subject: usize, to: RoomIdx },
    /// Jump several hops toward control and start the teleport cooldown.
    Teleport {
        subject: usize,
        to: RoomIdx,
        ready_at: f64,
    },
    SabotageCamera { subject: usize, room: RoomIdx },
    /// Camera-jam spent for the current room.
    MarkAbilityUsed { subject: usize },
    ClearLureTarget { subject: usize },
    /// Ask for a breach warning at `direction`. Ignored if one is open.
    OpenBreach { subject: usize, direction: Direction },
    /// Nothing to do; the action is still consumed.
    Wait { subject: usize },
}

pub type AiEffects = SmallVec<[AiEffect; 4]>;

/// Read-only view of the night the AI decides against.
#[derive(Debug, Clone, Copy)]
pub struct AiContext<'a> {
    pub world: &'a World,
    pub now: f64,
    pub night: u8,
    pub subjects: &'a [SubjectInstance],
    pub cameras: &'a CameraNetwork,
    pub breach: &'a BreachState,
}

/// Seconds between actions for `archetype` on `night`.
#[must_use]
pub fn move_interval(world: &World, archetype: &Archetype, night: u8) -> f64 {
    let tuning = &world.tuning;
    let speed = f64::from(archetype.speed).max(f64::EPSILON);
    tuning.base_move_interval_secs / speed * tuning.night_interval_scale(night)
}

/// Whether subject `idx` acts on this tick.
#[must_use]
pub fn is_eligible(ctx: &AiContext<'_>, idx: usize) -> bool {
    let Some(subject) = ctx.subjects.get(idx) else {
        return false;
    };
    let Some(archetype) = ctx.world.roster.subjects.get(subject.archetype_idx) else {
        return false;
    };
    subject.active
        && !subject.is_stunned(ctx.now)
        && ctx.breach.breaching_subject() != Some(idx)
        && ctx.now - subject.last_move >= move_interval(ctx.world, archetype, ctx.night)
}

/// Decide what subject `idx` does this tick. Returns `None` when it does not act.
pub fn evaluate_subject<R: Rng + ?Sized>(
    ctx: &AiContext<'_>,
    idx: usize,
    rng: &mut R,
) -> Option<AiEffects> {
    if !is_eligible(ctx, idx) {
        return None;
    }
    let subject = ctx.subjects.get(idx)?;
    let archetype = ctx.world.roster.subjects.get(subject.archetype_idx)?;
    let mut effects = AiEffects::new();

    if let Some(ability_effects) = ability_precheck(ctx, idx, subject, archetype, rng) {
        log::trace!("{} uses {:?}", archetype.id, archetype.ability);
        return Some(ability_effects);
    }

    if archetype.behavior == Behavior::Methodical {
        let roll: f32 = rng.random();
        if roll < ctx.world.tuning.methodical_sabotage_chance
            && ctx.cameras.is_online(subject.room)
        {
            effects.push(AiEffect::SabotageCamera {
                subject: idx,
                room: subject.room,
            });
        }
    }

    if archetype.behavior == Behavior::Erratic && subject.target.is_none() {
        let roll: f32 = rng.random();
        if roll < ctx.world.tuning.erratic_wander_chance {
            let control = ctx.world.facility.control_room();
            let options: SmallVec<[RoomIdx; 4]> = ctx
                .world
                .facility
                .neighbors(subject.room)
                .iter()
                .copied()
                .filter(|r| *r != control)
                .collect();
            if let Some(&to) = options.choose(rng) {
                log::trace!("{} wanders to {to}", archetype.id);
                push_move(ctx, idx, subject, to, archetype, &mut effects);
                return Some(effects);
            }
        }
    }

    let (next, clear_target) = resolve_next_hop(ctx, subject);
    if clear_target {
        effects.push(AiEffect::ClearLureTarget { subject: idx });
    }

    match next {
        Some(to) if to == ctx.world.facility.control_room() => {
            let direction = ctx.world.facility.approach_direction(subject.room);
            log::trace!("{} at the {direction} door", archetype.id);
            effects.push(AiEffect::OpenBreach {
                subject: idx,
                direction,
            });
        }
        Some(to) => {
            push_move(ctx, idx, subject, to, archetype, &mut effects);
            if subject.target == Some(to) {
                effects.push(AiEffect::ClearLureTarget { subject: idx });
            }
        }
        None => {
            log::trace!("{} is stuck in {}", archetype.id, subject.room);
            effects.push(AiEffect::Wait { subject: idx });
        }
    }
    Some(effects)
}

/// Camera-jam and teleport, which replace the subject's normal action.
fn ability_precheck<R: Rng + ?Sized>(
    ctx: &AiContext<'_>,
    idx: usize,
    subject: &SubjectInstance,
    archetype: &Archetype,
    rng: &mut R,
) -> Option<AiEffects> {
    match archetype.ability {
        Ability::CameraJam => {
            if subject.ability_used || !ctx.cameras.is_online(subject.room) {
                return None;
            }
            Some(SmallVec::from_slice(&[
                AiEffect::SabotageCamera {
                    subject: idx,
                    room: subject.room,
                },
                AiEffect::MarkAbilityUsed { subject: idx },
            ]))
        }
        Ability::Teleport => {
            if subject.target.is_some() || ctx.now < subject.ability_ready_at {
                return None;
            }
            let tuning = &ctx.world.tuning;
            let roll: f32 = rng.random();
            if roll >= tuning.teleport_chance {
                return None;
            }
            let hops = rng.random_range(1..=tuning.teleport_max_hops.max(1));
            let to = teleport_destination(ctx.world, subject.room, hops)?;
            Some(SmallVec::from_slice(&[AiEffect::Teleport {
                subject: idx,
                to,
                ready_at: ctx.now + tuning.teleport_cooldown_secs,
            }]))
        }
        Ability::None | Ability::Pack | Ability::Invisible | Ability::PowerDrain => None,
    }
}

/// Room `hops` steps toward control, stopping at a final room at the latest.
#[must_use]
pub fn teleport_destination(world: &World, from: RoomIdx, hops: usize) -> Option<RoomIdx> {
    let path = world
        .facility
        .shortest_path(from, world.facility.control_room());
    // path = [from, ..., final, control]; the last walkable index is len - 2.
    let last_walkable = path.len().checked_sub(2)?;
    let to = *path.get(hops.min(last_walkable))?;
    (to != from).then_some(to)
}

/// Next hop and whether the lure target has to be dropped first.
fn resolve_next_hop(ctx: &AiContext<'_>, subject: &SubjectInstance) -> (Option<RoomIdx>, bool) {
    let facility = &ctx.world.facility;
    let control = facility.control_room();
    match subject.target {
        Some(target) if target != subject.room => {
            if let Some(next) = facility.next_hop(subject.room, target) {
                (Some(next), false)
            } else {
                (facility.next_hop(subject.room, control), true)
            }
        }
        Some(_) => (facility.next_hop(subject.room, control), true),
        None => (facility.next_hop(subject.room, control), false),
    }
}

fn push_move(
    ctx: &AiContext<'_>,
    idx: usize,
    subject: &SubjectInstance,
    to: RoomIdx,
    archetype: &Archetype,
    effects: &mut AiEffects,
) {
    effects.push(AiEffect::Move { subject: idx, to });
    if archetype.ability != Ability::Pack {
        return;
    }
    for (other, follower) in ctx.subjects.iter().enumerate() {
        if other == idx
            || !follower.active
            || follower.room != subject.room
            || follower.is_stunned(ctx.now)
            || ctx.breach.breaching_subject() == Some(other)
        {
            continue;
        }
        let is_pack = ctx
            .world
            .roster
            .subjects
            .get(follower.archetype_idx)
            .is_some_and(|a| a.ability == Ability::Pack);
        if is_pack {
            effects.push(AiEffect::Move { subject: other, to });
        }
    }
}
