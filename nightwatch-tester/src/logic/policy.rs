use std::fmt;

use nightwatch_game::{CameraStatus, Direction, NightSession, Rejection};

/// Power kept in reserve for door blocks before spending on other tools.
const POWER_RESERVE: f32 = 25.0;

/// Policy interface for automated operators.
pub trait OperatorPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Issue whatever commands the policy wants after a frame. Returns the
    /// number of commands that were applied.
    fn act(&mut self, session: &mut NightSession) -> u32;
}

/// Built-in operator strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperatorStrategy {
    Idle,
    Guardian,
}

impl OperatorStrategy {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Guardian => "Guardian",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn OperatorPolicy + Send> {
        match self {
            Self::Idle => Box::new(IdlePolicy),
            Self::Guardian => Box::new(GuardianPolicy),
        }
    }
}

impl fmt::Display for OperatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct IdlePolicy;

/// Blocks the warned door, keeps the cameras up and baits subjects away
/// from the approach corridors.
struct GuardianPolicy;

impl OperatorPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "Idle"
    }

    fn act(&mut self, _session: &mut NightSession) -> u32 {
        0
    }
}

impl OperatorPolicy for GuardianPolicy {
    fn name(&self) -> &'static str {
        "Guardian"
    }

    fn act(&mut self, session: &mut NightSession) -> u32 {
        if !session.state().is_playing() {
            return 0;
        }
        if let Some(applied) = guard_doors(session) {
            return applied;
        }
        u32::from(reboot_first_offline(session)) + u32::from(lure_from_final_rooms(session))
    }
}

/// Door handling. Returns `Some` when the doors needed attention this frame,
/// in which case nothing else is attempted.
fn guard_doors(session: &mut NightSession) -> Option<u32> {
    let warned = session.state().breach.warning().map(|w| w.direction);
    let held = session.state().blocked_door;
    match (warned, held) {
        (Some(dir), Some(current)) if dir == current => Some(0),
        (Some(_), Some(_)) | (None, Some(_)) => {
            Some(u32::from(session.release_door().is_applied()))
        }
        (Some(dir), None) => Some(block(session, dir)),
        (None, None) => None,
    }
}

fn block(session: &mut NightSession, direction: Direction) -> u32 {
    match session.block_door(direction).rejection() {
        None => 1,
        Some(Rejection::DoorCoolingDown) => {
            log::trace!("{direction} door still cooling down");
            0
        }
        Some(other) => {
            log::debug!("could not block {direction} door: {other}");
            0
        }
    }
}

fn reboot_first_offline(session: &mut NightSession) -> bool {
    if session.state().power < POWER_RESERVE {
        return false;
    }
    let offline = session
        .state()
        .cameras
        .iter()
        .find(|c| c.status() == CameraStatus::Offline)
        .map(|c| session.world().facility.room_id(c.room).to_string());
    offline.is_some_and(|room| session.reboot_camera(&room).is_applied())
}

fn lure_from_final_rooms(session: &mut NightSession) -> bool {
    let state = session.state();
    let facility = &session.world().facility;
    if state.power < POWER_RESERVE + session.world().tuning.lure_cost {
        return false;
    }
    let pressing = state
        .subjects
        .iter()
        .any(|s| s.active && s.target.is_none() && facility.is_final(s.room));
    if !pressing {
        return false;
    }
    let Some(bait) = facility
        .spawn_rooms()
        .iter()
        .max_by_key(|r| facility.depth(**r).unwrap_or(0))
        .map(|r| facility.room_id(*r).to_string())
    else {
        return false;
    };
    session.place_lure(&bait).is_applied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nightwatch_game::World;
    use std::sync::Arc;

    fn session() -> NightSession {
        let world = Arc::new(World::load_from_static().unwrap());
        let mut session = NightSession::new(world, [1].into_iter().collect());
        session.start_night(1, 17);
        session
    }

    #[test]
    fn idle_never_acts() {
        let mut session = session();
        let before = session.state().digest();
        assert_eq!(OperatorStrategy::Idle.create_policy().act(&mut session), 0);
        assert_eq!(session.state().digest(), before);
    }

    #[test]
    fn guardian_blocks_the_warned_door_then_lets_go() {
        let mut session = session();
        session.with_state_mut(|state| {
            state.breach.open(Direction::Right, 0, "crawler", 4.0);
        });
        let mut policy = OperatorStrategy::Guardian.create_policy();
        assert_eq!(policy.act(&mut session), 1);
        assert_eq!(session.state().blocked_door, Some(Direction::Right));
        assert_eq!(policy.act(&mut session), 0);

        session.with_state_mut(|state| state.breach = Default::default());
        assert_eq!(policy.act(&mut session), 1);
        assert_eq!(session.state().blocked_door, None);
    }

    #[test]
    fn guardian_reboots_sabotaged_cameras() {
        let mut session = session();
        let archive = session.world().facility.room_index("archive").unwrap();
        session.with_state_mut(|state| {
            state.cameras.sabotage(archive);
        });
        let mut policy = OperatorStrategy::Guardian.create_policy();
        policy.act(&mut session);
        assert_eq!(
            session.state().cameras.get(archive).map(|c| c.status()),
            Some(CameraStatus::Rebooting)
        );
    }
}
