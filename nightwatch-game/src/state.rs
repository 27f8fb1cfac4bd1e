//! Aggregate night state and its read-only render view.
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::breach::BreachState;
use crate::cameras::{CameraNetwork, CameraStatus};
use crate::constants::POWER_MAX;
use crate::facility::{Direction, RoomIdx};
use crate::power::Cooldowns;
use crate::result::{NightOutcome, NightReport, NightStats};
use crate::rng::RngBundle;
use crate::roster::Ability;
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Menu,
    Playing,
    GameOver,
    Victory,
    Lore,
}

impl GamePhase {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver | Self::Victory)
    }
}

/// Live subject for the current night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectInstance {
    /// Archetype id.
    pub archetype: String,
    /// Position of the archetype in the roster.
    pub archetype_idx: usize,
    pub room: RoomIdx,
    /// Lure room the subject is heading for.
    pub target: Option<RoomIdx>,
    pub stunned_until: f64,
    pub active: bool,
    pub last_move: f64,
    /// Camera-jam spent in the current room.
    pub ability_used: bool,
    /// Earliest clock value for the next teleport.
    pub ability_ready_at: f64,
}

impl SubjectInstance {
    #[must_use]
    pub fn is_stunned(&self, now: f64) -> bool {
        now < self.stunned_until
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lure {
    pub id: u32,
    pub room: RoomIdx,
    pub expires_at: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub phase: GamePhase,
    pub night: u8,
    pub seed: u64,
    pub clock_secs: f64,
    /// Completed in-fiction hours since midnight.
    pub hour: u8,
    pub power: f32,
    pub subjects: Vec<SubjectInstance>,
    pub cameras: CameraNetwork,
    pub lures: Vec<Lure>,
    pub next_lure_id: u32,
    pub cooldowns: Cooldowns,
    pub blocked_door: Option<Direction>,
    pub breach: BreachState,
    /// Feedback intensity in `[0, 1]`; never read by the simulation.
    pub threat: f32,
    pub ai_ticks: u64,
    pub stats: NightStats,
    pub killed_by: Option<String>,
    pub report: Option<NightReport>,
    pub unlocked_nights: BTreeSet<u8>,
    #[serde(skip)]
    pub rng: RngBundle,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            phase: GamePhase::Menu,
            night: 1,
            seed: 0,
            clock_secs: 0.0,
            hour: 0,
            power: POWER_MAX,
            subjects: Vec::new(),
            cameras: CameraNetwork::default(),
            lures: Vec::new(),
            next_lure_id: 0,
            cooldowns: Cooldowns::default(),
            blocked_door: None,
            breach: BreachState::Idle,
            threat: 0.0,
            ai_ticks: 0,
            stats: NightStats::default(),
            killed_by: None,
            report: None,
            unlocked_nights: BTreeSet::from([1]),
            rng: RngBundle::default(),
        }
    }
}

impl GameState {
    /// Menu state holding the given unlock set.
    #[must_use]
    pub fn in_menu(unlocked_nights: BTreeSet<u8>) -> Self {
        Self {
            unlocked_nights,
            ..Self::default()
        }
    }

    /// Fresh `Playing` state for `night`. Nothing but the unlock set carries
    /// over from whatever came before.
    #[must_use]
    pub fn for_night(world: &World, night: u8, seed: u64, unlocked_nights: BTreeSet<u8>) -> Self {
        let mut rng = RngBundle::from_user_seed(seed);
        let mut spawns = world.facility.spawn_rooms().to_vec();
        spawns.shuffle(rng.spawn());

        let subjects = world
            .roster
            .active_on(night)
            .enumerate()
            .filter_map(|(slot, (archetype_idx, archetype))| {
                let room = *spawns.get(slot % spawns.len().max(1))?;
                Some(SubjectInstance {
                    archetype: archetype.id.clone(),
                    archetype_idx,
                    room,
                    target: None,
                    stunned_until: 0.0,
                    active: true,
                    last_move: 0.0,
                    ability_used: false,
                    ability_ready_at: 0.0,
                })
            })
            .collect();

        Self {
            phase: GamePhase::Playing,
            night,
            seed,
            subjects,
            cameras: CameraNetwork::for_facility(&world.facility),
            unlocked_nights,
            rng,
            ..Self::default()
        }
    }

    /// Rebuild the RNG streams after deserialization. Draw positions are not
    /// persisted, so a rehydrated state replays from the start of each stream.
    #[must_use]
    pub fn rehydrate(mut self) -> Self {
        self.rng = RngBundle::from_user_seed(self.seed);
        self
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Active subject indices standing in `room`, in roster order.
    pub fn subjects_in(&self, room: RoomIdx) -> impl Iterator<Item = usize> + '_ {
        self.subjects
            .iter()
            .enumerate()
            .filter(move |(_, s)| s.active && s.room == room)
            .map(|(i, _)| i)
    }

    #[must_use]
    pub fn subject_by_archetype(&self, id: &str) -> Option<usize> {
        self.subjects.iter().position(|s| s.archetype == id)
    }

    /// Invisible archetypes drop off the feeds on odd AI ticks.
    #[must_use]
    pub fn is_subject_visible(&self, world: &World, subject: usize) -> bool {
        let Some(instance) = self.subjects.get(subject) else {
            return false;
        };
        let invisible = world
            .roster
            .subjects
            .get(instance.archetype_idx)
            .is_some_and(|a| a.ability == Ability::Invisible);
        !(invisible && self.ai_ticks & 1 == 1)
    }

    /// End-of-night report for the current clock and counters.
    #[must_use]
    pub fn build_report(&self, outcome: NightOutcome) -> NightReport {
        NightReport {
            night: self.night,
            seed: self.seed,
            outcome,
            power_remaining: self.power,
            elapsed_secs: self.clock_secs,
            stats: self.stats,
        }
    }

    /// XxHash64 of the canonical JSON encoding, for replay checks.
    #[must_use]
    pub fn digest(&self) -> u64 {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        hasher.finish()
    }

    /// Snapshot for the renderer.
    #[must_use]
    pub fn render_view(&self, world: &World) -> RenderView {
        let facility = &world.facility;
        let cameras = self
            .cameras
            .iter()
            .map(|c| CameraView {
                room: facility.room_id(c.room).to_string(),
                status: c.status(),
                reboot_progress: c.reboot_progress,
                auto_repair_progress: c.auto_repair_progress,
            })
            .collect();
        let subjects = self
            .subjects
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, s)| SubjectView {
                id: s.archetype.clone(),
                room: facility.room_id(s.room).to_string(),
                stunned: s.is_stunned(self.clock_secs),
                visible: self.is_subject_visible(world, i),
            })
            .collect();
        let lures = self
            .lures
            .iter()
            .map(|l| LureView {
                room: facility.room_id(l.room).to_string(),
                remaining_secs: (l.expires_at - self.clock_secs).max(0.0),
            })
            .collect();
        let [lure, stun, door] = self.cooldowns.remaining(self.clock_secs);
        RenderView {
            phase: self.phase,
            night: self.night,
            clock_secs: self.clock_secs,
            hour: self.hour,
            power: self.power,
            threat: self.threat,
            cameras,
            subjects,
            lures,
            breach: self.breach.warning().map(|w| BreachView {
                direction: w.direction,
                remaining_secs: w.remaining_secs,
                subject_id: w.subject_id.clone(),
            }),
            blocked_door: self.blocked_door,
            cooldowns: CooldownView { lure, stun, door },
            killed_by: self.killed_by.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraView {
    pub room: String,
    pub status: CameraStatus,
    pub reboot_progress: f32,
    pub auto_repair_progress: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubjectView {
    pub id: String,
    pub room: String,
    pub stunned: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LureView {
    pub room: String,
    pub remaining_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreachView {
    pub direction: Direction,
    pub remaining_secs: f64,
    pub subject_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CooldownView {
    pub lure: f64,
    pub stun: f64,
    pub door: f64,
}

/// Everything a renderer reads once per displayed frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderView {
    pub phase: GamePhase,
    pub night: u8,
    pub clock_secs: f64,
    pub hour: u8,
    pub power: f32,
    pub threat: f32,
    pub cameras: Vec<CameraView>,
    pub subjects: Vec<SubjectView>,
    pub lures: Vec<LureView>,
    pub breach: Option<BreachView>,
    pub blocked_door: Option<Direction>,
    pub cooldowns: CooldownView,
    pub killed_by: Option<String>,
}
