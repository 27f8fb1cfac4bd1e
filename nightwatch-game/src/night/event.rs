//! Notifications returned by the scheduler and by player commands.
//!
//! The engine never calls out to audio or achievement collaborators. Every
//! frame, AI tick and command hands back a list of these values instead.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::facility::{Direction, RoomIdx};
use crate::result::NightReport;

/// Named audio cue for the external sound layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioCue {
    PingSweep,
    BreachAlarm,
    DoorSlam,
    Shock,
    Lure,
    StaticBurst,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    Cue { cue: AudioCue },
    /// In-fiction hour boundary crossed; `hour` counts up from 0 (midnight).
    HourChanged { hour: u8 },
    BreachOpened {
        direction: Direction,
        subject_id: String,
    },
    BreachRepelled {
        direction: Direction,
        subject_id: String,
    },
    CameraSabotaged { room: RoomIdx, subject_id: String },
    CameraRestored { room: RoomIdx },
    NightComplete { report: NightReport },
    NightLost { report: NightReport },
}

impl Notification {
    #[must_use]
    pub const fn cue(cue: AudioCue) -> Self {
        Self::Cue { cue }
    }

    /// Report carried by a night-ending notification.
    #[must_use]
    pub const fn report(&self) -> Option<&NightReport> {
        match self {
            Self::NightComplete { report } | Self::NightLost { report } => Some(report),
            _ => None,
        }
    }
}

pub type Notifications = SmallVec<[Notification; 4]>;

/// Audio cues in emission order.
pub fn cues(notifications: &[Notification]) -> impl Iterator<Item = AudioCue> + '_ {
    notifications.iter().filter_map(|n| match n {
        Notification::Cue { cue } => Some(*cue),
        _ => None,
    })
}
