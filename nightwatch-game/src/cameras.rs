//! Per-room camera state machine.
//!
//! `Online -> Offline` on sabotage; `Offline -> Rebooting -> Online` through a
//! fast player reboot; `Offline -> Online` through slow passive auto-repair.
//! Both progress bars keep advancing while offline and whichever completes
//! first restores the feed.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::PROGRESS_COMPLETE;
use crate::facility::{Facility, RoomIdx};
use crate::numbers::progress_pct;

/// Observable camera status for the render boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraStatus {
    Online,
    Offline,
    Rebooting,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub room: RoomIdx,
    pub online: bool,
    pub rebooting: bool,
    pub reboot_progress: f32,
    pub auto_repair_progress: f32,
}

impl Camera {
    #[must_use]
    pub const fn new(room: RoomIdx) -> Self {
        Self {
            room,
            online: true,
            rebooting: false,
            reboot_progress: 0.0,
            auto_repair_progress: 0.0,
        }
    }

    #[must_use]
    pub const fn status(&self) -> CameraStatus {
        if self.online {
            CameraStatus::Online
        } else if self.rebooting {
            CameraStatus::Rebooting
        } else {
            CameraStatus::Offline
        }
    }

    /// Knock the camera offline. Returns `false` when it already was.
    pub fn sabotage(&mut self) -> bool {
        if !self.online {
            return false;
        }
        self.online = false;
        self.rebooting = false;
        self.reboot_progress = 0.0;
        self.auto_repair_progress = 0.0;
        true
    }

    /// Start a player reboot. Returns `false` (and leaves the camera untouched)
    /// when the camera is online or already rebooting.
    pub fn reboot(&mut self) -> bool {
        if self.online || self.rebooting {
            return false;
        }
        self.rebooting = true;
        self.reboot_progress = 0.0;
        true
    }

    /// Camera state after `dt` seconds of repair work.
    #[must_use]
    pub fn advanced(&self, dt: f64, reboot_secs: f64, auto_repair_secs: f64) -> Self {
        let mut next = self.clone();
        if next.online {
            return next;
        }
        if next.rebooting {
            next.reboot_progress =
                (next.reboot_progress + progress_pct(dt, reboot_secs)).min(PROGRESS_COMPLETE);
        }
        next.auto_repair_progress = (next.auto_repair_progress
            + progress_pct(dt, auto_repair_secs))
        .min(PROGRESS_COMPLETE);

        if next.reboot_progress >= PROGRESS_COMPLETE
            || next.auto_repair_progress >= PROGRESS_COMPLETE
        {
            next = Self::new(next.room);
        }
        next
    }
}

/// All cameras of a night, one per non-control room in facility order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CameraNetwork {
    cameras: Vec<Camera>,
}

impl CameraNetwork {
    /// Fresh all-online network.
    #[must_use]
    pub fn for_facility(facility: &Facility) -> Self {
        let control = facility.control_room();
        let cameras = (0..facility.len())
            .filter_map(|i| u8::try_from(i).ok().map(RoomIdx))
            .filter(|room| *room != control)
            .map(Camera::new)
            .collect();
        Self { cameras }
    }

    #[must_use]
    pub fn get(&self, room: RoomIdx) -> Option<&Camera> {
        self.cameras.iter().find(|c| c.room == room)
    }

    fn get_mut(&mut self, room: RoomIdx) -> Option<&mut Camera> {
        self.cameras.iter_mut().find(|c| c.room == room)
    }

    #[must_use]
    pub fn is_online(&self, room: RoomIdx) -> bool {
        self.get(room).is_some_and(|c| c.online)
    }

    /// Take the camera in `room` offline. Returns `true` if it was online.
    pub fn sabotage(&mut self, room: RoomIdx) -> bool {
        self.get_mut(room).is_some_and(Camera::sabotage)
    }

    /// Start a reboot of the camera in `room`. Idempotent.
    pub fn reboot(&mut self, room: RoomIdx) -> bool {
        self.get_mut(room).is_some_and(Camera::reboot)
    }

    /// Network after `dt` seconds, plus the rooms whose feed came back.
    #[must_use]
    pub fn advanced(
        &self,
        dt: f64,
        reboot_secs: f64,
        auto_repair_secs: f64,
    ) -> (Self, SmallVec<[RoomIdx; 4]>) {
        let mut restored = SmallVec::new();
        let cameras = self
            .cameras
            .iter()
            .map(|camera| {
                let next = camera.advanced(dt, reboot_secs, auto_repair_secs);
                if !camera.online && next.online {
                    restored.push(camera.room);
                }
                next
            })
            .collect();
        (Self { cameras }, restored)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Camera> {
        self.cameras.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cameras.is_empty()
    }

    #[must_use]
    pub fn all_online(&self) -> bool {
        self.cameras.iter().all(|c| c.online)
    }

    #[must_use]
    pub fn offline_count(&self) -> usize {
        self.cameras.iter().filter(|c| !c.online).count()
    }
}
