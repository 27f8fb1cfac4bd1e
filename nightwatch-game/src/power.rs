//! Power pool, drain integration and tool gating.
use serde::{Deserialize, Serialize};

use crate::commands::Rejection;
use crate::constants::{POWER_MAX, POWER_MIN};
use crate::night::NightTuning;
use crate::numbers::clamp_f64_to_f32;

/// Paid tools that share the power pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Lure,
    Stun,
    Reboot,
}

impl Tool {
    #[must_use]
    pub const fn cost(self, tuning: &NightTuning) -> f32 {
        match self {
            Self::Lure => tuning.lure_cost,
            Self::Stun => tuning.stun_cost,
            Self::Reboot => tuning.reboot_cost,
        }
    }

    /// Cooldown started by a successful activation.
    #[must_use]
    pub const fn cooldown(self, tuning: &NightTuning) -> f64 {
        match self {
            Self::Lure => tuning.lure_cooldown_secs,
            Self::Stun => tuning.stun_cooldown_secs,
            Self::Reboot => 0.0,
        }
    }
}

/// Clock timestamps at which each tool becomes usable again.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Cooldowns {
    pub lure_ready_at: f64,
    pub stun_ready_at: f64,
    pub door_ready_at: f64,
}

impl Cooldowns {
    #[must_use]
    pub const fn ready_at(&self, tool: Tool) -> f64 {
        match tool {
            Tool::Lure => self.lure_ready_at,
            Tool::Stun => self.stun_ready_at,
            Tool::Reboot => 0.0,
        }
    }

    fn start(&mut self, tool: Tool, now: f64, tuning: &NightTuning) {
        let until = now + tool.cooldown(tuning);
        match tool {
            Tool::Lure => self.lure_ready_at = until,
            Tool::Stun => self.stun_ready_at = until,
            Tool::Reboot => {}
        }
    }

    /// Seconds left on every cooldown, never negative.
    #[must_use]
    pub fn remaining(&self, now: f64) -> [f64; 3] {
        [
            (self.lure_ready_at - now).max(0.0),
            (self.stun_ready_at - now).max(0.0),
            (self.door_ready_at - now).max(0.0),
        ]
    }

    #[must_use]
    pub fn all_clear(&self, now: f64) -> bool {
        self.remaining(now).iter().all(|r| *r <= 0.0)
    }
}

/// Instantaneous drain in power units per second.
#[must_use]
pub fn drain_rate(tuning: &NightTuning, door_blocked: bool, drain_boost: bool) -> f32 {
    let base = if drain_boost {
        tuning.base_drain_per_sec * tuning.power_drain_multiplier
    } else {
        tuning.base_drain_per_sec
    };
    let door = if door_blocked {
        tuning.door_drain_per_sec
    } else {
        0.0
    };
    base + door
}

/// Power left after draining at `rate` for `dt` seconds.
#[must_use]
pub fn drained(power: f32, rate: f32, dt: f64) -> f32 {
    clamp_power(power - rate * clamp_f64_to_f32(dt.max(0.0)))
}

#[must_use]
pub fn clamp_power(power: f32) -> f32 {
    if power.is_nan() {
        return POWER_MIN;
    }
    power.clamp(POWER_MIN, POWER_MAX)
}

/// Check cooldown and affordability without touching anything.
///
/// # Errors
///
/// Returns the [`Rejection`] that blocks the activation.
pub fn check_activation(
    power: f32,
    cooldowns: &Cooldowns,
    tool: Tool,
    now: f64,
    tuning: &NightTuning,
) -> Result<(), Rejection> {
    if now < cooldowns.ready_at(tool) {
        return Err(Rejection::CoolingDown(tool));
    }
    let cost = tool.cost(tuning);
    if power < cost {
        return Err(Rejection::InsufficientPower {
            tool,
            cost,
            available: power,
        });
    }
    Ok(())
}

/// Deduct the tool cost and start its cooldown. Call only after
/// [`check_activation`] and every command-specific check have passed.
pub fn commit_activation(
    power: &mut f32,
    cooldowns: &mut Cooldowns,
    tool: Tool,
    now: f64,
    tuning: &NightTuning,
) {
    *power = clamp_power(*power - tool.cost(tuning));
    cooldowns.start(tool, now, tuning);
}
