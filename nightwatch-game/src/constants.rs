//! Centralized balance and tuning constants for Nightwatch.
//!
//! These are the defaults behind [`crate::night::NightTuning`]. Every tuning
//! field falls back to one of these values, so an empty tuning document
//! reproduces the shipped balance exactly.

// Night structure ----------------------------------------------------------
pub(crate) const NIGHT_DURATION_SECS: f64 = 360.0;
pub(crate) const NIGHT_HOURS: u8 = 6;
pub(crate) const AI_TICK_INTERVAL_SECS: f64 = 0.5;
pub const MAX_NIGHT: u8 = 5;

// Facility limits ----------------------------------------------------------
pub(crate) const MAX_ROOMS: usize = 12;
pub(crate) const MAX_SUBJECTS: usize = 8;
/// Horizontal offset (layout units) under which a final room counts as the front door.
pub(crate) const FRONT_DOOR_DEAD_ZONE: f32 = 0.1;

// Power economy ------------------------------------------------------------
pub(crate) const POWER_MAX: f32 = 100.0;
pub(crate) const POWER_MIN: f32 = 0.0;
pub(crate) const BASE_DRAIN_PER_SEC: f32 = 0.12;
pub(crate) const DOOR_DRAIN_PER_SEC: f32 = 1.0;
pub(crate) const POWER_DRAIN_MULTIPLIER: f32 = 2.0;
pub(crate) const POWER_DRAIN_DEPTH: usize = 2;

// Tools --------------------------------------------------------------------
pub(crate) const LURE_COST: f32 = 8.0;
pub(crate) const LURE_COOLDOWN_SECS: f64 = 6.0;
pub(crate) const LURE_DURATION_SECS: f64 = 10.0;
pub(crate) const MAX_ACTIVE_LURES: usize = 2;
pub(crate) const STUN_COST: f32 = 12.0;
pub(crate) const STUN_COOLDOWN_SECS: f64 = 10.0;
pub(crate) const STUN_BASE_SECS: f64 = 6.0;
pub(crate) const STUN_MIN_SECS: f64 = 1.0;
pub(crate) const DOOR_COOLDOWN_SECS: f64 = 2.0;
pub(crate) const REBOOT_COST: f32 = 3.0;

// Cameras ------------------------------------------------------------------
pub(crate) const CAMERA_REBOOT_SECS: f64 = 4.0;
pub(crate) const CAMERA_AUTO_REPAIR_SECS: f64 = 45.0;
pub(crate) const PROGRESS_COMPLETE: f32 = 100.0;

// Breach -------------------------------------------------------------------
pub(crate) const BREACH_COUNTDOWN_SECS: f64 = 4.0;
pub(crate) const BREACH_REPEL_PENALTY: f32 = 10.0;

// Subject AI ---------------------------------------------------------------
pub(crate) const BASE_MOVE_INTERVAL_SECS: f64 = 6.0;
pub(crate) const NIGHT_INTERVAL_SCALE_STEP: f64 = 0.08;
pub(crate) const NIGHT_INTERVAL_SCALE_FLOOR: f64 = 0.6;
pub(crate) const TELEPORT_CHANCE: f32 = 0.15;
pub(crate) const TELEPORT_COOLDOWN_SECS: f64 = 12.0;
pub(crate) const TELEPORT_MAX_HOPS: usize = 2;
pub(crate) const METHODICAL_SABOTAGE_CHANCE: f32 = 0.08;
pub(crate) const ERRATIC_WANDER_CHANCE: f32 = 0.25;

// Threat -------------------------------------------------------------------
pub(crate) const THREAT_NIGHT_BASE: f32 = 0.7;
pub(crate) const THREAT_NIGHT_STEP: f32 = 0.06;

// RNG domains --------------------------------------------------------------
pub(crate) const RNG_DOMAIN_SPAWN: &[u8] = b"nightwatch.spawn";
pub(crate) const RNG_DOMAIN_AI: &[u8] = b"nightwatch.ai";
pub(crate) const RNG_DOMAIN_TOOLS: &[u8] = b"nightwatch.tools";

#[cfg(test)]
pub(crate) const FLOAT_EPSILON: f32 = 1e-4;
