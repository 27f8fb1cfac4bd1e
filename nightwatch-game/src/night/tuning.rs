//! Balance knobs for a night, deserializable with per-field defaults.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    AI_TICK_INTERVAL_SECS, BASE_DRAIN_PER_SEC, BASE_MOVE_INTERVAL_SECS, BREACH_COUNTDOWN_SECS,
    BREACH_REPEL_PENALTY, CAMERA_AUTO_REPAIR_SECS, CAMERA_REBOOT_SECS, DOOR_COOLDOWN_SECS,
    DOOR_DRAIN_PER_SEC, ERRATIC_WANDER_CHANCE, LURE_COOLDOWN_SECS, LURE_COST, LURE_DURATION_SECS,
    MAX_ACTIVE_LURES, METHODICAL_SABOTAGE_CHANCE, NIGHT_DURATION_SECS, NIGHT_INTERVAL_SCALE_FLOOR,
    NIGHT_INTERVAL_SCALE_STEP, POWER_DRAIN_DEPTH, POWER_DRAIN_MULTIPLIER, POWER_MAX, REBOOT_COST,
    STUN_BASE_SECS, STUN_COOLDOWN_SECS, STUN_COST, STUN_MIN_SECS, TELEPORT_CHANCE,
    TELEPORT_COOLDOWN_SECS, TELEPORT_MAX_HOPS,
};

/// Errors raised when tuning invariants are violated.
#[derive(Debug, Error, PartialEq)]
pub enum TuningError {
    #[error("{field} must be positive (got {value:.3})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must be between {min:.2} and {max:.2} (got {value:.3})")]
    RangeViolation {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("max_active_lures must be at least 1")]
    NoLureSlots,
}

/// Every balance number the simulation reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightTuning {
    /// Real seconds from midnight to dawn.
    pub night_duration_secs: f64,
    /// Cadence of the subject AI pass.
    pub ai_tick_interval_secs: f64,
    pub base_drain_per_sec: f32,
    /// Extra drain while a door is held shut.
    pub door_drain_per_sec: f32,
    /// Base-drain multiplier while a power-drain subject is close.
    pub power_drain_multiplier: f32,
    /// Hop depth at or under which power-drain subjects count as close.
    pub power_drain_depth: usize,
    pub lure_cost: f32,
    pub lure_cooldown_secs: f64,
    pub lure_duration_secs: f64,
    pub max_active_lures: usize,
    pub stun_cost: f32,
    pub stun_cooldown_secs: f64,
    pub stun_base_secs: f64,
    pub stun_min_secs: f64,
    /// Lockout after releasing a door.
    pub door_cooldown_secs: f64,
    pub reboot_cost: f32,
    pub camera_reboot_secs: f64,
    pub camera_auto_repair_secs: f64,
    /// Reaction window once a subject is at a door.
    pub breach_countdown_secs: f64,
    pub breach_repel_penalty: f32,
    /// Seconds between actions for a speed-1.0 subject on night 1.
    pub base_move_interval_secs: f64,
    pub night_interval_scale_step: f64,
    pub night_interval_scale_floor: f64,
    pub teleport_chance: f32,
    pub teleport_cooldown_secs: f64,
    pub teleport_max_hops: usize,
    pub methodical_sabotage_chance: f32,
    pub erratic_wander_chance: f32,
}

impl Default for NightTuning {
    fn default() -> Self {
        Self {
            night_duration_secs: NIGHT_DURATION_SECS,
            ai_tick_interval_secs: AI_TICK_INTERVAL_SECS,
            base_drain_per_sec: BASE_DRAIN_PER_SEC,
            door_drain_per_sec: DOOR_DRAIN_PER_SEC,
            power_drain_multiplier: POWER_DRAIN_MULTIPLIER,
            power_drain_depth: POWER_DRAIN_DEPTH,
            lure_cost: LURE_COST,
            lure_cooldown_secs: LURE_COOLDOWN_SECS,
            lure_duration_secs: LURE_DURATION_SECS,
            max_active_lures: MAX_ACTIVE_LURES,
            stun_cost: STUN_COST,
            stun_cooldown_secs: STUN_COOLDOWN_SECS,
            stun_base_secs: STUN_BASE_SECS,
            stun_min_secs: STUN_MIN_SECS,
            door_cooldown_secs: DOOR_COOLDOWN_SECS,
            reboot_cost: REBOOT_COST,
            camera_reboot_secs: CAMERA_REBOOT_SECS,
            camera_auto_repair_secs: CAMERA_AUTO_REPAIR_SECS,
            breach_countdown_secs: BREACH_COUNTDOWN_SECS,
            breach_repel_penalty: BREACH_REPEL_PENALTY,
            base_move_interval_secs: BASE_MOVE_INTERVAL_SECS,
            night_interval_scale_step: NIGHT_INTERVAL_SCALE_STEP,
            night_interval_scale_floor: NIGHT_INTERVAL_SCALE_FLOOR,
            teleport_chance: TELEPORT_CHANCE,
            teleport_cooldown_secs: TELEPORT_COOLDOWN_SECS,
            teleport_max_hops: TELEPORT_MAX_HOPS,
            methodical_sabotage_chance: METHODICAL_SABOTAGE_CHANCE,
            erratic_wander_chance: ERRATIC_WANDER_CHANCE,
        }
    }
}

impl NightTuning {
    /// Parse tuning overrides from JSON; missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate ranges.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), TuningError> {
        let positive = [
            ("night_duration_secs", self.night_duration_secs),
            ("ai_tick_interval_secs", self.ai_tick_interval_secs),
            ("lure_duration_secs", self.lure_duration_secs),
            ("stun_base_secs", self.stun_base_secs),
            ("camera_reboot_secs", self.camera_reboot_secs),
            ("camera_auto_repair_secs", self.camera_auto_repair_secs),
            ("breach_countdown_secs", self.breach_countdown_secs),
            ("base_move_interval_secs", self.base_move_interval_secs),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(TuningError::NonPositive { field, value });
            }
        }

        let non_negative = [
            ("base_drain_per_sec", f64::from(self.base_drain_per_sec)),
            ("door_drain_per_sec", f64::from(self.door_drain_per_sec)),
            ("power_drain_multiplier", f64::from(self.power_drain_multiplier)),
            ("lure_cost", f64::from(self.lure_cost)),
            ("stun_cost", f64::from(self.stun_cost)),
            ("reboot_cost", f64::from(self.reboot_cost)),
            ("breach_repel_penalty", f64::from(self.breach_repel_penalty)),
            ("lure_cooldown_secs", self.lure_cooldown_secs),
            ("stun_cooldown_secs", self.stun_cooldown_secs),
            ("stun_min_secs", self.stun_min_secs),
            ("door_cooldown_secs", self.door_cooldown_secs),
            ("teleport_cooldown_secs", self.teleport_cooldown_secs),
            ("night_interval_scale_step", self.night_interval_scale_step),
        ];
        for (field, value) in non_negative {
            check_range(field, value, 0.0, f64::MAX)?;
        }

        for (field, value) in [
            ("lure_cost", self.lure_cost),
            ("stun_cost", self.stun_cost),
            ("reboot_cost", self.reboot_cost),
        ] {
            check_range(field, f64::from(value), 0.0, f64::from(POWER_MAX))?;
        }

        for (field, value) in [
            ("teleport_chance", self.teleport_chance),
            ("methodical_sabotage_chance", self.methodical_sabotage_chance),
            ("erratic_wander_chance", self.erratic_wander_chance),
        ] {
            check_range(field, f64::from(value), 0.0, 1.0)?;
        }
        check_range(
            "night_interval_scale_floor",
            self.night_interval_scale_floor,
            0.05,
            1.0,
        )?;

        if self.max_active_lures == 0 {
            return Err(TuningError::NoLureSlots);
        }
        Ok(())
    }

    /// Real seconds per in-fiction hour.
    #[must_use]
    pub fn secs_per_hour(&self) -> f64 {
        self.night_duration_secs / f64::from(crate::constants::NIGHT_HOURS)
    }

    /// Night-based multiplier applied to every subject's move interval.
    #[must_use]
    pub fn night_interval_scale(&self, night: u8) -> f64 {
        let steps = f64::from(night.saturating_sub(1));
        (1.0 - self.night_interval_scale_step * steps).max(self.night_interval_scale_floor)
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), TuningError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::RangeViolation {
            field,
            min,
            max,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let tuning = NightTuning::from_json("{}").expect("deserialize");
        assert_eq!(tuning, NightTuning::default());
        tuning.validate().expect("defaults are valid");
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let tuning = NightTuning::from_json(r#"{ "night_duration_secs": 60.0 }"#).unwrap();
        assert!((tuning.night_duration_secs - 60.0).abs() < f64::EPSILON);
        assert!((tuning.secs_per_hour() - 10.0).abs() < f64::EPSILON);
        assert_eq!(tuning.max_active_lures, NightTuning::default().max_active_lures);
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let tuning = NightTuning {
            teleport_chance: 1.5,
            ..NightTuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::RangeViolation { field, .. }) if field == "teleport_chance"
        ));

        let tuning = NightTuning {
            ai_tick_interval_secs: 0.0,
            ..NightTuning::default()
        };
        assert!(matches!(
            tuning.validate(),
            Err(TuningError::NonPositive { field, .. }) if field == "ai_tick_interval_secs"
        ));

        let tuning = NightTuning {
            max_active_lures: 0,
            ..NightTuning::default()
        };
        assert_eq!(tuning.validate(), Err(TuningError::NoLureSlots));
    }

    #[test]
    fn later_nights_shrink_move_interval_down_to_floor() {
        let tuning = NightTuning::default();
        assert!((tuning.night_interval_scale(1) - 1.0).abs() < f64::EPSILON);
        assert!(tuning.night_interval_scale(3) < tuning.night_interval_scale(2));
        assert!(
            (tuning.night_interval_scale(200) - tuning.night_interval_scale_floor).abs()
                < f64::EPSILON
        );
    }
}
