//! Numeric conversion helpers centralizing the clock/power casts.

use num_traits::cast::cast;

/// Clamp a f64 to the f32 range and downcast, returning 0.0 for non-finite values.
#[must_use]
pub fn clamp_f64_to_f32(value: f64) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    let min = cast::<f32, f64>(f32::MIN).unwrap_or(f64::MIN);
    let max = cast::<f32, f64>(f32::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max);
    cast::<f64, f32>(clamped).unwrap_or(0.0)
}

/// Floor a non-negative f64 into a u8, saturating at `u8::MAX`.
#[must_use]
pub fn floor_f64_to_u8(value: f64) -> u8 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    cast::<f64, u8>(value.floor().min(f64::from(u8::MAX))).unwrap_or(u8::MAX)
}

/// Convert a hop count into f32 for intensity math.
#[must_use]
pub fn usize_to_f32(value: usize) -> f32 {
    cast::<usize, f32>(value).unwrap_or(f32::MAX)
}

/// Fraction of elapsed time as a progress percentage in `[0, 100]`.
#[must_use]
pub fn progress_pct(delta_secs: f64, full_secs: f64) -> f32 {
    if full_secs <= 0.0 {
        return 100.0;
    }
    clamp_f64_to_f32((delta_secs / full_secs) * 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_handles_non_finite() {
        assert!((clamp_f64_to_f32(f64::NAN) - 0.0).abs() < f32::EPSILON);
        assert!((clamp_f64_to_f32(f64::from(f32::MAX) * 2.0) - f32::MAX).abs() < f32::EPSILON);
    }

    #[test]
    fn floor_to_u8_saturates() {
        assert_eq!(floor_f64_to_u8(3.9), 3);
        assert_eq!(floor_f64_to_u8(-1.0), 0);
        assert_eq!(floor_f64_to_u8(f64::NAN), 0);
        assert_eq!(floor_f64_to_u8(1_000.0), u8::MAX);
    }

    #[test]
    fn progress_is_bounded() {
        assert!((progress_pct(2.0, 4.0) - 50.0).abs() < f32::EPSILON);
        assert!((progress_pct(9.0, 4.0) - 100.0).abs() < f32::EPSILON);
        assert!((progress_pct(1.0, 0.0) - 100.0).abs() < f32::EPSILON);
    }
}
