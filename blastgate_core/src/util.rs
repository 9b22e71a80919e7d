//! Common step/bit helpers for blastgate_core.

use std::time::Duration;

/// Mask covering the low `width` bits of a snapshot. `width >= 64` covers all.
#[inline]
pub fn width_mask(width: u8) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// First step index of the slow zone: the final `fraction` of `steps`.
/// A fraction of 0 (or a non-finite value) disables the slow zone.
#[inline]
pub fn slow_zone_start(steps: u32, fraction: f32) -> u32 {
    if !fraction.is_finite() || fraction <= 0.0 {
        return steps;
    }
    let slow = (f64::from(steps) * f64::from(fraction.min(1.0))).round() as u32;
    steps.saturating_sub(slow)
}

/// Delay after step `index` given the slow-zone boundary.
#[inline]
pub fn step_delay(index: u32, slow_from: u32, fast: Duration, slow: Duration) -> Duration {
    if index >= slow_from { slow } else { fast }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_widths() {
        assert_eq!(width_mask(0), 0);
        assert_eq!(width_mask(16), 0xFFFF);
        assert_eq!(width_mask(64), u64::MAX);
    }

    #[test]
    fn slow_zone_is_the_last_tenth() {
        assert_eq!(slow_zone_start(900, 0.10), 810);
        assert_eq!(slow_zone_start(900, 0.0), 900);
        assert_eq!(slow_zone_start(900, 1.0), 0);
        assert_eq!(slow_zone_start(900, f32::NAN), 900);
    }

    #[test]
    fn delay_switches_at_boundary() {
        let fast = Duration::from_millis(2);
        let slow = Duration::from_millis(6);
        assert_eq!(step_delay(809, 810, fast, slow), fast);
        assert_eq!(step_delay(810, 810, fast, slow), slow);
    }
}
