//! Runtime configuration types for the control core.
//!
//! These are separate from the TOML-deserialized config in `blastgate_config`;
//! `conversions` bridges the two.

use std::time::Duration;

/// Controller cadence and grace period.
#[derive(Debug, Clone)]
pub struct ControllerCfg {
    /// Fixed period of the FSM tick loop.
    pub tick: Duration,
    /// How long a gate stays open after its tool stops (TIMEOUT).
    pub grace: Duration,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            tick: Duration::from_secs(1),
            grace: Duration::from_secs(10),
        }
    }
}

/// Limit-switch bank parameters.
#[derive(Debug, Clone)]
pub struct SwitchCfg {
    pub width: u8,
    /// Two samples must agree across this window before a change is accepted.
    pub debounce: Duration,
}

impl Default for SwitchCfg {
    fn default() -> Self {
        Self {
            width: 16,
            debounce: Duration::from_millis(20),
        }
    }
}

/// Motion parameters for one stepper gate.
#[derive(Debug, Clone)]
pub struct StepperCfg {
    /// Step ceiling for every move and for homing.
    pub steps_per_action: u32,
    pub fast_step: Duration,
    pub slow_step: Duration,
    /// Tail fraction of `steps_per_action` driven at `slow_step`.
    pub slow_fraction: f32,
    pub move_timeout: Duration,
    pub home_timeout: Duration,
    /// Pause between DIR change and the first STEP pulse.
    pub dir_setup: Duration,
}

impl Default for StepperCfg {
    fn default() -> Self {
        Self {
            steps_per_action: 900,
            fast_step: Duration::from_millis(2),
            slow_step: Duration::from_millis(6),
            slow_fraction: 0.10,
            move_timeout: Duration::from_secs(6),
            home_timeout: Duration::from_secs(6),
            dir_setup: Duration::from_micros(500),
        }
    }
}
