//! `From` implementations bridging `blastgate_config` types to core types.

use std::time::Duration;

use crate::config::{ControllerCfg, StepperCfg, SwitchCfg};

// ── ControllerCfg ────────────────────────────────────────────────────────────

impl From<&blastgate_config::ControllerCfg> for ControllerCfg {
    fn from(c: &blastgate_config::ControllerCfg) -> Self {
        Self {
            tick: Duration::from_millis(c.tick_ms),
            grace: Duration::from_millis(c.grace_ms),
        }
    }
}

// ── SwitchCfg ────────────────────────────────────────────────────────────────

impl From<&blastgate_config::SwitchesCfg> for SwitchCfg {
    fn from(c: &blastgate_config::SwitchesCfg) -> Self {
        Self {
            width: c.width,
            debounce: Duration::from_millis(c.debounce_ms),
        }
    }
}

// ── StepperCfg ───────────────────────────────────────────────────────────────

impl From<&blastgate_config::StepperCfg> for StepperCfg {
    fn from(c: &blastgate_config::StepperCfg) -> Self {
        Self {
            steps_per_action: c.steps_per_action,
            fast_step: Duration::from_micros(c.fast_step_us),
            slow_step: Duration::from_micros(c.slow_step_us),
            slow_fraction: c.slow_fraction,
            move_timeout: Duration::from_millis(c.move_timeout_ms),
            home_timeout: Duration::from_millis(c.home_timeout_ms),
            dir_setup: Duration::from_micros(c.dir_setup_us),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_agree_across_crates() {
        let from_file = StepperCfg::from(&blastgate_config::StepperCfg::default());
        let runtime = StepperCfg::default();
        assert_eq!(from_file.steps_per_action, runtime.steps_per_action);
        assert_eq!(from_file.fast_step, runtime.fast_step);
        assert_eq!(from_file.slow_step, runtime.slow_step);
        assert_eq!(from_file.move_timeout, runtime.move_timeout);
        assert_eq!(from_file.dir_setup, runtime.dir_setup);

        let ctl = ControllerCfg::from(&blastgate_config::ControllerCfg::default());
        assert_eq!(ctl.grace, Duration::from_secs(10));
        assert_eq!(ctl.tick, Duration::from_secs(1));
    }
}
