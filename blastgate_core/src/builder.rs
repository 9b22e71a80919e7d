//! Type-state builder for `GateController`.
//!
//! The builder enforces at compile time that a collector motor is provided
//! before `build()` is available. `try_build()` is always available for
//! dynamic checks.

use std::collections::HashSet;
use std::marker::PhantomData;
use std::sync::Arc;

use blastgate_traits::{Clock, Motor, MonotonicClock};

use crate::config::ControllerCfg;
use crate::controller::{GateController, MotorState};
use crate::error::{BuildError, Result};
use crate::gate::Gate;

// ── Type-state markers ───────────────────────────────────────────────────────

pub struct Missing;
pub struct Set;

pub struct ControllerBuilder<M> {
    gates: Vec<Gate>,
    motor: Option<Box<dyn Motor + Send>>,
    cfg: Option<ControllerCfg>,
    clock: Option<Arc<dyn Clock + Send + Sync>>,
    _m: PhantomData<M>,
}

impl Default for ControllerBuilder<Missing> {
    fn default() -> Self {
        Self {
            gates: Vec::new(),
            motor: None,
            cfg: None,
            clock: None,
            _m: PhantomData,
        }
    }
}

impl GateController {
    /// Start building a controller.
    pub fn builder() -> ControllerBuilder<Missing> {
        ControllerBuilder::default()
    }
}

/// Validate and assemble. Single source of truth for both build paths.
fn validate_and_build(
    gates: Vec<Gate>,
    motor: Box<dyn Motor + Send>,
    cfg: ControllerCfg,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Result<GateController> {
    if gates.is_empty() {
        return Err(eyre::Report::new(BuildError::NoGates));
    }
    let mut seen = HashSet::new();
    for g in &gates {
        if !seen.insert(g.id()) {
            return Err(eyre::Report::new(BuildError::DuplicateGateId(g.id())));
        }
    }
    if cfg.tick.is_zero() {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "tick period must be > 0",
        )));
    }

    tracing::info!(
        gates = gates.len(),
        tick_ms = cfg.tick.as_millis() as u64,
        grace_ms = cfg.grace.as_millis() as u64,
        "controller ready"
    );
    Ok(GateController {
        gates,
        motor,
        motor_state: MotorState::Off,
        cfg,
        clock,
        ticks: 0,
        shut_down: false,
    })
}

impl<M> ControllerBuilder<M> {
    /// Fallible build available in any type-state; returns detailed error for missing pieces.
    pub fn try_build(self) -> Result<GateController> {
        let motor = self
            .motor
            .ok_or_else(|| eyre::Report::new(BuildError::MissingMotor))?;
        validate_and_build(
            self.gates,
            motor,
            self.cfg.unwrap_or_default(),
            self.clock.unwrap_or_else(|| Arc::new(MonotonicClock::new())),
        )
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn with_gates(mut self, gates: impl IntoIterator<Item = Gate>) -> Self {
        self.gates.extend(gates);
        self
    }

    pub fn with_config(mut self, cfg: ControllerCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }

    /// Provide a custom clock implementation; defaults to `MonotonicClock` when not provided.
    pub fn with_clock(mut self, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }
}

impl ControllerBuilder<Missing> {
    pub fn with_motor(self, motor: impl Motor + Send + 'static) -> ControllerBuilder<Set> {
        ControllerBuilder {
            gates: self.gates,
            motor: Some(Box::new(motor)),
            cfg: self.cfg,
            clock: self.clock,
            _m: PhantomData,
        }
    }
}

impl ControllerBuilder<Set> {
    /// Build once the motor is provided; roster checks still apply.
    pub fn build(self) -> Result<GateController> {
        self.try_build()
    }
}
