//! Stepper-driven blast gate with open/closed limit switches.
//!
//! Every move is bounded twice: by `steps_per_action` pulses and by a wall
//! clock timeout measured on the injected [`Clock`]. The driver is disabled
//! after every move so the motor carries no holding current at rest.

use std::sync::Arc;
use std::time::Duration;

use blastgate_traits::{Actuator, Clock, Direction, StepperDriver, SwitchInput};
use tracing::{debug, info, trace, warn};

use crate::config::StepperCfg;
use crate::error::{BuildError, MoveFault};
use crate::util::{slow_zone_start, step_delay};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Last confirmed carriage position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Open,
    Closed,
    Unknown,
}

impl From<Direction> for Position {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Open => Position::Open,
            Direction::Close => Position::Closed,
        }
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Position::Open => "open",
            Position::Closed => "closed",
            Position::Unknown => "unknown",
        })
    }
}

/// How a move ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Target limit was already asserted; the driver was never enabled.
    AlreadyThere,
    /// Target limit asserted after `steps` pulses.
    Arrived { steps: u32 },
    /// Bounded failure; position is now unknown.
    Fault(MoveFault),
}

impl MoveOutcome {
    pub fn is_confirmed(self) -> bool {
        !matches!(self, MoveOutcome::Fault(_))
    }
}

pub struct StepperGateActuator<D: StepperDriver, S: SwitchInput> {
    name: String,
    driver: D,
    switches: S,
    open_switch: u8,
    closed_switch: u8,
    cfg: StepperCfg,
    clock: Arc<dyn Clock + Send + Sync>,
    position: Position,
    enabled: bool,
    direction: Option<Direction>,
}

impl<D: StepperDriver, S: SwitchInput> core::fmt::Debug for StepperGateActuator<D, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StepperGateActuator")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("enabled", &self.enabled)
            .field("direction", &self.direction)
            .finish()
    }
}

impl<D: StepperDriver, S: SwitchInput> StepperGateActuator<D, S> {
    /// Construct without homing; position starts `Unknown`.
    pub fn new(
        name: impl Into<String>,
        driver: D,
        switches: S,
        open_switch: u8,
        closed_switch: u8,
        cfg: StepperCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, BuildError> {
        if cfg.steps_per_action == 0 {
            return Err(BuildError::InvalidConfig("steps_per_action must be >= 1"));
        }
        if !(0.0..=1.0).contains(&cfg.slow_fraction) {
            return Err(BuildError::InvalidConfig("slow_fraction must be in [0, 1]"));
        }
        if cfg.move_timeout.is_zero() || cfg.home_timeout.is_zero() {
            return Err(BuildError::InvalidConfig("move and home timeouts must be > 0"));
        }
        if open_switch == closed_switch {
            return Err(BuildError::InvalidConfig(
                "open and closed limit switches must differ",
            ));
        }
        Ok(Self {
            name: name.into(),
            driver,
            switches,
            open_switch,
            closed_switch,
            cfg,
            clock,
            position: Position::Unknown,
            enabled: false,
            direction: None,
        })
    }

    /// Construct and home once. A homing failure is logged and leaves the
    /// position `Unknown`; it is not retried.
    pub fn homed(
        name: impl Into<String>,
        driver: D,
        switches: S,
        open_switch: u8,
        closed_switch: u8,
        cfg: StepperCfg,
        clock: Arc<dyn Clock + Send + Sync>,
    ) -> Result<Self, BuildError> {
        let mut act = Self::new(name, driver, switches, open_switch, closed_switch, cfg, clock)?;
        match act.home() {
            Ok(outcome) if outcome.is_confirmed() => {
                info!(gate = %act.name, ?outcome, "homed");
            }
            Ok(outcome) => {
                warn!(gate = %act.name, ?outcome, "homing failed; gate untrusted");
            }
            Err(e) => {
                warn!(gate = %act.name, error = %e, "homing aborted by I/O error; gate untrusted");
            }
        }
        Ok(act)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn config(&self) -> &StepperCfg {
        &self.cfg
    }

    /// Drive toward the closed limit, bounded by `home_timeout` and
    /// `steps_per_action`.
    pub fn home(&mut self) -> Result<MoveOutcome, BoxError> {
        let outcome = self.drive(Direction::Close, self.cfg.home_timeout)?;
        Ok(match outcome {
            MoveOutcome::Fault(MoveFault::BothLimits) => outcome,
            MoveOutcome::Fault(_) => MoveOutcome::Fault(MoveFault::HomingFailed),
            ok => ok,
        })
    }

    fn limits(&self, target: Direction) -> (u8, u8) {
        match target {
            Direction::Open => (self.open_switch, self.closed_switch),
            Direction::Close => (self.closed_switch, self.open_switch),
        }
    }

    /// One bounded move toward `target`. The driver is disabled on every
    /// path out of this function once it has been enabled.
    pub fn drive(&mut self, target: Direction, timeout: Duration) -> Result<MoveOutcome, BoxError> {
        let (target_sw, other_sw) = self.limits(target);
        if self.switches.read_switch(target_sw)? {
            if self.switches.read_switch(other_sw)? {
                self.position = Position::Unknown;
                warn!(gate = %self.name, ?target, "both limits asserted before move");
                return Ok(MoveOutcome::Fault(MoveFault::BothLimits));
            }
            self.position = Position::from(target);
            debug!(gate = %self.name, position = %self.position, "already at limit");
            return Ok(MoveOutcome::AlreadyThere);
        }

        self.position = Position::Unknown;
        let result = self.run_move(target, timeout);
        let disabled = self.driver.disable();
        self.enabled = false;

        let outcome = result?;
        disabled?;
        match outcome {
            MoveOutcome::Fault(fault) => {
                warn!(gate = %self.name, ?target, %fault, "move ended without limit");
            }
            _ => {
                self.position = Position::from(target);
                debug!(gate = %self.name, position = %self.position, ?outcome, "move complete");
            }
        }
        Ok(outcome)
    }

    fn run_move(&mut self, target: Direction, timeout: Duration) -> Result<MoveOutcome, BoxError> {
        let (target_sw, other_sw) = self.limits(target);
        let ceiling = self.cfg.steps_per_action;
        let slow_from = slow_zone_start(ceiling, self.cfg.slow_fraction);

        self.driver.enable()?;
        self.enabled = true;
        self.driver.set_direction(target)?;
        self.direction = Some(target);
        self.clock.sleep(self.cfg.dir_setup);

        let start = self.clock.now();
        for step in 0..ceiling {
            let at_target = self.switches.read_switch(target_sw)?;
            let at_other = self.switches.read_switch(other_sw)?;
            if at_target && at_other {
                return Ok(MoveOutcome::Fault(MoveFault::BothLimits));
            }
            if at_target {
                return Ok(MoveOutcome::Arrived { steps: step });
            }
            if self.clock.now().saturating_duration_since(start) >= timeout {
                return Ok(MoveOutcome::Fault(MoveFault::Timeout));
            }
            self.driver.step()?;
            self.clock
                .sleep(step_delay(step, slow_from, self.cfg.fast_step, self.cfg.slow_step));
            if step + 1 == slow_from {
                trace!(gate = %self.name, step, "entering slow zone");
            }
        }

        // The final pulse may have landed on the limit.
        if self.switches.read_switch(target_sw)? {
            if self.switches.read_switch(other_sw)? {
                return Ok(MoveOutcome::Fault(MoveFault::BothLimits));
            }
            return Ok(MoveOutcome::Arrived { steps: ceiling });
        }
        Ok(MoveOutcome::Fault(MoveFault::StepCeiling))
    }

    fn move_to(&mut self, target: Direction) -> Result<(), BoxError> {
        match self.drive(target, self.cfg.move_timeout)? {
            MoveOutcome::Fault(fault) => Err(Box::new(fault)),
            _ => Ok(()),
        }
    }
}

impl<D: StepperDriver, S: SwitchInput> Actuator for StepperGateActuator<D, S> {
    fn open(&mut self) -> Result<(), BoxError> {
        self.move_to(Direction::Open)
    }

    fn close(&mut self) -> Result<(), BoxError> {
        self.move_to(Direction::Close)
    }

    fn disable(&mut self) -> Result<(), BoxError> {
        self.enabled = false;
        self.driver.disable()
    }

    fn is_referenced(&self) -> bool {
        self.position != Position::Unknown
    }
}
