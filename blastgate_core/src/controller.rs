//! The gate controller: owns every gate and the shared collector motor.
//!
//! A tick refreshes every tool monitor, advances every gate's state machine
//! (blocking on any actuator move) and then applies the motor policy. The
//! motor is started only by an S0 -> S1 transition and stopped only once no
//! gate can be open.

use std::sync::Arc;
use std::time::Duration;

use blastgate_traits::{Clock, Motor};
use eyre::WrapErr;
use tracing::{debug, error, info, warn};

use crate::command::{Command, CommandError};
use crate::config::ControllerCfg;
use crate::error::Result;
use crate::gate::{Gate, GateState, OperatingState, Transition};
use crate::hw_error::map_hw_error;
use crate::machine::MachineState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotorState {
    On,
    #[default]
    Off,
}

impl core::fmt::Display for MotorState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            MotorState::On => "ON",
            MotorState::Off => "OFF",
        })
    }
}

/// True when any gate is open or cannot be trusted to be closed.
pub fn any_open<'a>(gates: impl IntoIterator<Item = &'a Gate>) -> bool {
    gates
        .into_iter()
        .any(|g| g.state() == GateState::Open || !g.is_trusted())
}

/// Motor state after a tick. Only ever turns the motor off.
pub fn motor_policy(current: MotorState, any_open: bool) -> MotorState {
    match (current, any_open) {
        (MotorState::On, false) => MotorState::Off,
        (s, _) => s,
    }
}

/// Per-gate line of a status dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateStatus {
    pub channel: usize,
    pub id: u8,
    pub name: String,
    pub operating_state: OperatingState,
    pub machine_state: MachineState,
    pub overridden: bool,
    pub gate_state: GateState,
    pub trusted: bool,
    pub fault: Option<String>,
}

impl core::fmt::Display for GateStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "[{}] gate {} {:<12} {} ({:<7}) tool={}{} gate={}{}",
            self.channel,
            self.id,
            self.name,
            self.operating_state,
            self.operating_state.describe(),
            self.machine_state,
            if self.overridden { "*" } else { "" },
            self.gate_state,
            if self.trusted { "" } else { " UNTRUSTED" },
        )?;
        if let Some(fault) = &self.fault {
            write!(f, " ({fault})")?;
        }
        Ok(())
    }
}

/// What happened during one tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub index: u64,
    pub transitions: Vec<(u8, Transition)>,
    pub motor: MotorState,
}

pub struct GateController {
    pub(crate) gates: Vec<Gate>,
    pub(crate) motor: Box<dyn Motor + Send>,
    pub(crate) motor_state: MotorState,
    pub(crate) cfg: ControllerCfg,
    pub(crate) clock: Arc<dyn Clock + Send + Sync>,
    pub(crate) ticks: u64,
    pub(crate) shut_down: bool,
}

impl core::fmt::Debug for GateController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GateController")
            .field("gates", &self.gates)
            .field("motor_state", &self.motor_state)
            .field("cfg", &self.cfg)
            .field("ticks", &self.ticks)
            .finish()
    }
}

impl GateController {
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn gate(&self, channel: usize) -> Option<&Gate> {
        self.gates.get(channel)
    }

    pub fn motor_state(&self) -> MotorState {
        self.motor_state
    }

    pub fn tick_period(&self) -> Duration {
        self.cfg.tick
    }

    pub fn grace(&self) -> Duration {
        self.cfg.grace
    }

    pub fn clock(&self) -> Arc<dyn Clock + Send + Sync> {
        self.clock.clone()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    fn start_motor(&mut self) {
        if self.motor_state == MotorState::On {
            return;
        }
        match self.motor.start() {
            Ok(()) => {
                self.motor_state = MotorState::On;
                info!("collector motor ON");
            }
            Err(e) => error!(error = %map_hw_error(&*e), "collector motor start failed"),
        }
    }

    /// Stop attempt from inside a tick. A failed stop leaves the motor `On`
    /// so the next tick retries.
    fn try_stop_motor(&mut self) {
        if let Err(e) = self.stop_motor() {
            error!(error = ?e, "collector motor stop failed; retrying next tick");
        }
    }

    fn stop_motor(&mut self) -> Result<()> {
        self.motor
            .stop()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("collector motor stop")?;
        self.motor_state = MotorState::Off;
        info!("collector motor OFF");
        Ok(())
    }

    /// One control cycle: refresh, advance, motor policy.
    pub fn tick(&mut self) -> Result<TickReport> {
        let index = self.ticks;
        self.ticks += 1;

        for gate in &mut self.gates {
            gate.machine_mut().refresh();
        }

        // One time base per tick, even when earlier gates block on moves.
        let now = self.clock.now();
        let grace = self.cfg.grace;
        let mut transitions = Vec::new();
        for i in 0..self.gates.len() {
            let t = self.gates[i].advance(now, grace);
            if t == Transition::Opened {
                self.start_motor();
            }
            if !matches!(t, Transition::Idle | Transition::Held | Transition::Waiting) {
                transitions.push((self.gates[i].id(), t));
            }
        }

        let next = motor_policy(self.motor_state, any_open(&self.gates));
        if next != self.motor_state {
            self.try_stop_motor();
        }

        debug!(tick = index, motor = %self.motor_state, ?transitions, "tick");
        Ok(TickReport {
            index,
            transitions,
            motor: self.motor_state,
        })
    }

    pub fn status(&self) -> Vec<GateStatus> {
        self.gates
            .iter()
            .enumerate()
            .map(|(channel, g)| GateStatus {
                channel,
                id: g.id(),
                name: g.name().to_string(),
                operating_state: g.operating_state(),
                machine_state: g.machine().state(),
                overridden: g.machine().override_state().is_some(),
                gate_state: g.state(),
                trusted: g.is_trusted(),
                fault: g.fault().map(str::to_string),
            })
            .collect()
    }

    /// Apply an operator command. `Status` returns a snapshot; overrides take
    /// effect at the next refresh.
    pub fn apply(&mut self, cmd: Command) -> std::result::Result<Option<Vec<GateStatus>>, CommandError> {
        if let Some(channel) = cmd.channel()
            && channel >= self.gates.len()
        {
            return Err(CommandError::UnknownChannel {
                channel,
                count: self.gates.len(),
            });
        }
        match cmd {
            Command::Status => Ok(Some(self.status())),
            Command::Force { channel, state } => {
                let gate = &mut self.gates[channel];
                info!(gate = gate.id(), name = gate.name(), %state, "override");
                gate.machine_mut().set_override(Some(state));
                Ok(None)
            }
            Command::Release { channel } => {
                let gate = &mut self.gates[channel];
                info!(gate = gate.id(), name = gate.name(), "override released");
                gate.machine_mut().set_override(None);
                Ok(None)
            }
        }
    }

    /// Disable every actuator and stop the collector. Runs once; later calls
    /// are no-ops.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        for gate in &mut self.gates {
            gate.disable();
        }
        let stopped = self.stop_motor();
        info!(ticks = self.ticks, "controller shut down");
        stopped
    }
}

impl Drop for GateController {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!(error = %e, "shutdown during drop failed");
        }
    }
}
