//! One blast gate: its actuator, its tool monitor and its operating state.
//!
//! | From | Tool | To | Side effect |
//! |------|------|----|-------------|
//! | S0   | ON   | S1 | open gate, clear timer, request motor |
//! | S1   | OFF  | S2 | arm grace timer |
//! | S1   | ON   | S1 | clear timer |
//! | S2   | ON   | S1 | clear timer |
//! | S2   | OFF, timer expired | S0 | close gate |
//! | S2   | OFF, timer running | S2 | none |

use std::str::FromStr;
use std::time::{Duration, Instant};

use blastgate_traits::Actuator;
use tracing::{info, warn};

use crate::error::{GateError, MoveFault};
use crate::hw_error::map_hw_error;
use crate::machine::{Machine, MachineState};
use crate::timer::Timer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Open,
    Closed,
}

impl core::fmt::Display for GateState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            GateState::Open => "OPEN",
            GateState::Closed => "CLOSED",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperatingState {
    /// Tool off, gate closed.
    #[default]
    S0,
    /// Tool on, gate open.
    S1,
    /// Tool just stopped, gate open while the grace timer runs.
    S2,
}

impl OperatingState {
    pub fn describe(self) -> &'static str {
        match self {
            OperatingState::S0 => "idle",
            OperatingState::S1 => "running",
            OperatingState::S2 => "grace",
        }
    }
}

impl core::fmt::Display for OperatingState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            OperatingState::S0 => "S0",
            OperatingState::S1 => "S1",
            OperatingState::S2 => "S2",
        })
    }
}

impl TryFrom<u8> for OperatingState {
    type Error = GateError;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(OperatingState::S0),
            1 => Ok(OperatingState::S1),
            2 => Ok(OperatingState::S2),
            other => Err(GateError::Config(format!(
                "operating state {other} is not one of S0, S1, S2"
            ))),
        }
    }
}

impl FromStr for OperatingState {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S0" | "0" => Ok(OperatingState::S0),
            "S1" | "1" => Ok(OperatingState::S1),
            "S2" | "2" => Ok(OperatingState::S2),
            _ => Err(GateError::Config(format!(
                "operating state {s:?} is not one of S0, S1, S2"
            ))),
        }
    }
}

/// What one `advance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// S0 -> S0
    Idle,
    /// S0 -> S1; the motor should be requested on.
    Opened,
    /// S1 -> S1
    Held,
    /// S1 -> S2
    GraceStarted,
    /// S2 -> S1
    Resumed,
    /// S2 -> S2
    Waiting,
    /// S2 -> S0
    Closed,
}

pub struct Gate {
    id: u8,
    name: String,
    state: GateState,
    op: OperatingState,
    timer: Timer,
    actuator: Box<dyn Actuator + Send>,
    machine: Machine,
    fault: Option<String>,
}

impl core::fmt::Debug for Gate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Gate")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("op", &self.op)
            .field("machine", &self.machine)
            .field("fault", &self.fault)
            .finish()
    }
}

impl Gate {
    /// A new gate starts in S0 and CLOSED. An actuator that is not referenced
    /// (e.g. a stepper whose homing failed) makes the gate untrusted.
    pub fn new(id: u8, name: impl Into<String>, actuator: Box<dyn Actuator + Send>, machine: Machine) -> Self {
        let name = name.into();
        let fault = (!actuator.is_referenced()).then(|| MoveFault::HomingFailed.to_string());
        Self {
            id,
            name,
            state: GateState::Closed,
            op: OperatingState::S0,
            timer: Timer::new(),
            actuator,
            machine,
            fault,
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn operating_state(&self) -> OperatingState {
        self.op
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn fault(&self) -> Option<&str> {
        self.fault.as_deref()
    }

    /// Position is backed by a confirmed limit and the last move succeeded.
    pub fn is_trusted(&self) -> bool {
        self.fault.is_none() && self.actuator.is_referenced()
    }

    fn record_fault(&mut self, e: &(dyn std::error::Error + Send + Sync + 'static)) {
        let err = match e.downcast_ref::<MoveFault>() {
            Some(fault) => GateError::Move {
                gate: self.id,
                fault: *fault,
            },
            None => map_hw_error(e),
        };
        warn!(gate = self.id, name = %self.name, error = %err, "gate move failed; gate untrusted");
        self.fault = Some(err.to_string());
    }

    /// Open the gate. GateState changes only when the actuator confirms.
    pub fn open(&mut self) -> bool {
        match self.actuator.open() {
            Ok(()) => {
                self.state = GateState::Open;
                self.fault = None;
                info!(gate = self.id, name = %self.name, "gate open");
                true
            }
            Err(e) => {
                self.record_fault(&*e);
                false
            }
        }
    }

    pub fn close(&mut self) -> bool {
        match self.actuator.close() {
            Ok(()) => {
                self.state = GateState::Closed;
                self.fault = None;
                info!(gate = self.id, name = %self.name, "gate closed");
                true
            }
            Err(e) => {
                self.record_fault(&*e);
                false
            }
        }
    }

    /// Remove holding current. Errors are logged.
    pub fn disable(&mut self) {
        if let Err(e) = self.actuator.disable() {
            warn!(gate = self.id, error = %e, "actuator disable failed");
        }
    }

    /// Advance the operating state machine using the machine state from the
    /// latest refresh.
    pub fn advance(&mut self, now: Instant, grace: Duration) -> Transition {
        let tool = self.machine.state();
        let (next, transition) = match (self.op, tool) {
            (OperatingState::S0, MachineState::On) => {
                self.timer.clear();
                self.open();
                (OperatingState::S1, Transition::Opened)
            }
            (OperatingState::S0, MachineState::Off) => (OperatingState::S0, Transition::Idle),
            (OperatingState::S1, MachineState::On) => {
                self.timer.clear();
                (OperatingState::S1, Transition::Held)
            }
            (OperatingState::S1, MachineState::Off) => {
                self.timer.set(now, grace);
                (OperatingState::S2, Transition::GraceStarted)
            }
            (OperatingState::S2, MachineState::On) => {
                self.timer.clear();
                (OperatingState::S1, Transition::Resumed)
            }
            (OperatingState::S2, MachineState::Off) => {
                if self.timer.expired(now) {
                    self.close();
                    (OperatingState::S0, Transition::Closed)
                } else {
                    (OperatingState::S2, Transition::Waiting)
                }
            }
        };
        if next != self.op {
            info!(
                gate = self.id,
                name = %self.name,
                from = %self.op,
                to = %next,
                "operating state"
            );
        }
        self.op = next;
        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::RecordingActuator;
    use blastgate_hardware::SimulatedSensor;
    use rstest::rstest;

    #[rstest]
    #[case(0, OperatingState::S0)]
    #[case(1, OperatingState::S1)]
    #[case(2, OperatingState::S2)]
    fn operating_state_from_u8(#[case] v: u8, #[case] expect: OperatingState) {
        assert_eq!(OperatingState::try_from(v).unwrap(), expect);
        assert_eq!(expect.to_string().parse::<OperatingState>().unwrap(), expect);
    }

    #[rstest]
    #[case("S3")]
    #[case("")]
    #[case("open")]
    fn invalid_operating_state_is_config_error(#[case] s: &str) {
        assert!(matches!(s.parse::<OperatingState>(), Err(GateError::Config(_))));
        assert!(matches!(OperatingState::try_from(3), Err(GateError::Config(_))));
    }

    #[test]
    fn failed_open_keeps_gate_closed_and_untrusted() {
        let act = RecordingActuator::new();
        let log = act.log();
        log.set_fail(true);
        let mut gate = Gate::new(
            0,
            "saw",
            Box::new(act),
            Machine::new("saw", Box::new(SimulatedSensor::new())),
        );
        assert!(!gate.open());
        assert_eq!(gate.state(), GateState::Closed);
        assert!(!gate.is_trusted());
        log.set_fail(false);
        assert!(gate.open());
        assert!(gate.is_trusted());
    }
}
