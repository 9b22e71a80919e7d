use blastgate_core::hw_error::map_hw_error;
use blastgate_core::mocks::{FailingSensor, RecordingActuator};
use blastgate_core::{Gate, GateError, GateState, Machine, MachineState, MoveFault};
use blastgate_hardware::SimulatedSensor;
use blastgate_hardware::error::HwError;
use blastgate_traits::{Actuator, SensorState};
use rstest::rstest;

#[test]
fn gate_errors_pass_through() {
    let e = GateError::SwitchOutOfRange { id: 9, width: 8 };
    assert!(matches!(
        map_hw_error(&e),
        GateError::SwitchOutOfRange { id: 9, width: 8 }
    ));
}

#[test]
fn move_faults_become_hardware_faults() {
    let mapped = map_hw_error(&MoveFault::StepCeiling);
    match mapped {
        GateError::HardwareFault(msg) => assert!(msg.contains("step ceiling")),
        other => panic!("unexpected {other:?}"),
    }
}

#[rstest]
#[case(HwError::Timeout, true)]
#[case(HwError::NoSuchAxis(3), false)]
#[case(HwError::LockPoisoned, false)]
fn hardware_errors_are_classified(#[case] hw: HwError, #[case] is_timeout: bool) {
    let mapped = map_hw_error(&hw);
    assert_eq!(matches!(mapped, GateError::Timeout), is_timeout);
    if !is_timeout {
        assert!(matches!(mapped, GateError::HardwareFault(_)));
    }
}

#[rstest]
#[case("i2c read timeout", true)]
#[case("bus error", false)]
fn foreign_errors_fall_back_to_message(#[case] msg: &str, #[case] is_timeout: bool) {
    let e = std::io::Error::other(msg.to_string());
    let mapped = map_hw_error(&e);
    if is_timeout {
        assert!(matches!(mapped, GateError::Timeout));
    } else {
        assert!(matches!(mapped, GateError::Hardware(ref s) if s == msg));
    }
}

/// Actuator whose every move ends in a fixed fault.
struct Faulty(MoveFault);

impl Actuator for Faulty {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(self.0))
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(self.0))
    }
}

#[test]
fn move_fault_is_recorded_with_gate_id() {
    let mut gate = Gate::new(
        7,
        "planer",
        Box::new(Faulty(MoveFault::Timeout)),
        Machine::new("planer", Box::new(SimulatedSensor::new())),
    );
    assert!(gate.is_trusted());
    assert!(!gate.open());
    assert_eq!(gate.state(), GateState::Closed);
    let fault = gate.fault().expect("fault recorded");
    assert!(fault.contains("gate 7"), "{fault}");
    assert!(fault.contains("timed out"), "{fault}");
    assert!(!gate.is_trusted());
}

#[test]
fn successful_move_clears_fault() {
    let act = RecordingActuator::new();
    let log = act.log();
    let mut gate = Gate::new(
        0,
        "saw",
        Box::new(act),
        Machine::new("saw", Box::new(SimulatedSensor::new())),
    );
    log.set_fail(true);
    assert!(!gate.open());
    assert!(gate.fault().is_some());
    log.set_fail(false);
    assert!(gate.open());
    assert!(gate.fault().is_none());
    assert_eq!(gate.state(), GateState::Open);
}

#[test]
fn sensor_failure_keeps_last_state() {
    let mut m = Machine::new("lathe", Box::new(FailingSensor));
    assert_eq!(m.refresh(), MachineState::Off);
    m.set_override(Some(SensorState::On));
    assert_eq!(m.refresh(), MachineState::On);
    m.set_override(None);
    // Read fails again: the last observed state is kept.
    assert_eq!(m.refresh(), MachineState::On);
}
