use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use blastgate_core::mocks::{ActuatorLog, RecordingActuator, RecordingMotor};
use blastgate_core::runner::{RunLimits, run};
use blastgate_core::{
    Command, ControllerCfg, Gate, GateController, GateState, GateStatus, Machine, MotorState,
    OperatingState,
};
use blastgate_hardware::SimulatedSensor;
use blastgate_traits::{ManualClock, SensorState};
use crossbeam_channel as xch;

struct Rig {
    ctl: GateController,
    clock: ManualClock,
    logs: Vec<Arc<ActuatorLog>>,
    starts: Arc<AtomicU32>,
}

fn rig(n: u8) -> Rig {
    let clock = ManualClock::new();
    let mut logs = Vec::new();
    let gates: Vec<Gate> = (0..n)
        .map(|id| {
            let act = RecordingActuator::new();
            logs.push(act.log());
            let name = format!("tool{id}");
            Gate::new(
                id,
                name.clone(),
                Box::new(act),
                Machine::new(name, Box::new(SimulatedSensor::new())),
            )
        })
        .collect();
    let motor = RecordingMotor::new();
    let (starts, _) = motor.counters();
    let ctl = GateController::builder()
        .with_gates(gates)
        .with_motor(motor)
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    Rig {
        ctl,
        clock,
        logs,
        starts,
    }
}

#[test]
fn stops_after_max_ticks_on_a_fixed_cadence() {
    let mut r = rig(2);
    let (_tx, rx) = xch::unbounded();
    let stop = AtomicBool::new(false);
    let ticks = run(
        &mut r.ctl,
        &rx,
        &stop,
        RunLimits { max_ticks: Some(5) },
        |_| {},
    )
    .unwrap();
    assert_eq!(ticks, 5);
    assert_eq!(r.clock.elapsed(), Duration::from_secs(5));
    // Shut down on exit.
    assert!(r.logs.iter().all(|l| l.disables() == 1));
}

#[test]
fn preset_shutdown_flag_runs_no_ticks() {
    let mut r = rig(1);
    let (_tx, rx) = xch::unbounded();
    let stop = AtomicBool::new(true);
    let ticks = run(&mut r.ctl, &rx, &stop, RunLimits::default(), |_| {}).unwrap();
    assert_eq!(ticks, 0);
    assert_eq!(r.logs[0].disables(), 1);
}

#[test]
fn commands_apply_at_tick_boundary() {
    let mut r = rig(2);
    let (tx, rx) = xch::unbounded();
    tx.send(Command::Force {
        channel: 1,
        state: SensorState::On,
    })
    .unwrap();
    tx.send(Command::Status).unwrap();
    // Unknown channel is logged and skipped.
    tx.send(Command::Release { channel: 7 }).unwrap();

    let stop = AtomicBool::new(false);
    let mut snapshots: Vec<Vec<GateStatus>> = Vec::new();
    let ticks = run(
        &mut r.ctl,
        &rx,
        &stop,
        RunLimits { max_ticks: Some(3) },
        |s| snapshots.push(s.to_vec()),
    )
    .unwrap();
    assert_eq!(ticks, 3);

    // The snapshot was taken before the first tick refreshed the override.
    assert_eq!(snapshots.len(), 1);
    let before = &snapshots[0][1];
    assert!(before.overridden);
    assert_eq!(before.operating_state, OperatingState::S0);

    let gate = r.ctl.gate(1).unwrap();
    assert_eq!(gate.operating_state(), OperatingState::S1);
    assert_eq!(gate.state(), GateState::Open);
    assert_eq!(r.ctl.gate(0).unwrap().state(), GateState::Closed);
    assert_eq!(r.logs[1].opens(), 1);
    assert_eq!(r.starts.load(Ordering::Relaxed), 1);
}

#[test]
fn released_override_follows_sensor_again() {
    let mut r = rig(1);
    let (tx, rx) = xch::unbounded();
    tx.send(Command::Force {
        channel: 0,
        state: SensorState::On,
    })
    .unwrap();
    let stop = AtomicBool::new(false);
    run(&mut r.ctl, &rx, &stop, RunLimits { max_ticks: Some(1) }, |_| {}).unwrap();
    assert_eq!(r.ctl.gate(0).unwrap().operating_state(), OperatingState::S1);

    tx.send(Command::Release { channel: 0 }).unwrap();
    run(&mut r.ctl, &rx, &stop, RunLimits { max_ticks: Some(2) }, |_| {}).unwrap();
    let gate = r.ctl.gate(0).unwrap();
    assert!(gate.machine().override_state().is_none());
    assert_eq!(gate.machine().state(), SensorState::Off);
    assert_eq!(gate.operating_state(), OperatingState::S2);
}

#[test]
fn failed_collector_stop_is_retried_without_ending_the_run() {
    let clock = ManualClock::new();
    let sensor = SimulatedSensor::new();
    let tool = sensor.handle();
    let act = RecordingActuator::new();
    let log = act.log();
    let motor = RecordingMotor::new();
    motor.fail_next_stops(3);
    let (_, stops) = motor.counters();
    let running = motor.running();
    let mut ctl = GateController::builder()
        .with_gate(Gate::new(0, "saw", Box::new(act), Machine::new("saw", Box::new(sensor))))
        .with_motor(motor)
        .with_config(ControllerCfg {
            tick: Duration::from_secs(1),
            grace: Duration::from_secs(1),
        })
        .with_clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    tool.set(SensorState::On);
    ctl.tick().unwrap();
    assert_eq!(ctl.motor_state(), MotorState::On);

    tool.set(SensorState::Off);
    clock.advance(Duration::from_secs(1));
    ctl.tick().unwrap(); // S1 -> S2
    clock.advance(Duration::from_secs(1));
    ctl.tick().unwrap(); // S2 -> S0, stop fails
    assert_eq!(ctl.gate(0).unwrap().state(), GateState::Closed);
    assert_eq!(ctl.motor_state(), MotorState::On);
    assert_eq!(stops.load(Ordering::Relaxed), 1);

    let (_tx, rx) = xch::unbounded();
    let stop = AtomicBool::new(false);
    let ticks = run(&mut ctl, &rx, &stop, RunLimits { max_ticks: Some(10) }, |_| {}).unwrap();
    assert_eq!(ticks, 10);
    assert_eq!(ctl.motor_state(), MotorState::Off);
    assert!(!running.load(Ordering::Relaxed));
    // Two more failures, one success, then the shutdown stop.
    assert_eq!(stops.load(Ordering::Relaxed), 5);
    assert_eq!(log.closes(), 1);
}
