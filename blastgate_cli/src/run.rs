//! Roster assembly and the three subcommands.

use std::io::BufReader;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use blastgate_config::{ActuatorKind, Config, GateCfg, SensorKind};
use blastgate_core::console::Console;
use blastgate_core::runner::{RunLimits, run};
use blastgate_core::{
    ControllerCfg, DebouncedSwitches, Gate, GateController, GateStatus, Machine, SharedSwitches,
    StepperCfg, StepperGateActuator, SwitchCfg,
};
use blastgate_hardware::{LoggingActuator, SimulatedMotor, SimulatedSensor};
use blastgate_traits::{Actuator, Clock, InputBank, MonotonicClock, StepperDriver};
use eyre::{Result, WrapErr};
use serde_json::json;

/// Gates that homed without confirming a limit switch.
#[derive(Debug)]
pub struct UntrustedGates(pub Vec<String>);

impl core::fmt::Display for UntrustedGates {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "gates not referenced: {}", self.0.join(", "))
    }
}

impl std::error::Error for UntrustedGates {}

/// Options of the `run` subcommand.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOpts {
    pub ticks: Option<u64>,
    pub tick_ms: Option<u64>,
    pub grace_ms: Option<u64>,
    pub no_console: bool,
}

/// Gate ids listed in a comma-separated env var (simulation fault injection).
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn sim_fault_ids(var: &str) -> Vec<u8> {
    std::env::var(var)
        .map(|v| {
            v.split(',')
                .filter_map(|s| s.trim().parse::<u8>().ok())
                .collect()
        })
        .unwrap_or_default()
}

fn stepper_gate<D, B>(
    g: &GateCfg,
    driver: D,
    switches: &SharedSwitches<B>,
    stepper: &StepperCfg,
    clock: &Arc<dyn Clock + Send + Sync>,
) -> Result<Box<dyn Actuator + Send>>
where
    D: StepperDriver + Send + 'static,
    B: InputBank + Send + 'static,
{
    let act = StepperGateActuator::homed(
        g.name.clone(),
        driver,
        switches.clone(),
        g.open_switch,
        g.closed_switch,
        stepper.clone(),
        clock.clone(),
    )
    .wrap_err_with(|| format!("gate {} ({})", g.id, g.name))?;
    Ok(Box::new(act))
}

/// Simulation bench roster: one axis per stepper gate, every limit switch on
/// a single shared bank.
#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn sim_roster(cfg: &Config, clock: &Arc<dyn Clock + Send + Sync>) -> Result<Vec<Gate>> {
    use blastgate_hardware::SimBench;
    use blastgate_traits::Direction;

    let sw: SwitchCfg = (&cfg.switches).into();
    let stepper: StepperCfg = (&cfg.stepper).into();
    let bench = SimBench::new(sw.width)?;
    let switches = DebouncedSwitches::new(bench.inputs(), clock.clone(), sw.debounce)?.into_shared();
    let dead = sim_fault_ids("BLASTGATE_SIM_DEAD_SWITCH");
    let jammed = sim_fault_ids("BLASTGATE_SIM_JAM");

    let mut gates = Vec::with_capacity(cfg.gates.len());
    for g in &cfg.gates {
        if g.sensor == SensorKind::Gpio {
            tracing::debug!(gate = g.id, "gpio sensor simulated; drive it from the console");
        }
        let actuator: Box<dyn Actuator + Send> = match g.actuator {
            ActuatorKind::Stepper => {
                let axis = bench.add_axis(cfg.simulation.travel_steps, g.open_switch, g.closed_switch)?;
                if dead.contains(&g.id) {
                    bench.set_dead_switch(axis, Direction::Close, true)?;
                }
                if jammed.contains(&g.id) {
                    bench.set_jammed(axis, true)?;
                }
                stepper_gate(g, bench.driver(axis)?, &switches, &stepper, clock)?
            }
            ActuatorKind::Logging => Box::new(LoggingActuator::new(g.name.clone())),
        };
        let machine = Machine::new(g.name.clone(), Box::new(SimulatedSensor::new()));
        gates.push(Gate::new(g.id, g.name.clone(), actuator, machine));
    }
    Ok(gates)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn gpio_roster(cfg: &Config, clock: &Arc<dyn Clock + Send + Sync>) -> Result<Vec<Gate>> {
    use blastgate_hardware::gpio::{GpioCurrentSensor, GpioInputBank, GpioStepperDriver};
    use blastgate_traits::Sensor;

    let sw: SwitchCfg = (&cfg.switches).into();
    let stepper: StepperCfg = (&cfg.stepper).into();
    if cfg.switches.pins.is_empty() {
        eyre::bail!("switches.pins must list the limit-switch input pins on hardware");
    }
    let bank = GpioInputBank::new(&cfg.switches.pins).wrap_err("open limit-switch bank")?;
    let switches = DebouncedSwitches::new(bank, clock.clone(), sw.debounce)?.into_shared();

    let mut gates = Vec::with_capacity(cfg.gates.len());
    for g in &cfg.gates {
        let sensor: Box<dyn Sensor + Send> = match (g.sensor, g.sensor_pin) {
            (SensorKind::Gpio, Some(pin)) => Box::new(
                GpioCurrentSensor::new(pin, g.sensor_active_high)
                    .wrap_err_with(|| format!("gate {} current sensor", g.id))?,
            ),
            (SensorKind::Gpio, None) => eyre::bail!("gates[{}]: gpio sensor needs sensor_pin", g.id),
            (SensorKind::Sim, _) => Box::new(SimulatedSensor::new()),
        };
        let actuator: Box<dyn Actuator + Send> = match g.actuator {
            ActuatorKind::Stepper => {
                let (Some(step), Some(dir)) = (g.step_pin, g.dir_pin) else {
                    eyre::bail!("gates[{}]: stepper gate needs step_pin and dir_pin", g.id);
                };
                let driver = GpioStepperDriver::new(
                    step,
                    dir,
                    g.en_pin,
                    cfg.stepper.pulse_width_us,
                    g.invert_dir,
                )
                .wrap_err_with(|| format!("gate {} stepper pins", g.id))?;
                stepper_gate(g, driver, &switches, &stepper, clock)?
            }
            ActuatorKind::Logging => Box::new(LoggingActuator::new(g.name.clone())),
        };
        gates.push(Gate::new(g.id, g.name.clone(), actuator, Machine::new(g.name.clone(), sensor)));
    }
    Ok(gates)
}

/// Build the roster (homing every stepper gate) and the controller.
pub fn build_controller(cfg: &Config, ctl: ControllerCfg) -> Result<GateController> {
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());

    #[cfg(all(feature = "hardware", target_os = "linux"))]
    let (gates, motor): (Vec<Gate>, Box<dyn blastgate_traits::Motor + Send>) = {
        let gates = gpio_roster(cfg, &clock)?;
        let motor: Box<dyn blastgate_traits::Motor + Send> = match cfg.collector.relay_pin {
            Some(pin) => Box::new(
                blastgate_hardware::gpio::GpioRelay::new(pin, cfg.collector.active_low)
                    .wrap_err("open collector relay")?,
            ),
            None => {
                tracing::warn!("collector.relay_pin not set; collector is simulated");
                Box::new(SimulatedMotor::new())
            }
        };
        (gates, motor)
    };
    #[cfg(not(all(feature = "hardware", target_os = "linux")))]
    let (gates, motor) = (sim_roster(cfg, &clock)?, SimulatedMotor::new());

    GateController::builder()
        .with_gates(gates)
        .with_motor(motor)
        .with_config(ctl)
        .with_clock(clock)
        .build()
}

fn status_json(s: &GateStatus) -> serde_json::Value {
    json!({
        "channel": s.channel,
        "id": s.id,
        "name": s.name,
        "operating_state": s.operating_state.to_string(),
        "machine": s.machine_state.to_string(),
        "overridden": s.overridden,
        "gate": s.gate_state.to_string(),
        "trusted": s.trusted,
        "fault": s.fault,
    })
}

pub fn print_status(status: &[GateStatus], json: bool) {
    if json {
        println!("{}", json!({ "status": status.iter().map(status_json).collect::<Vec<_>>() }));
    } else {
        for s in status {
            println!("{s}");
        }
    }
}

pub fn run_controller(cfg: &Config, opts: RunOpts, shutdown: &AtomicBool, json: bool) -> Result<u64> {
    let mut ctl: ControllerCfg = (&cfg.controller).into();
    if let Some(ms) = opts.tick_ms {
        ctl.tick = std::time::Duration::from_millis(ms);
    }
    if let Some(ms) = opts.grace_ms {
        ctl.grace = std::time::Duration::from_millis(ms);
    }
    let mut controller = build_controller(cfg, ctl)?;
    print_status(&controller.status(), json);

    let console = if opts.no_console {
        Console::spawn(std::io::empty())
    } else {
        Console::spawn(BufReader::new(std::io::stdin()))
    };
    let ticks = run(
        &mut controller,
        console.receiver(),
        shutdown,
        RunLimits {
            max_ticks: opts.ticks,
        },
        |status| print_status(status, json),
    )?;

    print_status(&controller.status(), json);
    if json {
        println!("{}", json!({ "ticks": ticks, "motor": controller.motor_state().to_string() }));
    } else {
        println!("run complete: {ticks} ticks");
    }
    Ok(ticks)
}

pub fn self_check(cfg: &Config, json: bool) -> Result<()> {
    let controller = build_controller(cfg, (&cfg.controller).into())?;
    let status = controller.status();
    print_status(&status, json);
    let untrusted: Vec<String> = status
        .iter()
        .filter(|s| !s.trusted)
        .map(|s| format!("{} ({})", s.id, s.name))
        .collect();
    if !untrusted.is_empty() {
        return Err(eyre::Report::new(UntrustedGates(untrusted)));
    }
    if !json {
        println!("self-check ok: {} gates referenced", status.len());
    }
    Ok(())
}

fn kind_names(g: &GateCfg) -> (&'static str, &'static str) {
    let sensor = match g.sensor {
        SensorKind::Sim => "sim",
        SensorKind::Gpio => "gpio",
    };
    let actuator = match g.actuator {
        ActuatorKind::Stepper => "stepper",
        ActuatorKind::Logging => "logging",
    };
    (sensor, actuator)
}

pub fn check_config(cfg: &Config, json: bool) {
    if json {
        let gates: Vec<_> = cfg
            .gates
            .iter()
            .map(|g| {
                let (sensor, actuator) = kind_names(g);
                json!({
                    "id": g.id,
                    "name": g.name,
                    "sensor": sensor,
                    "actuator": actuator,
                    "open_switch": g.open_switch,
                    "closed_switch": g.closed_switch,
                })
            })
            .collect();
        println!(
            "{}",
            json!({
                "ok": true,
                "tick_ms": cfg.controller.tick_ms,
                "grace_ms": cfg.controller.grace_ms,
                "gates": gates,
            })
        );
        return;
    }
    println!(
        "config ok: {} gates, tick {} ms, grace {} ms",
        cfg.gates.len(),
        cfg.controller.tick_ms,
        cfg.controller.grace_ms
    );
    for g in &cfg.gates {
        let (sensor, actuator) = kind_names(g);
        println!(
            "  gate {} {:<12} sensor={sensor} actuator={actuator} open_switch={} closed_switch={}",
            g.id, g.name, g.open_switch, g.closed_switch
        );
    }
}
