#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and roster parsing for the blast-gate controller.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section has defaults, so an empty document describes the stock
//!   four-gate shop (saw, drillpress, lathe, router) on the simulation bench.
//! - The gate roster can also come from a CSV file with strict headers.
use serde::Deserialize;
use std::collections::HashSet;

/// Roster CSV schema.
///
/// Expected headers:
/// id,name,sensor_pin,open_switch,closed_switch
///
/// Example:
/// id,name,sensor_pin,open_switch,closed_switch
/// 0,saw,5,0,1
/// 1,drillpress,6,2,3
#[derive(Debug, Deserialize, Clone)]
pub struct RosterRow {
    pub id: u8,
    pub name: String,
    pub sensor_pin: u8,
    pub open_switch: u8,
    pub closed_switch: u8,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ControllerCfg {
    /// Control loop period.
    pub tick_ms: u64,
    /// Grace period before a gate closes after its tool stops.
    pub grace_ms: u64,
}

impl Default for ControllerCfg {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            grace_ms: 10_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SwitchesCfg {
    /// Number of inputs in the limit-switch bank (at most 64).
    pub width: u8,
    pub debounce_ms: u64,
    /// BCM pins backing the bank on real hardware, bit order. Empty on the
    /// simulation bench.
    pub pins: Vec<u8>,
}

impl Default for SwitchesCfg {
    fn default() -> Self {
        Self {
            width: 16,
            debounce_ms: 20,
            pins: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StepperCfg {
    /// Step ceiling for one open/close move and for homing.
    pub steps_per_action: u32,
    pub fast_step_us: u64,
    pub slow_step_us: u64,
    /// Tail of `steps_per_action` driven at `slow_step_us`. 0 disables.
    pub slow_fraction: f32,
    pub move_timeout_ms: u64,
    pub home_timeout_ms: u64,
    /// Pause between a DIR change and the first STEP pulse.
    pub dir_setup_us: u64,
    /// STEP high time.
    pub pulse_width_us: u32,
}

impl Default for StepperCfg {
    fn default() -> Self {
        Self {
            steps_per_action: 900,
            fast_step_us: 2000,
            slow_step_us: 6000,
            slow_fraction: 0.10,
            move_timeout_ms: 6000,
            home_timeout_ms: 6000,
            dir_setup_us: 500,
            pulse_width_us: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SensorKind {
    /// Simulated sensor, driven from the operator console.
    #[default]
    Sim,
    /// Digital current-sense comparator on `sensor_pin`.
    Gpio,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActuatorKind {
    /// Stepper gate with open/closed limit switches.
    #[default]
    Stepper,
    /// Position-less actuator that only logs its moves.
    Logging,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GateCfg {
    pub id: u8,
    pub name: String,
    #[serde(default)]
    pub sensor: SensorKind,
    #[serde(default)]
    pub sensor_pin: Option<u8>,
    /// Current-sense comparator polarity.
    #[serde(default = "default_true")]
    pub sensor_active_high: bool,
    #[serde(default)]
    pub actuator: ActuatorKind,
    pub open_switch: u8,
    pub closed_switch: u8,
    #[serde(default)]
    pub step_pin: Option<u8>,
    #[serde(default)]
    pub dir_pin: Option<u8>,
    #[serde(default)]
    pub en_pin: Option<u8>,
    #[serde(default)]
    pub invert_dir: bool,
}

fn default_true() -> bool {
    true
}

impl From<RosterRow> for GateCfg {
    fn from(r: RosterRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            sensor: SensorKind::Gpio,
            sensor_pin: Some(r.sensor_pin),
            sensor_active_high: true,
            actuator: ActuatorKind::Stepper,
            open_switch: r.open_switch,
            closed_switch: r.closed_switch,
            step_pin: None,
            dir_pin: None,
            en_pin: None,
            invert_dir: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct CollectorCfg {
    pub relay_pin: Option<u8>,
    pub active_low: bool,
}

impl Default for CollectorCfg {
    fn default() -> Self {
        Self {
            relay_pin: None,
            active_low: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationCfg {
    /// Carriage travel between the closed and open stops, in steps.
    pub travel_steps: u32,
}

impl Default for SimulationCfg {
    fn default() -> Self {
        Self { travel_steps: 880 }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerCfg,
    pub switches: SwitchesCfg,
    pub stepper: StepperCfg,
    pub gates: Vec<GateCfg>,
    pub collector: CollectorCfg,
    pub simulation: SimulationCfg,
    pub logging: Logging,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            controller: ControllerCfg::default(),
            switches: SwitchesCfg::default(),
            stepper: StepperCfg::default(),
            gates: default_roster(),
            collector: CollectorCfg::default(),
            simulation: SimulationCfg::default(),
            logging: Logging::default(),
        }
    }
}

/// The stock shop: four stepper gates, limit switches paired on the bank.
pub fn default_roster() -> Vec<GateCfg> {
    ["saw", "drillpress", "lathe", "router"]
        .iter()
        .zip(0u8..)
        .map(|(name, id)| GateCfg {
            id,
            name: (*name).to_string(),
            sensor: SensorKind::Sim,
            sensor_pin: None,
            sensor_active_high: true,
            actuator: ActuatorKind::Stepper,
            open_switch: id * 2,
            closed_switch: id * 2 + 1,
            step_pin: None,
            dir_pin: None,
            en_pin: None,
            invert_dir: false,
        })
        .collect()
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

pub fn load_roster_csv(path: &std::path::Path) -> eyre::Result<Vec<GateCfg>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open roster CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["id", "name", "sensor_pin", "open_switch", "closed_switch"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "roster CSV must have headers '{}', got: {}",
            expected.join(","),
            actual.join(",")
        );
    }

    let mut gates = Vec::new();
    for (idx, rec) in rdr.deserialize::<RosterRow>().enumerate() {
        match rec {
            Ok(row) => gates.push(GateCfg::from(row)),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    if gates.is_empty() {
        eyre::bail!("roster CSV {:?} has no gates", path);
    }
    Ok(gates)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Controller
        if self.controller.tick_ms == 0 {
            eyre::bail!("controller.tick_ms must be >= 1");
        }
        if self.controller.tick_ms > 60_000 {
            eyre::bail!("controller.tick_ms is unreasonably large (>60s)");
        }
        if self.controller.grace_ms > 60 * 60 * 1000 {
            eyre::bail!("controller.grace_ms is unreasonably large (>1h)");
        }

        // Switches
        if self.switches.width == 0 || self.switches.width > 64 {
            eyre::bail!("switches.width must be in [1, 64]");
        }
        if self.switches.debounce_ms > 1000 {
            eyre::bail!("switches.debounce_ms is unreasonably large (>1s)");
        }
        if !self.switches.pins.is_empty() && self.switches.pins.len() != self.switches.width as usize
        {
            eyre::bail!(
                "switches.pins lists {} pins but switches.width is {}",
                self.switches.pins.len(),
                self.switches.width
            );
        }

        // Stepper
        let st = &self.stepper;
        if st.steps_per_action == 0 {
            eyre::bail!("stepper.steps_per_action must be >= 1");
        }
        if st.fast_step_us == 0 {
            eyre::bail!("stepper.fast_step_us must be >= 1");
        }
        if st.slow_step_us < st.fast_step_us {
            eyre::bail!("stepper.slow_step_us must be >= stepper.fast_step_us");
        }
        if !(0.0..=1.0).contains(&st.slow_fraction) {
            eyre::bail!("stepper.slow_fraction must be in [0.0, 1.0]");
        }
        if st.move_timeout_ms == 0 {
            eyre::bail!("stepper.move_timeout_ms must be >= 1");
        }
        if st.home_timeout_ms == 0 {
            eyre::bail!("stepper.home_timeout_ms must be >= 1");
        }
        if st.pulse_width_us == 0 {
            eyre::bail!("stepper.pulse_width_us must be >= 1");
        }

        // Gates
        if self.gates.is_empty() {
            eyre::bail!("gates: roster must contain at least one gate");
        }
        let mut ids = HashSet::new();
        let mut switches = HashSet::new();
        for g in &self.gates {
            if !ids.insert(g.id) {
                eyre::bail!("gates: duplicate gate id {}", g.id);
            }
            if g.name.trim().is_empty() {
                eyre::bail!("gates[{}].name must not be empty", g.id);
            }
            if g.sensor == SensorKind::Gpio && g.sensor_pin.is_none() {
                eyre::bail!("gates[{}].sensor_pin is required for a gpio sensor", g.id);
            }
            if g.actuator == ActuatorKind::Stepper {
                if g.open_switch == g.closed_switch {
                    eyre::bail!(
                        "gates[{}]: open_switch and closed_switch must differ",
                        g.id
                    );
                }
                for sw in [g.open_switch, g.closed_switch] {
                    if sw >= self.switches.width {
                        eyre::bail!(
                            "gates[{}]: switch {} is outside the {}-input bank",
                            g.id,
                            sw,
                            self.switches.width
                        );
                    }
                    if !switches.insert(sw) {
                        eyre::bail!("gates[{}]: switch {} is used by another gate", g.id, sw);
                    }
                }
            }
        }

        // Simulation
        if self.simulation.travel_steps == 0 {
            eyre::bail!("simulation.travel_steps must be >= 1");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly, got {rot:?}");
        }

        Ok(())
    }
}
