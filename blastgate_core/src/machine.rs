//! Tool monitor: one sensor per gate, sampled once per tick.

use blastgate_traits::{AnalogInput, Sensor, SensorState};

/// Observed tool state. Same two values as a raw sensor reading.
pub type MachineState = SensorState;

pub struct Machine {
    name: String,
    sensor: Box<dyn Sensor + Send>,
    state: MachineState,
    override_state: Option<MachineState>,
}

impl core::fmt::Debug for Machine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Machine")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("override", &self.override_state)
            .finish()
    }
}

impl Machine {
    pub fn new(name: impl Into<String>, sensor: Box<dyn Sensor + Send>) -> Self {
        Self {
            name: name.into(),
            sensor,
            state: MachineState::Off,
            override_state: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// State seen at the last refresh.
    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn override_state(&self) -> Option<MachineState> {
        self.override_state
    }

    /// Force the observed state until released with `None`.
    pub fn set_override(&mut self, state: Option<MachineState>) {
        self.override_state = state;
    }

    /// Sample the sensor. An override wins over the sensor; a failed read
    /// keeps the previous state.
    pub fn refresh(&mut self) -> MachineState {
        if let Some(forced) = self.override_state {
            self.state = forced;
            return forced;
        }
        match self.sensor.read() {
            Ok(s) => {
                if s != self.state {
                    tracing::debug!(machine = %self.name, state = %s, "tool state changed");
                }
                self.state = s;
            }
            Err(e) => {
                tracing::warn!(
                    machine = %self.name,
                    error = %e,
                    kept = %self.state,
                    "sensor read failed; keeping last state"
                );
            }
        }
        self.state
    }
}

/// Turns an analog current reading into ON/OFF with separate thresholds so a
/// reading hovering near one threshold does not chatter.
#[derive(Debug)]
pub struct HysteresisSensor<A: AnalogInput> {
    input: A,
    on_volts: f32,
    off_volts: f32,
    state: SensorState,
}

impl<A: AnalogInput> HysteresisSensor<A> {
    pub const DEFAULT_ON_VOLTS: f32 = 0.50;
    pub const DEFAULT_OFF_VOLTS: f32 = 0.30;

    /// `on_volts` must be strictly above `off_volts`.
    pub fn new(input: A, on_volts: f32, off_volts: f32) -> Option<Self> {
        if !(on_volts.is_finite() && off_volts.is_finite()) || on_volts <= off_volts {
            return None;
        }
        Some(Self {
            input,
            on_volts,
            off_volts,
            state: SensorState::Off,
        })
    }

    pub fn with_defaults(input: A) -> Self {
        Self {
            input,
            on_volts: Self::DEFAULT_ON_VOLTS,
            off_volts: Self::DEFAULT_OFF_VOLTS,
            state: SensorState::Off,
        }
    }
}

impl<A: AnalogInput> Sensor for HysteresisSensor<A> {
    fn read(&mut self) -> Result<SensorState, Box<dyn std::error::Error + Send + Sync>> {
        let v = self.input.read_volts()?;
        self.state = match self.state {
            SensorState::Off if v >= self.on_volts => SensorState::On,
            SensorState::On if v <= self.off_volts => SensorState::Off,
            s => s,
        };
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::FailingSensor;
    use blastgate_hardware::{SimulatedAnalog, SimulatedSensor};

    #[test]
    fn override_wins_until_released() {
        let sensor = SimulatedSensor::new();
        let mut m = Machine::new("saw", Box::new(sensor));
        m.set_override(Some(MachineState::On));
        assert_eq!(m.refresh(), MachineState::On);
        m.set_override(None);
        assert_eq!(m.refresh(), MachineState::Off);
    }

    #[test]
    fn failed_read_keeps_last_state() {
        let mut m = Machine::new("lathe", Box::new(FailingSensor));
        m.set_override(Some(MachineState::On));
        m.refresh();
        m.set_override(None);
        assert_eq!(m.refresh(), MachineState::On);
    }

    #[test]
    fn hysteresis_band() {
        let adc = SimulatedAnalog::new(0.0);
        let set = adc.setter();
        let mut s = HysteresisSensor::with_defaults(adc);
        for (volts, expect) in [
            (0.40, SensorState::Off),
            (0.55, SensorState::On),
            (0.40, SensorState::On),
            (0.30, SensorState::Off),
            (0.45, SensorState::Off),
        ] {
            set(volts);
            assert_eq!(s.read().unwrap(), expect, "at {volts} V");
        }
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        assert!(HysteresisSensor::new(SimulatedAnalog::new(0.0), 0.2, 0.4).is_none());
    }
}
