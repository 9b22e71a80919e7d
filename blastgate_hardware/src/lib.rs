//! Hardware backends for the blast-gate controller.
//!
//! The simulated devices are always available and back the CLI when the
//! `hardware` feature is off. With `hardware` on (Linux only), `gpio` provides
//! rppal-backed drivers for a Raspberry Pi.
pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod gpio;
pub mod sim;

pub use sim::{SimBench, SimInputBank, SimStepperDriver};

use blastgate_traits::{Actuator, AnalogInput, Motor, Sensor, SensorState};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Simulated tool sensor. The returned reading is whatever was last stored
/// through a [`SensorHandle`].
#[derive(Debug, Default)]
pub struct SimulatedSensor {
    on: Arc<AtomicBool>,
}

/// Write side of a [`SimulatedSensor`].
#[derive(Debug, Clone)]
pub struct SensorHandle {
    on: Arc<AtomicBool>,
}

impl SensorHandle {
    pub fn set(&self, state: SensorState) {
        self.on.store(state.is_on(), Ordering::Release);
    }
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self) -> SensorHandle {
        SensorHandle {
            on: self.on.clone(),
        }
    }
}

impl Sensor for SimulatedSensor {
    fn read(&mut self) -> Result<SensorState, Box<dyn std::error::Error + Send + Sync>> {
        Ok(SensorState::from(self.on.load(Ordering::Acquire)))
    }
}

/// Simulated analog current-sense channel, in volts.
#[derive(Debug, Default)]
pub struct SimulatedAnalog {
    volts_bits: Arc<AtomicU32>,
}

impl SimulatedAnalog {
    pub fn new(volts: f32) -> Self {
        Self {
            volts_bits: Arc::new(AtomicU32::new(volts.to_bits())),
        }
    }

    /// Setter usable from another thread or a test.
    pub fn setter(&self) -> impl Fn(f32) + Send + Sync + 'static {
        let bits = self.volts_bits.clone();
        move |v: f32| bits.store(v.to_bits(), Ordering::Release)
    }
}

impl AnalogInput for SimulatedAnalog {
    fn read_volts(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>> {
        Ok(f32::from_bits(self.volts_bits.load(Ordering::Acquire)))
    }
}

/// Simulated collector relay.
#[derive(Debug, Default)]
pub struct SimulatedMotor {
    running: Arc<AtomicBool>,
    starts: Arc<AtomicU32>,
}

impl SimulatedMotor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared flag mirroring the relay state.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Shared counter of start commands.
    pub fn start_counter(&self) -> Arc<AtomicU32> {
        self.starts.clone()
    }
}

impl Motor for SimulatedMotor {
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.running.store(true, Ordering::Release);
        self.starts.fetch_add(1, Ordering::Relaxed);
        tracing::info!("collector motor on (simulated)");
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.running.store(false, Ordering::Release);
        tracing::info!("collector motor off (simulated)");
        Ok(())
    }
}

/// Actuator without position feedback (servo or linear actuator stand-in).
/// Moves complete immediately.
#[derive(Debug)]
pub struct LoggingActuator {
    name: String,
    opens: Arc<AtomicU32>,
    closes: Arc<AtomicU32>,
}

impl LoggingActuator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            opens: Arc::new(AtomicU32::new(0)),
            closes: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Shared (opens, closes) counters.
    pub fn counters(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (self.opens.clone(), self.closes.clone())
    }
}

impl Actuator for LoggingActuator {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.opens.fetch_add(1, Ordering::Relaxed);
        tracing::info!(actuator = %self.name, "actuator open (simulated)");
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.closes.fetch_add(1, Ordering::Relaxed);
        tracing::info!(actuator = %self.name, "actuator closed (simulated)");
        Ok(())
    }
}
