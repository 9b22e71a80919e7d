//! Capability traits shared by the control core and the hardware backends.
//!
//! Every trait returns `Box<dyn Error + Send + Sync>` at the boundary so that
//! hardware, mock and simulated implementations can report whatever error type
//! they own; `blastgate_core::hw_error` maps those into typed errors.

pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::sync::{Arc, Mutex};

/// Binary reading produced by a tool sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SensorState {
    On,
    #[default]
    Off,
}

impl SensorState {
    #[inline]
    pub fn is_on(self) -> bool {
        matches!(self, SensorState::On)
    }
}

impl From<bool> for SensorState {
    fn from(on: bool) -> Self {
        if on { SensorState::On } else { SensorState::Off }
    }
}

impl core::fmt::Display for SensorState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            SensorState::On => f.write_str("ON"),
            SensorState::Off => f.write_str("OFF"),
        }
    }
}

/// Travel direction of a gate actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Open,
    Close,
}

/// A tool sensor. Must return promptly; no side effects beyond sampling.
pub trait Sensor {
    fn read(&mut self) -> Result<SensorState, Box<dyn std::error::Error + Send + Sync>>;
}

/// An analog source (e.g. a current-transformer channel on an ADC), in volts.
pub trait AnalogInput {
    fn read_volts(&mut self) -> Result<f32, Box<dyn std::error::Error + Send + Sync>>;
}

/// A gate actuator. Both moves return only once motion has settled or a
/// bounded failure was reached.
pub trait Actuator {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;

    /// Remove holding current. Called on shutdown.
    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }

    /// Whether the actuator's position is backed by a confirmed limit.
    /// Actuators without position feedback are always considered referenced.
    fn is_referenced(&self) -> bool {
        true
    }
}

/// Debounced limit-switch access. `true` means asserted.
pub trait SwitchInput {
    fn read_switch(&mut self, id: u8) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// A bank of raw digital inputs sampled as one snapshot, bit `n` = input `n`.
pub trait InputBank {
    /// Number of valid bits in a snapshot (at most 64).
    fn width(&self) -> u8;
    fn read_raw(&mut self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// STEP/DIR/EN stepper driver lines.
pub trait StepperDriver {
    fn enable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn set_direction(
        &mut self,
        direction: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    /// Emit one step pulse. Inter-step delay is owned by the caller.
    fn step(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// The shared dust-collector motor (usually a relay).
pub trait Motor {
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

impl<T: Sensor + ?Sized> Sensor for Box<T> {
    fn read(&mut self) -> Result<SensorState, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read()
    }
}

impl<T: Actuator + ?Sized> Actuator for Box<T> {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).open()
    }
    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).close()
    }
    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).disable()
    }
    fn is_referenced(&self) -> bool {
        (**self).is_referenced()
    }
}

impl<T: StepperDriver + ?Sized> StepperDriver for Box<T> {
    fn enable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).enable()
    }
    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).disable()
    }
    fn set_direction(
        &mut self,
        direction: Direction,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_direction(direction)
    }
    fn step(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).step()
    }
}

impl<T: Motor + ?Sized> Motor for Box<T> {
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).start()
    }
    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).stop()
    }
}

impl<T: InputBank + ?Sized> InputBank for Box<T> {
    fn width(&self) -> u8 {
        (**self).width()
    }
    fn read_raw(&mut self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        (**self).read_raw()
    }
}

/// One switch bank shared by several actuators on the control thread.
impl<T: SwitchInput + ?Sized> SwitchInput for Arc<Mutex<T>> {
    fn read_switch(&mut self, id: u8) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut guard = self
            .lock()
            .map_err(|_| std::io::Error::other("switch bank lock poisoned"))?;
        guard.read_switch(id)
    }
}
