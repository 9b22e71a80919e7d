//! rppal-backed drivers for a Raspberry Pi header.
//!
//! Pin numbers are BCM numbers. Limit switches and current-sense comparators
//! are wired active-low against the internal pull-ups.
use std::time::Duration;

use blastgate_traits::{Direction, InputBank, Motor, Sensor, SensorState, StepperDriver};
use rppal::gpio::{Gpio, InputPin, Level, OutputPin};
use tracing::trace;

use crate::error::{HwError, Result};

fn gpio() -> Result<Gpio> {
    Gpio::new().map_err(|e| HwError::Gpio(format!("open gpio: {e}")))
}

/// EN level that leaves the driver disabled (active-low enable).
const EN_IDLE_HIGH: bool = true;

/// Relay pin level for the requested contactor state; `true` is high.
fn relay_level(on: bool, active_low: bool) -> bool {
    on ^ active_low
}

fn level(high: bool) -> Level {
    if high { Level::High } else { Level::Low }
}

/// Claim `pin` as an output already driven to `high`, so it never glitches
/// through the opposite level.
fn output(gpio: &Gpio, pin: u8, high: bool) -> Result<OutputPin> {
    let pin = gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?;
    Ok(if high {
        pin.into_output_high()
    } else {
        pin.into_output_low()
    })
}

fn input_pullup(gpio: &Gpio, pin: u8) -> Result<InputPin> {
    Ok(gpio
        .get(pin)
        .map_err(|e| HwError::Gpio(format!("pin {pin}: {e}")))?
        .into_input_pullup())
}

/// DRV8825/A4988-style STEP/DIR/EN driver. EN is active low.
pub struct GpioStepperDriver {
    step: OutputPin,
    dir: OutputPin,
    en: Option<OutputPin>,
    pulse: Duration,
    invert_dir: bool,
}

impl GpioStepperDriver {
    pub fn new(
        step_pin: u8,
        dir_pin: u8,
        en_pin: Option<u8>,
        pulse_width_us: u32,
        invert_dir: bool,
    ) -> Result<Self> {
        let gpio = gpio()?;
        let step = output(&gpio, step_pin, false)?;
        let dir = output(&gpio, dir_pin, false)?;
        // Start disabled: no holding torque at rest.
        let en = en_pin
            .map(|p| output(&gpio, p, EN_IDLE_HIGH))
            .transpose()?;
        Ok(Self {
            step,
            dir,
            en,
            pulse: Duration::from_micros(u64::from(pulse_width_us.max(1))),
            invert_dir,
        })
    }
}

impl StepperDriver for GpioStepperDriver {
    fn enable(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(en) = self.en.as_mut() {
            en.set_low();
        }
        Ok(())
    }

    fn disable(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Some(en) = self.en.as_mut() {
            en.write(level(EN_IDLE_HIGH));
        }
        self.step.set_low();
        Ok(())
    }

    fn set_direction(
        &mut self,
        direction: Direction,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let high = matches!(direction, Direction::Open) ^ self.invert_dir;
        if high {
            self.dir.set_high();
        } else {
            self.dir.set_low();
        }
        Ok(())
    }

    fn step(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.step.set_high();
        std::thread::sleep(self.pulse);
        self.step.set_low();
        Ok(())
    }
}

/// A set of pull-up inputs read as one snapshot; bit `n` is `pins[n]`.
pub struct GpioInputBank {
    pins: Vec<InputPin>,
}

impl GpioInputBank {
    pub fn new(pins: &[u8]) -> Result<Self> {
        if pins.len() > 64 {
            return Err(HwError::BankTooWide(pins.len()));
        }
        let gpio = gpio()?;
        let pins = pins
            .iter()
            .map(|p| input_pullup(&gpio, *p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { pins })
    }
}

impl InputBank for GpioInputBank {
    fn width(&self) -> u8 {
        self.pins.len() as u8
    }

    fn read_raw(&mut self) -> std::result::Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let raw = self
            .pins
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, p)| if p.is_high() { acc | (1 << i) } else { acc });
        trace!(raw, "input bank snapshot");
        Ok(raw)
    }
}

/// Digital current-sense comparator output.
pub struct GpioCurrentSensor {
    pin: InputPin,
    active_high: bool,
}

impl GpioCurrentSensor {
    pub fn new(pin: u8, active_high: bool) -> Result<Self> {
        let gpio = gpio()?;
        Ok(Self {
            pin: input_pullup(&gpio, pin)?,
            active_high,
        })
    }
}

impl Sensor for GpioCurrentSensor {
    fn read(&mut self) -> std::result::Result<SensorState, Box<dyn std::error::Error + Send + Sync>> {
        Ok(SensorState::from(self.pin.is_high() == self.active_high))
    }
}

/// Relay driving the collector contactor.
pub struct GpioRelay {
    pin: OutputPin,
    active_low: bool,
}

impl GpioRelay {
    pub fn new(pin: u8, active_low: bool) -> Result<Self> {
        let gpio = gpio()?;
        Ok(Self {
            pin: output(&gpio, pin, relay_level(false, active_low))?,
            active_low,
        })
    }

    fn set(&mut self, on: bool) {
        self.pin.write(level(relay_level(on, self.active_low)));
    }
}

impl Motor for GpioRelay {
    fn start(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.set(true);
        Ok(())
    }

    fn stop(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.set(false);
        Ok(())
    }
}
