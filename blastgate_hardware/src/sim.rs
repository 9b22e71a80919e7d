//! Simulated gate mechanics: stepper axes with limit switches wired into one
//! pull-up input bank.
//!
//! Each axis travels between `0` (closed stop) and `travel_steps` (open stop).
//! A limit switch pulls its bit low while the carriage sits on that stop.
//! Faults can be injected per axis: a jammed carriage ignores step pulses, a
//! dead switch never asserts.

use crate::error::{HwError, Result};
use blastgate_traits::{Direction, InputBank, StepperDriver};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct SimAxis {
    position: u32,
    travel_steps: u32,
    open_bit: u8,
    closed_bit: u8,
    enabled: bool,
    direction: Direction,
    jammed: bool,
    dead_open_switch: bool,
    dead_closed_switch: bool,
    pulses: u64,
    pulses_while_disabled: u64,
}

impl SimAxis {
    fn open_asserted(&self) -> bool {
        !self.dead_open_switch && self.position >= self.travel_steps
    }

    fn closed_asserted(&self) -> bool {
        !self.dead_closed_switch && self.position == 0
    }
}

#[derive(Debug)]
struct BenchState {
    width: u8,
    axes: Vec<SimAxis>,
    /// Extra bits held low regardless of axis state (wiring shorts).
    forced_low: u64,
    /// When set, every bank read fails as if the expander stopped answering.
    bank_offline: bool,
}

/// Shared handle to the simulated bench. Clones refer to the same bench.
#[derive(Debug, Clone)]
pub struct SimBench {
    state: Arc<Mutex<BenchState>>,
}

impl SimBench {
    /// A bench whose input bank has `width` bits (at most 64).
    pub fn new(width: u8) -> Result<Self> {
        if width as usize > 64 {
            return Err(HwError::BankTooWide(width as usize));
        }
        Ok(Self {
            state: Arc::new(Mutex::new(BenchState {
                width,
                axes: Vec::new(),
                forced_low: 0,
                bank_offline: false,
            })),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, BenchState>> {
        self.state.lock().map_err(|_| HwError::LockPoisoned)
    }

    /// Add an axis parked mid-travel (position unknown to the controller).
    /// Returns the axis index.
    pub fn add_axis(&self, travel_steps: u32, open_bit: u8, closed_bit: u8) -> Result<usize> {
        let mut st = self.lock()?;
        st.axes.push(SimAxis {
            position: travel_steps / 2,
            travel_steps: travel_steps.max(1),
            open_bit,
            closed_bit,
            enabled: false,
            direction: Direction::Close,
            jammed: false,
            dead_open_switch: false,
            dead_closed_switch: false,
            pulses: 0,
            pulses_while_disabled: 0,
        });
        Ok(st.axes.len() - 1)
    }

    fn with_axis<T>(&self, axis: usize, f: impl FnOnce(&mut SimAxis) -> T) -> Result<T> {
        let mut st = self.lock()?;
        let a = st.axes.get_mut(axis).ok_or(HwError::NoSuchAxis(axis))?;
        Ok(f(a))
    }

    /// Stepper driver bound to one axis.
    pub fn driver(&self, axis: usize) -> Result<SimStepperDriver> {
        self.with_axis(axis, |_| ())?;
        Ok(SimStepperDriver {
            bench: self.clone(),
            axis,
        })
    }

    /// The pull-up input bank carrying every axis's limit switches.
    pub fn inputs(&self) -> SimInputBank {
        SimInputBank {
            bench: self.clone(),
        }
    }

    pub fn set_position(&self, axis: usize, position: u32) -> Result<()> {
        self.with_axis(axis, |a| a.position = position.min(a.travel_steps))
    }

    pub fn position(&self, axis: usize) -> Result<u32> {
        self.with_axis(axis, |a| a.position)
    }

    pub fn travel_steps(&self, axis: usize) -> Result<u32> {
        self.with_axis(axis, |a| a.travel_steps)
    }

    pub fn is_enabled(&self, axis: usize) -> Result<bool> {
        self.with_axis(axis, |a| a.enabled)
    }

    /// Step pulses received while the driver was enabled.
    pub fn pulses(&self, axis: usize) -> Result<u64> {
        self.with_axis(axis, |a| a.pulses)
    }

    pub fn pulses_while_disabled(&self, axis: usize) -> Result<u64> {
        self.with_axis(axis, |a| a.pulses_while_disabled)
    }

    /// A jammed carriage ignores step pulses.
    pub fn set_jammed(&self, axis: usize, jammed: bool) -> Result<()> {
        self.with_axis(axis, |a| a.jammed = jammed)
    }

    /// A dead switch never pulls its bit low.
    pub fn set_dead_switch(&self, axis: usize, which: Direction, dead: bool) -> Result<()> {
        self.with_axis(axis, |a| match which {
            Direction::Open => a.dead_open_switch = dead,
            Direction::Close => a.dead_closed_switch = dead,
        })
    }

    /// Hold an input bit low independent of any axis (e.g. a shorted harness).
    pub fn force_low(&self, bit: u8, low: bool) -> Result<()> {
        let mut st = self.lock()?;
        if low {
            st.forced_low |= 1u64 << bit;
        } else {
            st.forced_low &= !(1u64 << bit);
        }
        Ok(())
    }

    /// Make subsequent bank reads fail with [`HwError::Timeout`].
    pub fn set_bank_offline(&self, offline: bool) -> Result<()> {
        self.lock()?.bank_offline = offline;
        Ok(())
    }

    fn snapshot(&self) -> Result<u64> {
        let st = self.lock()?;
        if st.bank_offline {
            return Err(HwError::Timeout);
        }
        let mask = if st.width >= 64 {
            u64::MAX
        } else {
            (1u64 << st.width) - 1
        };
        let mut bits = mask;
        for a in &st.axes {
            if a.open_asserted() {
                bits &= !(1u64 << a.open_bit);
            }
            if a.closed_asserted() {
                bits &= !(1u64 << a.closed_bit);
            }
        }
        Ok(bits & !st.forced_low & mask)
    }
}

/// STEP/DIR/EN lines of one simulated axis.
#[derive(Debug, Clone)]
pub struct SimStepperDriver {
    bench: SimBench,
    axis: usize,
}

impl StepperDriver for SimStepperDriver {
    fn enable(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bench.with_axis(self.axis, |a| a.enabled = true)?;
        Ok(())
    }

    fn disable(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bench.with_axis(self.axis, |a| a.enabled = false)?;
        Ok(())
    }

    fn set_direction(
        &mut self,
        direction: Direction,
    ) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bench.with_axis(self.axis, |a| a.direction = direction)?;
        Ok(())
    }

    fn step(&mut self) -> std::result::Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bench.with_axis(self.axis, |a| {
            if !a.enabled {
                a.pulses_while_disabled += 1;
                return;
            }
            a.pulses += 1;
            if a.jammed {
                return;
            }
            // Mechanical stops clamp travel at both ends.
            a.position = match a.direction {
                Direction::Open => (a.position + 1).min(a.travel_steps),
                Direction::Close => a.position.saturating_sub(1),
            };
        })?;
        Ok(())
    }
}

/// Input bank view of the bench.
#[derive(Debug, Clone)]
pub struct SimInputBank {
    bench: SimBench,
}

impl InputBank for SimInputBank {
    fn width(&self) -> u8 {
        self.bench.lock().map(|st| st.width).unwrap_or(0)
    }

    fn read_raw(&mut self) -> std::result::Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.bench.snapshot()?)
    }
}
