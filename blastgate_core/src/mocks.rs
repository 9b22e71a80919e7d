//! Test and helper mocks for blastgate_core

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use blastgate_traits::{Actuator, InputBank, Motor, Sensor, SensorState};

/// Input bank replaying a fixed script of raw snapshots; the last entry
/// repeats once the script runs out.
#[derive(Debug, Clone)]
pub struct ScriptedBank {
    width: u8,
    script: Vec<u64>,
    idx: usize,
}

impl ScriptedBank {
    pub fn new(width: u8, script: Vec<u64>) -> Self {
        Self {
            width,
            script,
            idx: 0,
        }
    }
}

impl InputBank for ScriptedBank {
    fn width(&self) -> u8 {
        self.width
    }

    fn read_raw(&mut self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>> {
        let v = self
            .script
            .get(self.idx)
            .or_else(|| self.script.last())
            .copied()
            .ok_or_else(|| std::io::Error::other("empty bank script"))?;
        self.idx = self.idx.saturating_add(1);
        Ok(v)
    }
}

/// Shared counters of a [`RecordingActuator`].
#[derive(Debug, Default)]
pub struct ActuatorLog {
    pub opens: AtomicU32,
    pub closes: AtomicU32,
    pub disables: AtomicU32,
    /// When set, every move fails.
    pub fail: AtomicBool,
}

impl ActuatorLog {
    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::Relaxed)
    }
    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::Relaxed)
    }
    pub fn disables(&self) -> u32 {
        self.disables.load(Ordering::Relaxed)
    }
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::Relaxed);
    }
}

/// Actuator that records calls and settles instantly.
#[derive(Debug, Default)]
pub struct RecordingActuator {
    log: Arc<ActuatorLog>,
}

impl RecordingActuator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> Arc<ActuatorLog> {
        self.log.clone()
    }

    fn check(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.log.fail.load(Ordering::Relaxed) {
            return Err(Box::new(std::io::Error::other("actuator jammed")));
        }
        Ok(())
    }
}

impl Actuator for RecordingActuator {
    fn open(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.log.opens.fetch_add(1, Ordering::Relaxed);
        self.check()
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.log.closes.fetch_add(1, Ordering::Relaxed);
        self.check()
    }

    fn disable(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.log.disables.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Collector motor that mirrors its state into a shared flag.
#[derive(Debug, Default)]
pub struct RecordingMotor {
    running: Arc<AtomicBool>,
    starts: Arc<AtomicU32>,
    stops: Arc<AtomicU32>,
    failing_stops: Arc<AtomicU32>,
}

impl RecordingMotor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` calls to `stop` fail (stuck relay).
    pub fn fail_next_stops(&self, n: u32) {
        self.failing_stops.store(n, Ordering::Relaxed);
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Shared (starts, stop attempts) counters.
    pub fn counters(&self) -> (Arc<AtomicU32>, Arc<AtomicU32>) {
        (self.starts.clone(), self.stops.clone())
    }
}

impl Motor for RecordingMotor {
    fn start(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.running.store(true, Ordering::Relaxed);
        self.starts.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.stops.fetch_add(1, Ordering::Relaxed);
        if self
            .failing_stops
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(Box::new(std::io::Error::other("relay stuck")));
        }
        self.running.store(false, Ordering::Relaxed);
        Ok(())
    }
}

/// Sensor that always errors on read.
#[derive(Debug, Default, Clone, Copy)]
pub struct FailingSensor;

impl Sensor for FailingSensor {
    fn read(&mut self) -> Result<SensorState, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("sensor offline")))
    }
}
