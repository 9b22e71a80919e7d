use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum GateError {
    #[error("hardware error: {0}")]
    Hardware(String),
    #[error("hardware fault: {0}")]
    HardwareFault(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("timeout waiting for hardware")]
    Timeout,
    #[error("switch {id} is outside the {width}-input bank")]
    SwitchOutOfRange { id: u8, width: u8 },
    #[error("gate {gate} move failed: {fault}")]
    Move { gate: u8, fault: MoveFault },
}

/// Why a stepper move or homing run ended without a confirmed limit.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MoveFault {
    #[error("homing did not reach the closed limit")]
    HomingFailed,
    #[error("step ceiling reached before the limit asserted (stall or obstruction)")]
    StepCeiling,
    #[error("move timed out before the limit asserted")]
    Timeout,
    #[error("both limit switches asserted (wiring fault)")]
    BothLimits,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("missing collector motor")]
    MissingMotor,
    #[error("gate roster is empty")]
    NoGates,
    #[error("duplicate gate id {0}")]
    DuplicateGateId(u8),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
