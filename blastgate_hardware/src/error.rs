use thiserror::Error;

#[derive(Debug, Error)]
pub enum HwError {
    #[error("gpio error: {0}")]
    Gpio(String),
    #[error("hardware timeout")]
    Timeout,
    #[error("simulated axis {0} does not exist")]
    NoSuchAxis(usize),
    #[error("input bank width {0} exceeds 64 bits")]
    BankTooWide(usize),
    #[error("simulation state lock poisoned")]
    LockPoisoned,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HwError>;
