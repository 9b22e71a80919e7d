#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core blast-gate control logic (hardware-agnostic).
//!
//! All hardware interactions go through the capability traits in
//! `blastgate_traits`: `Sensor`, `Actuator`, `Motor`, `InputBank`,
//! `StepperDriver` and `Clock`.
//!
//! ## Architecture
//!
//! - **Timer**: check-and-clear grace countdown (`timer`)
//! - **Switches**: debounced pull-up limit-switch bank (`switch`)
//! - **Stepper**: limit-seeking, bounded gate moves and homing (`stepper`)
//! - **Machine**: tool monitor with operator override (`machine`)
//! - **Gate**: the S0/S1/S2 operating-state machine (`gate`)
//! - **Controller**: tick loop body and collector-motor policy (`controller`)
//! - **Console/Runner**: operator commands and the fixed-period loop
//!
//! Every timed wait goes through `Clock::sleep` or `Clock::wait_until`, so the
//! whole stack runs deterministically under `ManualClock` in tests.

pub mod builder;
pub mod command;
pub mod config;
pub mod console;
pub mod controller;
pub mod conversions;
pub mod error;
pub mod gate;
pub mod hw_error;
pub mod machine;
pub mod mocks;
pub mod runner;
pub mod stepper;
pub mod switch;
pub mod timer;
pub mod util;

pub use builder::ControllerBuilder;
pub use command::{Command, CommandError};
pub use config::{ControllerCfg, StepperCfg, SwitchCfg};
pub use controller::{GateController, GateStatus, MotorState, TickReport, any_open, motor_policy};
pub use error::{BuildError, GateError, MoveFault, Result};
pub use gate::{Gate, GateState, OperatingState, Transition};
pub use machine::{HysteresisSensor, Machine, MachineState};
pub use stepper::{MoveOutcome, Position, StepperGateActuator};
pub use switch::{DebouncedSwitches, SharedSwitches};
pub use timer::Timer;
