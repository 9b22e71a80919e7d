//! Debounced limit-switch bank.
//!
//! A change is accepted only when two raw snapshots taken one debounce window
//! apart agree. Inputs are wired against pull-ups, so a switch is asserted
//! when its bit reads low.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use blastgate_traits::{Clock, InputBank, SwitchInput};
use eyre::WrapErr;

use crate::error::{GateError, Result};
use crate::hw_error::map_hw_error;
use crate::util::width_mask;

/// A bank shared by every stepper gate on the control thread.
pub type SharedSwitches<B> = Arc<Mutex<DebouncedSwitches<B>>>;

pub struct DebouncedSwitches<B: InputBank> {
    bank: B,
    clock: Arc<dyn Clock + Send + Sync>,
    debounce: Duration,
    width: u8,
    mask: u64,
    stable: u64,
}

impl<B: InputBank> core::fmt::Debug for DebouncedSwitches<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DebouncedSwitches")
            .field("width", &self.width)
            .field("debounce", &self.debounce)
            .field("stable", &format_args!("{:#x}", self.stable))
            .finish()
    }
}

impl<B: InputBank> DebouncedSwitches<B> {
    /// Wrap `bank`. The stable snapshot starts all-high (nothing asserted).
    pub fn new(bank: B, clock: Arc<dyn Clock + Send + Sync>, debounce: Duration) -> Result<Self> {
        let width = bank.width();
        if width == 0 || width > 64 {
            return Err(eyre::Report::new(GateError::Config(format!(
                "switch bank width {width} must be in [1, 64]"
            ))));
        }
        let mask = width_mask(width);
        Ok(Self {
            bank,
            clock,
            debounce,
            width,
            mask,
            stable: mask,
        })
    }

    pub fn into_shared(self) -> SharedSwitches<B> {
        Arc::new(Mutex::new(self))
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Last accepted snapshot.
    pub fn stable(&self) -> u64 {
        self.stable
    }

    fn read_raw(&mut self) -> Result<u64> {
        let raw = self
            .bank
            .read_raw()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("reading limit-switch bank")?;
        Ok(raw & self.mask)
    }

    /// Sample the bank and return the (possibly updated) stable snapshot.
    pub fn poll(&mut self) -> Result<u64> {
        let first = self.read_raw()?;
        let changed = first ^ self.stable;
        if changed == 0 {
            return Ok(self.stable);
        }
        self.clock.sleep(self.debounce);
        let second = self.read_raw()?;
        if second == first {
            tracing::debug!(
                changed = format_args!("{changed:#x}"),
                stable = format_args!("{second:#x}"),
                "switch change accepted"
            );
            self.stable = second;
        } else {
            tracing::trace!(
                first = format_args!("{first:#x}"),
                second = format_args!("{second:#x}"),
                "switch bounce rejected"
            );
        }
        Ok(self.stable)
    }

    fn check_id(&self, id: u8) -> std::result::Result<(), GateError> {
        if id >= self.width {
            return Err(GateError::SwitchOutOfRange {
                id,
                width: self.width,
            });
        }
        Ok(())
    }

    /// Asserted state of `id` in the last accepted snapshot, without polling.
    pub fn is_asserted(&self, id: u8) -> std::result::Result<bool, GateError> {
        self.check_id(id)?;
        Ok(self.stable & (1u64 << id) == 0)
    }
}

impl<B: InputBank> SwitchInput for DebouncedSwitches<B> {
    fn read_switch(&mut self, id: u8) -> std::result::Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        self.check_id(id)?;
        self.poll()?;
        Ok(self.is_asserted(id)?)
    }
}
