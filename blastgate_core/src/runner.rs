//! Fixed-period run loop around a [`GateController`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crossbeam_channel as xch;

use crate::command::Command;
use crate::controller::{GateController, GateStatus};
use crate::error::Result;

/// When to stop a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunLimits {
    /// Stop after this many ticks; `None` runs until shutdown is requested.
    pub max_ticks: Option<u64>,
}

/// Next absolute deadline. Ticks missed while a move blocked the loop are
/// skipped rather than replayed back to back.
#[inline]
fn next_deadline(prev: Instant, period: Duration, now: Instant) -> Instant {
    let next = prev + period;
    if next > now {
        next
    } else {
        tracing::debug!(
            overrun_ms = now.saturating_duration_since(next).as_millis() as u64,
            "tick overran its period"
        );
        now + period
    }
}

/// Drive `controller` until `shutdown` is set, `limits` are reached or a tick
/// fails. Pending commands are applied before each tick; status snapshots go
/// to `on_status`. The controller is shut down on every exit path.
pub fn run(
    controller: &mut GateController,
    commands: &xch::Receiver<Command>,
    shutdown: &AtomicBool,
    limits: RunLimits,
    mut on_status: impl FnMut(&[GateStatus]),
) -> Result<u64> {
    let clock = controller.clock();
    let period = controller.tick_period();
    let mut deadline = clock.now();
    tracing::info!(
        period_ms = period.as_millis() as u64,
        max_ticks = ?limits.max_ticks,
        "run start"
    );

    let result = loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            break Ok(());
        }
        if let Some(max) = limits.max_ticks
            && controller.ticks() >= max
        {
            break Ok(());
        }

        for cmd in commands.try_iter() {
            match controller.apply(cmd) {
                Ok(Some(status)) => on_status(&status),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "command rejected"),
            }
        }

        if let Err(e) = controller.tick() {
            break Err(e);
        }

        deadline = next_deadline(deadline, period, clock.now());
        clock.wait_until(deadline);
    };

    let ticks = controller.ticks();
    let stopped = controller.shutdown();
    result?;
    stopped?;
    tracing::info!(ticks, "run complete");
    Ok(ticks)
}
