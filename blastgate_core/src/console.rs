//! Operator console reader.
//!
//! Spawns a thread that reads lines, parses them into [`Command`]s and hands
//! them to the control thread over a bounded channel. The control thread
//! drains the channel at the start of a tick, so every override is observed
//! at a tick boundary. Malformed lines are logged and dropped.
use crossbeam_channel as xch;
use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::command::Command;

/// Enough to absorb a pasted burst of commands between ticks.
const QUEUE_DEPTH: usize = 64;

pub struct Console {
    rx: xch::Receiver<Command>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Console {
    pub fn spawn<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = xch::bounded(QUEUE_DEPTH);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            for line in reader.lines() {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("console thread received shutdown signal");
                    break;
                }
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        tracing::warn!(error = %e, "console read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(cmd) => {
                        // If send fails, consumer is gone; exit gracefully
                        if tx.send(cmd).is_err() {
                            tracing::debug!("console consumer disconnected, exiting thread");
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(input = %line.trim(), error = %e, "command rejected"),
                }
            }
            tracing::trace!("console thread exiting cleanly");
        });

        Self {
            rx,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Receiver side, for draining inside the run loop.
    pub fn receiver(&self) -> &xch::Receiver<Command> {
        &self.rx
    }

    /// Everything queued since the last drain.
    pub fn drain(&self) -> Vec<Command> {
        self.rx.try_iter().collect()
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.join_handle.take() {
            // A reader blocked on stdin cannot be interrupted; only join a
            // thread that has already finished.
            if !handle.is_finished() {
                tracing::trace!("console thread still blocked on input; detaching");
                return;
            }
            match handle.join() {
                Ok(()) => tracing::trace!("console thread joined successfully"),
                Err(e) => tracing::warn!(?e, "console thread panicked during shutdown"),
            }
        }
    }
}
