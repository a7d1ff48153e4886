//! Delayed one-shot actions.
//!
//! Each scheduled action gets its own short-lived thread that waits on either
//! its delay or the scheduler's cancel channel. Nobody ever sends on the cancel
//! channel; [`PulseScheduler::cancel_all`] drops the sender, which wakes every
//! waiting thread at once.

use crossbeam_channel::{after, select, Receiver, Sender};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Runs actions after a delay unless cancelled first.
pub struct PulseScheduler {
    cancel: Sender<()>,
    cancelled: Receiver<()>,
    pending: Vec<JoinHandle<()>>,
}

impl PulseScheduler {
    /// Create a scheduler with nothing pending.
    pub fn new() -> Self {
        let (cancel, cancelled) = crossbeam_channel::bounded(0);
        PulseScheduler {
            cancel,
            cancelled,
            pending: Vec::new(),
        }
    }

    /// Run `action` once `delay` has elapsed.
    pub fn schedule<F>(&mut self, delay: Duration, action: F) -> io::Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.reap();

        let cancelled = self.cancelled.clone();
        let handle = thread::Builder::new()
            .name("led-pulse".to_string())
            .spawn(move || {
                select! {
                    recv(cancelled) -> _ => {
                        tracing::trace!("scheduled action cancelled");
                    }
                    recv(after(delay)) -> _ => action(),
                }
            })?;

        self.pending.push(handle);
        Ok(())
    }

    /// Number of actions that have neither run nor been cancelled.
    pub fn pending(&mut self) -> usize {
        self.reap();
        self.pending.len()
    }

    /// Cancel every pending action and wait for their threads to exit.
    pub fn cancel_all(&mut self) {
        let (cancel, cancelled) = crossbeam_channel::bounded(0);
        // Dropping the old sender disconnects every waiting receiver
        drop(std::mem::replace(&mut self.cancel, cancel));
        self.cancelled = cancelled;

        for handle in self.pending.drain(..) {
            let _ = handle.join();
        }
    }

    fn reap(&mut self) {
        self.pending.retain(|h| !h.is_finished());
    }
}

impl Default for PulseScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PulseScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
