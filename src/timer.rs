// src/timer.rs

//! Cancellable single-shot timers.
//!
//! - [`TimerHandle`] runs a callback once after a delay on its own Tokio task,
//!   unless it is cancelled (or dropped) first.
//! - [`TimerSlot`] holds at most one armed timer of a given purpose. Starting
//!   a new timer cancels the previous one, and every start hands out a fresh
//!   [`TimerToken`] so a callback that lost the race with cancellation can
//!   tell it is stale and do nothing.

use std::fmt;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing::{debug, trace};

use crate::errors::SpoolrError;

/// A running single-shot timer.
///
/// Dropping the handle cancels the timer, same as [`TimerHandle::cancel`].
/// Must be created from within a Tokio runtime.
pub struct TimerHandle {
    label: &'static str,
    cancel: Option<oneshot::Sender<()>>,
}

impl TimerHandle {
    pub fn spawn<F>(label: &'static str, delay: Duration, on_fire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            tokio::select! {
                () = sleep(delay) => {
                    trace!(timer = label, ?delay, "timer fired");
                    on_fire();
                }
                _ = cancel_rx => {
                    debug!(error = %SpoolrError::TimerCanceled(label), "timer stopped");
                }
            }
        });

        Self {
            label,
            cancel: Some(cancel_tx),
        }
    }

    /// Stop the timer. A no-op if it already fired.
    pub fn cancel(mut self) {
        self.send_cancel();
    }

    /// `true` until the timer fires or is cancelled.
    pub fn is_pending(&self) -> bool {
        self.cancel.as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn send_cancel(&mut self) {
        if let Some(tx) = self.cancel.take() {
            // Err only means the timer task already finished.
            let _ = tx.send(());
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.send_cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("label", &self.label)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Identifies one start of a [`TimerSlot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerToken(u64);

/// Holder for at most one armed timer, with replace-on-start semantics.
#[derive(Debug)]
pub struct TimerSlot {
    label: &'static str,
    starts: u64,
    armed: Option<(TimerToken, TimerHandle)>,
}

impl TimerSlot {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            starts: 0,
            armed: None,
        }
    }

    /// Cancel whatever is armed, then arm a new timer.
    ///
    /// The callback receives the token of this start; it should call
    /// [`TimerSlot::take_if_current`] before acting.
    pub fn start<F>(&mut self, delay: Duration, on_fire: F) -> TimerToken
    where
        F: FnOnce(TimerToken) + Send + 'static,
    {
        self.cancel();

        self.starts += 1;
        let token = TimerToken(self.starts);
        let handle = TimerHandle::spawn(self.label, delay, move || on_fire(token));
        self.armed = Some((token, handle));
        token
    }

    /// Cancel the armed timer, if any. Returns whether one was armed.
    pub fn cancel(&mut self) -> bool {
        match self.armed.take() {
            Some((_, handle)) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Disarm the slot if `token` is the current start.
    ///
    /// Returns `false` for a token that was replaced or cancelled; the caller
    /// must then ignore the firing.
    pub fn take_if_current(&mut self, token: TimerToken) -> bool {
        match &self.armed {
            Some((current, _)) if *current == token => {
                if let Some((_, mut handle)) = self.armed.take() {
                    // Fired: nothing left to cancel, just release the sender.
                    handle.cancel.take();
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn current(&self) -> Option<TimerToken> {
        self.armed.as_ref().map(|(token, _)| *token)
    }
}
