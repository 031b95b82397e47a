//! # Bootstrap Context
//!
//! Cancellation and deadline signal threaded through every step of a run.
//!
//! The pipeline checks the context between steps and aborts with
//! [`BootstrapError::Cancelled`] or [`BootstrapError::DeadlineExceeded`].
//! A step already running inside a collaborator is not interrupted by the
//! pipeline itself; collaborators that want to stop early can await
//! [`BootstrapContext::done`].

use std::future::pending;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::error::{BootstrapError, ErrorKind};

/// Cancellation signal plus optional deadline
#[derive(Clone, Debug)]
pub struct BootstrapContext {
    cancel_rx: watch::Receiver<bool>,
    deadline: Option<Instant>,
}

/// Sender side of a [`BootstrapContext`]
#[derive(Debug)]
pub struct CancelHandle {
    cancel_tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Request cancellation of every context derived from this handle
    pub fn cancel(&self) {
        // send_replace never fails, even with no receivers left
        self.cancel_tx.send_replace(true);
    }
}

impl BootstrapContext {
    /// Create a cancellable context
    pub fn new() -> (Self, CancelHandle) {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        (
            Self {
                cancel_rx,
                deadline: None,
            },
            CancelHandle { cancel_tx },
        )
    }

    /// A context that is never cancelled and has no deadline
    pub fn background() -> Self {
        let (ctx, _handle) = Self::new();
        ctx
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    /// Fail if the run was cancelled or its deadline passed
    pub fn checkpoint(&self) -> Result<(), BootstrapError> {
        if self.is_cancelled() {
            return Err(BootstrapError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(BootstrapError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Report an interrupted collaborator call as the reason the context
    /// stopped (`Cancelled` or `DeadlineExceeded`).
    ///
    /// Any other error, or an interruption while the context is still live,
    /// is returned unchanged.
    pub(crate) fn attribute(&self, err: BootstrapError) -> BootstrapError {
        if err.kind() != ErrorKind::Interrupted {
            return err;
        }
        match self.checkpoint() {
            Err(reason) => reason,
            Ok(()) => err,
        }
    }

    /// Resolves once the context is cancelled or the deadline passes
    pub async fn done(&self) {
        let mut cancel_rx = self.cancel_rx.clone();
        let cancelled = async move {
            loop {
                if *cancel_rx.borrow_and_update() {
                    return;
                }
                if cancel_rx.changed().await.is_err() {
                    // Handle dropped without cancelling: never fires.
                    pending::<()>().await;
                }
            }
        };

        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = cancelled => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => cancelled.await,
        }
    }
}

impl Default for BootstrapContext {
    fn default() -> Self {
        Self::background()
    }
}
