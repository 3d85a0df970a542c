//! Per-call deadline and cancellation.
//!
//! Every store call made on behalf of a document operation is raced against the
//! caller's [`CallContext`]. A multi-step operation that is cancelled half way
//! keeps whatever writes already completed.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::storage::StorageError;

/// Ambient deadline and cancellation signal for one document operation.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// Creates a context with no deadline that is never cancelled unless asked to.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context whose deadline is `timeout` from now.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Ties this context to an existing cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Cancels the context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once the context is cancelled or past its deadline.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    () = self.cancel.cancelled() => {}
                    () = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }

    /// Runs one store call under this context.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Cancelled`] if the context finishes first, otherwise
    /// whatever the call returns.
    pub async fn run<T, F>(&self, operation: &'static str, call: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        if self.is_done() {
            return Err(StorageError::cancelled(operation));
        }

        tokio::select! {
            biased;
            () = self.done() => Err(StorageError::cancelled(operation)),
            result = call => result,
        }
    }
}
