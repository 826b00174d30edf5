//! Per-request cancellation and deadline

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::{Result, RouterError};

/// Cancellation signal plus optional deadline shared by every task a
/// request spawns. Clones observe the same token.
#[derive(Debug, Clone)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }

    /// No deadline; cancelled only explicitly.
    pub fn background() -> Self {
        Self::new(None)
    }

    /// Child context: cancelled with the parent, never outlives its deadline.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Fail fast if the request is already done.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(RouterError::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(RouterError::DeadlineExceeded);
            }
        }
        Ok(())
    }

    /// Drive `fut` until it completes, the request is cancelled or the
    /// deadline passes, whichever comes first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(RouterError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => Err(RouterError::DeadlineExceeded),
                res = fut => res,
            },
            None => tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(RouterError::Cancelled),
                res = fut => res,
            },
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::background()
    }
}
