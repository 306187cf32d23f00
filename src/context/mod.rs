//! Per-scrape deadline and cancellation

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::CollectError;

/// Deadline and cancellation signal shared by every collector in one scrape
/// round.
///
/// The orchestrator owns the context; collectors only borrow it. Cloning
/// yields a handle to the same round.
#[derive(Debug, Clone)]
pub struct ScrapeContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl ScrapeContext {
    /// Create a context whose deadline is `timeout` from now.
    ///
    /// A timeout too large to represent as an instant leaves the context
    /// without a deadline.
    pub fn new(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            token: CancellationToken::new(),
        }
    }

    /// Create a context with no deadline, only cancellation
    pub fn unbounded() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
        }
    }

    /// Time left before the deadline, `None` if unbounded
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Clamp a collector's own bound to what is left of the scrape
    pub fn bound(&self, limit: Duration) -> Duration {
        match self.remaining() {
            Some(remaining) => remaining.min(limit),
            None => limit,
        }
    }

    /// Abandon the scrape round
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Whether the deadline has passed
    pub fn expired(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() >= deadline)
    }

    /// Resolves once the scrape is cancelled
    pub async fn cancelled(&self) {
        self.token.cancelled().await
    }

    /// Resolves once the scrape is cancelled or its deadline passes,
    /// returning the matching error
    pub async fn done(&self) -> CollectError {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.token.cancelled() => CollectError::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => CollectError::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                CollectError::Cancelled
            }
        }
    }

    /// Fail fast if the scrape has already been abandoned
    pub fn check(&self) -> Result<(), CollectError> {
        if self.is_cancelled() {
            Err(CollectError::Cancelled)
        } else if self.expired() {
            Err(CollectError::DeadlineExceeded)
        } else {
            Ok(())
        }
    }
}

impl Default for ScrapeContext {
    fn default() -> Self {
        Self::unbounded()
    }
}
