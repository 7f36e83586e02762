//! Caller-supplied deadlines for backend calls.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::AppError;

/// Point in time by which a backend call must have completed.
///
/// Built on [`tokio::time::Instant`] so paused-clock tests can drive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `timeout` from now.
    pub fn after(timeout: Duration) -> Self {
        Self(Instant::now() + timeout)
    }

    /// Deadline at an explicit instant.
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// The underlying instant.
    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time left before the deadline, zero once elapsed.
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed.
    pub fn is_elapsed(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Run `fut` until the deadline. `what` names the operation in the
    /// timeout error.
    pub async fn run<F, T>(&self, what: &str, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout_at(self.0, fut).await {
            Ok(result) => result,
            Err(_) => Err(AppError::timeout(format!("{what} exceeded its deadline"))),
        }
    }
}
