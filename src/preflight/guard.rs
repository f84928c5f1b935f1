//! Cancellation Guard
//!
//! Races every external call of a preflight run against the caller's
//! cancellation token and the run's overall deadline.

use crate::error::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Cancellation token plus optional deadline shared by one run
#[derive(Debug, Clone)]
pub struct RunGuard {
    token: CancellationToken,
    timeout: Option<Duration>,
    deadline: Option<Instant>,
}

impl RunGuard {
    /// Guard that only honors `token`
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            timeout: None,
            deadline: None,
        }
    }

    /// Guard that also gives up once `timeout` has elapsed from now
    pub fn with_timeout(token: CancellationToken, timeout: Duration) -> Self {
        Self {
            token,
            timeout: Some(timeout),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Fail fast if the run was already cancelled or is past its deadline
    pub fn ensure_active(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let (Some(deadline), Some(timeout)) = (self.deadline, self.timeout) {
            if Instant::now() >= deadline {
                return Err(Error::Timeout(timeout));
            }
        }
        Ok(())
    }

    /// Drive `fut` to completion unless the run is cancelled or times out first
    pub async fn run<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.ensure_active()?;

        let expired = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            _ = expired => Err(Error::Timeout(self.timeout.unwrap_or_default())),
            result = fut => result,
        }
    }

    /// Like [`RunGuard::run`] for calls that cannot fail on their own
    pub async fn run_infallible<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        self.run(async { Ok(fut.await) }).await
    }
}

impl Default for RunGuard {
    fn default() -> Self {
        Self::new(CancellationToken::new())
    }
}
