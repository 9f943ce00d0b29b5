//! Per-call cancellation and deadlines.

use crate::{ErxError, ErxResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied cancellation signal for one gateway call.
///
/// A timeout is a deadline on the same signal: both surface as [`ErxError::Cancelled`].
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context cancelled when `token` is.
    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::background().timeout(timeout)
    }

    /// Add a deadline `timeout` from now, keeping any earlier one.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        let candidate = Instant::now() + timeout;
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < candidate => existing,
            _ => candidate,
        });
        self
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| d <= Instant::now())
    }

    /// Drive `work` unless the token fires or the deadline passes first.
    ///
    /// When interrupted, `work` is dropped, which abandons any in-flight exchange.
    pub async fn race<F, T>(&self, work: F) -> ErxResult<T>
    where
        F: Future<Output = ErxResult<T>>,
    {
        if self.is_cancelled() {
            return Err(ErxError::Cancelled);
        }

        let deadline = async {
            match self.deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ErxError::Cancelled),
            _ = deadline => Err(ErxError::Cancelled),
            result = work => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn background_runs_work_to_completion() {
        let result = CallContext::background().race(async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let result = CallContext::with_token(token)
            .race(async { Ok::<_, ErxError>(()) })
            .await;
        assert!(matches!(result, Err(ErxError::Cancelled)));
    }

    #[tokio::test]
    async fn cancellation_during_work_abandons_it() {
        let token = CancellationToken::new();
        let cx = CallContext::with_token(token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let result: ErxResult<()> = cx
            .race(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ErxError::Cancelled)));
    }

    #[tokio::test]
    async fn deadline_expires_as_cancellation() {
        let result: ErxResult<()> = CallContext::with_timeout(Duration::from_millis(20))
            .race(async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(ErxError::Cancelled)));
    }

    #[test]
    fn earlier_deadline_wins() {
        let cx = CallContext::with_timeout(Duration::from_secs(1)).timeout(Duration::from_secs(60));
        let remaining = cx.deadline().unwrap() - Instant::now();
        assert!(remaining <= Duration::from_secs(1));
    }
}
