//! Per-request cancellation and deadline
//!
//! Every storage round trip of a reader call runs through
//! [`RequestContext::run`], so a cancelled token or an expired deadline fails
//! the call with [`QueryError::Cancelled`] instead of returning partial data.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{CancelReason, QueryError, QueryStage};

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context observing an existing token (e.g. one cancelled on Ctrl-C)
    pub fn with_token(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            deadline: None,
        }
    }

    /// Tighten the deadline to `timeout` from now; an earlier deadline is kept
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        if let Some(timeout) = timeout {
            let candidate = Instant::now() + timeout;
            self.deadline = Some(match self.deadline {
                Some(existing) => existing.min(candidate),
                None => candidate,
            });
        }
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `fut` to completion unless the context is cancelled or expires first
    ///
    /// The future is dropped on either exit, releasing whatever statement it holds.
    pub async fn run<T, F>(&self, stage: QueryStage, fut: F) -> Result<T, QueryError>
    where
        F: Future<Output = Result<T, QueryError>>,
    {
        let guarded = async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    Err(QueryError::cancelled(stage, CancelReason::Requested))
                }
                result = fut => result,
            }
        };

        match self.deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, guarded)
                .await
                .unwrap_or_else(|_| Err(QueryError::cancelled(stage, CancelReason::DeadlineExceeded))),
            None => guarded.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn run_passes_through_result() {
        let ctx = RequestContext::new();
        let value = ctx.run(QueryStage::Search, async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn cancelled_before_run() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let result: Result<(), _> = ctx
            .run(QueryStage::ListTags, std::future::pending())
            .await;
        assert!(matches!(
            result,
            Err(QueryError::Cancelled {
                stage: QueryStage::ListTags,
                reason: CancelReason::Requested
            })
        ));
    }

    #[tokio::test]
    async fn cancelled_while_running() {
        let token = CancellationToken::new();
        let ctx = RequestContext::with_token(token.clone());
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });
        let result: Result<(), _> = ctx.run(QueryStage::Search, std::future::pending()).await;
        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn deadline_exceeded() {
        let ctx = RequestContext::new().with_timeout(Some(Duration::from_millis(20)));
        let result: Result<(), _> = ctx
            .run(QueryStage::TagValues, std::future::pending())
            .await;
        assert!(matches!(
            result,
            Err(QueryError::Cancelled {
                reason: CancelReason::DeadlineExceeded,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn with_timeout_keeps_earliest_deadline() {
        let ctx = RequestContext::new()
            .with_timeout(Some(Duration::from_secs(1)))
            .with_timeout(Some(Duration::from_secs(60)));
        let deadline = ctx.deadline().unwrap();
        assert!(deadline <= Instant::now() + Duration::from_secs(1));

        let ctx = RequestContext::new().with_timeout(None);
        assert!(ctx.deadline().is_none());
    }
}
