//! Retry policy: operation-specific fixed delays.

use std::future::Future;
use std::time::Duration;

use tracing::error;

use super::shutdown::ShutdownSignal;
use crate::domain::{LivebarError, Result};

/// Remote-facing steps of a cycle that get retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FetchStreams,
    ReadSidebar,
    PublishSidebar,
    PublishWiki,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::FetchStreams => "fetch_streams",
            Operation::ReadSidebar => "read_sidebar",
            Operation::PublishSidebar => "publish_sidebar",
            Operation::PublishWiki => "publish_wiki",
        }
    }
}

/// Retry policy for transient failures.
///
/// Every transient failure waits the same fixed delay and retries, with no
/// upper bound on attempts. Only shutdown ends the loop early.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before retrying a provider fetch.
    pub fetch_delay: Duration,

    /// Delay before retrying a document store read or write.
    pub publish_delay: Duration,
}

impl RetryPolicy {
    /// Default policy: 2 minutes for fetches, 1 minute for publishes.
    pub fn default_v1() -> Self {
        Self {
            fetch_delay: Duration::from_secs(120),
            publish_delay: Duration::from_secs(60),
        }
    }

    pub fn delay_for(&self, operation: Operation) -> Duration {
        match operation {
            Operation::FetchStreams => self.fetch_delay,
            Operation::ReadSidebar | Operation::PublishSidebar | Operation::PublishWiki => {
                self.publish_delay
            }
        }
    }

    /// Runs `attempt` until it succeeds or fails with a non-transient error.
    ///
    /// Returns [`LivebarError::Shutdown`] if shutdown is requested before or
    /// while waiting; no further attempt is made after that.
    pub async fn run<T, F, Fut>(
        &self,
        operation: Operation,
        destination: &str,
        shutdown: &mut ShutdownSignal,
        mut attempt: F,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let delay = self.delay_for(operation);
        loop {
            if shutdown.is_requested() {
                return Err(LivebarError::Shutdown);
            }

            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() => {
                    error!(
                        subreddit = %destination,
                        operation = operation.as_str(),
                        error = %e,
                        "Operation failed. Retrying in {}s",
                        delay.as_secs()
                    );
                    if !shutdown.sleep(delay).await {
                        return Err(LivebarError::Shutdown);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::default_v1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn default_policy_has_two_tiers() {
        let policy = RetryPolicy::default_v1();
        assert_eq!(policy.delay_for(Operation::FetchStreams), Duration::from_secs(120));
        assert_eq!(policy.delay_for(Operation::PublishSidebar), Duration::from_secs(60));
        assert_eq!(policy.delay_for(Operation::PublishWiki), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried_after_fixed_delay() {
        let policy = RetryPolicy::default_v1();
        let (_tx, mut shutdown) = ShutdownSignal::channel();
        let calls = AtomicU32::new(0);

        let start = Instant::now();
        let value = policy
            .run(Operation::PublishWiki, "chess", &mut shutdown, || async {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(LivebarError::Network("reset".into())),
                    _ => Ok(7),
                }
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(120));
    }

    #[tokio::test(start_paused = true)]
    async fn non_transient_errors_propagate_immediately() {
        let policy = RetryPolicy::default_v1();
        let (_tx, mut shutdown) = ShutdownSignal::channel();
        let calls = AtomicU32::new(0);

        let err = policy
            .run(Operation::PublishSidebar, "chess", &mut shutdown, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LivebarError::Rejected("SUBREDDIT_NOEXIST".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LivebarError::Rejected(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_during_wait_stops_retrying() {
        let policy = RetryPolicy::default_v1();
        let (tx, mut shutdown) = ShutdownSignal::channel();
        let calls = AtomicU32::new(0);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(30)).await;
            let _ = tx.send(true);
        });

        let err = policy
            .run(Operation::FetchStreams, "chess", &mut shutdown, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(LivebarError::Timeout("slow".into()))
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LivebarError::Shutdown));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
