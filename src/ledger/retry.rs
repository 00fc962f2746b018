//! Bounded retry for optimistic-concurrency conflicts.
//!
//! Only a lost CAS race re-enters the loop; every other error propagates
//! unchanged. Exhaustion is an explicit outcome, distinct from business
//! failures, so callers can tell contention from an invalid request.

use std::time::Duration;

use futures::future::BoxFuture;

/// What a single attempt produced, as seen by the retry driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt<T> {
    Done(T),
    /// Lost a version race; worth re-running from fresh reads.
    Conflict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome<T> {
    Done(T),
    Exhausted { attempts: u32 },
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Pause between conflicting attempts. Anti-spin, not backoff.
    pub pause: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            pause: Duration::from_millis(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, pause: Duration) -> Self {
        Self {
            max_attempts,
            pause,
        }
    }

    /// Drive `op` until it completes, fails, or the attempt bound is hit.
    /// The attempt number passed to `op` starts at 1.
    pub async fn run<'a, T, E, F>(&self, mut op: F) -> Result<RetryOutcome<T>, E>
    where
        F: FnMut(u32) -> BoxFuture<'a, Result<Attempt<T>, E>>,
    {
        for attempt in 1..=self.max_attempts {
            match op(attempt).await? {
                Attempt::Done(value) => return Ok(RetryOutcome::Done(value)),
                Attempt::Conflict => {
                    if attempt < self.max_attempts && !self.pause.is_zero() {
                        tokio::time::sleep(self.pause).await;
                    }
                }
            }
        }
        Ok(RetryOutcome::Exhausted {
            attempts: self.max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[tokio::test]
    async fn test_done_on_first_attempt() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result: Result<RetryOutcome<u32>, String> = policy
            .run(|attempt| Box::pin(async move { Ok(Attempt::Done(attempt)) }))
            .await;
        assert_eq!(result.unwrap(), RetryOutcome::Done(1));
    }

    #[tokio::test]
    async fn test_conflict_then_done() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = Cell::new(0u32);
        let result: Result<RetryOutcome<u32>, String> = policy
            .run(|attempt| {
                calls.set(calls.get() + 1);
                Box::pin(async move {
                    if attempt < 3 {
                        Ok(Attempt::Conflict)
                    } else {
                        Ok(Attempt::Done(attempt))
                    }
                })
            })
            .await;
        assert_eq!(result.unwrap(), RetryOutcome::Done(3));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_after_bound() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let result: Result<RetryOutcome<u32>, String> = policy
            .run(|_| Box::pin(async { Ok(Attempt::Conflict) }))
            .await;
        assert_eq!(result.unwrap(), RetryOutcome::Exhausted { attempts: 3 });
    }

    #[tokio::test]
    async fn test_error_stops_the_loop() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let calls = Cell::new(0u32);
        let result: Result<RetryOutcome<u32>, String> = policy
            .run(|_| {
                calls.set(calls.get() + 1);
                Box::pin(async { Err("boom".to_string()) })
            })
            .await;
        assert_eq!(result.unwrap_err(), "boom");
        assert_eq!(calls.get(), 1);
    }
}
