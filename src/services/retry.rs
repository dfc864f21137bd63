//! Bounded retry of optimistic-concurrency conflicts

use std::future::Future;

use crate::error::{AppError, AppResult};

/// Run `operation` until it succeeds, fails with anything other than a
/// store conflict, or has been attempted `max_attempts` times.
///
/// Each attempt must start its own store transaction and redo its reads.
/// Exhausting the attempts yields [`AppError::ConcurrencyConflict`].
pub async fn with_optimistic_retry<T, F, Fut>(max_attempts: u32, mut operation: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match operation().await {
            Err(AppError::Store(err)) if err.is_conflict() => {
                if attempt >= max_attempts {
                    return Err(AppError::ConcurrencyConflict(format!(
                        "giving up after {} attempts: {}",
                        attempt, err
                    )));
                }
                attempt += 1;
            }
            result => return result,
        }
    }
}
