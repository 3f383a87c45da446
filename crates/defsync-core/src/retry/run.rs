//! Retry loop: run a closure until success or policy says stop.

use super::policy::{RetryDecision, RetryPolicy};

/// Runs `f` until it succeeds, `retryable` rejects the error, or the policy
/// gives up. Sleeps for the backoff duration between attempts.
pub fn run_with_retry<T, E, F, R>(policy: &RetryPolicy, retryable: R, mut f: F) -> Result<T, E>
where
    F: FnMut() -> Result<T, E>,
    R: Fn(&E) -> bool,
    E: std::fmt::Display,
{
    let mut attempt = 1u32;
    loop {
        match f() {
            Ok(v) => return Ok(v),
            Err(e) => {
                if !retryable(&e) {
                    return Err(e);
                }
                match policy.decide(attempt) {
                    RetryDecision::NoRetry => return Err(e),
                    RetryDecision::RetryAfter(d) => {
                        tracing::debug!("attempt {} failed ({}), retrying in {:?}", attempt, e, d);
                        std::thread::sleep(d);
                        attempt += 1;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    #[test]
    fn succeeds_after_transient_failures() {
        let mut calls = 0;
        let r: Result<u32, String> = run_with_retry(&fast(5), |_| true, || {
            calls += 1;
            if calls < 3 {
                Err("busy".to_string())
            } else {
                Ok(calls)
            }
        });
        assert_eq!(r, Ok(3));
    }

    #[test]
    fn gives_up_at_max_attempts() {
        let mut calls = 0;
        let r: Result<(), String> = run_with_retry(&fast(3), |_| true, || {
            calls += 1;
            Err("busy".to_string())
        });
        assert!(r.is_err());
        assert_eq!(calls, 3);
    }

    #[test]
    fn non_retryable_stops_immediately() {
        let mut calls = 0;
        let r: Result<(), String> = run_with_retry(&fast(5), |e: &String| e != "fatal", || {
            calls += 1;
            Err("fatal".to_string())
        });
        assert!(r.is_err());
        assert_eq!(calls, 1);
    }
}
