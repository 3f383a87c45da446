//! Bounded retry with backoff.
//!
//! Used for cleanup of the staged file, which can fail for a short while
//! after the scanner tool has released it.

mod policy;
mod run;

pub use policy::{RetryDecision, RetryPolicy};
pub use run::run_with_retry;
