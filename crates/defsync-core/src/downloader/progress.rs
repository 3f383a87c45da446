//! Download progress snapshot (bytes done, rate, ETA).

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct DownloadProgress {
    pub bytes_done: u64,
    /// From `Content-Length`; `None` when the server did not send one.
    pub total_bytes: Option<u64>,
    pub elapsed: Duration,
}

impl DownloadProgress {
    /// Download rate in bytes per second (0 if no time has elapsed).
    pub fn bytes_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes_done as f64 / secs
    }

    /// Fraction complete in [0.0, 1.0]; `None` without a known total.
    pub fn fraction(&self) -> Option<f64> {
        let total = self.total_bytes?;
        if total == 0 {
            return Some(1.0);
        }
        Some((self.bytes_done as f64 / total as f64).min(1.0))
    }

    /// Estimated seconds remaining (None if total unknown or rate is 0).
    pub fn eta_secs(&self) -> Option<f64> {
        let remaining = self.total_bytes?.saturating_sub(self.bytes_done);
        if remaining == 0 {
            return Some(0.0);
        }
        let rate = self.bytes_per_sec();
        if rate <= 0.0 {
            return None;
        }
        Some(remaining as f64 / rate)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.total_bytes, Some(t) if self.bytes_done >= t)
    }
}

/// Receives a snapshot after every chunk written.
pub type ProgressSink = Box<dyn Fn(&DownloadProgress) + Send + Sync>;
