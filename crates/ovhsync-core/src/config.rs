// ── Engine configuration ──
//
// Knobs for the convergence loop. Built by `ovhsync-config` from TOML and
// environment; `Default` matches what the OVH provider ships with.

use std::time::Duration;

/// Exponential delay between conflict retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(500),
            max: Duration::from_secs(10),
        }
    }
}

impl Backoff {
    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial
            .checked_mul(1 << shift)
            .map_or(self.max, |d| d.min(self.max))
    }
}

/// Per-operation convergence deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        let twenty_minutes = Duration::from_secs(20 * 60);
        Self {
            create: twenty_minutes,
            update: twenty_minutes,
            delete: twenty_minutes,
        }
    }
}

/// Everything the convergence engine needs besides an API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Fixed spacing between status reads while polling.
    pub poll_interval: Duration,
    pub backoff: Backoff,
    /// Also retry HTTP 429 responses on submit. Only 409 is retried otherwise.
    pub retry_rate_limited: bool,
    pub timeouts: Timeouts,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            backoff: Backoff::default(),
            retry_rate_limited: false,
            timeouts: Timeouts::default(),
        }
    }
}
