//! Exponential backoff and response classification for the retry loop.

use std::time::Duration;

/// Statuses the server may answer while it is temporarily unavailable.
pub const RETRYABLE_STATUSES: [u16; 3] = [500, 502, 503];

/// Classification of an HTTP status for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// Non-error status with a JSON body to decode.
    Success,
    /// 204: success without a body.
    NoContent,
    /// 500, 502 or 503: retry with backoff.
    Retryable,
    /// Any other 4xx/5xx: surface to the caller.
    Failed,
}

/// Classifies an HTTP status code.
///
/// * **204** → [`ResponseClass::NoContent`]
/// * **500, 502, 503** → [`ResponseClass::Retryable`]
/// * **other 4xx/5xx** → [`ResponseClass::Failed`]
/// * **everything else** → [`ResponseClass::Success`]
pub fn classify_status(status: u16) -> ResponseClass {
    match status {
        204 => ResponseClass::NoContent,
        s if RETRYABLE_STATUSES.contains(&s) => ResponseClass::Retryable,
        400..=599 => ResponseClass::Failed,
        _ => ResponseClass::Success,
    }
}

/// Deterministic exponential backoff: `base`, `2 * base`, `4 * base`, ...
/// between at most `max_tries` attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max_tries: u32,
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(1),
            max_tries: 5,
        }
    }
}

impl ExponentialBackoff {
    pub fn new(base: Duration, max_tries: u32) -> Self {
        Self { base, max_tries }
    }

    /// Delay to wait after the `attempt`-th try (1-based) failed.
    /// Returns `None` once the attempt budget is spent.
    pub fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt >= self.max_tries {
            return None;
        }
        let factor = 2u32.saturating_pow(attempt - 1);
        Some(self.base.saturating_mul(factor))
    }
}
