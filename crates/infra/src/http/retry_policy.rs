//! Response classification and backoff for the platform transport
//!
//! Everything here is pure so it can be tested without network I/O. The
//! credential refresh triggered by 401/403 is a separate side effect owned by
//! [`HttpClient`](super::HttpClient).

use std::time::Duration;

use rand::Rng;
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// What one attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// A response arrived with this status code.
    Status(u16),
    /// No response: connect failure, timeout, reset.
    Transport(String),
}

/// Verdict on one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send again after a backoff. `reason` is surfaced if the cap is hit.
    Retry { reason: Option<String> },
    /// Stop and hand the response back as is.
    Fail,
    /// Stop and report an error.
    Fatal(String),
}

impl RetryDecision {
    pub fn is_retry(&self) -> bool {
        matches!(self, RetryDecision::Retry { .. })
    }

    /// Final verdict once no attempts are left.
    pub fn exhausted(self) -> Self {
        match self {
            RetryDecision::Retry { reason: Some(reason) } => RetryDecision::Fatal(reason),
            RetryDecision::Retry { reason: None } => RetryDecision::Fail,
            other => other,
        }
    }
}

/// Classify one attempt.
///
/// | outcome | decision |
/// |---|---|
/// | transport error | retry, error recorded |
/// | 429 | retry, silent |
/// | 401, 403 | retry, silent (caller refreshes credentials) |
/// | 0, 5xx except 501 | retry, error recorded |
/// | anything else | fail without error |
pub fn classify(outcome: &AttemptOutcome) -> RetryDecision {
    match outcome {
        AttemptOutcome::Transport(err) => {
            RetryDecision::Retry { reason: Some(format!("transport error: {err}")) }
        }
        AttemptOutcome::Status(429) => RetryDecision::Retry { reason: None },
        AttemptOutcome::Status(401 | 403) => RetryDecision::Retry { reason: None },
        AttemptOutcome::Status(code) if *code == 0 || (*code >= 500 && *code != 501) => {
            RetryDecision::Retry { reason: Some(format!("unexpected HTTP status {code}")) }
        }
        AttemptOutcome::Status(_) => RetryDecision::Fail,
    }
}

/// Whether the attempt should trigger a credential refresh before retrying.
pub fn requires_credential_refresh(outcome: &AttemptOutcome) -> bool {
    matches!(outcome, AttemptOutcome::Status(401 | 403))
}

/// Exponential backoff with cap and optional equal jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub base: Duration,
    pub max: Duration,
    pub jitter: bool,
}

impl Backoff {
    /// Delay before retry number `retry` (1-based): `base * 2^(retry-1)`, capped.
    pub fn delay(&self, retry: u32) -> Duration {
        let shift = retry.saturating_sub(1).min(16);
        let delay = self.base.saturating_mul(1u32 << shift).min(self.max);

        if !self.jitter || delay.is_zero() {
            return delay;
        }

        let half = delay / 2;
        let spread = rand::thread_rng().gen_range(0..=half.as_millis() as u64);
        half + Duration::from_millis(spread)
    }

    /// Delay requested by the server on 429/503, capped at `max`.
    pub fn server_hint(&self, status: u16, headers: &HeaderMap) -> Option<Duration> {
        if status != 429 && status != 503 {
            return None;
        }

        headers
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(|secs| Duration::from_secs(secs).min(self.max))
    }
}
