//! Lifecycle errors of the sample event scheduler
//!
//! Only `start` and `stop` can fail. A failed event creation is logged by
//! the event loop and never surfaces here.

use hubbridge_domain::BridgeError;
use thiserror::Error;

use crate::errors::InfraError;

#[derive(Debug, Error)]
pub enum SchedulerError {
    /// `start` called while the event task is alive
    #[error("Sample event scheduler already running")]
    AlreadyRunning,

    /// `stop` called without a prior `start`
    #[error("Sample event scheduler not running")]
    NotRunning,

    /// The event task outlived the join timeout after cancellation
    #[error("Sample event task did not stop within {seconds}s")]
    Timeout { seconds: u64 },

    /// The event task panicked
    #[error("Sample event task failed: {0}")]
    TaskJoinFailed(String),
}

/// Misuse of the lifecycle is the caller's fault, a stuck or panicked task
/// is ours.
impl From<SchedulerError> for InfraError {
    fn from(err: SchedulerError) -> Self {
        let bridge_err = match err {
            SchedulerError::AlreadyRunning | SchedulerError::NotRunning => {
                BridgeError::InvalidInput(err.to_string())
            }
            SchedulerError::Timeout { .. } | SchedulerError::TaskJoinFailed(_) => {
                BridgeError::Internal(err.to_string())
            }
        };
        InfraError(bridge_err)
    }
}

impl From<SchedulerError> for BridgeError {
    fn from(err: SchedulerError) -> Self {
        InfraError::from(err).into()
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_map_to_invalid_input() {
        let err: BridgeError = SchedulerError::AlreadyRunning.into();
        assert!(matches!(err, BridgeError::InvalidInput(_)));
    }

    #[test]
    fn timeout_maps_to_internal() {
        let err: BridgeError = SchedulerError::Timeout { seconds: 5 }.into();
        assert!(matches!(err, BridgeError::Internal(msg) if msg.contains("5s")));
    }

    #[test]
    fn messages_name_the_sample_event_task() {
        assert_eq!(
            SchedulerError::NotRunning.to_string(),
            "Sample event scheduler not running"
        );
        assert_eq!(
            SchedulerError::TaskJoinFailed("boom".into()).to_string(),
            "Sample event task failed: boom"
        );
    }
}
