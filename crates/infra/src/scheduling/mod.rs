//! Scheduling infrastructure for background tasks
//!
//! Schedulers follow the same lifecycle rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout on shutdown

pub mod error;
pub mod sample_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use sample_scheduler::{SampleEventScheduler, SampleSchedulerConfig};
