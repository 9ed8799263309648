//! Process-level helpers

pub mod logging;
pub mod shutdown;

pub use logging::{init_logging, LogFormat};
pub use shutdown::shutdown_signal;
