//! Tracing subscriber setup
//!
//! `RUST_LOG` selects the filter (default [`DEFAULT_FILTER`]) and
//! `HUBBRIDGE_LOG_FORMAT=json` switches to one JSON object per line.

use tracing_subscriber::{fmt, EnvFilter};

pub const LOG_FORMAT_ENV: &str = "HUBBRIDGE_LOG_FORMAT";
pub const DEFAULT_FILTER: &str = "info,hubbridge_core=debug,hubbridge_infra=debug,hubbridge_app=debug";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl LogFormat {
    /// Anything other than `json` (any case) means text.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(value) if value.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

/// Install the global subscriber.
///
/// # Errors
/// Fails when a global subscriber is already installed.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt().with_env_filter(filter).with_target(true);

    let installed = match format {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.try_init(),
    };
    installed.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))
}
