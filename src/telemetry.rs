//! Tracing subscriber setup.
//!
//! Filter precedence: `RUST_LOG`, then `[logging] level`, then
//! [`DEFAULT_FILTER`].

use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, LoggingConfig};

pub const DEFAULT_FILTER: &str = "readiness_probe=info,tower_http=warn";

/// Install the global subscriber. Fails if one is already installed.
pub fn init(logging: &LoggingConfig) -> anyhow::Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = filter_directive(rust_log.as_deref(), logging.level.as_deref());
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| anyhow::anyhow!("invalid log filter `{directive}`: {e}"))?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    result.map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))
}

/// Pick the filter directive, skipping blank values.
fn filter_directive<'a>(rust_log: Option<&'a str>, configured: Option<&'a str>) -> &'a str {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .or(configured.filter(|s| !s.trim().is_empty()))
        .unwrap_or(DEFAULT_FILTER)
}
