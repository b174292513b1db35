//! Configuration types for readiness-probe.
//!
//! Config is loaded once at startup from a TOML file and validated before the
//! probe listener is bound. Every field has a default, so an empty file (or no
//! file at all) yields a working setup.
//!
//! # Example
//! ```toml
//! [probe]
//! bind_address   = "0.0.0.0"
//! port           = 10254
//! readiness_path = "/readyz"
//! liveness_path  = "/livez"
//! shutdown_drain_secs = 5
//!
//! [logging]
//! level  = "readiness_probe=debug"
//! format = "json"
//! ```

use std::{
    net::IpAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "READINESS_PROBE_CONFIG";

/// Environment variable overriding `probe.port`.
pub const PORT_ENV: &str = "READINESS_PROBE_PORT";

/// Config file consulted when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/readiness-probe/config.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub probe: ProbeConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content =
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content)
    }

    /// Load the config the binary runs with.
    ///
    /// `READINESS_PROBE_CONFIG` names a file that must exist. Without it,
    /// [`DEFAULT_CONFIG_PATH`] is read if present, else defaults apply.
    /// `READINESS_PROBE_PORT` is applied last.
    pub fn from_env() -> anyhow::Result<Self> {
        let explicit = std::env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut config = Self::resolve(explicit.as_deref(), Path::new(DEFAULT_CONFIG_PATH))?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Pick the config source: `explicit` if given, then `default_path` if it
    /// exists, then [`Config::default`].
    pub fn resolve(explicit: Option<&Path>, default_path: &Path) -> anyhow::Result<Self> {
        let path = match explicit {
            Some(path) => path,
            None if default_path.exists() => default_path,
            None => return Ok(Self::default()),
        };
        Self::load(path).with_context(|| format!("Failed to load config from {}", path.display()))
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("parsing config TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `READINESS_PROBE_PORT` on top of the file value.
    ///
    /// A non-numeric value is rejected rather than ignored.
    pub fn apply_env_overrides(&mut self) -> anyhow::Result<()> {
        if let Ok(port) = std::env::var(PORT_ENV) {
            self.probe.port = port
                .parse()
                .with_context(|| format!("{PORT_ENV} must be a port number, got `{port}`"))?;
        }
        self.validate()
    }

    fn validate(&self) -> anyhow::Result<()> {
        let probe = &self.probe;

        anyhow::ensure!(probe.port != 0, "probe.port must be non-zero");

        probe
            .bind_address
            .parse::<IpAddr>()
            .with_context(|| format!("probe.bind_address `{}` is not an IP address", probe.bind_address))?;

        for (field, path) in [
            ("readiness_path", &probe.readiness_path),
            ("liveness_path", &probe.liveness_path),
        ] {
            anyhow::ensure!(
                path.starts_with('/'),
                "probe.{} `{}` must start with `/`",
                field,
                path
            );
        }

        anyhow::ensure!(
            probe.readiness_path != probe.liveness_path,
            "probe.readiness_path and probe.liveness_path must differ (both `{}`)",
            probe.readiness_path
        );

        Ok(())
    }
}

/// Probe listener settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    /// Address the probe listener binds to (default: `0.0.0.0`).
    #[serde(default = "defaults::bind_address")]
    pub bind_address: String,

    /// Port for the probe listener (default: 10254).
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Path answering the readiness probe (default: `/readyz`).
    #[serde(default = "defaults::readiness_path")]
    pub readiness_path: String,

    /// Path answering the liveness probe (default: `/livez`).
    ///
    /// `/healthz` is always served as a liveness alias in addition.
    #[serde(default = "defaults::liveness_path")]
    pub liveness_path: String,

    /// Seconds to keep serving after a shutdown signal, with readiness
    /// failing, before the listener closes (default: 5). `0` closes at once.
    #[serde(default = "defaults::shutdown_drain_secs")]
    pub shutdown_drain_secs: u64,
}

impl ProbeConfig {
    pub fn shutdown_drain(&self) -> Duration {
        Duration::from_secs(self.shutdown_drain_secs)
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::bind_address(),
            port: defaults::port(),
            readiness_path: defaults::readiness_path(),
            liveness_path: defaults::liveness_path(),
            shutdown_drain_secs: defaults::shutdown_drain_secs(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub format: LogFormat,
}

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// One JSON object per line, for log shippers.
    Json,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Text => "text",
            Self::Json => "json",
        })
    }
}

mod defaults {
    pub fn bind_address() -> String { "0.0.0.0".into() }
    pub fn port() -> u16 { 10254 }
    pub fn readiness_path() -> String { "/readyz".into() }
    pub fn liveness_path() -> String { "/livez".into() }
    pub fn shutdown_drain_secs() -> u64 { 5 }
}
