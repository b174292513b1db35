//! Readiness and liveness reporting for a process running under an orchestrator.
//!
//! Components that own startup work report progress on the shared
//! [`HealthState`]; the probe router in [`api::probes`] turns that state into
//! `/readyz` and `/livez` responses, and [`server::serve`] runs it.
//!
//! ```rust,ignore
//! let health = readiness_probe::HealthState::global();
//! tokio::spawn(readiness_probe::server::serve(config, health.clone(), shutdown));
//!
//! informers.wait_for_cache_sync().await?;
//! health.set_caches_synced(true);
//!
//! controllers.start().await?;
//! health.set_controllers_ready(true);
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod health;
pub mod server;
pub mod telemetry;

pub use config::Config;
pub use health::{HealthState, LivenessSnapshot, ProbeBody, ProbeStatus, ReadinessSnapshot};
