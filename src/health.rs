//! Process health state shared between the reporters and the probe endpoints.
//!
//! [`HealthState`] holds two independent flags:
//!
//! - `caches_synced` — the initial cache synchronisation has finished
//! - `controllers_ready` — the control loops are initialised and taking work
//!
//! Writers (informers, controller managers) flip the flags with the setters;
//! readers (the probe handlers) take a snapshot and render it. Each flag is its
//! own [`AtomicBool`], so no operation here ever takes a lock or waits on
//! another thread.
//!
//! A snapshot reads the two flags one after the other, not as a single
//! transaction. A probe racing a transition may pair a fresh value of one flag
//! with a stale value of the other; the next poll sees the settled state.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, OnceLock,
};

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

/// Process-wide instance handed out by [`HealthState::global`].
static GLOBAL_HEALTH_STATE: OnceLock<Arc<HealthState>> = OnceLock::new();

/// Concurrency-safe holder of the two readiness flags.
///
/// Both flags start out `false`. Nothing here enforces monotonicity: a flag
/// may be set back to `false` (e.g. on re-sync or shutdown) and readiness
/// follows it.
#[derive(Debug, Default)]
pub struct HealthState {
    caches_synced: AtomicBool,
    controllers_ready: AtomicBool,
}

impl HealthState {
    /// Create a fresh state with both flags cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared process-wide state, creating it on first use.
    ///
    /// Concurrent first callers race safely; exactly one instance is ever
    /// constructed and every caller receives a handle to it.
    pub fn global() -> Arc<HealthState> {
        GLOBAL_HEALTH_STATE
            .get_or_init(|| Arc::new(HealthState::new()))
            .clone()
    }

    /// Record whether the caches have completed their synchronisation.
    pub fn set_caches_synced(&self, synced: bool) {
        let previous = self.caches_synced.swap(synced, Ordering::AcqRel);
        log_transition(Flag::CachesSynced, previous, synced);
    }

    /// Record whether the controllers are ready to process work.
    pub fn set_controllers_ready(&self, ready: bool) {
        let previous = self.controllers_ready.swap(ready, Ordering::AcqRel);
        log_transition(Flag::ControllersReady, previous, ready);
    }

    /// Current value of the caches-synced flag.
    pub fn caches_synced(&self) -> bool {
        self.caches_synced.load(Ordering::Acquire)
    }

    /// Current value of the controllers-ready flag.
    pub fn controllers_ready(&self) -> bool {
        self.controllers_ready.load(Ordering::Acquire)
    }

    /// Read both flags for the readiness probe.
    pub fn readiness(&self) -> ReadinessSnapshot {
        ReadinessSnapshot {
            caches_synced: self.caches_synced(),
            controllers_ready: self.controllers_ready(),
        }
    }

    /// Read both flags for the liveness probe.
    ///
    /// The flags are diagnostic only; liveness never fails on their values.
    pub fn liveness(&self) -> LivenessSnapshot {
        LivenessSnapshot {
            caches_synced: self.caches_synced(),
            controllers_ready: self.controllers_ready(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Flag {
    CachesSynced,
    ControllersReady,
}

impl std::fmt::Display for Flag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::CachesSynced => "caches_synced",
            Self::ControllersReady => "controllers_ready",
        })
    }
}

fn log_transition(flag: Flag, previous: bool, value: bool) {
    if previous == value {
        trace!(%flag, value, "health flag rewritten with unchanged value");
    } else {
        info!(%flag, value, "health flag changed");
    }
}

/// Status label carried in every probe body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy,
    Alive,
}

impl std::fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::Alive => "alive",
        })
    }
}

/// JSON body returned by both probe endpoints.
///
/// The raw flags are always included so an operator can tell "caches not
/// synced" apart from "controllers not ready" from a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProbeBody {
    pub status: ProbeStatus,
    pub caches_synced: bool,
    pub controllers_ready: bool,
}

/// Point-in-time view of the flags as seen by the readiness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessSnapshot {
    pub caches_synced: bool,
    pub controllers_ready: bool,
}

impl ReadinessSnapshot {
    /// Ready only when both flags are set. Computed on every call.
    pub fn is_ready(&self) -> bool {
        self.caches_synced && self.controllers_ready
    }

    pub fn status(&self) -> ProbeStatus {
        if self.is_ready() {
            ProbeStatus::Healthy
        } else {
            ProbeStatus::Unhealthy
        }
    }

    /// `200 OK` when ready, `503 Service Unavailable` otherwise.
    pub fn status_code(&self) -> StatusCode {
        if self.is_ready() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }

    pub fn body(&self) -> ProbeBody {
        ProbeBody {
            status: self.status(),
            caches_synced: self.caches_synced,
            controllers_ready: self.controllers_ready,
        }
    }
}

/// Point-in-time view of the flags as seen by the liveness probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LivenessSnapshot {
    pub caches_synced: bool,
    pub controllers_ready: bool,
}

impl LivenessSnapshot {
    pub fn status(&self) -> ProbeStatus {
        ProbeStatus::Alive
    }

    /// Always `200 OK`: answering at all is the liveness signal.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::OK
    }

    pub fn body(&self) -> ProbeBody {
        ProbeBody {
            status: self.status(),
            caches_synced: self.caches_synced,
            controllers_ready: self.controllers_ready,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_COMBINATIONS: [(bool, bool); 4] =
        [(false, false), (true, false), (false, true), (true, true)];

    fn state_with(synced: bool, ready: bool) -> HealthState {
        let state = HealthState::new();
        state.set_caches_synced(synced);
        state.set_controllers_ready(ready);
        state
    }

    // -----------------------------------------------------------------------
    // Initial state
    // -----------------------------------------------------------------------

    #[test]
    fn fresh_state_is_not_ready() {
        let state = HealthState::new();
        let snap = state.readiness();

        assert!(!snap.caches_synced);
        assert!(!snap.controllers_ready);
        assert!(!snap.is_ready());
        assert_eq!(snap.status(), ProbeStatus::Unhealthy);
        assert_eq!(snap.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn getters_reflect_the_last_write() {
        let state = HealthState::new();
        state.set_caches_synced(true);
        assert!(state.caches_synced());
        assert!(!state.controllers_ready());

        state.set_controllers_ready(true);
        state.set_caches_synced(false);
        assert!(!state.caches_synced());
        assert!(state.controllers_ready());
    }

    // -----------------------------------------------------------------------
    // Readiness
    // -----------------------------------------------------------------------

    #[test]
    fn caches_synced_alone_is_not_ready() {
        let state = HealthState::new();
        state.set_caches_synced(true);

        let body = state.readiness().body();
        assert_eq!(body.status, ProbeStatus::Unhealthy);
        assert!(body.caches_synced);
        assert!(!body.controllers_ready);
    }

    #[test]
    fn controllers_ready_alone_is_not_ready() {
        let state = HealthState::new();
        state.set_controllers_ready(true);

        let snap = state.readiness();
        assert!(!snap.is_ready());
        assert_eq!(snap.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn both_flags_set_is_ready() {
        let snap = state_with(true, true).readiness();
        assert!(snap.is_ready());
        assert_eq!(snap.status(), ProbeStatus::Healthy);
        assert_eq!(snap.status_code(), StatusCode::OK);
    }

    #[test]
    fn readiness_is_the_and_of_both_flags_in_every_combination() {
        for (synced, ready) in ALL_COMBINATIONS {
            let snap = state_with(synced, ready).readiness();
            assert_eq!(snap.is_ready(), synced && ready, "synced={synced} ready={ready}");
            assert_eq!(snap.caches_synced, synced);
            assert_eq!(snap.controllers_ready, ready);
        }
    }

    #[test]
    fn readiness_follows_the_latest_writes() {
        let state = HealthState::new();
        let writes = [
            (true, false),
            (true, true),
            (false, true),
            (true, true),
            (false, false),
        ];
        for (synced, ready) in writes {
            state.set_caches_synced(synced);
            state.set_controllers_ready(ready);
            assert_eq!(state.readiness().is_ready(), synced && ready);
        }
    }

    #[test]
    fn resetting_a_flag_reverts_readiness() {
        let state = state_with(true, true);
        assert!(state.readiness().is_ready());

        state.set_controllers_ready(false);
        let snap = state.readiness();
        assert!(!snap.is_ready());
        assert_eq!(snap.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn repeated_identical_writes_are_idempotent() {
        let state = HealthState::new();
        state.set_caches_synced(true);
        let first = state.readiness();

        for _ in 0..5 {
            state.set_caches_synced(true);
        }
        assert_eq!(state.readiness(), first);
        assert_eq!(state.liveness().body(), state.liveness().body());
    }

    // -----------------------------------------------------------------------
    // Liveness
    // -----------------------------------------------------------------------

    #[test]
    fn liveness_is_alive_in_every_combination() {
        for (synced, ready) in ALL_COMBINATIONS {
            let snap = state_with(synced, ready).liveness();
            assert_eq!(snap.status(), ProbeStatus::Alive);
            assert_eq!(snap.status_code(), StatusCode::OK);

            let body = snap.body();
            assert_eq!(body.caches_synced, synced);
            assert_eq!(body.controllers_ready, ready);
        }
    }

    // -----------------------------------------------------------------------
    // Serialisation
    // -----------------------------------------------------------------------

    #[test]
    fn body_serialises_with_camel_case_keys() {
        let body = state_with(true, false).readiness().body();
        let json = serde_json::to_value(body).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": "unhealthy",
                "cachesSynced": true,
                "controllersReady": false,
            })
        );
    }

    #[test]
    fn status_labels_match_display() {
        for status in [ProbeStatus::Healthy, ProbeStatus::Unhealthy, ProbeStatus::Alive] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json.as_str().unwrap(), status.to_string());
        }
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn concurrent_writers_and_readers_never_panic_or_deadlock() {
        let state = Arc::new(HealthState::new());

        std::thread::scope(|s| {
            for w in 0..4 {
                let state = Arc::clone(&state);
                s.spawn(move || {
                    for i in 0..10_000 {
                        let value = (i + w) % 2 == 0;
                        state.set_caches_synced(value);
                        state.set_controllers_ready(!value);
                    }
                });
            }
            for _ in 0..4 {
                let state = Arc::clone(&state);
                s.spawn(move || {
                    for _ in 0..10_000 {
                        let snap = state.readiness();
                        assert_eq!(snap.is_ready(), snap.caches_synced && snap.controllers_ready);
                        assert_eq!(state.liveness().status_code(), StatusCode::OK);
                    }
                });
            }
        });

        // Settle both flags and confirm the last write wins.
        state.set_caches_synced(true);
        state.set_controllers_ready(true);
        assert!(state.readiness().is_ready());
    }

    // -----------------------------------------------------------------------
    // Singleton
    // -----------------------------------------------------------------------

    #[test]
    fn global_returns_the_same_instance() {
        let a = HealthState::global();
        let b = std::thread::spawn(HealthState::global).join().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
