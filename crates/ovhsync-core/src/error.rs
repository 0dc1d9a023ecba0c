// ── Convergence error types ──
//
// What a caller of the resource handlers sees. Transport-level failures
// arrive wrapped in `Api` together with the call that produced them; the
// other variants describe how a convergence attempt ended.

use std::time::Duration;

use thiserror::Error;

use crate::lifecycle::{LifecycleEvent, LifecycleState};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum ConvergeError {
    // ── Submit / read errors ─────────────────────────────────────────
    /// A call the API rejected outright (validation, auth, transport).
    /// Never retried.
    #[error("calling {method} {endpoint} with params {payload}: {source}")]
    Api {
        method: &'static str,
        endpoint: String,
        payload: String,
        #[source]
        source: ovhsync_api::Error,
    },

    #[error("{endpoint} not found")]
    NotFound { endpoint: String },

    #[error("unexpected response from {endpoint}: {reason}")]
    UnexpectedResponse { endpoint: String, reason: String },

    // ── Convergence outcomes ─────────────────────────────────────────
    /// The asynchronous operation itself failed on the remote side.
    #[error("{endpoint} reported status {status}: {message}")]
    RemoteFailure {
        endpoint: String,
        status: String,
        message: String,
    },

    /// The deadline passed before the remote object converged. Its real
    /// state is unknown.
    #[error(
        "timed out after {}s waiting on {endpoint} (last observed: {})",
        .waited.as_secs(),
        .last_observed.as_deref().unwrap_or("nothing")
    )]
    Timeout {
        endpoint: String,
        waited: Duration,
        last_observed: Option<String>,
    },

    // ── Local errors ─────────────────────────────────────────────────
    #[error("invalid attribute {name}: {reason}")]
    Attribute { name: String, reason: String },

    #[error("invalid lifecycle transition from {from} on {event}")]
    InvalidTransition {
        from: LifecycleState,
        event: LifecycleEvent,
    },
}

impl ConvergeError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn is_remote_failure(&self) -> bool {
        matches!(self, Self::RemoteFailure { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// HTTP status of the underlying API error, if any.
    pub fn api_status(&self) -> Option<u16> {
        match self {
            Self::Api { source, .. } => source.status(),
            _ => None,
        }
    }
}
