//! CLI error types with miette diagnostics.
//!
//! Maps `ConvergeError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use std::time::Duration;

use miette::Diagnostic;
use thiserror::Error;

use ovhsync_config::ConfigError;
use ovhsync_core::ConvergeError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const REMOTE_FAILURE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the API at {endpoint}")]
    #[diagnostic(
        code(ovhsync::connection_failed),
        help(
            "Request payload: {payload}\n\
             Check the endpoint and your network.\n\
             Override it with --endpoint or set `endpoint` in your profile."
        )
    )]
    ConnectionFailed {
        endpoint: String,
        payload: String,
        #[source]
        source: ovhsync_api::Error,
    },

    #[error("Could not set up the HTTP client for {endpoint}")]
    #[diagnostic(
        code(ovhsync::client_setup),
        help("Check `ca_cert` in your profile, or pass --insecure for test endpoints.")
    )]
    ClientSetup {
        endpoint: String,
        #[source]
        source: ovhsync_api::Error,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{endpoint} not found")]
    #[diagnostic(
        code(ovhsync::not_found),
        help("The object was deleted outside this tool; recreate it with `create`.")
    )]
    NotFound { endpoint: String },

    #[error("{endpoint} is busy with another operation")]
    #[diagnostic(
        code(ovhsync::conflict),
        help(
            "Request payload: {payload}\n\
             Retry once the running operation completes."
        )
    )]
    Conflict { endpoint: String, payload: String },

    // ── Convergence ──────────────────────────────────────────────────
    #[error("Timed out after {waited} waiting on {endpoint}")]
    #[diagnostic(
        code(ovhsync::timeout),
        help(
            "Last observed: {last_observed}\n\
             The operation may still complete remotely. Check with `show`,\n\
             or raise the deadline with --timeout."
        )
    )]
    Timeout {
        endpoint: String,
        waited: String,
        last_observed: String,
    },

    #[error("{endpoint} reported status {status}")]
    #[diagnostic(code(ovhsync::remote_failure), help("{message}"))]
    RemoteFailure {
        endpoint: String,
        status: String,
        message: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("{method} {endpoint} failed: {message}")]
    #[diagnostic(code(ovhsync::api_error), help("Request payload: {payload}"))]
    ApiError {
        method: String,
        endpoint: String,
        payload: String,
        message: String,
    },

    #[error("Unexpected response from {endpoint}: {reason}")]
    #[diagnostic(code(ovhsync::unexpected_response))]
    UnexpectedResponse { endpoint: String, reason: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(ovhsync::internal))]
    Internal { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(ovhsync::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(ovhsync::profile_not_found),
        help("Available profiles: {available}")
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(ovhsync::config))]
    Config(Box<ConfigError>),

    // ── IO / Serialization ────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(ovhsync::json), help("Check the JSON file contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML output failed: {0}")]
    #[diagnostic(code(ovhsync::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::ClientSetup { .. } => exit_code::CONNECTION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } => exit_code::CONFLICT,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::RemoteFailure { .. } => exit_code::REMOTE_FAILURE,
            Self::Validation { .. } | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── ConvergeError → CliError mapping ─────────────────────────────────

impl From<ConvergeError> for CliError {
    fn from(err: ConvergeError) -> Self {
        match err {
            ConvergeError::Api {
                method,
                endpoint,
                payload,
                source,
            } => match source {
                ovhsync_api::Error::Transport(_) | ovhsync_api::Error::Tls(_) => {
                    CliError::ConnectionFailed {
                        endpoint,
                        payload,
                        source,
                    }
                }
                ref e if e.is_conflict() => CliError::Conflict { endpoint, payload },
                e => CliError::ApiError {
                    method: method.into(),
                    endpoint,
                    payload,
                    message: e.to_string(),
                },
            },

            ConvergeError::NotFound { endpoint } => CliError::NotFound { endpoint },

            ConvergeError::UnexpectedResponse { endpoint, reason } => {
                CliError::UnexpectedResponse { endpoint, reason }
            }

            ConvergeError::RemoteFailure {
                endpoint,
                status,
                message,
            } => CliError::RemoteFailure {
                endpoint,
                status,
                message,
            },

            ConvergeError::Timeout {
                endpoint,
                waited,
                last_observed,
            } => CliError::Timeout {
                endpoint,
                waited: format_waited(waited),
                last_observed: last_observed.unwrap_or_else(|| "nothing".into()),
            },

            ConvergeError::Attribute { name, reason } => CliError::Validation {
                field: name,
                reason,
            },

            e @ ConvergeError::InvalidTransition { .. } => CliError::Internal {
                message: e.to_string(),
            },
        }
    }
}

/// Whole seconds, or whole milliseconds below one second.
fn format_waited(waited: Duration) -> String {
    let rounded = if waited < Duration::from_secs(1) {
        Duration::from_millis(u64::from(waited.subsec_millis()))
    } else {
        Duration::from_secs(waited.as_secs())
    };
    humantime::format_duration(rounded).to_string()
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { profile } => CliError::ProfileNotFound {
                name: profile,
                available: String::new(),
            },
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn api(status: u16) -> ConvergeError {
        ConvergeError::Api {
            method: "POST",
            endpoint: "/cloud/project/p/database/mysql/c/ipRestriction".into(),
            payload: "{}".into(),
            source: ovhsync_api::Error::Api {
                status,
                class: None,
                message: "nope".into(),
            },
        }
    }

    #[test]
    fn convergence_outcomes_have_distinct_exit_codes() {
        let timeout = CliError::from(ConvergeError::Timeout {
            endpoint: "/x".into(),
            waited: Duration::from_secs(90),
            last_observed: Some("CREATING".into()),
        });
        let failure = CliError::from(ConvergeError::RemoteFailure {
            endpoint: "/x".into(),
            status: "ERROR".into(),
            message: "boom".into(),
        });

        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);
        assert_eq!(failure.exit_code(), exit_code::REMOTE_FAILURE);
    }

    #[test]
    fn api_errors_map_by_status() {
        assert_eq!(CliError::from(api(409)).exit_code(), exit_code::CONFLICT);
        assert_eq!(CliError::from(api(400)).exit_code(), exit_code::GENERAL);
        assert_eq!(
            CliError::from(ConvergeError::NotFound {
                endpoint: "/x".into()
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
    }

    #[test]
    fn timeout_wait_is_reported_in_whole_seconds() {
        let err = CliError::from(ConvergeError::Timeout {
            endpoint: "/x".into(),
            waited: Duration::from_secs(1203) + Duration::from_micros(3412),
            last_observed: None,
        });
        match err {
            CliError::Timeout { waited, .. } => assert_eq!(waited, "20m 3s"),
            other => panic!("expected Timeout, got {other:?}"),
        }
        assert_eq!(format_waited(Duration::from_micros(200_450)), "200ms");
    }

    #[test]
    fn conflict_keeps_the_payload() {
        match CliError::from(api(409)) {
            CliError::Conflict { endpoint, payload } => {
                assert!(endpoint.ends_with("/ipRestriction"));
                assert_eq!(payload, "{}");
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn bad_attributes_are_usage_errors() {
        let err = CliError::from(ConvergeError::Attribute {
            name: "colour".into(),
            reason: "not a known attribute".into(),
        });
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
