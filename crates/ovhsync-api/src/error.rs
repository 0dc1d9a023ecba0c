use thiserror::Error;

/// Top-level error type for the `ovhsync-api` crate.
///
/// Every failure that originates from the API itself carries the HTTP
/// status code, so callers can tell a conflict (409) or a missing object
/// (404) apart from everything else. `ovhsync-core` decides which of these
/// are retryable.
#[derive(Debug, Error)]
pub enum Error {
    // ── API ─────────────────────────────────────────────────────────
    /// Non-2xx response, parsed from OVH's `{"class", "message"}` body.
    #[error("OVH API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        /// Error class reported by OVH, e.g. `Client::Conflict::Locked`.
        class: Option<String>,
        message: String,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing or construction error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status code, when the failure came back from the API.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Another operation already owns the remote object's state transition.
    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the API rejected the call for rate limiting.
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }

    /// Error class reported by the API, if available.
    pub fn api_class(&self) -> Option<&str> {
        match self {
            Self::Api { class, .. } => class.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16) -> Error {
        Error::Api {
            status,
            class: None,
            message: "boom".into(),
        }
    }

    #[test]
    fn status_helpers_classify_api_errors() {
        assert!(api(409).is_conflict());
        assert!(api(404).is_not_found());
        assert!(api(429).is_rate_limited());
        assert!(!api(400).is_conflict());
        assert!(!api(400).is_not_found());
    }

    #[test]
    fn non_api_errors_have_no_status() {
        let err = Error::Tls("bad cert".into());
        assert_eq!(err.status(), None);
        assert!(!err.is_conflict());
        assert_eq!(err.api_class(), None);
    }
}
