//! Shared configuration for the ovhsync CLI and embedders.
//!
//! TOML profiles merged with `OVHSYNC_` environment variables, and their
//! translation into `ovhsync_core::EngineConfig` plus the API transport
//! settings. The CLI layers its flag overrides on top of [`ResolvedProfile`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use ovhsync_api::{DEFAULT_ENDPOINT, TlsMode, TransportConfig};
use ovhsync_core::{Backoff, EngineConfig, Timeouts};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{profile}' is not defined")]
    UnknownProfile { profile: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named API profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

/// A named API profile. Every field is optional; unset fields fall back
/// to the engine defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// API root, e.g. "https://ca.api.ovh.com/1.0".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "humantime_serde::option")]
    pub request_timeout: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "humantime_serde::option")]
    pub poll_interval: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "humantime_serde::option")]
    pub backoff_initial: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "humantime_serde::option")]
    pub backoff_max: Option<Duration>,

    /// Retry 429 responses like conflicts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_rate_limited: Option<bool>,

    #[serde(default)]
    pub timeouts: ProfileTimeouts,
}

/// Per-operation convergence deadlines.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ProfileTimeouts {
    #[serde(default, skip_serializing_if = "Option::is_none", with = "humantime_serde::option")]
    pub create: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "humantime_serde::option")]
    pub update: Option<Duration>,

    #[serde(default, skip_serializing_if = "Option::is_none", with = "humantime_serde::option")]
    pub delete: Option<Duration>,
}

mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use std::time::Duration;

        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match duration {
                Some(d) => super::serialize(d, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
        where
            D: Deserializer<'de>,
        {
            Option::<String>::deserialize(deserializer)?
                .map(|s| humantime::parse_duration(&s).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "ovhsync", "ovhsync").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("ovhsync");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from `path` + environment. A missing file yields the
/// defaults.
///
/// Environment keys nest on `__`: `OVHSYNC_PROFILES__PROD__POLL_INTERVAL=2s`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("OVHSYNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profile resolution ──────────────────────────────────────────────

/// A profile translated into what the API client and engine consume.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub name: String,
    pub endpoint: Url,
    pub transport: TransportConfig,
    pub engine: EngineConfig,
}

/// Pick the profile to use: the explicit name, else `default_profile`,
/// else "default".
///
/// An explicitly requested profile must exist. The implicit default may be
/// absent, in which case every setting falls back to its default.
pub fn select_profile(
    cfg: &Config,
    requested: Option<&str>,
) -> Result<(String, Profile), ConfigError> {
    let name = requested
        .or(cfg.default_profile.as_deref())
        .unwrap_or("default")
        .to_owned();

    match cfg.profiles.get(&name) {
        Some(p) => Ok((name, p.clone())),
        None if requested.is_some() => Err(ConfigError::UnknownProfile { profile: name }),
        None => Ok((name, Profile::default())),
    }
}

/// [`select_profile`] followed by [`Profile::resolve`].
pub fn resolve_profile(
    cfg: &Config,
    requested: Option<&str>,
) -> Result<ResolvedProfile, ConfigError> {
    let (name, profile) = select_profile(cfg, requested)?;
    profile.resolve(name, &cfg.defaults)
}

impl Profile {
    /// Translate into what the API client and engine consume.
    pub fn resolve(
        &self,
        name: String,
        defaults: &Defaults,
    ) -> Result<ResolvedProfile, ConfigError> {
        Ok(ResolvedProfile {
            endpoint: self.endpoint_url()?,
            transport: self.transport_config(defaults),
            engine: self.engine_config()?,
            name,
        })
    }

    /// API root URL, defaulting to the EU endpoint.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        raw.parse().map_err(|_| ConfigError::Validation {
            field: "endpoint".into(),
            reason: format!("invalid URL: {raw}"),
        })
    }

    pub fn transport_config(&self, defaults: &Defaults) -> TransportConfig {
        let tls = if self.insecure.unwrap_or(false) {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        }
    }

    /// Build an `EngineConfig`, filling unset fields from its defaults.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let defaults = EngineConfig::default();

        let poll_interval = self.poll_interval.unwrap_or(defaults.poll_interval);
        if poll_interval.is_zero() || poll_interval >= Duration::from_secs(60) {
            return Err(ConfigError::Validation {
                field: "poll_interval".into(),
                reason: format!(
                    "expected between 0s and 1m, got {}",
                    humantime::format_duration(poll_interval)
                ),
            });
        }

        let backoff = Backoff {
            initial: self.backoff_initial.unwrap_or(defaults.backoff.initial),
            max: self.backoff_max.unwrap_or(defaults.backoff.max),
        };
        if backoff.initial.is_zero() {
            return Err(ConfigError::Validation {
                field: "backoff_initial".into(),
                reason: "must be above zero".into(),
            });
        }
        if backoff.initial > backoff.max {
            return Err(ConfigError::Validation {
                field: "backoff_initial".into(),
                reason: "must not exceed backoff_max".into(),
            });
        }

        Ok(EngineConfig {
            poll_interval,
            backoff,
            retry_rate_limited: self
                .retry_rate_limited
                .unwrap_or(defaults.retry_rate_limited),
            timeouts: Timeouts {
                create: self.timeouts.create.unwrap_or(defaults.timeouts.create),
                update: self.timeouts.update.unwrap_or(defaults.timeouts.update),
                delete: self.timeouts.delete.unwrap_or(defaults.timeouts.delete),
            },
        })
    }
}
