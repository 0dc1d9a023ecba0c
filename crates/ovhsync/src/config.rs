//! CLI configuration: thin wrapper around `ovhsync_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects
//! `GlobalOpts` flag overrides (--endpoint, --poll-interval, --timeout).

use std::path::PathBuf;

use ovhsync_config::{ConfigError, ResolvedProfile, select_profile};

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use ovhsync_config::{Config, config_path, load_config_from, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Config file in effect: `--config` / `OVHSYNC_CONFIG`, else the platform path.
pub fn active_config_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&active_config_path(global))?)
}

/// Output format: flag > env > `[defaults] output` > table.
pub fn output_format(global: &GlobalOpts, cfg: &Config) -> OutputFormat {
    global.output.unwrap_or_else(|| {
        <OutputFormat as clap::ValueEnum>::from_str(&cfg.defaults.output, true)
            .unwrap_or(OutputFormat::Table)
    })
}

/// Resolve the active profile, applying CLI flag overrides on top.
pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<ResolvedProfile, CliError> {
    let (name, mut profile) =
        select_profile(cfg, global.profile.as_deref()).map_err(|e| match e {
            ConfigError::UnknownProfile { profile } => unknown_profile(cfg, profile),
            other => other.into(),
        })?;

    if let Some(ref endpoint) = global.endpoint {
        profile.endpoint = Some(endpoint.clone());
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(interval) = global.poll_interval {
        profile.poll_interval = Some(interval);
    }
    if let Some(timeout) = global.request_timeout {
        profile.request_timeout = Some(timeout);
    }
    if let Some(deadline) = global.timeout {
        profile.timeouts.create = Some(deadline);
        profile.timeouts.update = Some(deadline);
        profile.timeouts.delete = Some(deadline);
    }

    Ok(profile.resolve(name, &cfg.defaults)?)
}

/// `ProfileNotFound` listing the profiles that do exist.
pub fn unknown_profile(cfg: &Config, name: String) -> CliError {
    let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
    names.sort();
    CliError::ProfileNotFound {
        name,
        available: if names.is_empty() {
            "(none)".into()
        } else {
            names.join(", ")
        },
    }
}
