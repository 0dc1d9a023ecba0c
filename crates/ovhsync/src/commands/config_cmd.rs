//! Config subcommand handlers.

use serde_json::json;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output::{self, OutputOpts};

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts, out: &OutputOpts) -> Result<(), CliError> {
    let path = config::active_config_path(global);

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), out.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let rendered = output::render_value(out.format, &cfg)?;
            output::print_output(&rendered, out.quiet);
            Ok(())
        }

        ConfigCommand::Resolved => {
            let cfg = config::load(global)?;
            let resolved = config::resolve(global, &cfg)?;
            let engine = &resolved.engine;
            let view = json!({
                "profile": resolved.name,
                "endpoint": resolved.endpoint.as_str(),
                "request_timeout": humantime::format_duration(resolved.transport.timeout).to_string(),
                "poll_interval": humantime::format_duration(engine.poll_interval).to_string(),
                "backoff_initial": humantime::format_duration(engine.backoff.initial).to_string(),
                "backoff_max": humantime::format_duration(engine.backoff.max).to_string(),
                "retry_rate_limited": engine.retry_rate_limited,
                "timeouts": {
                    "create": humantime::format_duration(engine.timeouts.create).to_string(),
                    "update": humantime::format_duration(engine.timeouts.update).to_string(),
                    "delete": humantime::format_duration(engine.timeouts.delete).to_string(),
                },
            });
            let rendered = output::render_value(out.format, &view)?;
            output::print_output(&rendered, out.quiet);
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load(global)?;
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            let lines: Vec<String> = names
                .into_iter()
                .map(|name| {
                    if name == default {
                        format!("{name} (default)")
                    } else {
                        name.clone()
                    }
                })
                .collect();
            output::print_output(&lines.join("\n"), out.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load(global)?;
            if !cfg.profiles.contains_key(&name) {
                return Err(config::unknown_profile(&cfg, name));
            }
            cfg.default_profile = Some(name.clone());
            config::save_config_to(&cfg, &path)?;
            if !out.quiet {
                eprintln!("default profile set to '{name}'");
            }
            Ok(())
        }
    }
}
