mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use ovhsync_api::RestClient;
use ovhsync_core::Engine;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::OutputOpts;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    // Shell completions need neither config nor network
    if let Command::Completions(args) = &cli.command {
        use clap::CommandFactory;
        use clap_complete::generate;

        let mut cmd = Cli::command();
        generate(args.shell, &mut cmd, "ovhsync", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load(&cli.global)?;
    let out = OutputOpts {
        format: config::output_format(&cli.global, &cfg),
        quiet: cli.global.quiet,
    };

    match cli.command {
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global, &out),

        // Everything else talks to the API
        cmd => {
            let resolved = config::resolve(&cli.global, &cfg)?;
            let client = RestClient::new(resolved.endpoint.clone(), &resolved.transport)
                .map_err(|source| CliError::ClientSetup {
                    endpoint: resolved.endpoint.to_string(),
                    source,
                })?;
            let engine = Engine::new(&resolved.engine);

            tracing::debug!(command = ?cmd, profile = %resolved.name, endpoint = %resolved.endpoint, "dispatching command");
            commands::dispatch(cmd, &client, &engine, &out).await
        }
    }
}
