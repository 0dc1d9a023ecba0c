//! Command dispatch: bridges CLI args -> resource handlers -> output formatting.

pub mod allowed_network;
pub mod config_cmd;
pub mod ip_restriction;
pub mod util;

use ovhsync_api::RestClient;
use ovhsync_core::Engine;

use crate::cli::Command;
use crate::error::CliError;
use crate::output::OutputOpts;

/// Dispatch an API-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &RestClient,
    engine: &Engine,
    out: &OutputOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::IpRestriction(args) => ip_restriction::handle(client, engine, args, out).await,
        Command::AllowedNetwork(args) => allowed_network::handle(client, engine, args, out).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
