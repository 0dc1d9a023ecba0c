//! Dedicated-cloud allowed network command handlers.

use ovhsync_api::RestClient;
use ovhsync_core::{
    AllowedNetworkLocator, AllowedNetworkPatch, DedicatedCloud, Engine, NewAllowedNetwork,
    Resource,
};

use crate::cli::{AllowedNetworkArgs, AllowedNetworkCommand, AllowedNetworkTarget};
use crate::error::CliError;
use crate::output::OutputOpts;

use super::util;

impl From<AllowedNetworkTarget> for AllowedNetworkLocator {
    fn from(t: AllowedNetworkTarget) -> Self {
        DedicatedCloud::new(t.service_name).allowed_network(t.id)
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &RestClient,
    engine: &Engine,
    args: AllowedNetworkArgs,
    out: &OutputOpts,
) -> Result<(), CliError> {
    let handler = engine.allowed_networks(client);

    match args.command {
        AllowedNetworkCommand::Create {
            service_name,
            network,
            description,
            from_file,
        } => {
            let desired = match (from_file, service_name, network) {
                (Some(path), ..) => util::read_desired::<NewAllowedNetwork>(&path)?,
                (None, Some(service_name), Some(network)) => NewAllowedNetwork {
                    service_name,
                    network,
                    description,
                },
                _ => {
                    return Err(CliError::Validation {
                        field: "create".into(),
                        reason: "--service-name and --network are required without --from-file"
                            .into(),
                    });
                }
            };

            let applied = handler.create(&desired).await?;
            util::print_state(&applied.locator.to_string(), Some(&applied.attributes), out)
        }

        AllowedNetworkCommand::Show { target } => {
            let locator = AllowedNetworkLocator::from(target);
            let attrs = handler.read(&locator).await?;
            util::print_state(&locator.to_string(), attrs.as_ref(), out)
        }

        AllowedNetworkCommand::Update {
            target,
            description,
        } => {
            let locator = AllowedNetworkLocator::from(target);
            let attrs = handler
                .update(&locator, &AllowedNetworkPatch { description })
                .await?;
            util::print_state(&locator.to_string(), Some(&attrs), out)
        }

        AllowedNetworkCommand::Delete { target } => {
            let locator = AllowedNetworkLocator::from(target);
            handler.delete(&locator).await?;
            util::print_deleted(&locator.to_string(), out);
            Ok(())
        }

        AllowedNetworkCommand::Task { target, task_id } => {
            let locator = AllowedNetworkLocator::from(target).task(task_id);
            let attrs = handler.read_task(&locator).await?;
            util::print_state(&locator.to_string(), attrs.as_ref(), out)
        }
    }
}
