//! Database IP restriction command handlers.

use ovhsync_api::RestClient;
use ovhsync_core::{
    DatabaseCluster, Engine, IpRestrictionLocator, IpRestrictionPatch, NewIpRestriction, Resource,
};

use crate::cli::{IpRestrictionArgs, IpRestrictionCommand, IpRestrictionTarget};
use crate::error::CliError;
use crate::output::OutputOpts;

use super::util;

impl From<IpRestrictionTarget> for IpRestrictionLocator {
    fn from(t: IpRestrictionTarget) -> Self {
        DatabaseCluster::new(t.service_name, t.engine, t.cluster_id).restriction(t.ip)
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &RestClient,
    engine: &Engine,
    args: IpRestrictionArgs,
    out: &OutputOpts,
) -> Result<(), CliError> {
    let handler = engine.ip_restrictions(client);

    match args.command {
        IpRestrictionCommand::Create {
            service_name,
            engine: db_engine,
            cluster_id,
            ip,
            description,
            from_file,
        } => {
            let desired = match (from_file, service_name, db_engine, cluster_id, ip) {
                (Some(path), ..) => util::read_desired::<NewIpRestriction>(&path)?,
                (None, Some(service_name), Some(db_engine), Some(cluster_id), Some(ip)) => {
                    NewIpRestriction {
                        cluster: DatabaseCluster::new(service_name, db_engine, cluster_id),
                        ip,
                        description,
                    }
                }
                _ => {
                    return Err(CliError::Validation {
                        field: "create".into(),
                        reason: "--service-name, --engine, --cluster-id and --ip are required \
                                 without --from-file"
                            .into(),
                    });
                }
            };

            let applied = handler.create(&desired).await?;
            util::print_state(&applied.locator.to_string(), Some(&applied.attributes), out)
        }

        IpRestrictionCommand::Show { target } => {
            let locator = IpRestrictionLocator::from(target);
            let attrs = handler.read(&locator).await?;
            util::print_state(&locator.to_string(), attrs.as_ref(), out)
        }

        IpRestrictionCommand::Update {
            target,
            description,
        } => {
            let locator = IpRestrictionLocator::from(target);
            let attrs = handler
                .update(&locator, &IpRestrictionPatch { description })
                .await?;
            util::print_state(&locator.to_string(), Some(&attrs), out)
        }

        IpRestrictionCommand::Delete { target } => {
            let locator = IpRestrictionLocator::from(target);
            handler.delete(&locator).await?;
            util::print_deleted(&locator.to_string(), out);
            Ok(())
        }
    }
}
