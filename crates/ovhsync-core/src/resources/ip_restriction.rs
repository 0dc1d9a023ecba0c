// ── Managed-database IP restriction ──
//
// `/cloud/project/{service}/database/{engine}/{cluster}/ipRestriction/{ip}`.
// The object itself carries the status the poller watches: it goes
// CREATING/UPDATING -> READY, or DELETING -> 404.

use std::fmt;

use ovhsync_api::{ApiClient, Endpoint};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::{AttributeMapping, Attributes};
use crate::error::ConvergeError;
use crate::executor::Mutation;
use crate::lifecycle::MutationKind;
use crate::poller::{ConvergencePlan, Decision, Observation, RemoteStatus};
use crate::resource::{Applied, Engine, Resource};

// ── Locators ────────────────────────────────────────────────────────

/// The database cluster an IP restriction belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatabaseCluster {
    pub service_name: String,
    pub engine: String,
    pub cluster_id: String,
}

impl DatabaseCluster {
    pub fn new(
        service_name: impl Into<String>,
        engine: impl Into<String>,
        cluster_id: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            engine: engine.into(),
            cluster_id: cluster_id.into(),
        }
    }

    /// Collection endpoint for this cluster's IP restrictions.
    pub fn ip_restrictions(&self) -> Endpoint {
        Endpoint::new("cloud")
            .push("project")
            .push(&self.service_name)
            .push("database")
            .push(&self.engine)
            .push(&self.cluster_id)
            .push("ipRestriction")
    }

    pub fn restriction(&self, ip: impl Into<String>) -> IpRestrictionLocator {
        IpRestrictionLocator {
            cluster: self.clone(),
            ip: ip.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpRestrictionLocator {
    #[serde(flatten)]
    pub cluster: DatabaseCluster,
    pub ip: String,
}

impl IpRestrictionLocator {
    pub fn endpoint(&self) -> Endpoint {
        self.cluster.ip_restrictions().push(&self.ip)
    }
}

impl fmt::Display for IpRestrictionLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.cluster.service_name, self.cluster.engine, self.cluster.cluster_id, self.ip
        )
    }
}

// ── Remote object ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IpRestrictionStatus {
    Creating,
    Deleting,
    Error,
    Ready,
    Updating,
    /// Anything the API adds later, kept verbatim.
    #[serde(untagged)]
    Other(String),
}

impl IpRestrictionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Creating => "CREATING",
            Self::Deleting => "DELETING",
            Self::Error => "ERROR",
            Self::Ready => "READY",
            Self::Updating => "UPDATING",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for IpRestrictionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRestriction {
    pub ip: String,
    #[serde(default)]
    pub description: String,
    pub status: IpRestrictionStatus,
}

impl AttributeMapping for IpRestriction {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("ip", "ip"),
        ("description", "description"),
        ("status", "status"),
    ];
}

impl RemoteStatus for IpRestriction {
    fn status_label(&self) -> String {
        self.status.to_string()
    }
}

// ── Desired state ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewIpRestriction {
    #[serde(flatten)]
    pub cluster: DatabaseCluster,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AttributeMapping for NewIpRestriction {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("service_name", "service_name"),
        ("engine", "engine"),
        ("cluster_id", "cluster_id"),
        ("ip", "ip"),
        ("description", "description"),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpRestrictionPatch {
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    ip: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

// ── Convergence predicates ──────────────────────────────────────────

fn failed(restriction: &IpRestriction) -> Decision {
    Decision::Failed(format!(
        "IP restriction {} is in {} status",
        restriction.ip, restriction.status
    ))
}

fn await_ready(obs: &Observation<IpRestriction>) -> Decision {
    match obs {
        Observation::Found(r) => match r.status {
            IpRestrictionStatus::Ready => Decision::Ready,
            IpRestrictionStatus::Error => failed(r),
            _ => Decision::Continue,
        },
        // Not visible yet right after the POST.
        Observation::Gone => Decision::Continue,
    }
}

fn await_removed(obs: &Observation<IpRestriction>) -> Decision {
    match obs {
        Observation::Gone => Decision::Ready,
        Observation::Found(r) if r.status == IpRestrictionStatus::Error => failed(r),
        Observation::Found(_) => Decision::Continue,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

/// IP restriction handler bound to an API client.
pub struct IpRestrictions<'a, C> {
    client: &'a C,
    engine: &'a Engine,
}

impl<'a, C: ApiClient> IpRestrictions<'a, C> {
    pub fn new(client: &'a C, engine: &'a Engine) -> Self {
        Self { client, engine }
    }
}

impl<C: ApiClient> Resource for IpRestrictions<'_, C> {
    type Locator = IpRestrictionLocator;
    type Desired = NewIpRestriction;
    type Patch = IpRestrictionPatch;

    async fn create(
        &self,
        desired: &NewIpRestriction,
    ) -> Result<Applied<IpRestrictionLocator>, ConvergeError> {
        let body = CreateRequest {
            ip: &desired.ip,
            description: desired.description.as_deref(),
        };
        let collection = desired.cluster.ip_restrictions();
        debug!(
            ip = %desired.ip,
            cluster = %desired.cluster.cluster_id,
            service = %desired.cluster.service_name,
            "creating IP restriction"
        );

        let outcome = self
            .engine
            .executor()
            .execute(
                self.client,
                &Mutation::create(collection.clone(), &body),
                self.engine.deadline(MutationKind::Create),
                |created: &IpRestriction| {
                    Ok(ConvergencePlan::new(
                        desired.cluster.restriction(&created.ip).endpoint(),
                        await_ready,
                    ))
                },
            )
            .await?;

        let created = outcome
            .response
            .ok_or_else(|| ConvergeError::UnexpectedResponse {
                endpoint: collection.to_string(),
                reason: "create returned no IP restriction".into(),
            })?;
        let locator = desired.cluster.restriction(created.ip);
        let attributes = self
            .engine
            .reconciler()
            .sync_existing::<C, IpRestriction>(self.client, &locator.endpoint())
            .await?;

        Ok(Applied {
            locator,
            attributes,
        })
    }

    async fn read(
        &self,
        locator: &IpRestrictionLocator,
    ) -> Result<Option<Attributes>, ConvergeError> {
        debug!(%locator, "reading IP restriction");
        self.engine
            .reconciler()
            .sync::<C, IpRestriction>(self.client, &locator.endpoint())
            .await
    }

    async fn update(
        &self,
        locator: &IpRestrictionLocator,
        patch: &IpRestrictionPatch,
    ) -> Result<Attributes, ConvergeError> {
        let endpoint = locator.endpoint();
        debug!(%locator, ?patch, "updating IP restriction");

        self.engine
            .executor()
            .execute(
                self.client,
                &Mutation::update(endpoint.clone(), patch),
                self.engine.deadline(MutationKind::Update),
                |_: &IgnoredAny| Ok(ConvergencePlan::new(endpoint.clone(), await_ready)),
            )
            .await?;

        self.engine
            .reconciler()
            .sync_existing::<C, IpRestriction>(self.client, &endpoint)
            .await
    }

    async fn delete(&self, locator: &IpRestrictionLocator) -> Result<(), ConvergeError> {
        let endpoint = locator.endpoint();
        debug!(%locator, "deleting IP restriction");

        self.engine
            .executor()
            .execute::<C, (), IgnoredAny, IpRestriction, _>(
                self.client,
                &Mutation::delete(endpoint.clone()),
                self.engine.deadline(MutationKind::Delete),
                |_| Ok(ConvergencePlan::new(endpoint.clone(), await_removed)),
            )
            .await?;
        Ok(())
    }
}
