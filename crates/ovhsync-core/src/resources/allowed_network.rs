// ── Dedicated-cloud allowed network ──
//
// `/dedicatedCloud/{service}/allowedNetwork/{networkAccessId}`.
// Mutations answer with a task (`.../task/{taskId}`); create waits on the
// task, update and delete wait on the allowed network itself.

use std::fmt;

use chrono::{DateTime, FixedOffset};
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

/// A dedicated-cloud service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedicatedCloud {
    pub service_name: String,
}

impl DedicatedCloud {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    pub fn allowed_networks(&self) -> Endpoint {
        Endpoint::new("dedicatedCloud")
            .push(&self.service_name)
            .push("allowedNetwork")
    }

    pub fn allowed_network(&self, network_access_id: i64) -> AllowedNetworkLocator {
        AllowedNetworkLocator {
            service_name: self.service_name.clone(),
            network_access_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedNetworkLocator {
    pub service_name: String,
    pub network_access_id: i64,
}

impl AllowedNetworkLocator {
    pub fn endpoint(&self) -> Endpoint {
        DedicatedCloud::new(&self.service_name)
            .allowed_networks()
            .push(self.network_access_id)
    }

    pub fn task(&self, task_id: i64) -> AllowedNetworkTaskLocator {
        AllowedNetworkTaskLocator {
            network: self.clone(),
            task_id,
        }
    }
}

impl fmt::Display for AllowedNetworkLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_name, self.network_access_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AllowedNetworkTaskLocator {
    #[serde(flatten)]
    pub network: AllowedNetworkLocator,
    pub task_id: i64,
}

impl AllowedNetworkTaskLocator {
    pub fn endpoint(&self) -> Endpoint {
        self.network.endpoint().push("task").push(self.task_id)
    }
}

impl fmt::Display for AllowedNetworkTaskLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.task_id)
    }
}

// ── Allowed network ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AllowedNetworkState {
    Allowed,
    Creating,
    Deleting,
    Error,
    ToCreate,
    ToDelete,
    ToUpdate,
    Unknown,
    Updating,
    #[serde(untagged)]
    Other(String),
}

impl AllowedNetworkState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Allowed => "allowed",
            Self::Creating => "creating",
            Self::Deleting => "deleting",
            Self::Error => "error",
            Self::ToCreate => "toCreate",
            Self::ToDelete => "toDelete",
            Self::ToUpdate => "toUpdate",
            Self::Unknown => "unknown",
            Self::Updating => "updating",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for AllowedNetworkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowedNetwork {
    pub network_access_id: i64,
    pub network: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: AllowedNetworkState,
}

impl AttributeMapping for AllowedNetwork {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("network_access_id", "networkAccessId"),
        ("network", "network"),
        ("description", "description"),
        ("state", "state"),
    ];
}

impl RemoteStatus for AllowedNetwork {
    fn status_label(&self) -> String {
        self.state.to_string()
    }
}

// ── Tasks ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    Canceled,
    Doing,
    Done,
    Error,
    Fixing,
    ToCancel,
    ToCreate,
    Todo,
    Unknown,
    WaitingForChilds,
    WaitingTodo,
    #[serde(untagged)]
    Other(String),
}

impl TaskState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Canceled => "canceled",
            Self::Doing => "doing",
            Self::Done => "done",
            Self::Error => "error",
            Self::Fixing => "fixing",
            Self::ToCancel => "toCancel",
            Self::ToCreate => "toCreate",
            Self::Todo => "todo",
            Self::Unknown => "unknown",
            Self::WaitingForChilds => "waitingForChilds",
            Self::WaitingTodo => "waitingTodo",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dedicated-cloud operation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DedicatedCloudTask {
    pub task_id: i64,
    #[serde(default)]
    pub network_access_id: Option<i64>,
    #[serde(default)]
    pub name: String,
    pub state: TaskState,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_from: Option<String>,
    #[serde(default)]
    pub datacenter_id: Option<i64>,
    #[serde(default)]
    pub end_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub execution_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub filer_id: Option<i64>,
    #[serde(default)]
    pub host_id: Option<i64>,
    #[serde(default)]
    pub last_modification_date: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub maintenance_date_from: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub maintenance_date_to: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub order_id: Option<i64>,
    #[serde(default)]
    pub parent_task_id: Option<i64>,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub vlan_id: Option<i64>,
}

impl AttributeMapping for DedicatedCloudTask {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("task_id", "taskId"),
        ("network_access_id", "networkAccessId"),
        ("name", "name"),
        ("state", "state"),
        ("progress", "progress"),
        ("description", "description"),
        ("created_by", "createdBy"),
        ("created_from", "createdFrom"),
        ("datacenter_id", "datacenterId"),
        ("end_date", "endDate"),
        ("execution_date", "executionDate"),
        ("filer_id", "filerId"),
        ("host_id", "hostId"),
        ("last_modification_date", "lastModificationDate"),
        ("maintenance_date_from", "maintenanceDateFrom"),
        ("maintenance_date_to", "maintenanceDateTo"),
        ("network", "network"),
        ("order_id", "orderId"),
        ("parent_task_id", "parentTaskId"),
        ("type", "type"),
        ("user_id", "userId"),
        ("vlan_id", "vlanId"),
    ];
}

impl RemoteStatus for DedicatedCloudTask {
    fn status_label(&self) -> String {
        self.state.to_string()
    }
}

// ── Desired state ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAllowedNetwork {
    pub service_name: String,
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl AttributeMapping for NewAllowedNetwork {
    const FIELDS: &'static [(&'static str, &'static str)] = &[
        ("service_name", "service_name"),
        ("network", "network"),
        ("description", "description"),
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedNetworkPatch {
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize)]
struct CreateRequest<'a> {
    network: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

// ── Convergence predicates ──────────────────────────────────────────

fn await_task_done(obs: &Observation<DedicatedCloudTask>) -> Decision {
    match obs {
        Observation::Found(task) => match task.state {
            TaskState::Done => Decision::Ready,
            TaskState::Error | TaskState::Canceled => Decision::Failed(format!(
                "task {} ({}) ended in state {}",
                task.task_id, task.name, task.state
            )),
            _ => Decision::Continue,
        },
        Observation::Gone => Decision::Continue,
    }
}

fn network_failed(network: &AllowedNetwork) -> Decision {
    Decision::Failed(format!(
        "allowed network {} ({}) is in state {}",
        network.network_access_id, network.network, network.state
    ))
}

fn await_allowed(obs: &Observation<AllowedNetwork>) -> Decision {
    match obs {
        Observation::Found(n) => match n.state {
            AllowedNetworkState::Allowed => Decision::Ready,
            AllowedNetworkState::Error => network_failed(n),
            _ => Decision::Continue,
        },
        Observation::Gone => Decision::Failed("allowed network disappeared during update".into()),
    }
}

fn await_removed(obs: &Observation<AllowedNetwork>) -> Decision {
    match obs {
        Observation::Gone => Decision::Ready,
        Observation::Found(n) if n.state == AllowedNetworkState::Error => network_failed(n),
        Observation::Found(_) => Decision::Continue,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

/// Allowed network handler bound to an API client.
pub struct AllowedNetworks<'a, C> {
    client: &'a C,
    engine: &'a Engine,
}

impl<'a, C: ApiClient> AllowedNetworks<'a, C> {
    pub fn new(client: &'a C, engine: &'a Engine) -> Self {
        Self { client, engine }
    }

    /// Reconcile one task, `None` once the API no longer knows it.
    pub async fn read_task(
        &self,
        locator: &AllowedNetworkTaskLocator,
    ) -> Result<Option<Attributes>, ConvergeError> {
        debug!(%locator, "reading allowed network task");
        self.engine
            .reconciler()
            .sync::<C, DedicatedCloudTask>(self.client, &locator.endpoint())
            .await
    }
}

impl<C: ApiClient> Resource for AllowedNetworks<'_, C> {
    type Locator = AllowedNetworkLocator;
    type Desired = NewAllowedNetwork;
    type Patch = AllowedNetworkPatch;

    async fn create(
        &self,
        desired: &NewAllowedNetwork,
    ) -> Result<Applied<AllowedNetworkLocator>, ConvergeError> {
        let service = DedicatedCloud::new(&desired.service_name);
        let collection = service.allowed_networks();
        let body = CreateRequest {
            network: &desired.network,
            description: desired.description.as_deref(),
        };
        debug!(service = %desired.service_name, network = %desired.network, "creating allowed network");

        let missing_id = || ConvergeError::UnexpectedResponse {
            endpoint: collection.to_string(),
            reason: "task carries no networkAccessId".into(),
        };

        let outcome = self
            .engine
            .executor()
            .execute(
                self.client,
                &Mutation::create(collection.clone(), &body),
                self.engine.deadline(MutationKind::Create),
                |task: &DedicatedCloudTask| {
                    let id = task.network_access_id.ok_or_else(missing_id)?;
                    Ok(ConvergencePlan::new(
                        service.allowed_network(id).task(task.task_id).endpoint(),
                        await_task_done,
                    ))
                },
            )
            .await?;

        let id = outcome
            .response
            .and_then(|task| task.network_access_id)
            .ok_or_else(missing_id)?;
        let locator = service.allowed_network(id);
        let attributes = self
            .engine
            .reconciler()
            .sync_existing::<C, AllowedNetwork>(self.client, &locator.endpoint())
            .await?;

        Ok(Applied {
            locator,
            attributes,
        })
    }

    async fn read(
        &self,
        locator: &AllowedNetworkLocator,
    ) -> Result<Option<Attributes>, ConvergeError> {
        debug!(%locator, "reading allowed network");
        self.engine
            .reconciler()
            .sync::<C, AllowedNetwork>(self.client, &locator.endpoint())
            .await
    }

    async fn update(
        &self,
        locator: &AllowedNetworkLocator,
        patch: &AllowedNetworkPatch,
    ) -> Result<Attributes, ConvergeError> {
        let endpoint = locator.endpoint();
        debug!(%locator, ?patch, "updating allowed network");

        self.engine
            .executor()
            .execute(
                self.client,
                &Mutation::update(endpoint.clone(), patch),
                self.engine.deadline(MutationKind::Update),
                |_: &IgnoredAny| Ok(ConvergencePlan::new(endpoint.clone(), await_allowed)),
            )
            .await?;

        self.engine
            .reconciler()
            .sync_existing::<C, AllowedNetwork>(self.client, &endpoint)
            .await
    }

    async fn delete(&self, locator: &AllowedNetworkLocator) -> Result<(), ConvergeError> {
        let endpoint = locator.endpoint();
        debug!(%locator, "deleting allowed network");

        self.engine
            .executor()
            .execute::<C, (), IgnoredAny, AllowedNetwork, _>(
                self.client,
                &Mutation::delete(endpoint.clone()),
                self.engine.deadline(MutationKind::Delete),
                |_| Ok(ConvergencePlan::new(endpoint.clone(), await_removed)),
            )
            .await?;
        Ok(())
    }
}
