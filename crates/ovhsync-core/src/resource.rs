// ── Caller contract ──
//
// What the declarative-state layer sees: four operations per resource type,
// each awaiting convergence (or failure) before it returns.

use std::future::Future;

use ovhsync_api::ApiClient;
use serde::Serialize;
use tokio::time::Instant;

use crate::attributes::Attributes;
use crate::config::{EngineConfig, Timeouts};
use crate::error::ConvergeError;
use crate::executor::MutationExecutor;
use crate::lifecycle::MutationKind;
use crate::reconciler::Reconciler;
use crate::resources::{AllowedNetworks, IpRestrictions};

/// Result of a create: the new object's locator and what the server stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Applied<L> {
    pub locator: L,
    pub attributes: Attributes,
}

pub trait Resource {
    type Locator: Send + Sync;
    type Desired: Send + Sync;
    type Patch: Send + Sync;

    /// Create, wait for the object to be ready, then read it back.
    fn create(
        &self,
        desired: &Self::Desired,
    ) -> impl Future<Output = Result<Applied<Self::Locator>, ConvergeError>> + Send;

    /// `Ok(None)` when the object no longer exists.
    fn read(
        &self,
        locator: &Self::Locator,
    ) -> impl Future<Output = Result<Option<Attributes>, ConvergeError>> + Send;

    /// Update, wait for the object to be ready, then read it back.
    fn update(
        &self,
        locator: &Self::Locator,
        patch: &Self::Patch,
    ) -> impl Future<Output = Result<Attributes, ConvergeError>> + Send;

    /// Delete and wait until the object is gone. Deleting a missing object
    /// succeeds.
    fn delete(
        &self,
        locator: &Self::Locator,
    ) -> impl Future<Output = Result<(), ConvergeError>> + Send;
}

/// Shared convergence machinery for every resource handler.
#[derive(Debug, Clone)]
pub struct Engine {
    executor: MutationExecutor,
    reconciler: Reconciler,
    timeouts: Timeouts,
}

impl Engine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            executor: MutationExecutor::new(config),
            reconciler: Reconciler,
            timeouts: config.timeouts,
        }
    }

    pub fn executor(&self) -> &MutationExecutor {
        &self.executor
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Deadline for a mutation of the given kind starting now.
    pub fn deadline(&self, kind: MutationKind) -> Instant {
        let timeout = match kind {
            MutationKind::Create => self.timeouts.create,
            MutationKind::Update => self.timeouts.update,
            MutationKind::Delete => self.timeouts.delete,
        };
        Instant::now() + timeout
    }

    pub fn ip_restrictions<'a, C: ApiClient>(&'a self, client: &'a C) -> IpRestrictions<'a, C> {
        IpRestrictions::new(client, self)
    }

    pub fn allowed_networks<'a, C: ApiClient>(&'a self, client: &'a C) -> AllowedNetworks<'a, C> {
        AllowedNetworks::new(client, self)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
