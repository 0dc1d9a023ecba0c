//! Convergence engine between `ovhsync-api` and declarative-state callers.
//!
//! OVH mutations are accepted long before they take effect. Every operation
//! this crate exposes therefore submits, waits, and reads back before it
//! returns:
//!
//! - **[`MutationExecutor`]** issues one create/update/delete call, retrying
//!   only while the API answers 409 Conflict, and drives the mutation's
//!   [`Lifecycle`].
//!
//! - **[`Poller`]** re-reads the remote object (or its task) on a fixed
//!   interval until a predicate declares it ready or failed, or the deadline
//!   passes.
//!
//! - **[`Reconciler`]** maps what the server persisted onto an
//!   [`Attributes`] bag, and reports a vanished object as `None`.
//!
//! - **Resources** ([`resources`]) wire these together for database IP
//!   restrictions and dedicated-cloud allowed networks behind the
//!   [`Resource`] trait.

pub mod attributes;
pub mod config;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod poller;
pub mod reconciler;
pub mod resource;
pub mod resources;

#[cfg(test)]
mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use attributes::{AttributeMapping, Attributes};
pub use config::{Backoff, EngineConfig, Timeouts};
pub use error::ConvergeError;
pub use executor::{Mutation, MutationExecutor, Outcome};
pub use lifecycle::{Lifecycle, LifecycleEvent, LifecycleState, MutationKind};
pub use poller::{ConvergencePlan, Decision, Observation, Poller, RemoteStatus};
pub use reconciler::Reconciler;
pub use resource::{Applied, Engine, Resource};
pub use resources::{
    AllowedNetwork, AllowedNetworkLocator, AllowedNetworkPatch, AllowedNetworkState,
    AllowedNetworkTaskLocator, AllowedNetworks, DatabaseCluster, DedicatedCloud,
    DedicatedCloudTask, IpRestriction, IpRestrictionLocator, IpRestrictionPatch,
    IpRestrictionStatus, IpRestrictions, NewAllowedNetwork, NewIpRestriction, TaskState,
};
