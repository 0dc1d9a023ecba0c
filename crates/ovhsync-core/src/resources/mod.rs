pub mod allowed_network;
pub mod ip_restriction;

pub use allowed_network::{
    AllowedNetwork, AllowedNetworkLocator, AllowedNetworkPatch, AllowedNetworkState,
    AllowedNetworkTaskLocator, AllowedNetworks, DedicatedCloud, DedicatedCloudTask,
    NewAllowedNetwork, TaskState,
};
pub use ip_restriction::{
    DatabaseCluster, IpRestriction, IpRestrictionLocator, IpRestrictionPatch,
    IpRestrictionStatus, IpRestrictions, NewIpRestriction,
};
