// ovhsync-api: Async client for the OVH public REST API.
//
// The `ApiClient` trait is the contract the convergence core consumes;
// `RestClient` is the reqwest-backed implementation of it.

pub mod client;
pub mod endpoint;
pub mod error;
pub mod transport;

pub use client::{ApiClient, RestClient};
pub use endpoint::Endpoint;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};

/// Default API root for the OVH Europe region.
pub const DEFAULT_ENDPOINT: &str = "https://eu.api.ovh.com/1.0";
