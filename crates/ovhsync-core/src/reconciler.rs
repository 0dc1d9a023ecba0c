// ── Reconciler ──
//
// The read path: fetch the remote object and map it onto local attributes.
// A 404 means "clear local state", not an error.

use ovhsync_api::{ApiClient, Endpoint};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::attributes::{AttributeMapping, Attributes};
use crate::error::ConvergeError;

#[derive(Debug, Clone, Copy, Default)]
pub struct Reconciler;

impl Reconciler {
    /// Fetch the remote object, `None` if it no longer exists.
    pub async fn fetch<C, T>(
        &self,
        client: &C,
        endpoint: &Endpoint,
    ) -> Result<Option<T>, ConvergeError>
    where
        C: ApiClient,
        T: DeserializeOwned + Send,
    {
        match client.get::<T>(endpoint).await {
            Ok(remote) => Ok(Some(remote)),
            Err(e) if e.is_not_found() => {
                debug!(%endpoint, "remote object gone, local state should be cleared");
                Ok(None)
            }
            Err(source) => Err(ConvergeError::Api {
                method: "GET",
                endpoint: endpoint.to_string(),
                payload: "{}".into(),
                source,
            }),
        }
    }

    /// Fetch and map onto attributes.
    pub async fn sync<C, T>(
        &self,
        client: &C,
        endpoint: &Endpoint,
    ) -> Result<Option<Attributes>, ConvergeError>
    where
        C: ApiClient,
        T: AttributeMapping + Send,
    {
        match self.fetch::<C, T>(client, endpoint).await? {
            Some(remote) => Ok(Some(remote.to_attributes()?)),
            None => Ok(None),
        }
    }

    /// Read-after-write: the object must exist.
    pub async fn sync_existing<C, T>(
        &self,
        client: &C,
        endpoint: &Endpoint,
    ) -> Result<Attributes, ConvergeError>
    where
        C: ApiClient,
        T: AttributeMapping + Send,
    {
        self.sync::<C, T>(client, endpoint)
            .await?
            .ok_or_else(|| ConvergeError::NotFound {
                endpoint: endpoint.to_string(),
            })
    }
}
