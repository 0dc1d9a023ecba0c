// OVH REST client
//
// Wraps `reqwest::Client` with endpoint resolution, JSON body handling and
// OVH error-body parsing. The `ApiClient` trait is the seam the convergence
// core programs against, so tests can swap in scripted clients.

use std::future::Future;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::endpoint::Endpoint;
use crate::error::Error;
use crate::transport::TransportConfig;

// ── Contract ─────────────────────────────────────────────────────────

/// The four calls the convergence core is allowed to make.
///
/// Every failure that came back from the API must surface as an [`Error`]
/// whose [`Error::status`] is set, so conflicts and missing objects can be
/// recognised.
pub trait ApiClient: Send + Sync {
    fn get<T>(&self, endpoint: &Endpoint) -> impl Future<Output = Result<T, Error>> + Send
    where
        T: DeserializeOwned + Send;

    fn post<B, T>(
        &self,
        endpoint: &Endpoint,
        body: &B,
    ) -> impl Future<Output = Result<T, Error>> + Send
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send;

    fn put<B, T>(
        &self,
        endpoint: &Endpoint,
        body: &B,
    ) -> impl Future<Output = Result<T, Error>> + Send
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send;

    fn delete<T>(&self, endpoint: &Endpoint) -> impl Future<Output = Result<T, Error>> + Send
    where
        T: DeserializeOwned + Send;
}

// ── Error response shape ─────────────────────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    class: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// At most the first 200 characters of a response body, cut on a char
/// boundary.
fn preview(body: &str) -> &str {
    body.char_indices().nth(200).map_or(body, |(i, _)| &body[..i])
}

// ── Client ───────────────────────────────────────────────────────────

/// reqwest-backed [`ApiClient`].
///
/// Request signing is not handled here; put a signing proxy or a client
/// with default auth headers in front when talking to the real API.
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    /// Create a client for the given API root from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url))
    }

    /// Wrap a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The API root URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &Endpoint) -> Result<Url, Error> {
        Ok(endpoint.to_url(&self.base_url)?)
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await?;
        trace!(%status, body_len = body.len(), "response received");

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        // DELETE and PUT frequently answer with an empty body.
        let text = if body.trim().is_empty() {
            "null"
        } else {
            body.as_str()
        };
        serde_json::from_str(text).map_err(|e| {
            let head = preview(&body);
            Error::Deserialization {
                message: format!("{e} (body preview: {head:?})"),
                body: body.clone(),
            }
        })
    }

    fn parse_error(status: reqwest::StatusCode, raw: &str) -> Error {
        match serde_json::from_str::<ErrorResponse>(raw) {
            Ok(err) => Error::Api {
                status: status.as_u16(),
                class: err.class,
                message: err.message.unwrap_or_else(|| status.to_string()),
            },
            Err(_) => Error::Api {
                status: status.as_u16(),
                class: None,
                message: if raw.is_empty() {
                    status.to_string()
                } else {
                    preview(raw).to_owned()
                },
            },
        }
    }
}

impl ApiClient for RestClient {
    async fn get<T>(&self, endpoint: &Endpoint) -> Result<T, Error>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.url(endpoint)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        Self::handle_response(resp).await
    }

    async fn post<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let url = self.url(endpoint)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn put<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let url = self.url(endpoint)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        Self::handle_response(resp).await
    }

    async fn delete<T>(&self, endpoint: &Endpoint) -> Result<T, Error>
    where
        T: DeserializeOwned + Send,
    {
        let url = self.url(endpoint)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        Self::handle_response(resp).await
    }
}
