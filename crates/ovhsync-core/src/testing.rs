// Scripted in-memory `ApiClient` for unit tests.
//
// Replies are served strictly in call order from a queue, regardless of
// method or path; once the queue is empty the sticky reply (if any) repeats.
#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;

use ovhsync_api::{ApiClient, Endpoint, Error};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ApiFailure(u16);

pub(crate) fn api_error(status: u16) -> ApiFailure {
    ApiFailure(status)
}

#[derive(Debug, Clone)]
enum Reply {
    Ok(Value),
    Err(ApiFailure),
}

#[derive(Default)]
pub(crate) struct ScriptedClient {
    script: Mutex<VecDeque<Reply>>,
    sticky: Option<Reply>,
    calls: Mutex<Vec<String>>,
    bodies: Mutex<Vec<Value>>,
}

impl ScriptedClient {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn ok(self, value: Value) -> Self {
        self.script.lock().unwrap().push_back(Reply::Ok(value));
        self
    }

    pub(crate) fn err(self, failure: ApiFailure) -> Self {
        self.script.lock().unwrap().push_back(Reply::Err(failure));
        self
    }

    pub(crate) fn ok_forever(mut self, value: Value) -> Self {
        self.sticky = Some(Reply::Ok(value));
        self
    }

    pub(crate) fn err_forever(mut self, failure: ApiFailure) -> Self {
        self.sticky = Some(Reply::Err(failure));
        self
    }

    /// `"METHOD /path"` for every call made, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Request bodies sent with POST and PUT, in order.
    pub(crate) fn bodies(&self) -> Vec<Value> {
        self.bodies.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, method: &str) -> usize {
        let prefix = format!("{method} ");
        self.calls().iter().filter(|c| c.starts_with(&prefix)).count()
    }

    fn reply<T: DeserializeOwned>(&self, method: &str, endpoint: &Endpoint) -> Result<T, Error> {
        self.calls.lock().unwrap().push(format!("{method} {endpoint}"));

        let next = self.script.lock().unwrap().pop_front();
        let reply = next
            .or_else(|| self.sticky.clone())
            .unwrap_or_else(|| panic!("script exhausted at {method} {endpoint}"));

        match reply {
            Reply::Ok(value) => {
                serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body: value.to_string(),
                })
            }
            Reply::Err(ApiFailure(status)) => Err(Error::Api {
                status,
                class: None,
                message: format!("scripted HTTP {status}"),
            }),
        }
    }

    fn record_body<B: Serialize>(&self, body: &B) {
        self.bodies
            .lock()
            .unwrap()
            .push(serde_json::to_value(body).unwrap());
    }
}

impl ApiClient for ScriptedClient {
    async fn get<T>(&self, endpoint: &Endpoint) -> Result<T, Error>
    where
        T: DeserializeOwned + Send,
    {
        self.reply("GET", endpoint)
    }

    async fn post<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        self.record_body(body);
        self.reply("POST", endpoint)
    }

    async fn put<B, T>(&self, endpoint: &Endpoint, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        self.record_body(body);
        self.reply("PUT", endpoint)
    }

    async fn delete<T>(&self, endpoint: &Endpoint) -> Result<T, Error>
    where
        T: DeserializeOwned + Send,
    {
        self.reply("DELETE", endpoint)
    }
}
