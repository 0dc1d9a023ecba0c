// ── Poller ──
//
// Reads a remote object on a fixed interval until a predicate says it is
// ready, failed, or the deadline passes. Read failures other than 404 are
// treated as "not yet" and never end the wait early.

use std::time::Duration;

use ovhsync_api::{ApiClient, Endpoint};
use serde::de::DeserializeOwned;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

use crate::error::ConvergeError;

/// One status read.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation<T> {
    Found(T),
    /// The read answered 404.
    Gone,
}

impl<T> Observation<T> {
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(t) => Some(t),
            Self::Gone => None,
        }
    }
}

/// What a predicate makes of an observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Ready,
    /// The remote operation aborted; carries the diagnostic to surface.
    Failed(String),
}

/// A remote representation that exposes a status label.
pub trait RemoteStatus {
    fn status_label(&self) -> String;
}

/// Where to poll and how to judge what comes back.
pub struct ConvergencePlan<S> {
    pub endpoint: Endpoint,
    pub check: fn(&Observation<S>) -> Decision,
}

impl<S> ConvergencePlan<S> {
    pub fn new(endpoint: Endpoint, check: fn(&Observation<S>) -> Decision) -> Self {
        Self { endpoint, check }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Poll `plan.endpoint` until `plan.check` decides, or `deadline` passes.
    ///
    /// The first read happens immediately. Returns the observation that was
    /// judged ready.
    pub async fn wait_until<C, S>(
        &self,
        client: &C,
        plan: &ConvergencePlan<S>,
        deadline: Instant,
    ) -> Result<Observation<S>, ConvergeError>
    where
        C: ApiClient,
        S: DeserializeOwned + RemoteStatus + Send,
    {
        let started = Instant::now();
        let mut reads: u32 = 0;
        let mut last_observed: Option<String> = None;

        loop {
            reads += 1;
            let observation = match client.get::<S>(&plan.endpoint).await {
                Ok(remote) => Some(Observation::Found(remote)),
                Err(e) if e.is_not_found() => Some(Observation::Gone),
                Err(e) => {
                    warn!(endpoint = %plan.endpoint, error = %e, "status read failed, will retry");
                    last_observed = Some(format!("read failed: {e}"));
                    None
                }
            };

            if let Some(observation) = observation {
                let label = match &observation {
                    Observation::Found(remote) => remote.status_label(),
                    Observation::Gone => "not found".to_owned(),
                };

                match (plan.check)(&observation) {
                    Decision::Ready => {
                        debug!(endpoint = %plan.endpoint, reads, status = %label, "converged");
                        return Ok(observation);
                    }
                    Decision::Failed(message) => {
                        return Err(ConvergeError::RemoteFailure {
                            endpoint: plan.endpoint.to_string(),
                            status: label,
                            message,
                        });
                    }
                    Decision::Continue => {
                        debug!(endpoint = %plan.endpoint, reads, status = %label, "not converged yet");
                        last_observed = Some(label);
                    }
                }
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ConvergeError::Timeout {
                    endpoint: plan.endpoint.to_string(),
                    waited: now - started,
                    last_observed,
                });
            }
            sleep(self.interval.min(deadline - now)).await;
        }
    }
}
