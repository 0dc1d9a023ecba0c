// ── Mutation executor ──
//
// Submits one create/update/delete call, retrying only while the API
// answers with a conflict, then hands the accepted mutation to the poller.
// Drives the lifecycle state machine for the mutation as it goes.

use ovhsync_api::{ApiClient, Endpoint};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::config::{Backoff, EngineConfig};
use crate::error::ConvergeError;
use crate::lifecycle::{Lifecycle, LifecycleEvent, LifecycleState, MutationKind};
use crate::poller::{ConvergencePlan, Observation, Poller, RemoteStatus};

/// One mutation call: what to send and where.
#[derive(Debug)]
pub struct Mutation<'a, B> {
    kind: MutationKind,
    endpoint: Endpoint,
    body: &'a B,
}

impl<'a, B: Serialize + Sync> Mutation<'a, B> {
    pub fn create(endpoint: Endpoint, body: &'a B) -> Self {
        Self {
            kind: MutationKind::Create,
            endpoint,
            body,
        }
    }

    pub fn update(endpoint: Endpoint, body: &'a B) -> Self {
        Self {
            kind: MutationKind::Update,
            endpoint,
            body,
        }
    }

    /// The JSON payload, for diagnostics.
    fn payload(&self) -> String {
        match self.kind {
            MutationKind::Delete => "{}".to_owned(),
            MutationKind::Create | MutationKind::Update => serde_json::to_string(self.body)
                .unwrap_or_else(|e| format!("<unserializable: {e}>")),
        }
    }
}

impl Mutation<'static, ()> {
    pub fn delete(endpoint: Endpoint) -> Self {
        Self {
            kind: MutationKind::Delete,
            endpoint,
            body: &(),
        }
    }
}

/// How a mutation ended when it did not fail.
#[derive(Debug)]
pub struct Outcome<R> {
    /// Submit response. `None` when a delete found the object already gone.
    pub response: Option<R>,
    /// Number of submit calls issued, conflicts included.
    pub attempts: u32,
    pub state: LifecycleState,
}

#[derive(Debug, Clone)]
pub struct MutationExecutor {
    poller: Poller,
    backoff: Backoff,
    retry_rate_limited: bool,
}

impl MutationExecutor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            poller: Poller::new(config.poll_interval),
            backoff: config.backoff,
            retry_rate_limited: config.retry_rate_limited,
        }
    }

    fn is_retryable(&self, err: &ovhsync_api::Error) -> bool {
        err.is_conflict() || (self.retry_rate_limited && err.is_rate_limited())
    }

    /// Submit `mutation`, retrying conflicts until `deadline`, then poll
    /// the plan built from the submit response until it converges.
    pub async fn execute<C, B, R, S, F>(
        &self,
        client: &C,
        mutation: &Mutation<'_, B>,
        deadline: Instant,
        plan: F,
    ) -> Result<Outcome<R>, ConvergeError>
    where
        C: ApiClient,
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
        S: DeserializeOwned + RemoteStatus + Send,
        F: FnOnce(&R) -> Result<ConvergencePlan<S>, ConvergeError>,
    {
        let mut lifecycle = Lifecycle::new(mutation.kind);
        let started = Instant::now();
        let mut attempts: u32 = 0;

        let response = loop {
            attempts += 1;
            lifecycle.apply(LifecycleEvent::Submitted)?;
            debug!(
                attempt = attempts,
                method = mutation.kind.method(),
                endpoint = %mutation.endpoint,
                "submitting mutation"
            );

            let err = match Self::submit::<C, B, R>(client, mutation).await {
                Ok(response) => break response,
                Err(err) => err,
            };

            if self.is_retryable(&err) {
                lifecycle.apply(LifecycleEvent::Conflict)?;
                let now = Instant::now();
                if now >= deadline {
                    lifecycle.apply(LifecycleEvent::DeadlineExceeded)?;
                    return Err(ConvergeError::Timeout {
                        endpoint: mutation.endpoint.to_string(),
                        waited: now - started,
                        last_observed: Some(err.to_string()),
                    });
                }
                let delay = self.backoff.delay(attempts).min(deadline - now);
                warn!(
                    attempt = attempts,
                    endpoint = %mutation.endpoint,
                    status = ?err.status(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "remote object busy, retrying"
                );
                sleep(delay).await;
                continue;
            }

            if mutation.kind == MutationKind::Delete && err.is_not_found() {
                lifecycle.apply(LifecycleEvent::Gone)?;
                info!(endpoint = %mutation.endpoint, "already deleted");
                return Ok(Outcome {
                    response: None,
                    attempts,
                    state: lifecycle.state(),
                });
            }

            lifecycle.apply(LifecycleEvent::Errored)?;
            if mutation.kind == MutationKind::Update && err.is_not_found() {
                return Err(ConvergeError::NotFound {
                    endpoint: mutation.endpoint.to_string(),
                });
            }
            return Err(ConvergeError::Api {
                method: mutation.kind.method(),
                endpoint: mutation.endpoint.to_string(),
                payload: mutation.payload(),
                source: err,
            });
        };

        let plan = match plan(&response) {
            Ok(plan) => plan,
            Err(e) => {
                lifecycle.apply(LifecycleEvent::Errored)?;
                return Err(e);
            }
        };

        debug!(endpoint = %plan.endpoint, kind = %mutation.kind, "waiting for convergence");
        match self.poller.wait_until(client, &plan, deadline).await {
            Ok(observation) => {
                let event = if mutation.kind == MutationKind::Delete {
                    LifecycleEvent::Gone
                } else {
                    LifecycleEvent::Converged
                };
                if let Observation::Found(remote) = &observation {
                    debug!(status = %remote.status_label(), "final observation");
                }
                let state = lifecycle.apply(event)?;
                info!(endpoint = %mutation.endpoint, kind = %mutation.kind, attempts, %state, "mutation converged");
                Ok(Outcome {
                    response: Some(response),
                    attempts,
                    state,
                })
            }
            Err(err) => {
                let event = if err.is_timeout() {
                    LifecycleEvent::DeadlineExceeded
                } else {
                    LifecycleEvent::Errored
                };
                lifecycle.apply(event)?;
                Err(err)
            }
        }
    }

    /// Exactly one network call.
    async fn submit<C, B, R>(
        client: &C,
        mutation: &Mutation<'_, B>,
    ) -> Result<R, ovhsync_api::Error>
    where
        C: ApiClient,
        B: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        match mutation.kind {
            MutationKind::Create => client.post(&mutation.endpoint, mutation.body).await,
            MutationKind::Update => client.put(&mutation.endpoint, mutation.body).await,
            MutationKind::Delete => client.delete(&mutation.endpoint).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde::Deserialize;
    use serde_json::{Value, json};

    use super::*;
    use crate::poller::Decision;
    use crate::testing::{ScriptedClient, api_error};

    #[derive(Debug, Deserialize)]
    struct Probe {
        status: String,
    }

    impl RemoteStatus for Probe {
        fn status_label(&self) -> String {
            self.status.clone()
        }
    }

    fn ready(obs: &Observation<Probe>) -> Decision {
        match obs {
            Observation::Found(p) if p.status == "READY" => Decision::Ready,
            Observation::Found(p) if p.status == "ERROR" => Decision::Failed("broken".into()),
            _ => Decision::Continue,
        }
    }

    fn removed(obs: &Observation<Probe>) -> Decision {
        match obs {
            Observation::Gone => Decision::Ready,
            Observation::Found(_) => Decision::Continue,
        }
    }

    fn executor() -> MutationExecutor {
        MutationExecutor::new(&EngineConfig {
            poll_interval: Duration::from_secs(5),
            ..EngineConfig::default()
        })
    }

    fn target() -> Endpoint {
        Endpoint::new("things").push("t1")
    }

    fn plan_ready(_: &Value) -> Result<ConvergencePlan<Probe>, ConvergeError> {
        Ok(ConvergencePlan::new(target(), ready))
    }

    fn plan_removed(_: &Value) -> Result<ConvergencePlan<Probe>, ConvergeError> {
        Ok(ConvergencePlan::new(target(), removed))
    }

    #[tokio::test(start_paused = true)]
    async fn conflicts_are_retried_until_success() {
        let client = ScriptedClient::new()
            .err(api_error(409))
            .err(api_error(409))
            .err(api_error(409))
            .ok(json!({"status": "CREATING"}))
            .ok(json!({"status": "READY"}));
        let body = json!({"name": "x"});
        let deadline = Instant::now() + Duration::from_secs(600);

        let outcome = executor()
            .execute(
                &client,
                &Mutation::create(Endpoint::new("things"), &body),
                deadline,
                plan_ready,
            )
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.state, LifecycleState::Ready);
        assert_eq!(client.count("POST"), 4);
        assert_eq!(client.count("GET"), 1);
        assert!(client.bodies().iter().all(|b| b == &body));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_grows_between_conflicts() {
        let client = ScriptedClient::new()
            .err(api_error(409))
            .err(api_error(409))
            .ok(json!({"status": "READY"}))
            .ok(json!({"status": "READY"}));
        let start = Instant::now();

        executor()
            .execute(
                &client,
                &Mutation::update(target(), &json!({})),
                start + Duration::from_secs(600),
                plan_ready,
            )
            .await
            .unwrap();

        // 500ms after the first conflict, 1s after the second.
        assert_eq!(Instant::now() - start, Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_terminal_and_carry_the_call() {
        let client = ScriptedClient::new().err(api_error(400));
        let body = json!({"ip": "not-an-ip"});

        let err = executor()
            .execute(
                &client,
                &Mutation::create(Endpoint::new("things"), &body),
                Instant::now() + Duration::from_secs(60),
                plan_ready,
            )
            .await
            .unwrap_err();

        match err {
            ConvergeError::Api {
                method,
                endpoint,
                payload,
                ref source,
            } => {
                assert_eq!(method, "POST");
                assert_eq!(endpoint, "/things");
                assert_eq!(payload, r#"{"ip":"not-an-ip"}"#);
                assert_eq!(source.status(), Some(400));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_are_terminal_by_default() {
        let client = ScriptedClient::new().err(api_error(429));

        let err = executor()
            .execute(
                &client,
                &Mutation::create(Endpoint::new("things"), &json!({})),
                Instant::now() + Duration::from_secs(60),
                plan_ready,
            )
            .await
            .unwrap_err();

        assert_eq!(err.api_status(), Some(429));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limits_retry_when_enabled() {
        let client = ScriptedClient::new()
            .err(api_error(429))
            .ok(json!({"status": "READY"}))
            .ok(json!({"status": "READY"}));
        let executor = MutationExecutor::new(&EngineConfig {
            retry_rate_limited: true,
            ..EngineConfig::default()
        });

        let outcome = executor
            .execute(
                &client,
                &Mutation::create(Endpoint::new("things"), &json!({})),
                Instant::now() + Duration::from_secs(60),
                plan_ready,
            )
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn endless_conflicts_time_out() {
        let client = ScriptedClient::new().err_forever(api_error(409));

        let err = executor()
            .execute(
                &client,
                &Mutation::update(target(), &json!({})),
                Instant::now() + Duration::from_secs(30),
                plan_ready,
            )
            .await
            .unwrap_err();

        assert!(err.is_timeout(), "expected timeout, got {err:?}");
        assert_eq!(client.count("GET"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_of_missing_object_succeeds() {
        let client = ScriptedClient::new().err(api_error(404));

        let outcome = executor()
            .execute::<_, _, Value, Probe, _>(
                &client,
                &Mutation::delete(target()),
                Instant::now() + Duration::from_secs(60),
                plan_removed,
            )
            .await
            .unwrap();

        assert!(outcome.response.is_none());
        assert_eq!(outcome.state, LifecycleState::Deleted);
        assert_eq!(client.calls(), ["DELETE /things/t1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_waits_for_not_found() {
        let client = ScriptedClient::new()
            .ok(Value::Null)
            .ok(json!({"status": "DELETING"}))
            .err(api_error(404));

        let outcome = executor()
            .execute::<_, _, Value, Probe, _>(
                &client,
                &Mutation::delete(target()),
                Instant::now() + Duration::from_secs(60),
                plan_removed,
            )
            .await
            .unwrap();

        assert_eq!(outcome.state, LifecycleState::Deleted);
        assert_eq!(client.count("GET"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn delete_from_ready_survives_conflict_retry() {
        let client = ScriptedClient::new()
            .err(api_error(409))
            .ok(Value::Null)
            .err(api_error(404));

        let outcome = executor()
            .execute::<_, _, Value, Probe, _>(
                &client,
                &Mutation::delete(target()),
                Instant::now() + Duration::from_secs(60),
                plan_removed,
            )
            .await
            .unwrap();

        assert_eq!(outcome.attempts, 2);
        assert_eq!(outcome.state, LifecycleState::Deleted);
        assert_eq!(client.count("DELETE"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn update_of_missing_object_is_not_found() {
        let client = ScriptedClient::new().err(api_error(404));

        let err = executor()
            .execute(
                &client,
                &Mutation::update(target(), &json!({"description": "x"})),
                Instant::now() + Duration::from_secs(60),
                plan_ready,
            )
            .await
            .unwrap_err();

        assert!(err.is_not_found(), "expected NotFound, got {err:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn remote_error_during_poll_surfaces() {
        let client = ScriptedClient::new()
            .ok(json!({"status": "CREATING"}))
            .ok(json!({"status": "ERROR"}));

        let err = executor()
            .execute(
                &client,
                &Mutation::create(Endpoint::new("things"), &json!({})),
                Instant::now() + Duration::from_secs(60),
                plan_ready,
            )
            .await
            .unwrap_err();

        assert!(err.is_remote_failure());
    }
}
