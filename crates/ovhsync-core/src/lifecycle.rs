// ── Per-resource lifecycle ──
//
// The state machine the executor and poller drive for one mutation on one
// locator. Transitions outside the table are rejected rather than ignored.

use strum::Display;
use tracing::debug;

use crate::error::ConvergeError;

/// The kind of mutation being converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl MutationKind {
    /// HTTP method used to submit this mutation.
    pub fn method(self) -> &'static str {
        match self {
            Self::Create => "POST",
            Self::Update => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum LifecycleState {
    Pending,
    InProgress,
    Ready,
    Deleted,
    Failed,
    TimedOut,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Ready | Self::Deleted | Self::Failed | Self::TimedOut
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LifecycleEvent {
    /// A create/update/delete call was sent.
    Submitted,
    /// The submit answered 409 (or another retryable status).
    Conflict,
    /// Polling saw the object ready.
    Converged,
    /// The object no longer exists.
    Gone,
    /// The API rejected the call or the object reported an error.
    Errored,
    DeadlineExceeded,
}

/// Tracks one mutation's position in the lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct Lifecycle {
    kind: MutationKind,
    state: LifecycleState,
}

impl Lifecycle {
    /// Creates and updates start `Pending`; a delete starts from the live
    /// object, `Ready`.
    pub fn new(kind: MutationKind) -> Self {
        let state = match kind {
            MutationKind::Delete => LifecycleState::Ready,
            MutationKind::Create | MutationKind::Update => LifecycleState::Pending,
        };
        Self { kind, state }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Apply an event, returning the new state.
    pub fn apply(&mut self, event: LifecycleEvent) -> Result<LifecycleState, ConvergeError> {
        use LifecycleEvent as E;
        use LifecycleState as S;

        let deleting = self.kind == MutationKind::Delete;
        let next = match (self.state, event) {
            (S::Pending, E::Submitted) => S::InProgress,
            (S::Ready, E::Submitted) if deleting => S::InProgress,
            (S::InProgress, E::Conflict) => S::Pending,
            (S::InProgress, E::Converged) if !deleting => S::Ready,
            (S::InProgress, E::Gone) if deleting => S::Deleted,
            (S::InProgress, E::Errored) => S::Failed,
            // Conflict retries can run out the clock before the next submit.
            (S::InProgress | S::Pending, E::DeadlineExceeded) => S::TimedOut,
            (from, event) => return Err(ConvergeError::InvalidTransition { from, event }),
        };

        debug!(kind = %self.kind, from = %self.state, to = %next, %event, "lifecycle transition");
        self.state = next;
        Ok(next)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn create_converges_through_conflict_retry() {
        let mut lc = Lifecycle::new(MutationKind::Create);
        assert_eq!(lc.apply(LifecycleEvent::Submitted).unwrap(), LifecycleState::InProgress);
        assert_eq!(lc.apply(LifecycleEvent::Conflict).unwrap(), LifecycleState::Pending);
        assert_eq!(lc.apply(LifecycleEvent::Submitted).unwrap(), LifecycleState::InProgress);
        assert_eq!(lc.apply(LifecycleEvent::Converged).unwrap(), LifecycleState::Ready);
        assert!(lc.state().is_terminal());
    }

    #[test]
    fn delete_starts_ready_and_ends_in_deleted() {
        let mut lc = Lifecycle::new(MutationKind::Delete);
        assert_eq!(lc.state(), LifecycleState::Ready);
        assert_eq!(lc.apply(LifecycleEvent::Submitted).unwrap(), LifecycleState::InProgress);
        assert_eq!(lc.apply(LifecycleEvent::Gone).unwrap(), LifecycleState::Deleted);
    }

    #[test]
    fn gone_is_not_a_create_outcome() {
        let mut lc = Lifecycle::new(MutationKind::Create);
        lc.apply(LifecycleEvent::Submitted).unwrap();
        let err = lc.apply(LifecycleEvent::Gone).unwrap_err();
        assert!(matches!(
            err,
            ConvergeError::InvalidTransition {
                from: LifecycleState::InProgress,
                event: LifecycleEvent::Gone
            }
        ));
        assert_eq!(lc.state(), LifecycleState::InProgress);
    }

    #[test]
    fn ready_only_resubmits_for_delete() {
        let mut lc = Lifecycle::new(MutationKind::Update);
        lc.apply(LifecycleEvent::Submitted).unwrap();
        lc.apply(LifecycleEvent::Converged).unwrap();
        assert!(lc.apply(LifecycleEvent::Submitted).is_err());
    }

    #[test]
    fn terminal_states_reject_everything() {
        for event in [
            LifecycleEvent::Submitted,
            LifecycleEvent::Conflict,
            LifecycleEvent::Converged,
            LifecycleEvent::Errored,
            LifecycleEvent::DeadlineExceeded,
        ] {
            let mut lc = Lifecycle::new(MutationKind::Create);
            lc.apply(LifecycleEvent::Submitted).unwrap();
            lc.apply(LifecycleEvent::Errored).unwrap();
            assert!(lc.apply(event).is_err(), "FAILED accepted {event}");
        }
    }

    #[test]
    fn timeouts_from_pending_and_in_progress() {
        let mut lc = Lifecycle::new(MutationKind::Delete);
        lc.apply(LifecycleEvent::Submitted).unwrap();
        lc.apply(LifecycleEvent::Conflict).unwrap();
        assert_eq!(
            lc.apply(LifecycleEvent::DeadlineExceeded).unwrap(),
            LifecycleState::TimedOut
        );
    }

    #[test]
    fn display_uses_state_machine_names() {
        assert_eq!(LifecycleState::InProgress.to_string(), "IN_PROGRESS");
        assert_eq!(LifecycleState::TimedOut.to_string(), "TIMED_OUT");
        assert_eq!(MutationKind::Delete.method(), "DELETE");
    }
}
