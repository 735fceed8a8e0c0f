//! Replica calendar boundary and the partial-failure outcome it reports.

use async_trait::async_trait;

use crate::error::{RelayError, RelayResult};
use crate::event::Event;

/// Mirrors events into a second calendar.
#[async_trait]
pub trait ReplicaTarget: Send + Sync {
    /// Attempt every event independently; one failure must not stop the
    /// rest. `Err` is reserved for failures that prevented any attempt.
    async fn add_events(&self, events: &[Event]) -> RelayResult<ReplicationOutcome>;
}

/// One event that could not be mirrored, paired with why.
#[derive(Debug)]
pub struct ReplicationFailure {
    pub event: Event,
    pub error: RelayError,
}

/// Result of mirroring a batch. Events not listed in `PartialFailure` were
/// replicated successfully.
#[derive(Debug)]
pub enum ReplicationOutcome {
    Success,
    PartialFailure(Vec<ReplicationFailure>),
}

impl ReplicationOutcome {
    /// Collapse per-event failures into an outcome.
    pub fn from_failures(failures: Vec<ReplicationFailure>) -> Self {
        if failures.is_empty() {
            ReplicationOutcome::Success
        } else {
            ReplicationOutcome::PartialFailure(failures)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ReplicationOutcome::Success)
    }

    pub fn failures(&self) -> &[ReplicationFailure] {
        match self {
            ReplicationOutcome::Success => &[],
            ReplicationOutcome::PartialFailure(failures) => failures,
        }
    }

    /// Failed events, index-aligned with [`Self::errors`].
    pub fn failed_events(&self) -> Vec<&Event> {
        self.failures().iter().map(|f| &f.event).collect()
    }

    /// Errors, index-aligned with [`Self::failed_events`].
    pub fn errors(&self) -> Vec<&RelayError> {
        self.failures().iter().map(|f| &f.error).collect()
    }
}

/// Stands in for a replica whose credentials could not be loaded. Every
/// batch fails as a whole, which the pipeline reports without aborting.
pub struct UnavailableReplica {
    reason: String,
}

impl UnavailableReplica {
    pub fn new(reason: impl Into<String>) -> Self {
        UnavailableReplica {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ReplicaTarget for UnavailableReplica {
    async fn add_events(&self, _events: &[Event]) -> RelayResult<ReplicationOutcome> {
        Err(RelayError::Auth(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_event(id: &str) -> Event {
        let now = Utc::now();
        Event {
            id: id.to_string(),
            subject: id.to_string(),
            start: now,
            end: now,
            organizer: String::new(),
        }
    }

    #[test]
    fn test_no_failures_is_success() {
        let outcome = ReplicationOutcome::from_failures(vec![]);
        assert!(outcome.is_success());
        assert!(outcome.failed_events().is_empty());
    }

    #[test]
    fn test_failed_events_and_errors_stay_aligned() {
        let outcome = ReplicationOutcome::from_failures(vec![
            ReplicationFailure {
                event: make_event("a"),
                error: RelayError::Replica("quota".into()),
            },
            ReplicationFailure {
                event: make_event("b"),
                error: RelayError::Timeout(30),
            },
        ]);

        let events = outcome.failed_events();
        let errors = outcome.errors();
        assert_eq!(events.len(), errors.len());
        assert_eq!(events[0].id, "a");
        assert!(matches!(errors[0], RelayError::Replica(_)));
        assert_eq!(events[1].id, "b");
        assert!(matches!(errors[1], RelayError::Timeout(30)));
    }

    #[tokio::test]
    async fn test_unavailable_replica_fails_whole_batch() {
        let replica = UnavailableReplica::new("Token file not found");
        let err = replica.add_events(&[make_event("a")]).await.unwrap_err();
        assert!(matches!(err, RelayError::Auth(ref msg) if msg == "Token file not found"));
    }
}
