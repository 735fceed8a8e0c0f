//! Per-run report accumulated across pipeline stages.

use std::fmt;

use crate::error::RelayError;
use crate::event::Event;
use crate::replica::ReplicationOutcome;
use crate::window::TimeWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Filter,
    Notify,
    Record,
    Replicate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Filter => "filter",
            Stage::Notify => "notify",
            Stage::Record => "record",
            Stage::Replicate => "replicate",
        };
        f.write_str(name)
    }
}

/// How a stage failure affects the rest of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The run stopped here.
    Fatal,
    /// Surfaced to the operator; later stages still ran.
    Reported,
}

/// A failure observed during one stage, with what it was working on.
#[derive(Debug)]
pub struct StageIssue {
    pub stage: Stage,
    pub severity: Severity,
    pub context: String,
    pub error: RelayError,
}

impl fmt::Display for StageIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.stage, self.context, self.error)
    }
}

/// Everything one pass did and everything that went wrong.
///
/// Per-event replication failures live in `replication`, not in `issues`.
#[derive(Debug)]
pub struct RunReport {
    pub window: TimeWindow,
    /// Dedup ran against the no-op store this pass.
    pub degraded_store: bool,
    pub fetched: usize,
    /// Events that were new at filter time, in digest order.
    pub new_events: Vec<Event>,
    pub notified: bool,
    pub recorded: bool,
    /// `None` when replication was never attempted.
    pub replication: Option<ReplicationOutcome>,
    pub issues: Vec<StageIssue>,
}

impl RunReport {
    pub fn new(window: TimeWindow, degraded_store: bool) -> Self {
        RunReport {
            window,
            degraded_store,
            fetched: 0,
            new_events: Vec::new(),
            notified: false,
            recorded: false,
            replication: None,
            issues: Vec::new(),
        }
    }

    pub(crate) fn fatal(&mut self, stage: Stage, context: impl Into<String>, error: RelayError) {
        self.push(stage, Severity::Fatal, context.into(), error);
    }

    pub(crate) fn reported(&mut self, stage: Stage, context: impl Into<String>, error: RelayError) {
        self.push(stage, Severity::Reported, context.into(), error);
    }

    fn push(&mut self, stage: Stage, severity: Severity, context: String, error: RelayError) {
        self.issues.push(StageIssue {
            stage,
            severity,
            context,
            error,
        });
    }

    /// The failure that ended the run early, if any.
    pub fn fatal_issue(&self) -> Option<&StageIssue> {
        self.issues.iter().find(|i| i.severity == Severity::Fatal)
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal_issue().is_some()
    }

    pub fn issues_at(&self, stage: Stage) -> impl Iterator<Item = &StageIssue> {
        self.issues.iter().filter(move |i| i.stage == stage)
    }

    /// Number of new events whose replication failed.
    pub fn replication_failures(&self) -> usize {
        self.replication
            .as_ref()
            .map(|o| o.failures().len())
            .unwrap_or(0)
    }

    /// No issues and no replication failures.
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty() && self.replication_failures() == 0
    }

    /// One-line summary for logs and the CLI.
    pub fn summary(&self) -> String {
        let mut parts = vec![
            format!("{} fetched", self.fetched),
            format!("{} new", self.new_events.len()),
        ];
        if self.replication.is_some() {
            let failed = self.replication_failures();
            parts.push(format!(
                "{} replicated, {} failed",
                self.new_events.len().saturating_sub(failed),
                failed
            ));
        }
        if !self.issues.is_empty() {
            parts.push(format!("{} issue(s)", self.issues.len()));
        }
        if self.degraded_store {
            parts.push("dedup disabled".to_string());
        }
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replica::ReplicationFailure;
    use chrono::{Duration, Utc};

    #[test]
    fn test_fatal_issue_is_found_among_reported() {
        let mut report = RunReport::new(TimeWindow::from_now(Duration::hours(1)), false);
        report.reported(Stage::Notify, "3 new events", RelayError::Notify("503".into()));
        report.fatal(Stage::Filter, "id x", RelayError::Store("locked".into()));

        let fatal = report.fatal_issue().expect("should have a fatal issue");
        assert_eq!(fatal.stage, Stage::Filter);
        assert_eq!(
            fatal.to_string(),
            "filter failed (id x): Dedup store error: locked"
        );
        assert!(!report.is_clean());
    }

    #[test]
    fn test_summary_mentions_degraded_store() {
        let now = Utc::now();
        let report = RunReport::new(TimeWindow::new(now, now), true);
        assert_eq!(report.summary(), "0 fetched, 0 new, dedup disabled");
        assert!(report.is_clean());
    }

    #[test]
    fn test_summary_tolerates_more_failures_than_events() {
        let mut report = RunReport::new(TimeWindow::from_now(Duration::hours(1)), false);
        let event = crate::Event {
            id: "a".to_string(),
            subject: "a".to_string(),
            start: Utc::now(),
            end: Utc::now(),
            organizer: String::new(),
        };
        let failure = |event: &crate::Event| ReplicationFailure {
            event: event.clone(),
            error: RelayError::Replica("rejected".into()),
        };
        report.replication = Some(ReplicationOutcome::from_failures(vec![
            failure(&event),
            failure(&event),
        ]));

        assert_eq!(report.summary(), "0 fetched, 0 new, 0 replicated, 2 failed");
    }
}
