//! The sync pipeline: fetch → order → filter → notify → record → replicate.
//!
//! One call to [`SyncPipeline::run`] is one pass over one window. Only a
//! fetch failure or a dedup lookup failure stops a pass early; every other
//! failure is written into the [`RunReport`] and the pass carries on.

use std::collections::HashSet;
use std::sync::Arc;

use chrono_tz::Tz;
use tracing::{debug, error, info, warn};

use crate::dedup::DedupStore;
use crate::digest::build_digest;
use crate::notify::Notifier;
use crate::replica::ReplicaTarget;
use crate::report::{RunReport, Stage};
use crate::source::EventSource;
use crate::window::TimeWindow;

/// When new ids are written to the dedup store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecordPolicy {
    /// Record even if the digest could not be sent. A notifier outage then
    /// costs the announcement rather than causing repeated announcements.
    #[default]
    Always,
    /// Record (and replicate) only after the digest was sent, so nothing is
    /// ever marked seen without a human having been told.
    AfterNotify,
}

pub struct SyncPipeline {
    source: Box<dyn EventSource>,
    notifier: Arc<dyn Notifier>,
    store: Box<dyn DedupStore>,
    replica: Box<dyn ReplicaTarget>,
    timezone: Tz,
    record_policy: RecordPolicy,
}

impl SyncPipeline {
    pub fn new(
        source: Box<dyn EventSource>,
        notifier: Arc<dyn Notifier>,
        store: Box<dyn DedupStore>,
        replica: Box<dyn ReplicaTarget>,
    ) -> Self {
        SyncPipeline {
            source,
            notifier,
            store,
            replica,
            timezone: chrono_tz::UTC,
            record_policy: RecordPolicy::default(),
        }
    }

    /// Zone used to render start times in the digest.
    pub fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    pub fn with_record_policy(mut self, policy: RecordPolicy) -> Self {
        self.record_policy = policy;
        self
    }

    /// Run one pass over `window`.
    pub async fn run(&mut self, window: TimeWindow) -> RunReport {
        let mut report = RunReport::new(window, !self.store.is_persistent());
        info!(%window, "starting sync pass");

        let mut events = match self.source.fetch_events(&window).await {
            Ok(events) => events,
            Err(e) => {
                error!(%window, error = %e, "failed to fetch events");
                report.fatal(Stage::Fetch, format!("window {}", window), e);
                return report;
            }
        };
        report.fetched = events.len();
        info!(count = events.len(), "fetched events");

        // Stable: events sharing a start keep their fetch order.
        events.sort_by_key(|e| e.start);

        let mut fresh = Vec::new();
        let mut accepted = HashSet::new();
        for event in events {
            if accepted.contains(&event.id) {
                debug!(id = %event.id, "duplicate id in batch");
                continue;
            }
            match self.store.exists(&event.id) {
                Ok(true) => debug!(id = %event.id, "already seen"),
                Ok(false) => {
                    accepted.insert(event.id.clone());
                    fresh.push(event);
                }
                Err(e) => {
                    error!(id = %event.id, error = %e, "dedup lookup failed, aborting pass");
                    let message = format!("Can't look up ID {}: {}", event.id, e);
                    if let Err(send_err) = self.notifier.send(&message).await {
                        warn!(error = %send_err, "failed to report lookup failure");
                    }
                    report.fatal(Stage::Filter, format!("id {}", event.id), e);
                    return report;
                }
            }
        }

        if fresh.is_empty() {
            info!("no new events");
            return report;
        }
        info!(count = fresh.len(), "new events");

        let digest = build_digest(&fresh, self.timezone);
        match self.notifier.send(&digest).await {
            Ok(()) => report.notified = true,
            Err(e) => {
                warn!(error = %e, "failed to send digest");
                report.reported(Stage::Notify, format!("{} new events", fresh.len()), e);
            }
        }

        if !report.notified && self.record_policy == RecordPolicy::AfterNotify {
            info!("digest not delivered, leaving events unrecorded for the next pass");
            report.new_events = fresh;
            return report;
        }

        let ids: Vec<String> = fresh.iter().map(|e| e.id.clone()).collect();
        match self.store.record(&ids) {
            Ok(()) => report.recorded = true,
            Err(e) => {
                warn!(count = ids.len(), error = %e, "failed to record seen ids");
                let message = format!("Can't add ids to the storage: {}", e);
                if let Err(send_err) = self.notifier.send(&message).await {
                    warn!(error = %send_err, "failed to report record failure");
                }
                report.reported(Stage::Record, format!("{} ids", ids.len()), e);
            }
        }

        match self.replica.add_events(&fresh).await {
            Ok(outcome) => {
                for failure in outcome.failures() {
                    warn!(id = %failure.event.id, error = %failure.error, "failed to replicate event");
                }
                report.replication = Some(outcome);
            }
            Err(e) => {
                warn!(error = %e, "replication failed");
                report.reported(Stage::Replicate, format!("{} events", fresh.len()), e);
            }
        }

        report.new_events = fresh;
        info!(summary = %report.summary(), "sync pass finished");
        report
    }
}
