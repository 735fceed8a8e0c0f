use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use calrelay_core::TimeWindow;
use calrelay_core::dedup;
use calrelay_core::notify::Notifier;
use calrelay_core::pipeline::SyncPipeline;
use calrelay_core::replica::{ReplicaTarget, UnavailableReplica};
use calrelay_core::report::RunReport;
use tracing::{info, warn};

use crate::auth::{
    GOOGLE_SCOPES, GOOGLE_TOKEN_URL, MICROSOFT_SCOPES, MICROSOFT_TOKEN_URL, OAuthApp, TokenFile,
};
use crate::config::{self, Config};
use crate::providers::google::{DEFAULT_CALENDAR_ID, GoogleReplica};
use crate::providers::outlook::OutlookSource;
use crate::providers::slack::{LogNotifier, SlackNotifier};
use crate::providers::http_client;

const OUTLOOK_TOKENS_FILE: &str = "outlook.json";
const GOOGLE_TOKENS_FILE: &str = "google.json";

/// Command-line overrides for a sync pass.
pub struct SyncArgs {
    pub interval: Option<String>,
    pub db: Option<PathBuf>,
    pub calendar_id: Option<String>,
}

pub async fn run(cfg: &Config, args: SyncArgs) -> Result<RunReport> {
    let data_dir = config::data_dir()?;
    let interval = cfg.interval(args.interval.as_deref())?;
    let timezone = cfg.reference_timezone()?;
    let http = http_client()?;

    let notifier: Arc<dyn Notifier> = match &cfg.slack_url {
        Some(url) => Arc::new(SlackNotifier::new(http.clone(), url)),
        None => Arc::new(LogNotifier),
    };

    let outlook_app = cfg.outlook.as_ref().map(|o| OAuthApp {
        token_url: MICROSOFT_TOKEN_URL.to_string(),
        client_id: o.client_id.clone(),
        client_secret: o.client_secret.clone(),
        scopes: MICROSOFT_SCOPES.to_string(),
    });
    let outlook_token = TokenFile::new(data_dir.join(OUTLOOK_TOKENS_FILE))
        .access_token(outlook_app.as_ref(), &http)
        .await?;
    let source = OutlookSource::new(http.clone(), outlook_token)
        .with_calendar_id(cfg.outlook.as_ref().and_then(|o| o.calendar_id.clone()));

    let google_app = cfg.google.as_ref().map(|g| OAuthApp {
        token_url: GOOGLE_TOKEN_URL.to_string(),
        client_id: g.client_id.clone(),
        client_secret: g.client_secret.clone(),
        scopes: GOOGLE_SCOPES.to_string(),
    });
    let google_token = TokenFile::new(data_dir.join(GOOGLE_TOKENS_FILE))
        .access_token(google_app.as_ref(), &http)
        .await;
    let calendar_id = args
        .calendar_id
        .or_else(|| cfg.google.as_ref().and_then(|g| g.calendar_id.clone()))
        .unwrap_or_else(|| DEFAULT_CALENDAR_ID.to_string());
    let replica = google_replica(google_token, http, calendar_id);

    let store_path = cfg.store_path(&data_dir, args.db.as_deref());
    info!(path = %store_path.display(), backend = ?cfg.store.backend, "opening dedup store");
    let store = dedup::open_or_noop(
        dedup::open_store(cfg.store.backend, &store_path),
        notifier.as_ref(),
    )
    .await;

    let mut pipeline = SyncPipeline::new(Box::new(source), notifier, store, replica)
        .with_timezone(timezone)
        .with_record_policy(cfg.record_policy());

    let report = pipeline.run(TimeWindow::from_now(interval)).await;
    print_report(&report);
    Ok(report)
}

/// Mirroring is advisory: without a usable Google token the pass still
/// notifies and records, and replication shows up as a stage issue.
fn google_replica(
    token: Result<String>,
    http: reqwest::Client,
    calendar_id: String,
) -> Box<dyn ReplicaTarget> {
    match token {
        Ok(token) => Box::new(GoogleReplica::new(http, token, calendar_id)),
        Err(e) => {
            warn!(error = %e, "Google replica unavailable");
            Box::new(UnavailableReplica::new(format!("Google tokens: {:#}", e)))
        }
    }
}

fn print_report(report: &RunReport) {
    println!("📅 {}", report.window);
    println!("  {}", report.summary());

    for event in &report.new_events {
        println!("  + {} ({})", event.subject, event.start.to_rfc3339());
    }

    if let Some(outcome) = &report.replication {
        for failure in outcome.failures() {
            println!("  ✗ {}: {}", failure.event.subject, failure.error);
        }
    }

    for issue in &report.issues {
        println!("  ! {}", issue);
    }
}
