mod auth;
mod commands;
mod config;
mod logging;
mod providers;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::sync::SyncArgs;
use config::Config;

#[derive(Parser)]
#[command(name = "calrelay")]
#[command(about = "Announce new Outlook events on Slack and mirror them into Google Calendar")]
struct Cli {
    /// Config file (defaults to ~/.config/calrelay/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pass over [now, now + interval)
    Sync {
        /// Window length (e.g., "1h", "90m", "-30m")
        #[arg(long)]
        interval: Option<String>,

        /// Dedup store path
        #[arg(long)]
        db: Option<PathBuf>,

        /// Google calendar to mirror into
        #[arg(long)]
        calendar_id: Option<String>,
    },
    /// Show whether event ids have already been processed
    Seen {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Dedup store path
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose)?;
    let cfg = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Sync {
            interval,
            db,
            calendar_id,
        } => {
            let args = SyncArgs {
                interval,
                db,
                calendar_id,
            };
            let report = commands::sync::run(&cfg, args).await?;
            if let Some(fatal) = report.fatal_issue() {
                anyhow::bail!("Sync aborted: {}", fatal);
            }
            Ok(())
        }
        Commands::Seen { ids, db } => commands::seen::run(&cfg, &ids, db),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_flags() {
        let cli = Cli::try_parse_from([
            "calrelay",
            "sync",
            "--interval",
            "2h",
            "--calendar-id",
            "team",
            "--verbose",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Sync {
                interval,
                calendar_id,
                db,
            } => {
                assert_eq!(interval.as_deref(), Some("2h"));
                assert_eq!(calendar_id.as_deref(), Some("team"));
                assert!(db.is_none());
            }
            Commands::Seen { .. } => panic!("expected sync"),
        }
    }

    #[test]
    fn test_seen_requires_ids() {
        assert!(Cli::try_parse_from(["calrelay", "seen"]).is_err());
    }
}
