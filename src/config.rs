use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calrelay_core::dedup::StoreBackend;
use calrelay_core::pipeline::RecordPolicy;
use chrono_tz::Tz;
use serde::Deserialize;

const DEFAULT_INTERVAL: &str = "1h";

#[derive(Debug, Deserialize)]
pub struct Config {
    /// Slack incoming-webhook URL. Without one, digests only go to the log.
    pub slack_url: Option<String>,

    /// IANA zone used to render start times in digests
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Length of the rolling window, e.g. "1h" or "90m"
    #[serde(default = "default_interval")]
    pub interval: String,

    /// Only mark events as seen once the digest was actually delivered
    #[serde(default)]
    pub record_after_notify_only: bool,

    #[serde(default)]
    pub store: StoreConfig,

    pub outlook: Option<OutlookConfig>,

    pub google: Option<GoogleConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    pub path: Option<String>,
}

/// OAuth app for the Microsoft Graph source calendar
#[derive(Debug, Deserialize)]
pub struct OutlookConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Calendar to read; the user's default calendar when unset
    pub calendar_id: Option<String>,
}

/// OAuth app for the Google replica calendar
#[derive(Debug, Deserialize)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub calendar_id: Option<String>,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_interval() -> String {
    DEFAULT_INTERVAL.to_string()
}

impl Config {
    /// Load config from `path`, or ~/.config/calrelay/config.toml
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        if !path.exists() {
            anyhow::bail!(
                "Config file not found at {}\n\n\
                Create it with at least:\n\n\
                slack_url = \"https://hooks.slack.com/services/...\"\n\n\
                [google]\n\
                client_id = \"your-client-id.apps.googleusercontent.com\"\n\
                client_secret = \"your-client-secret\"\n\
                calendar_id = \"primary\"",
                path.display()
            );
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Failed to parse config file at {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Window length, preferring a command-line override. A leading `-`
    /// makes the window extend into the past.
    pub fn interval(&self, cli_override: Option<&str>) -> Result<chrono::Duration> {
        parse_interval(cli_override.unwrap_or(&self.interval))
    }

    pub fn reference_timezone(&self) -> Result<Tz> {
        Ok(calrelay_core::time::parse_timezone(&self.timezone)?)
    }

    pub fn record_policy(&self) -> RecordPolicy {
        if self.record_after_notify_only {
            RecordPolicy::AfterNotify
        } else {
            RecordPolicy::Always
        }
    }

    /// Dedup store location: command line, then config, then the data dir.
    pub fn store_path(&self, data_dir: &Path, cli_override: Option<&Path>) -> PathBuf {
        if let Some(p) = cli_override {
            return p.to_path_buf();
        }
        match &self.store.path {
            Some(p) => expand_path(p),
            None => data_dir.join(self.store.backend.default_file_name()),
        }
    }
}

pub fn parse_interval(value: &str) -> Result<chrono::Duration> {
    let value = value.trim();
    let (negative, magnitude) = match value.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, value),
    };

    let std = humantime::parse_duration(magnitude)
        .with_context(|| format!("Invalid interval '{}'", value))?;
    let duration = chrono::Duration::from_std(std)
        .with_context(|| format!("Interval '{}' is too large", value))?;

    Ok(if negative { -duration } else { duration })
}

/// Get the config directory path (~/.config/calrelay)
pub fn config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calrelay");
    Ok(config_dir)
}

/// Get the config file path (~/.config/calrelay/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Directory holding the dedup store and token files
/// (~/.local/share/calrelay), created on first use.
pub fn data_dir() -> Result<PathBuf> {
    let dir = dirs::data_dir()
        .context("Could not determine data directory")?
        .join("calrelay");
    ensure_private_dir(&dir)?;
    Ok(dir)
}

fn ensure_private_dir(dir: &Path) -> Result<()> {
    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => anyhow::bail!("Not a directory: {}", dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create data directory at {}", dir.display()))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o700))?;
            }
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to inspect {}", dir.display())),
    }
}

/// Expand ~ in paths to the home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    PathBuf::from(path)
}
