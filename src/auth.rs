//! OAuth token files for the source and replica calendars.
//!
//! Obtaining the first token pair is done out of band; this module only
//! loads the stored tokens and refreshes them when they have expired.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const MICROSOFT_TOKEN_URL: &str = "https://login.microsoftonline.com/common/oauth2/v2.0/token";
pub const MICROSOFT_SCOPES: &str = "Calendars.ReadWrite User.Read offline_access openid";

pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_SCOPES: &str = "https://www.googleapis.com/auth/calendar.events";

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Tokens {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|at| at - Duration::seconds(EXPIRY_MARGIN_SECS) <= now)
    }
}

/// Where an OAuth app refreshes its tokens.
pub struct OAuthApp {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub scopes: String,
}

#[derive(Deserialize)]
struct RefreshResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: i64,
}

/// A JSON token file in the data directory.
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenFile { path: path.into() }
    }

    pub fn load(&self) -> Result<Tokens> {
        if !self.path.exists() {
            anyhow::bail!(
                "Token file not found at {}\n\n\
                Place a JSON file there with at least:\n  \
                {{ \"access_token\": \"...\", \"refresh_token\": \"...\" }}",
                self.path.display()
            );
        }

        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file at {}", self.path.display()))?;

        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token file at {}", self.path.display()))
    }

    /// Write through an owner-only temp file, then rename over the old one.
    pub fn save(&self, tokens: &Tokens) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(tokens).context("Failed to serialize tokens")?;

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        // A leftover temp file may carry looser permissions
        match std::fs::remove_file(&temp) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                return Err(e).with_context(|| format!("Failed to remove {}", temp.display()));
            }
            _ => {}
        }

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(&temp)
            .with_context(|| format!("Failed to create {}", temp.display()))?;
        file.write_all(contents.as_bytes())
            .with_context(|| format!("Failed to write token file at {}", temp.display()))?;
        drop(file);

        std::fs::rename(&temp, &self.path)
            .with_context(|| format!("Failed to replace token file at {}", self.path.display()))?;
        Ok(())
    }

    /// Load the access token, refreshing and rewriting the file first if it
    /// has expired and `app` can refresh it.
    pub async fn access_token(&self, app: Option<&OAuthApp>, client: &Client) -> Result<String> {
        let tokens = self.load()?;

        if !tokens.is_expired(Utc::now()) {
            return Ok(tokens.access_token);
        }

        let (Some(app), Some(refresh_token)) = (app, tokens.refresh_token.as_deref()) else {
            anyhow::bail!(
                "Access token in {} has expired and cannot be refreshed",
                self.path.display()
            );
        };

        info!(path = %self.path.display(), "refreshing expired access token");
        let refreshed = refresh(app, refresh_token, client).await?;
        self.save(&refreshed)?;
        Ok(refreshed.access_token)
    }
}

async fn refresh(app: &OAuthApp, refresh_token: &str, client: &Client) -> Result<Tokens> {
    let response = client
        .post(&app.token_url)
        .form(&[
            ("client_id", app.client_id.as_str()),
            ("client_secret", app.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
            ("scope", app.scopes.as_str()),
        ])
        .send()
        .await
        .context("Token refresh request failed")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Token refresh failed ({}): {}", status, body);
    }

    let data: RefreshResponse = response
        .json()
        .await
        .context("Failed to parse token refresh response")?;

    Ok(Tokens {
        access_token: data.access_token,
        // Providers may omit the refresh token when it did not rotate
        refresh_token: data.refresh_token.or_else(|| Some(refresh_token.to_string())),
        expires_at: Some(Utc::now() + Duration::seconds(data.expires_in)),
    })
}
