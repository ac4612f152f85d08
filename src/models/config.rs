// src/models/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use chrono_tz::Tz;
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Process-wide settings and Memberful credentials
    #[serde(default)]
    pub settings: Settings,

    /// HTTP client settings shared by every API client
    #[serde(default)]
    pub http: HttpConfig,

    /// Intercom contact sync
    #[serde(default)]
    pub intercom: IntercomConfig,

    /// WordPress user sync
    #[serde(default)]
    pub wordpress: WordPressConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Every missing or invalid required value, one message per violation.
    pub fn violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        match self.settings.time_zone.as_deref().map(str::trim) {
            None | Some("") => {
                violations.push(r#""settings.time-zone" is not configured"#.to_string())
            }
            Some(zone) if zone.parse::<Tz>().is_err() => {
                violations.push(format!(r#""settings.time-zone" is invalid ({zone})"#))
            }
            Some(_) => {}
        }

        if self.settings.log_level.and_then(LogLevel::from_code).is_none() {
            violations
                .push(r#""settings.log-level" is not configured or is invalid"#.to_string());
        }
        if is_blank(&self.settings.memberful_api_key) {
            violations.push(r#""settings.memberful-api-key" is not configured"#.to_string());
        }
        if is_blank(&self.settings.memberful_subdomain) && is_blank(&self.settings.memberful_endpoint)
        {
            violations.push(r#""settings.memberful-subdomain" is not configured"#.to_string());
        }
        if self.settings.sync_interval_secs == 0 {
            violations.push(r#""settings.sync-interval-secs" must be > 0"#.to_string());
        }

        if self.wordpress.enabled() {
            if is_blank(&self.wordpress.url) {
                violations.push(r#""wordpress.url" is not configured"#.to_string());
            }
            if is_blank(&self.wordpress.username) {
                violations.push(r#""wordpress.username" is not configured"#.to_string());
            }
            if self.wordpress.max_concurrent == 0 {
                violations.push(r#""wordpress.max-concurrent" must be > 0"#.to_string());
            }
        }

        violations
    }

    /// Validate configuration, folding all violations into one error.
    pub fn validate(&self) -> Result<()> {
        let violations = self.violations();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(AppError::config(violations.join("; ")))
        }
    }

    /// Configured time zone for log timestamps.
    pub fn time_zone(&self) -> Result<Tz> {
        let zone = self
            .settings
            .time_zone
            .as_deref()
            .map(str::trim)
            .ok_or_else(|| AppError::config("settings.time-zone is not configured"))?;
        zone.parse::<Tz>()
            .map_err(|e| AppError::config(format!("settings.time-zone is invalid: {e}")))
    }

    /// Configured log level threshold.
    pub fn log_level(&self) -> Result<LogLevel> {
        self.settings
            .log_level
            .and_then(LogLevel::from_code)
            .ok_or_else(|| AppError::config("settings.log-level must be one of 10, 20, 30, 40"))
    }

    /// Memberful GraphQL endpoint, derived from the subdomain unless overridden.
    pub fn memberful_endpoint(&self) -> Result<String> {
        if let Some(endpoint) = self.settings.memberful_endpoint.as_deref() {
            if !endpoint.trim().is_empty() {
                return Ok(endpoint.trim().to_string());
            }
        }
        let subdomain = self
            .settings
            .memberful_subdomain
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::config("settings.memberful-subdomain is not configured"))?;
        Ok(format!("https://{subdomain}.memberful.com/api/graphql"))
    }

    /// Memberful API key.
    pub fn memberful_api_key(&self) -> Result<&str> {
        self.settings
            .memberful_api_key
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| AppError::config("settings.memberful-api-key is not configured"))
    }

    /// Delay between scheduler ticks.
    pub fn sync_interval(&self) -> Duration {
        Duration::from_secs(self.settings.sync_interval_secs)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|s| s.trim().is_empty())
}

/// Process-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// IANA time zone used for log timestamps (e.g. "America/New_York")
    #[serde(default)]
    pub time_zone: Option<String>,

    /// Numeric log threshold: 10 error, 20 warn, 30 info, 40 debug
    #[serde(default)]
    pub log_level: Option<i64>,

    /// Memberful API key (bearer token)
    #[serde(default)]
    pub memberful_api_key: Option<String>,

    /// Memberful account subdomain
    #[serde(default)]
    pub memberful_subdomain: Option<String>,

    /// Full GraphQL endpoint, overrides the subdomain-derived URL
    #[serde(default)]
    pub memberful_endpoint: Option<String>,

    /// Seconds between sync ticks
    #[serde(default = "defaults::sync_interval")]
    pub sync_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            time_zone: None,
            log_level: None,
            memberful_api_key: None,
            memberful_subdomain: None,
            memberful_endpoint: None,
            sync_interval_secs: defaults::sync_interval(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds; no timeout when unset
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: None,
        }
    }
}

/// Intercom contact sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IntercomConfig {
    /// Access token; the sync is disabled when unset
    #[serde(default)]
    pub access_token: Option<String>,

    /// API base URL
    #[serde(default = "defaults::intercom_api_base")]
    pub api_base: String,

    /// Minimum delay between the start of consecutive requests
    #[serde(default = "defaults::intercom_min_interval")]
    pub min_request_interval_ms: u64,

    /// What to do when a search returns more than one contact
    #[serde(default)]
    pub multiple_matches: MultipleMatchPolicy,
}

impl IntercomConfig {
    pub fn enabled(&self) -> bool {
        !is_blank(&self.access_token)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

impl Default for IntercomConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            api_base: defaults::intercom_api_base(),
            min_request_interval_ms: defaults::intercom_min_interval(),
            multiple_matches: MultipleMatchPolicy::default(),
        }
    }
}

/// WordPress user sync settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WordPressConfig {
    /// Application password; the sync is disabled when unset
    #[serde(default)]
    pub application_password: Option<String>,

    /// Site base URL (e.g. "https://example.com")
    #[serde(default)]
    pub url: Option<String>,

    /// User the application password belongs to
    #[serde(default)]
    pub username: Option<String>,

    /// Maximum concurrent member reconciliations
    #[serde(default = "defaults::wordpress_max_concurrent")]
    pub max_concurrent: usize,

    /// What to do when a search returns more than one user
    #[serde(default)]
    pub multiple_matches: MultipleMatchPolicy,
}

impl WordPressConfig {
    pub fn enabled(&self) -> bool {
        !is_blank(&self.application_password)
    }
}

impl Default for WordPressConfig {
    fn default() -> Self {
        Self {
            application_password: None,
            url: None,
            username: None,
            max_concurrent: defaults::wordpress_max_concurrent(),
            multiple_matches: MultipleMatchPolicy::default(),
        }
    }
}

/// Policy for a downstream search that matches more than one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultipleMatchPolicy {
    /// Log the conflict and report the member as failed
    #[default]
    Conflict,
    /// Create a new record anyway
    Create,
}

/// Log level threshold, keyed by its numeric configuration code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 10,
    Warn = 20,
    Info = 30,
    Debug = 40,
}

impl LogLevel {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            10 => Some(LogLevel::Error),
            20 => Some(LogLevel::Warn),
            30 => Some(LogLevel::Info),
            40 => Some(LogLevel::Debug),
            _ => None,
        }
    }

    pub fn level_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

mod defaults {
    pub fn sync_interval() -> u64 {
        1
    }
    pub fn user_agent() -> String {
        concat!("member-sync/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn intercom_api_base() -> String {
        "https://api.intercom.io".into()
    }
    pub fn intercom_min_interval() -> u64 {
        250
    }
    pub fn wordpress_max_concurrent() -> usize {
        5
    }
}
