// src/config/mod.rs
//! Run configuration. Loaded once at startup and passed by reference to every
//! component; nothing reads configuration from global state.

pub mod word_groups;

use anyhow::{anyhow, Context, Result};
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::analyze::ReportMode;
use crate::clock::{parse_utc_offset, DEFAULT_UTC_OFFSET};

pub use word_groups::{load_word_groups, parse_word_groups, WordGroup, WordGroups};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";
pub const ENV_CONFIG_PATH: &str = "HEADLINE_CONFIG_PATH";

fn default_rank_threshold() -> u32 {
    5
}
fn default_utc_offset() -> String {
    DEFAULT_UTC_OFFSET.to_string()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_word_groups_path() -> PathBuf {
    PathBuf::from("config/frequency_words.txt")
}
fn default_true() -> bool {
    true
}
fn default_batch_size() -> usize {
    4000
}
fn default_batch_interval_ms() -> u64 {
    1000
}
fn default_window_start() -> String {
    "08:00".to_string()
}
fn default_window_end() -> String {
    "22:00".to_string()
}
fn default_retention_days() -> i64 {
    7
}
fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
    /// Monitored sources; their ids form the allow-list for merging and diffing.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
    #[serde(default = "default_word_groups_path")]
    pub word_groups_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub mode: ReportMode,
    /// Ranks at or above this position are emphasized when rendered.
    #[serde(default = "default_rank_threshold")]
    pub rank_threshold: u32,
    /// Offset used to decide the calendar day, e.g. "+08:00".
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Optional line appended to every message footer (e.g. an update notice).
    #[serde(default)]
    pub footer_notice: Option<String>,
    /// Plain-text `major.minor.patch` published for the latest release.
    #[serde(default)]
    pub version_check_url: Option<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            mode: ReportMode::default(),
            rank_threshold: default_rank_threshold(),
            utc_offset: default_utc_offset(),
            output_dir: default_output_dir(),
            footer_notice: None,
            version_check_url: None,
        }
    }
}

impl ReportConfig {
    /// Append a footer line below any configured notice.
    pub fn add_notice(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.footer_notice = Some(match self.footer_notice.take().filter(|n| !n.is_empty()) {
            Some(existing) => format!("{existing}\n{line}"),
            None => line,
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Per-message byte budget for chat channels.
    #[serde(default = "default_batch_size")]
    pub message_batch_size: usize,
    #[serde(default = "default_batch_interval_ms")]
    pub batch_send_interval_ms: u64,
    #[serde(default)]
    pub push_window: PushWindowConfig,
    #[serde(default)]
    pub telegram: Option<TelegramConfig>,
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            message_batch_size: default_batch_size(),
            batch_send_interval_ms: default_batch_interval_ms(),
            push_window: PushWindowConfig::default(),
            telegram: None,
            email: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushWindowConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_window_start")]
    pub start: String,
    #[serde(default = "default_window_end")]
    pub end: String,
    #[serde(default = "default_true")]
    pub once_per_day: bool,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for PushWindowConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start: default_window_start(),
            end: default_window_end(),
            once_per_day: true,
            retention_days: default_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// Defaults to `from` when empty.
    #[serde(default)]
    pub username: String,
    pub password: String,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            report: ReportConfig::default(),
            notification: NotificationConfig::default(),
            sources: Vec::new(),
            word_groups_path: default_word_groups_path(),
        }
    }
}

impl AppConfig {
    /// Resolve the path from `$HEADLINE_CONFIG_PATH` or the default, load it,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        let mut cfg = Self::load_from_file(&path)?;
        cfg.apply_env_overrides();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config at {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Environment variables win over file values when set and non-empty.
    pub fn apply_env_overrides(&mut self) {
        if let Some(mode) = env_str("REPORT_MODE") {
            match mode.parse::<ReportMode>() {
                Ok(m) => self.report.mode = m,
                Err(e) => tracing::warn!(value = %mode, error = %e, "ignoring REPORT_MODE"),
            }
        }
        if let Some(v) = env_bool("ENABLE_NOTIFICATION") {
            self.notification.enabled = v;
        }

        let window = &mut self.notification.push_window;
        if let Some(v) = env_bool("PUSH_WINDOW_ENABLED") {
            window.enabled = v;
        }
        if let Some(v) = env_str("PUSH_WINDOW_START") {
            window.start = v;
        }
        if let Some(v) = env_str("PUSH_WINDOW_END") {
            window.end = v;
        }
        if let Some(v) = env_bool("PUSH_WINDOW_ONCE_PER_DAY") {
            window.once_per_day = v;
        }
        if let Some(days) = env_str("PUSH_WINDOW_RETENTION_DAYS").and_then(|s| s.parse::<i64>().ok()) {
            if days > 0 {
                window.retention_days = days;
            }
        }

        if let (Some(token), Some(chat)) = (env_str("TELEGRAM_BOT_TOKEN"), env_str("TELEGRAM_CHAT_ID")) {
            self.notification.telegram = Some(TelegramConfig {
                bot_token: token,
                chat_id: chat,
            });
        }

        let email_env = (env_str("EMAIL_FROM"), env_str("EMAIL_PASSWORD"), env_str("EMAIL_TO"));
        if let (Some(from), Some(password), Some(to)) = email_env {
            let port = env_str("EMAIL_SMTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_smtp_port);
            let host = env_str("EMAIL_SMTP_SERVER")
                .or_else(|| self.notification.email.as_ref().map(|e| e.smtp_host.clone()))
                .unwrap_or_default();
            self.notification.email = Some(EmailConfig {
                smtp_host: host,
                smtp_port: port,
                username: String::new(),
                password,
                from,
                to,
            });
        }
    }

    pub fn validate(&self) -> Result<()> {
        if parse_utc_offset(&self.report.utc_offset).is_none() {
            return Err(anyhow!("report.utc_offset `{}` is not a valid offset", self.report.utc_offset));
        }
        if self.notification.message_batch_size == 0 {
            return Err(anyhow!("notification.message_batch_size must be > 0"));
        }
        if self.sources.is_empty() {
            return Err(anyhow!("no [[sources]] configured"));
        }
        if let Some(email) = &self.notification.email {
            if email.smtp_host.trim().is_empty() {
                return Err(anyhow!("notification.email.smtp_host is empty"));
            }
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> FixedOffset {
        parse_utc_offset(&self.report.utc_offset)
            .or_else(|| parse_utc_offset(DEFAULT_UTC_OFFSET))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.id.clone()).collect()
    }

    pub fn push_record_dir(&self) -> PathBuf {
        self.report.output_dir.join(".push_records")
    }

    pub fn has_channels(&self) -> bool {
        self.notification.telegram.is_some() || self.notification.email.is_some()
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    env_str(key).map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1"))
}
