//! Application configuration structures.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Accepted layouts for `schedule.end_time`.
const END_TIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y%m%d %H:%M:%S"];

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Trending board and topic URL layout
    #[serde(default)]
    pub source: SourceConfig,

    /// Cycle period and cutoff
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Snapshot retention and output
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Serialize the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate configuration values for basic sanity.
    ///
    /// The end time is only checked for format here; whether it lies in the
    /// future is decided when a schedule is built.
    pub fn validate(&self) -> Result<()> {
        if self.source.banner.trim().is_empty() {
            return Err(AppError::config("source.banner is empty"));
        }
        url::Url::parse(&self.source.url)
            .map_err(|e| AppError::config(format!("source.url {:?}: {e}", self.source.url)))?;
        if self.source.topic_limit == 0 {
            return Err(AppError::config("source.topic_limit must be > 0"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(AppError::config("schedule.interval_secs must be > 0"));
        }
        self.schedule.end_time()?;
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::config("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::config("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::config("crawler.max_concurrent must be > 0"));
        }
        if self.storage.history_capacity == 0 {
            return Err(AppError::config("storage.history_capacity must be > 0"));
        }
        if self.storage.persist_latest == 0 {
            return Err(AppError::config("storage.persist_latest must be > 0"));
        }
        Ok(())
    }
}

/// Where the ranking lives and how topic links are built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Display label, used as the prefix of persisted file names
    #[serde(default = "defaults::banner")]
    pub banner: String,

    /// Ranking page URL
    #[serde(default = "defaults::source_url")]
    pub url: String,

    /// Highest rank kept; rows ranked below it are dropped before any detail fetch
    #[serde(default = "defaults::topic_limit")]
    pub topic_limit: u32,

    #[serde(default = "defaults::topic_url_base")]
    pub topic_url_base: String,

    #[serde(default = "defaults::topic_url_suffix")]
    pub topic_url_suffix: String,

    #[serde(default = "defaults::detail_url_base")]
    pub detail_url_base: String,

    #[serde(default = "defaults::detail_url_suffix")]
    pub detail_url_suffix: String,
}

impl SourceConfig {
    /// Public link of a topic, from its still-encoded name.
    pub fn topic_url(&self, encoded_name: &str) -> String {
        format!(
            "{}{}{}",
            self.topic_url_base, encoded_name, self.topic_url_suffix
        )
    }

    /// Detail page holding the posts of a topic.
    pub fn detail_url(&self, encoded_name: &str) -> String {
        format!(
            "{}{}{}",
            self.detail_url_base, encoded_name, self.detail_url_suffix
        )
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            banner: defaults::banner(),
            url: defaults::source_url(),
            topic_limit: defaults::topic_limit(),
            topic_url_base: defaults::topic_url_base(),
            topic_url_suffix: defaults::topic_url_suffix(),
            detail_url_base: defaults::detail_url_base(),
            detail_url_suffix: defaults::detail_url_suffix(),
        }
    }
}

/// Cycle period and cutoff time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between two cycle starts
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Local wall-clock cutoff, e.g. `2026-10-18 20:00:00`
    #[serde(default = "defaults::end_time")]
    pub end_time: String,
}

impl ScheduleConfig {
    /// Parse `end_time` as a local timestamp.
    pub fn end_time(&self) -> Result<DateTime<Local>> {
        let raw = self.end_time.trim();
        let naive = END_TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .ok_or_else(|| {
                AppError::config(format!("schedule.end_time {raw:?} is not a valid timestamp"))
            })?;

        Local
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| {
                AppError::config(format!("schedule.end_time {raw:?} does not exist locally"))
            })
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: defaults::interval(),
            end_time: defaults::end_time(),
        }
    }
}

/// HTTP client behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent detail-page requests
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Delay after each detail-page request in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Snapshot retention and output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory receiving persisted snapshots
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,

    /// Snapshots kept in memory before the oldest is evicted
    #[serde(default = "defaults::history_capacity")]
    pub history_capacity: usize,

    /// Most recent snapshots written after each cycle
    #[serde(default = "defaults::persist_latest")]
    pub persist_latest: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: defaults::output_dir(),
            history_capacity: defaults::history_capacity(),
            persist_latest: defaults::persist_latest(),
        }
    }
}

mod defaults {
    // Source defaults
    pub fn banner() -> String {
        "热搜榜".into()
    }
    pub fn source_url() -> String {
        "https://s.weibo.com/top/summary?cate=realtimehot".into()
    }
    pub fn topic_limit() -> u32 {
        10
    }
    pub fn topic_url_base() -> String {
        "https://s.weibo.com/weibo?q=".into()
    }
    pub fn topic_url_suffix() -> String {
        "&Refer=top".into()
    }
    pub fn detail_url_base() -> String {
        "https://s.weibo.com/hot?q=".into()
    }
    pub fn detail_url_suffix() -> String {
        "&xsort=hot&suball=1&tw=hotweibo&Refer=weibo_hot".into()
    }

    // Schedule defaults
    pub fn interval() -> u64 {
        600
    }
    pub fn end_time() -> String {
        (chrono::Local::now() + chrono::Duration::days(1))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; trendwatch/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        4
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Storage defaults
    pub fn output_dir() -> String {
        "snapshots".into()
    }
    pub fn history_capacity() -> usize {
        1000
    }
    pub fn persist_latest() -> usize {
        1
    }
}
