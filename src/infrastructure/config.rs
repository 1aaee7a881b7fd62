//! Configuration infrastructure
//!
//! Configuration is layered, later layers winning:
//! 1. Built-in defaults (the `defaults` module)
//! 2. An optional config file (`--config`, any format the `config` crate reads)
//! 3. Environment variables, e.g. `TRENDING_SCRAPER__SCRAPER__MAX_RETRIES=5`
//!    or `TRENDING_SCRAPER__SITES__DARAZ_NP__BASE_URL=https://...`

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::domain::site::{SiteId, SiteProfile};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {message}")]
    Validation { message: String },
}

impl ConfigError {
    fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP behaviour shared by every site
    pub scraper: ScraperConfig,

    /// Per-site overrides keyed by site key (`amazon_in`, `daraz_np`)
    pub sites: HashMap<String, SiteOverride>,

    pub storage: StorageConfig,

    pub analysis: AnalysisConfig,

    pub logging: LoggingConfig,
}

/// Common scraper settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Attempts per page before giving up
    pub max_retries: u32,

    /// Base backoff delay; doubled on every further attempt
    pub retry_delay_ms: u64,

    pub timeout_seconds: u64,

    /// Pause before every request after the first
    pub request_delay_ms: u64,

    pub max_requests_per_second: u32,

    pub user_agent: String,

    pub accept_language: String,

    pub follow_redirects: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::MAX_RETRIES,
            retry_delay_ms: defaults::RETRY_DELAY_MS,
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            max_requests_per_second: defaults::MAX_REQUESTS_PER_SECOND,
            user_agent: defaults::USER_AGENT.to_string(),
            accept_language: defaults::ACCEPT_LANGUAGE.to_string(),
            follow_redirects: true,
        }
    }
}

/// Optional per-site overrides
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteOverride {
    pub base_url: Option<String>,
    pub trending_pages: Option<Vec<String>>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where scrape results are written
    pub data_dir: PathBuf,

    pub charts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
            charts_dir: PathBuf::from(defaults::DATA_DIR).join(defaults::CHARTS_SUBDIR),
        }
    }
}

impl StorageConfig {
    /// The configured data directory if it can be created, otherwise a
    /// per-user directory under the platform's local data dir.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if std::fs::create_dir_all(&self.data_dir).is_ok() {
            return self.data_dir.clone();
        }

        match dirs::data_local_dir() {
            Some(local) => {
                let fallback = local.join(defaults::APP_DIR_NAME).join("data");
                warn!(
                    "Data directory {:?} is not writable, using {:?}",
                    self.data_dir, fallback
                );
                fallback
            }
            None => self.data_dir.clone(),
        }
    }

    /// The configured charts directory if it can be created, otherwise the
    /// `charts` folder next to wherever [`Self::resolve_data_dir`] landed.
    pub fn resolve_charts_dir(&self) -> PathBuf {
        if std::fs::create_dir_all(&self.charts_dir).is_ok() {
            return self.charts_dir.clone();
        }

        let fallback = self.resolve_data_dir().join(defaults::CHARTS_SUBDIR);
        warn!(
            "Charts directory {:?} is not writable, using {:?}",
            self.charts_dir, fallback
        );
        fallback
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Symbol used when rendering prices in insights and charts
    pub currency_symbol: String,

    /// Entries per "top products" list
    pub top_n: usize,

    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            currency_symbol: defaults::CURRENCY_SYMBOL.to_string(),
            top_n: defaults::TOP_N,
            histogram_bins: defaults::HISTOGRAM_BINS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    pub console_output: bool,

    pub file_output: bool,

    pub log_dir: PathBuf,

    /// Number of log files to keep (older files will be deleted)
    pub max_files: u32,

    /// Enable automatic log cleanup on startup
    pub auto_cleanup_logs: bool,

    /// Module-specific log level filters (e.g., "reqwest": "info")
    pub module_filters: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let module_filters = [("reqwest", "info"), ("hyper", "warn"), ("html5ever", "warn")]
            .into_iter()
            .map(|(module, level)| (module.to_string(), level.to_string()))
            .collect();

        Self {
            level: "info".to_string(),
            json_format: false,
            console_output: true,
            file_output: true,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            max_files: defaults::MAX_LOG_FILES,
            auto_cleanup_logs: true,
            module_filters,
        }
    }
}

impl AppConfig {
    /// Defaults, then `file` (if given), then `TRENDING_SCRAPER__*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&AppConfig::default())?);

        if let Some(path) = file {
            info!("Loading configuration file {:?}", path);
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(defaults::ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scraper.max_retries == 0 {
            return Err(ConfigError::validation("scraper.max_retries must be at least 1"));
        }
        if self.scraper.timeout_seconds == 0 {
            return Err(ConfigError::validation("scraper.timeout_seconds must be positive"));
        }
        if self.scraper.max_requests_per_second == 0 {
            return Err(ConfigError::validation(
                "scraper.max_requests_per_second must be positive",
            ));
        }
        if self.analysis.histogram_bins == 0 {
            return Err(ConfigError::validation("analysis.histogram_bins must be positive"));
        }

        for (key, site) in &self.sites {
            if key.parse::<SiteId>().is_err() {
                warn!("Ignoring overrides for unknown site '{}'", key);
                continue;
            }
            if let Some(pages) = &site.trending_pages {
                if pages.is_empty() || pages.iter().any(|p| p.trim().is_empty()) {
                    return Err(ConfigError::validation(format!(
                        "sites.{key}.trending_pages must list at least one non-empty path"
                    )));
                }
            }
            if let Some(base) = &site.base_url {
                let absolute = Url::parse(base)
                    .map(|u| matches!(u.scheme(), "http" | "https"))
                    .unwrap_or(false);
                if !absolute {
                    return Err(ConfigError::validation(format!(
                        "sites.{key}.base_url must be an absolute http(s) URL, got '{base}'"
                    )));
                }
            }
        }

        Ok(())
    }

    fn site_override(&self, site: SiteId) -> Option<&SiteOverride> {
        self.sites.get(site.key())
    }

    /// Built-in profile with this configuration's overrides applied.
    pub fn site_profile(&self, site: SiteId) -> SiteProfile {
        let mut profile = SiteProfile::builtin(site);
        if let Some(overrides) = self.site_override(site) {
            if let Some(base) = &overrides.base_url {
                profile.base_url = base.trim_end_matches('/').to_string();
            }
            if let Some(pages) = &overrides.trending_pages {
                profile.trending_pages.clone_from(pages);
            }
        }
        profile
    }

    pub fn user_agent_for(&self, site: SiteId) -> &str {
        self.site_override(site)
            .and_then(|o| o.user_agent.as_deref())
            .unwrap_or(&self.scraper.user_agent)
    }
}

/// Default configuration values
pub mod defaults {
    pub const APP_DIR_NAME: &str = "trending-scraper";

    /// Prefix of environment overrides
    pub const ENV_PREFIX: &str = "TRENDING_SCRAPER";

    pub const MAX_RETRIES: u32 = 3;

    /// Backoff base of half a second
    pub const RETRY_DELAY_MS: u64 = 500;

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const REQUEST_DELAY_MS: u64 = 1500;

    pub const MAX_REQUESTS_PER_SECOND: u32 = 2;

    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

    pub const DATA_DIR: &str = "data";

    pub const CHARTS_SUBDIR: &str = "charts";

    pub const LOG_DIR: &str = "logs";

    pub const MAX_LOG_FILES: u32 = 5;

    pub const CURRENCY_SYMBOL: &str = "₹";

    pub const TOP_N: usize = 5;

    pub const HISTOGRAM_BINS: usize = 20;
}
