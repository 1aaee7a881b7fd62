//! Logging system configuration and initialization
//!
//! The library only emits `tracing` spans and events; installing a subscriber
//! is left to the host. This module is what the binary uses to do that:
//! - Console output with local timestamps
//! - One log file per run under the configured log directory
//! - Optional structured JSON for the file layer
//! - `RUST_LOG` override of the configured level and module filters
//! - Startup cleanup that keeps only the newest `max_files` log files

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use lazy_static::lazy_static;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::{self, time::FormatTime};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

pub use crate::infrastructure::config::LoggingConfig;

const LOG_FILE_PREFIX: &str = "trending-scraper";

// Keeps the non-blocking file writer alive for the life of the process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<WorkerGuard>> = Mutex::new(Vec::new());
}

struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut filter = EnvFilter::new(&config.level);
        for (module, level) in &config.module_filters {
            if let Ok(directive) = format!("{module}={level}").parse() {
                filter = filter.add_directive(directive);
            }
        }
        if let Ok(directive) = format!("trending_scraper_lib={}", config.level).parse() {
            filter = filter.add_directive(directive);
        }
        filter
    })
}

/// Initialize logging with custom configuration
///
/// Dependency noise (`reqwest`, `hyper`, `html5ever`) is held back by the
/// configured module filters. Setting `RUST_LOG` replaces the whole filter:
/// ```bash
/// RUST_LOG="debug,reqwest=debug" trending-scraper scrape --site amazon_in
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    if !config.file_output && !config.console_output {
        return Err(anyhow!("No logging output configured"));
    }

    let file_layer = if config.file_output {
        std::fs::create_dir_all(&config.log_dir)
            .with_context(|| format!("Failed to create log directory {:?}", config.log_dir))?;

        if config.auto_cleanup_logs {
            // leave room for the file this run is about to create
            cleanup_old_logs(&config.log_dir, config.max_files.saturating_sub(1))?;
        }

        let file_name = format!(
            "{LOG_FILE_PREFIX}-{}.log",
            Local::now().format("%Y%m%d_%H%M%S")
        );
        let (writer, guard) = non_blocking(rolling::never(&config.log_dir, file_name));
        if let Ok(mut guards) = LOG_GUARDS.lock() {
            guards.push(guard);
        }

        let layer = fmt::layer()
            .with_writer(writer)
            .with_timer(LocalTimeFormatter)
            .with_ansi(false);
        Some(if config.json_format {
            layer
                .json()
                .with_target(true)
                .with_current_span(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            layer.with_target(false).boxed()
        })
    } else {
        None
    };

    let console_layer = config.console_output.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_timer(LocalTimeFormatter)
            .with_target(false)
            .boxed()
    });

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))?;

    info!("Logging system initialized");
    info!("Log directory: {:?}", config.log_dir);
    info!("Log level: {}", config.level);
    info!("JSON format: {}", config.json_format);
    Ok(())
}

/// Delete all but the newest `keep` `.log` files; returns how many were removed.
pub fn cleanup_old_logs(log_dir: &Path, keep: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files: Vec<(PathBuf, std::time::SystemTime)> = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path.extension().is_some_and(|ext| ext == "log");
        if !path.is_file() || !is_log {
            continue;
        }
        if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
            log_files.push((path, modified));
        }
    }

    // newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(keep as usize) {
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove old log file {:?}: {}", path, e),
        }
    }
    Ok(removed)
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Trending Scraper System Information ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.level.is_empty());
        assert!(config.console_output);
        assert!(config.file_output);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
    }

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..7 {
            std::fs::write(dir.path().join(format!("run-{i}.log")), "x").unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "keep me").unwrap();

        let removed = cleanup_old_logs(dir.path(), 5).unwrap();
        assert_eq!(removed, 2);

        let remaining = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, 6);
    }

    #[test]
    fn no_output_is_rejected() {
        let config = LoggingConfig {
            file_output: false,
            console_output: false,
            ..LoggingConfig::default()
        };
        assert!(init_logging_with_config(&config).is_err());
    }
}
