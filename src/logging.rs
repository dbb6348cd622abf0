//! Plugin logging.
//!
//! The host console and the plugin's own log file receive the same lines.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::{PluginError, Result};

/// Level from the `Logging.Level` setting. Unknown values mean info.
fn parse_level(level: &str) -> Level {
    let level = level.trim();
    if level.eq_ignore_ascii_case("warning") {
        return Level::WARN;
    }
    level.parse().unwrap_or(Level::INFO)
}

/// `RUST_LOG` directives win over the configured level.
fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::from_default_env().add_directive(parse_level(level).into())
}

/// The configured file, or `default_file` when the setting is empty.
fn log_file_path(config: &LoggingConfig, default_file: &Path) -> PathBuf {
    if config.file.is_empty() {
        default_file.to_path_buf()
    } else {
        PathBuf::from(&config.file)
    }
}

/// Open the log file for appending; the host may load the plugin several
/// times per process and earlier lines must survive.
fn open_log_file(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

/// Start logging to stdout and the plugin log file.
///
/// Fails when the file cannot be opened or a global subscriber is already
/// installed.
pub fn init(config: &LoggingConfig, default_file: &Path) -> Result<()> {
    let log_file = Arc::new(open_log_file(&log_file_path(config, default_file))?);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stdout.and(log_file))
                .with_ansi(false)
                .with_target(true),
        )
        .with(env_filter(&config.level))
        .try_init()
        .map_err(|e| PluginError::Config(format!("logging already initialized: {e}")))
}

/// Start console-only logging. A second call is a no-op.
pub fn init_console_only(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(env_filter(level))
        .try_init();
}
