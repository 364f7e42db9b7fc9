use anyhow::{Context, Result};
use chrono::Local;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

const LOG_PREFIX: &str = "modx-remote_";
const LOG_SUFFIX: &str = ".log";

/// Number of log files kept in the log directory, newest first.
pub const MAX_LOG_FILES: usize = 20;

/// Send tracing output to a timestamped file under `log_dir`.
///
/// stdout and stderr belong to the remote command, so nothing is logged there.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    if !log_dir.exists() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    if let Err(e) = prune_old_logs(log_dir, MAX_LOG_FILES - 1) {
        eprintln!("Warning: failed to prune old logs: {}", e);
    }

    let log_file = log_dir.join(format!(
        "{}{}{}",
        LOG_PREFIX,
        Local::now().format("%Y%m%d_%H%M%S"),
        LOG_SUFFIX
    ));
    let file = File::create(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(EnvFilter::from_default_env().add_directive("modx_remote=debug".parse()?))
        .with_ansi(false)
        .with_writer(file)
        .init();

    Ok(log_file)
}

/// Delete all but the `keep` newest log files in `log_dir`.
///
/// File names carry a sortable timestamp, so name order is age order. Files
/// that don't look like our logs are left alone.
pub fn prune_old_logs(log_dir: &Path, keep: usize) -> io::Result<usize> {
    let mut logs: Vec<PathBuf> = fs::read_dir(log_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(LOG_PREFIX) && name.ends_with(LOG_SUFFIX))
        })
        .collect();

    if logs.len() <= keep {
        return Ok(0);
    }

    logs.sort();
    let excess = logs.len() - keep;
    for path in &logs[..excess] {
        fs::remove_file(path)?;
    }
    Ok(excess)
}
