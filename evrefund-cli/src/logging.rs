use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogSection;

/// Local wall-clock time, same calendar day the query window and refund notes use.
const LOG_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn local_timer() -> ChronoLocal {
    ChronoLocal::new(LOG_TIME_FORMAT.to_string())
}

/// Install the audit log: a daily-rotated file, mirrored to stdout when `console` is set.
/// Returns the file path prefix (the appender adds a `.YYYY-MM-DD` suffix).
pub fn init(log: &LogSection, console: bool) -> Result<PathBuf> {
    let dir = log.dir()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(log.file_name.clone())
        .build(&dir)
        .with_context(|| format!("open log file in {}", dir.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    let file_layer = fmt::layer()
        .with_writer(appender)
        .with_timer(local_timer())
        .with_ansi(false)
        .with_target(false);
    let console_layer = console.then(|| {
        fmt::layer()
            .with_writer(std::io::stdout)
            .with_timer(local_timer())
            .with_target(false)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .context("install log subscriber")?;

    Ok(dir.join(&log.file_name))
}
