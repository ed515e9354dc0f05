use std::env;
use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const LOG_ENV: &str = "CCS_LOG";

/// Installs a file subscriber when `CCS_LOG` is set. The terminal belongs to
/// the UI, so nothing is ever logged to stdout or stderr.
pub fn init(config: &Config) -> Result<()> {
    let Ok(directive) = env::var(LOG_ENV) else {
        return Ok(());
    };

    let path = config.log_file();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_new(directive.trim()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .init();

    tracing::info!("logging to {}", path.display());
    Ok(())
}
