use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LoggingConfig, ReportPaths};

/// Read by the turn simulator to attach per-step history to its events.
const TURN_DETAILS_ENV: &str = "YZP_TURN_DETAILS";

/// Keeps the background writer alive; dropping it flushes pending events.
pub struct Telemetry {
    _worker: WorkerGuard,
    pub path: PathBuf,
    /// False when another global subscriber was already installed.
    pub installed: bool,
}

/// Routes tracing events as JSON lines into the report directory.
pub fn init_telemetry(
    logging: &LoggingConfig,
    paths: &ReportPaths,
) -> Result<Option<Telemetry>> {
    if !logging.structured {
        return Ok(None);
    }

    if logging.turn_details {
        unsafe {
            std::env::set_var(TURN_DETAILS_ENV, "1");
        }
    }

    fs::create_dir_all(&paths.dir)
        .with_context(|| format!("creating report directory {}", paths.dir.display()))?;
    let file = File::create(&paths.telemetry)
        .with_context(|| format!("creating {}", paths.telemetry.display()))?;
    let (writer, worker) = NonBlockingBuilder::default().lossy(false).finish(file);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(logging.level()).into())
        .from_env_lossy();
    let json = fmt::layer()
        .json()
        .flatten_event(true)
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(writer);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .try_init()
        .is_ok();

    Ok(Some(Telemetry {
        _worker: worker,
        path: paths.telemetry.clone(),
        installed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn plain_runs_write_no_telemetry() {
        let dir = tempdir().unwrap();
        let paths = ReportPaths::in_dir(dir.path().join("report"), false);
        let telemetry = init_telemetry(&LoggingConfig::default(), &paths).unwrap();
        assert!(telemetry.is_none());
        assert!(!paths.dir.exists());
    }

    #[test]
    fn structured_runs_create_the_telemetry_file() {
        let dir = tempdir().unwrap();
        let paths = ReportPaths::in_dir(dir.path().join("report"), false);
        let logging = LoggingConfig {
            structured: true,
            ..LoggingConfig::default()
        };
        let telemetry = init_telemetry(&logging, &paths).unwrap().unwrap();
        assert_eq!(telemetry.path, dir.path().join("report").join("telemetry.jsonl"));
        assert!(telemetry.path.exists());
    }
}
