//! File-only tracing. The terminal belongs to the TUI, so nothing is written
//! to stdout or stderr once the alternate screen is up.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE: &str = "statimatch.log";
const DEFAULT_FILTER: &str = "info,statimatch=debug,reqwest=warn,hyper=warn";

/// Installs a daily-rolling file subscriber in `dir`. Returns `Ok(None)` when
/// the directory is not writable; the app then runs without a log file.
/// The guard must outlive the UI so buffered lines are flushed.
pub fn init_logging(dir: &Path) -> io::Result<Option<WorkerGuard>> {
    if !dir_writable(dir) {
        return Ok(None);
    }
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true),
        )
        .try_init()
        .map_err(|err| io::Error::other(err.to_string()))?;
    Ok(Some(guard))
}

// rolling::daily panics if it cannot create its first file
fn dir_writable(dir: &Path) -> bool {
    if fs::create_dir_all(dir).is_err() {
        return false;
    }
    let probe = dir.join(".statimatch_write_test");
    match OpenOptions::new().create(true).append(true).open(&probe) {
        Ok(_) => {
            let _ = fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_creates_missing_directories() {
        let dir = std::env::temp_dir()
            .join(format!("statimatch-log-test-{}", std::process::id()))
            .join("nested");
        assert!(dir_writable(&dir));
        assert!(dir.is_dir());
        assert!(!dir.join(".statimatch_write_test").exists());
        let _ = fs::remove_dir_all(dir.parent().unwrap_or(&dir));
    }
}
