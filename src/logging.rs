//! Diagnostic log
//!
//! Events go to `where-am-i.log` in the state directory through a
//! non-blocking appender. The filter is reloadable so `enableDebugLogs` takes
//! effect on the next recompute without restarting.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

pub const LOG_FILE_NAME: &str = "where-am-i.log";

/// Environment variable that pins the filter, ignoring `enableDebugLogs`.
pub const LOG_ENV: &str = "WHERE_AM_I_LOG";

/// The user state directory (`~/.local/state/where-am-i` on Linux), or the
/// local data directory on platforms without one.
pub fn log_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "where-am-i").context("No home directory found for the diagnostic log")?;
    Ok(dirs
        .state_dir()
        .unwrap_or_else(|| dirs.data_local_dir())
        .to_path_buf())
}

fn filter_for(debug: bool) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        EnvFilter::new(if debug { "where_am_i=debug" } else { "where_am_i=info" })
    })
}

/// Handle on the installed subscriber.
pub struct LogControl {
    filter: reload::Handle<EnvFilter, Registry>,
    debug: AtomicBool,
    path: PathBuf,
    _guard: WorkerGuard,
}

impl LogControl {
    /// Switch debug logging on or off. Cheap when nothing changes.
    pub fn set_debug(&self, enabled: bool) {
        if self.debug.swap(enabled, Ordering::Relaxed) == enabled {
            return;
        }
        if let Err(e) = self.filter.reload(filter_for(enabled)) {
            eprintln!("where-am-i: failed to reload log filter: {}", e);
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Install the global subscriber writing to `dir`.
pub fn init(dir: &Path, debug: bool) -> Result<LogControl> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let (filter, handle) = reload::Layer::new(filter_for(debug));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .with_thread_ids(false),
        )
        .try_init()
        .context("Failed to install the log subscriber")?;

    Ok(LogControl {
        filter: handle,
        debug: AtomicBool::new(debug),
        path: dir.join(LOG_FILE_NAME),
        _guard: guard,
    })
}

/// Copy the log file to `out`.
pub fn show_logs(dir: &Path, out: &mut impl Write) -> Result<()> {
    let path = dir.join(LOG_FILE_NAME);
    if !path.exists() {
        writeln!(out, "No diagnostic log yet at {}", path.display())?;
        writeln!(out, "Set \"where-am-i.enableDebugLogs\": true for detailed entries.")?;
        return Ok(());
    }

    let contents =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    out.write_all(contents.as_bytes())?;
    Ok(())
}
