// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Logging initialization
//!
//! Console output always goes through a `fmt` layer filtered by an
//! `EnvFilter`. With the `file-logging` feature a combined log file is also
//! written into a timestamped run folder, and old run folders are pruned:
//!
//! ```text
//! ./logs/
//!   ├── run_20250101_120000/nef.log
//!   └── run_20250102_093000/nef.log
//! ```

use std::path::{Path, PathBuf};

#[cfg(feature = "file-logging")]
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::{CrateDebugFlags, ObservabilityError, Result};

/// Where file logs go and how many old runs to keep
#[derive(Debug, Clone, PartialEq)]
pub struct FileLogging {
    /// Base directory holding one `run_<timestamp>` folder per run
    pub dir: PathBuf,
    /// Delete run folders older than this many days
    pub retention_days: u64,
    /// Keep at most this many run folders, the current one included
    pub retention_runs: usize,
}

impl FileLogging {
    /// 30 days / 10 runs retention
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            retention_days: 30,
            retention_runs: 10,
        }
    }

    pub fn with_retention(mut self, days: u64, runs: usize) -> Self {
        self.retention_days = days;
        self.retention_runs = runs;
        self
    }
}

/// Guard that keeps the non-blocking file writers alive.
/// Drop this to flush and close log files.
pub struct LoggingGuard {
    #[cfg(feature = "file-logging")]
    _file_guards: Vec<tracing_appender::non_blocking::WorkerGuard>,
    log_dir: Option<PathBuf>,
}

impl LoggingGuard {
    /// Run folder the log file is written to, if file logging is active
    pub fn log_dir(&self) -> Option<&Path> {
        self.log_dir.as_deref()
    }
}

impl std::fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingGuard")
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

/// Build the `EnvFilter` for a base level plus per-crate debug flags.
///
/// `RUST_LOG` wins over both when it is set.
pub fn build_filter(level: &str, debug_flags: &CrateDebugFlags) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = debug_flags.to_filter_string(level);
    EnvFilter::try_new(&directives).map_err(|e| ObservabilityError::InvalidFilter {
        filter: directives,
        reason: e.to_string(),
    })
}

/// Initialize logging with a console layer and, when `files` is given,
/// a file layer (requires the `file-logging` feature).
///
/// # Example
/// ```rust,no_run
/// use nef_observability::{init_logging, parse_debug_flags};
///
/// let flags = parse_debug_flags();
/// let _guard = init_logging("info", &flags, None).expect("logging");
/// tracing::info!("ready");
/// ```
pub fn init_logging(
    level: &str,
    debug_flags: &CrateDebugFlags,
    files: Option<&FileLogging>,
) -> Result<LoggingGuard> {
    let filter = build_filter(level, debug_flags)?;

    match files {
        None => {
            Registry::default()
                .with(filter)
                .with(fmt::layer().with_target(true))
                .try_init()
                .map_err(|e| ObservabilityError::AlreadyInitialized(e.to_string()))?;
            Ok(LoggingGuard {
                #[cfg(feature = "file-logging")]
                _file_guards: Vec::new(),
                log_dir: None,
            })
        }
        Some(files) => init_with_files(filter, files),
    }
}

/// Console logging at `info` with flags from args and `NEF_DEBUG`
pub fn init_logging_default() -> Result<LoggingGuard> {
    init_logging("info", &crate::parse_debug_flags(), None)
}

#[cfg(feature = "file-logging")]
fn init_with_files(filter: EnvFilter, files: &FileLogging) -> Result<LoggingGuard> {
    let now = Utc::now();
    let run_dir = create_run_dir(&files.dir, now)?;
    let appender = tracing_appender::rolling::never(&run_dir, "nef.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_writer(writer).with_ansi(false);

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .try_init()
        .map_err(|e| ObservabilityError::AlreadyInitialized(e.to_string()))?;

    // After init so removal failures reach the new subscriber
    let removed = cleanup_old_logs(
        &files.dir,
        files.retention_days,
        files.retention_runs,
        now,
        &run_dir,
    )?;
    tracing::debug!(
        "[NEF-LOG] Logging to {} ({} old runs removed)",
        run_dir.display(),
        removed
    );

    Ok(LoggingGuard {
        _file_guards: vec![guard],
        log_dir: Some(run_dir),
    })
}

#[cfg(not(feature = "file-logging"))]
fn init_with_files(_filter: EnvFilter, _files: &FileLogging) -> Result<LoggingGuard> {
    Err(ObservabilityError::FileLoggingDisabled)
}

/// Run folder timestamp, e.g. `run_20250101_120000`
#[cfg(feature = "file-logging")]
const RUN_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// About a thousand years
#[cfg(feature = "file-logging")]
const MAX_RETENTION_DAYS: u64 = 365_000;

#[cfg(feature = "file-logging")]
fn io_error(path: &Path, source: std::io::Error) -> ObservabilityError {
    ObservabilityError::LogDirectory {
        path: path.display().to_string(),
        source,
    }
}

/// Create `run_<timestamp>` under `base`, suffixing a counter when a run
/// started within the same second
#[cfg(feature = "file-logging")]
fn create_run_dir(base: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
    std::fs::create_dir_all(base).map_err(|e| io_error(base, e))?;

    let stamp = now.format(RUN_TIMESTAMP_FORMAT).to_string();
    let mut candidate = base.join(format!("run_{}", stamp));
    let mut suffix = 1;
    while candidate.exists() {
        candidate = base.join(format!("run_{}_{}", stamp, suffix));
        suffix += 1;
    }
    std::fs::create_dir(&candidate).map_err(|e| io_error(&candidate, e))?;
    Ok(candidate)
}

/// Start time encoded in a run folder name, ignoring any collision suffix
#[cfg(feature = "file-logging")]
fn run_started_at(dir_name: &str) -> Option<DateTime<Utc>> {
    let stamp = dir_name.strip_prefix("run_")?.get(..15)?;
    let naive = NaiveDateTime::parse_from_str(stamp, RUN_TIMESTAMP_FORMAT).ok()?;
    Some(Utc.from_utc_datetime(&naive))
}

/// Delete run folders older than `retention_days`, then the oldest ones beyond
/// `retention_runs`. `current` is never removed. Returns how many were deleted.
#[cfg(feature = "file-logging")]
fn cleanup_old_logs(
    base: &Path,
    retention_days: u64,
    retention_runs: usize,
    now: DateTime<Utc>,
    current: &Path,
) -> Result<usize> {
    if !base.exists() {
        return Ok(0);
    }

    let mut runs: Vec<(DateTime<Utc>, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(base).map_err(|e| io_error(base, e))? {
        let path = entry.map_err(|e| io_error(base, e))?.path();
        if !path.is_dir() || path == current {
            continue;
        }
        let started = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(run_started_at);
        if let Some(started) = started {
            runs.push((started, path));
        }
    }
    // Newest first
    runs.sort_by(|a, b| b.cmp(a));

    // Clamped so the subtraction stays within chrono's range
    let cutoff = now - Duration::days(retention_days.min(MAX_RETENTION_DAYS) as i64);
    // The current run takes one of the retained slots
    let keep = retention_runs.saturating_sub(1);

    let mut removed = 0;
    for (rank, (started, path)) in runs.iter().enumerate() {
        if *started >= cutoff && rank < keep {
            continue;
        }
        match std::fs::remove_dir_all(path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!(
                "[NEF-LOG] Failed to remove old log directory {}: {}",
                path.display(),
                e
            ),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_accepts_flags() {
        let flags = CrateDebugFlags::from_args(vec!["--debug-nef-npu-engine".to_string()]);
        assert!(build_filter("warn", &flags).is_ok());
    }

    #[test]
    fn test_bad_level_rejected() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let err = build_filter("info,=[", &CrateDebugFlags::default()).unwrap_err();
        assert!(matches!(err, ObservabilityError::InvalidFilter { .. }));
    }

    #[test]
    fn test_file_logging_defaults() {
        let files = FileLogging::new("logs");
        assert_eq!(files.retention_days, 30);
        assert_eq!(files.retention_runs, 10);
        assert_eq!(files.with_retention(7, 3).retention_runs, 3);
    }

    #[cfg(feature = "file-logging")]
    mod files {
        use super::super::*;

        fn at(stamp: &str) -> DateTime<Utc> {
            run_started_at(&format!("run_{}", stamp)).unwrap()
        }

        fn make_runs(base: &Path, stamps: &[&str]) {
            for stamp in stamps {
                std::fs::create_dir(base.join(format!("run_{}", stamp))).unwrap();
            }
        }

        #[test]
        fn test_run_dir_uses_timestamp() {
            let base = tempfile::tempdir().unwrap();
            let now = at("20250314_081500");
            let a = create_run_dir(base.path(), now).unwrap();
            let b = create_run_dir(base.path(), now).unwrap();
            assert_eq!(a.file_name().unwrap(), "run_20250314_081500");
            assert_eq!(b.file_name().unwrap(), "run_20250314_081500_1");
            assert_eq!(run_started_at("run_20250314_081500_1"), Some(now));
            assert_eq!(run_started_at("notes"), None);
        }

        #[test]
        fn test_runs_older_than_retention_removed() {
            let base = tempfile::tempdir().unwrap();
            make_runs(base.path(), &["20250101_000000", "20250220_000000"]);
            let now = at("20250301_000000");
            let current = create_run_dir(base.path(), now).unwrap();

            let removed = cleanup_old_logs(base.path(), 30, 10, now, &current).unwrap();
            assert_eq!(removed, 1);
            assert!(!base.path().join("run_20250101_000000").exists());
            assert!(base.path().join("run_20250220_000000").exists());
            assert!(current.exists());
        }

        #[test]
        fn test_only_most_recent_runs_kept() {
            let base = tempfile::tempdir().unwrap();
            make_runs(
                base.path(),
                &["20250301_010000", "20250301_020000", "20250301_030000"],
            );
            let now = at("20250301_040000");
            let current = create_run_dir(base.path(), now).unwrap();
            std::fs::write(base.path().join("README"), "not a run").unwrap();

            let removed = cleanup_old_logs(base.path(), 30, 2, now, &current).unwrap();
            assert_eq!(removed, 2);
            assert!(base.path().join("run_20250301_030000").exists());
            assert!(!base.path().join("run_20250301_020000").exists());
            assert!(!base.path().join("run_20250301_010000").exists());
            assert!(base.path().join("README").exists());
            assert!(current.exists());
        }
    }

    #[cfg(not(feature = "file-logging"))]
    #[test]
    fn test_file_logging_needs_feature() {
        let files = FileLogging::new(std::env::temp_dir());
        let err = init_logging("info", &CrateDebugFlags::default(), Some(&files)).unwrap_err();
        assert!(matches!(err, ObservabilityError::FileLoggingDisabled));
    }
}
