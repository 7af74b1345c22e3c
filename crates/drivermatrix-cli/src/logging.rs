//! Logging setup for the runner
//!
//! Diagnostics go to stderr so the transcript and report on stdout stay
//! machine-parseable. `RUST_LOG` takes precedence over the default filter.
//! With `--log-file`, a JSON copy of every event is written as well.

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// JSON log file, if any
    pub log_file: Option<PathBuf>,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Whether to log span open/close (check timing)
    pub enable_spans: bool,

    /// Filter used when `RUST_LOG` is unset
    pub default_filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            include_location: cfg!(debug_assertions),
            enable_spans: false,
            default_filter: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        if path.is_some() {
            // the file is for debugging a run, so record what each check did
            self.enable_spans = true;
            self.default_filter =
                "warn,drivermatrix_core=debug,drivermatrix_driver_mongodb=debug".to_string();
        }
        self.log_file = path;
        self
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// until the process exits.
pub fn init(config: LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.default_filter));

    let span_events = if config.enable_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let mut layers = Vec::new();

    let console_layer = fmt::layer()
        .with_target(true)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(env_filter.clone())
        .boxed();
    layers.push(console_layer);

    let mut guard = None;
    if let Some(path) = &config.log_file {
        let (directory, file_name) = split_log_path(path)?;
        std::fs::create_dir_all(&directory)?;
        let file_appender = tracing_appender::rolling::never(&directory, file_name);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_span_events(span_events)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(env_filter)
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry().with(layers).try_init()?;

    tracing::debug!(
        log_file = ?config.log_file,
        "logging initialized"
    );

    Ok(guard)
}

fn split_log_path(path: &Path) -> anyhow::Result<(PathBuf, &std::ffi::OsStr)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, file_name))
}
