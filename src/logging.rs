use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log file path; stderr is used when unset
pub const LOG_FILE_ENV: &str = "LSP_BRIDGE_LOG_FILE";

/// When "true", the process id is inserted into the log file name
pub const LOG_UNIQUE_ENV: &str = "LSP_BRIDGE_LOG_UNIQUE";

/// When "true", log lines are written as JSON
pub const LOG_JSON_ENV: &str = "LSP_BRIDGE_LOG_JSON";

/// Configuration for the logging system
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level filter (e.g., "debug", "info", "warn", "error")
    pub level: String,
    /// Optional log file path. If None, logs only to stderr
    pub file_path: Option<PathBuf>,
    /// Whether to use structured JSON format for logs
    pub json_format: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file_path: None,
            json_format: false,
        }
    }
}

impl LogConfig {
    /// Create LogConfig from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create LogConfig from an arbitrary key lookup
    pub fn from_lookup<L>(lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        // stdout carries the rendered context, so stay quiet by default
        let level = lookup("RUST_LOG").unwrap_or_else(|| "warn".to_string());
        let unique = lookup(LOG_UNIQUE_ENV).is_some_and(|value| value == "true");
        let file_path = lookup(LOG_FILE_ENV).map(|path| {
            let path = PathBuf::from(path);
            if unique {
                with_pid_suffix(path, std::process::id())
            } else {
                path
            }
        });
        let json_format = lookup(LOG_JSON_ENV).is_some_and(|value| value == "true");

        Self {
            level,
            file_path,
            json_format,
        }
    }

    /// Override values from CLI arguments
    pub fn with_overrides(mut self, level: Option<String>, file_path: Option<PathBuf>) -> Self {
        if let Some(level) = level {
            self.level = level;
        }
        if let Some(file_path) = file_path {
            self.file_path = Some(file_path);
        }
        self
    }
}

/// `bridge.log` becomes `bridge.<pid>.log`
fn with_pid_suffix(mut path: PathBuf, pid: u32) -> PathBuf {
    let Some(stem) = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()) else {
        return path;
    };
    let unique_name = match path.extension().and_then(|ext| ext.to_str()) {
        Some(extension) if !extension.is_empty() => format!("{}.{}.{}", stem, pid, extension),
        _ => format!("{}.{}", stem, pid),
    };
    path.set_file_name(unique_name);
    path
}

/// Initialize the logging system based on configuration
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_new(&config.level).or_else(|_| EnvFilter::try_new("warn"))?;
    let subscriber = tracing_subscriber::registry().with(env_filter);

    match (&config.file_path, config.json_format) {
        (Some(file_path), true) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;
            subscriber
                .with(fmt::layer().json().with_writer(file).with_ansi(false))
                .init();
        }
        (Some(file_path), false) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(file_path)?;
            subscriber
                .with(
                    fmt::layer()
                        .with_writer(file)
                        .with_ansi(false)
                        .with_target(true)
                        .with_line_number(true),
                )
                .init();
        }
        (None, true) => {
            subscriber
                .with(fmt::layer().json().with_writer(io::stderr).with_ansi(false))
                .init();
        }
        (None, false) => {
            subscriber
                .with(
                    fmt::layer()
                        .with_writer(io::stderr)
                        .with_ansi(true)
                        .with_target(true),
                )
                .init();
        }
    }

    Ok(())
}

/// Log how long an operation took
#[macro_export]
macro_rules! log_timing {
    ($level:expr, $operation:expr, $duration:expr) => {
        tracing::event!(
            $level,
            operation = $operation,
            duration_ms = $duration.as_millis(),
            pid = std::process::id(),
            "Performance timing"
        );
    };
}
