//! Bridge configuration
//!
//! Everything tunable is read once at startup into [`BridgeConfig`] and
//! passed down explicitly. Environment lookups go through a closure so the
//! parsing rules can be tested without touching the process environment.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Lines of context shown around each reference
pub const CONTEXT_LINES_ENV: &str = "LSP_CONTEXT_LINES";

/// Language server executable, overridden by `--server-path`
pub const SERVER_PATH_ENV: &str = "LSP_BRIDGE_SERVER_PATH";

pub const DEFAULT_CONTEXT_LINES: usize = 5;

pub const DEFAULT_SERVER_PATH: &str = "clangd";

/// Default timeout for LSP initialization (30 seconds)
///
/// Leaves clangd time to load compile_commands.json before answering.
pub const DEFAULT_INITIALIZATION_TIMEOUT_SECS: u64 = 30;

/// Default timeout for individual LSP requests (10 seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Core Configuration Types
// ============================================================================

/// Tuning for backend warm-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarmUpConfig {
    /// Upper bound on source files opened during warm-up
    pub max_files: usize,

    /// Pause between the two index-priming queries
    pub index_query_delay: Duration,

    /// Pause after each successful file open
    pub open_delay: Duration,

    /// Source extensions worth opening, without the dot
    pub source_extensions: Vec<String>,

    /// Directory names never descended into; hidden directories are always skipped
    pub skip_dirs: Vec<String>,
}

impl Default for WarmUpConfig {
    fn default() -> Self {
        Self {
            max_files: 3,
            index_query_delay: Duration::from_millis(100),
            open_delay: Duration::from_millis(50),
            source_extensions: vec!["cpp".into(), "cxx".into(), "cc".into()],
            skip_dirs: vec!["build".into(), "cmake-build-debug".into()],
        }
    }
}

/// How to launch and talk to the language server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Executable name or path
    pub command: String,

    pub args: Vec<String>,

    /// Workspace root, also the server's working directory
    pub root: PathBuf,

    pub init_timeout: Duration,

    pub request_timeout: Duration,
}

impl ServerConfig {
    pub fn new(command: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            root: root.into(),
            init_timeout: Duration::from_secs(DEFAULT_INITIALIZATION_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Executable file name without directory or extension, e.g. `clangd`
    pub fn server_name(&self) -> String {
        Path::new(&self.command)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.command.clone())
    }
}

/// Complete bridge configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Lines shown before and after each reference
    pub context_lines: usize,

    pub warmup: WarmUpConfig,

    pub server: ServerConfig,
}

impl BridgeConfig {
    /// Read configuration from the process environment
    pub fn from_env(root: impl Into<PathBuf>) -> Self {
        Self::from_lookup(root, |key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<L>(root: impl Into<PathBuf>, lookup: L) -> Self
    where
        L: Fn(&str) -> Option<String>,
    {
        let command = lookup(SERVER_PATH_ENV)
            .filter(|path| !path.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SERVER_PATH.to_string());

        Self {
            context_lines: parse_context_lines(lookup(CONTEXT_LINES_ENV).as_deref()),
            warmup: WarmUpConfig::default(),
            server: ServerConfig::new(command, root),
        }
    }

    /// Apply a command-line server path, which wins over the environment
    pub fn with_server_path(mut self, path: Option<String>) -> Self {
        if let Some(path) = path {
            self.server.command = path;
        }
        self
    }

    pub fn with_server_args(mut self, args: Vec<String>) -> Self {
        self.server.args = args;
        self
    }

    pub fn with_context_lines(mut self, context_lines: Option<usize>) -> Self {
        if let Some(lines) = context_lines {
            self.context_lines = lines;
        }
        self
    }
}

/// Parse a context-line count, falling back to the default on bad input
pub fn parse_context_lines(value: Option<&str>) -> usize {
    let Some(raw) = value else {
        return DEFAULT_CONTEXT_LINES;
    };

    match raw.trim().parse::<i64>() {
        Ok(lines) if lines >= 0 => usize::try_from(lines).unwrap_or(DEFAULT_CONTEXT_LINES),
        Ok(lines) => {
            warn!(
                "{} must not be negative (got {}), using {}",
                CONTEXT_LINES_ENV, lines, DEFAULT_CONTEXT_LINES
            );
            DEFAULT_CONTEXT_LINES
        }
        Err(_) => {
            warn!(
                "Invalid {} value {:?}, using {}",
                CONTEXT_LINES_ENV, raw, DEFAULT_CONTEXT_LINES
            );
            DEFAULT_CONTEXT_LINES
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_context_lines_parsing() {
        assert_eq!(parse_context_lines(None), 5);
        assert_eq!(parse_context_lines(Some("3")), 3);
        assert_eq!(parse_context_lines(Some(" 0 ")), 0);
        assert_eq!(parse_context_lines(Some("-2")), 5);
        assert_eq!(parse_context_lines(Some("lots")), 5);
        assert_eq!(parse_context_lines(Some("")), 5);
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = BridgeConfig::from_lookup("/work", lookup_from(&[]));
        assert_eq!(config.context_lines, DEFAULT_CONTEXT_LINES);
        assert_eq!(config.server.command, "clangd");
        assert_eq!(config.server.root, PathBuf::from("/work"));
        assert_eq!(config.warmup.max_files, 3);
        assert_eq!(
            config.server.request_timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }

    #[test]
    fn test_environment_values_are_applied() {
        let config = BridgeConfig::from_lookup(
            "/work",
            lookup_from(&[
                (CONTEXT_LINES_ENV, "2"),
                (SERVER_PATH_ENV, "/opt/llvm/bin/clangd-18"),
            ]),
        );
        assert_eq!(config.context_lines, 2);
        assert_eq!(config.server.command, "/opt/llvm/bin/clangd-18");
        assert_eq!(config.server.server_name(), "clangd-18");
    }

    #[test]
    fn test_command_line_overrides_environment() {
        let config = BridgeConfig::from_lookup(
            "/work",
            lookup_from(&[(CONTEXT_LINES_ENV, "2"), (SERVER_PATH_ENV, "clangd-17")]),
        )
        .with_server_path(Some("gopls".to_string()))
        .with_server_args(vec!["-remote=auto".to_string()])
        .with_context_lines(Some(9));

        assert_eq!(config.server.command, "gopls");
        assert_eq!(config.server.args, vec!["-remote=auto".to_string()]);
        assert_eq!(config.context_lines, 9);
    }

    #[test]
    fn test_absent_overrides_keep_values() {
        let config = BridgeConfig::from_lookup("/work", lookup_from(&[(CONTEXT_LINES_ENV, "1")]))
            .with_server_path(None)
            .with_context_lines(None);
        assert_eq!(config.context_lines, 1);
        assert_eq!(config.server.command, "clangd");
    }
}
