mod backend;
mod config;
mod context;
mod diagnostics;
mod error;
mod io;
mod logging;
mod lsp;
mod symbol;
mod warmup;

#[cfg(test)]
mod test_utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Level, error, info, warn};

use backend::{LspBackend, SymbolBackend};
use config::BridgeConfig;
use context::{DefinitionResolver, ReferenceAggregator};
use diagnostics::TracingDiagnostics;
use error::ContextError;
use io::RealFileSystem;
use logging::{LogConfig, init_logging};
use warmup::strategy_for;

/// Source context for symbols, resolved through a language server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Workspace root handed to the language server (defaults to current directory)
    #[arg(long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Language server executable (overrides LSP_BRIDGE_SERVER_PATH env var)
    #[arg(long, value_name = "PATH", global = true)]
    server_path: Option<String>,

    /// Extra argument passed to the language server; repeatable
    #[arg(long = "server-arg", value_name = "ARG", global = true, allow_hyphen_values = true)]
    server_args: Vec<String>,

    /// Skip the backend warm-up step
    #[arg(long, global = true)]
    no_warmup: bool,

    /// Log level (overrides RUST_LOG env var)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,

    /// Log file path (overrides LSP_BRIDGE_LOG_FILE env var)
    #[arg(long, value_name = "FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Print the full source definition of every symbol matching SYMBOL
    Definition {
        symbol: String,
    },
    /// Print every reference to SYMBOL with surrounding source lines
    References {
        symbol: String,

        /// Lines of context around each reference (overrides LSP_CONTEXT_LINES env var)
        #[arg(long, value_name = "N")]
        context_lines: Option<usize>,
    },
}

impl Command {
    fn context_lines(&self) -> Option<usize> {
        match self {
            Command::Definition { .. } => None,
            Command::References { context_lines, .. } => *context_lines,
        }
    }
}

/// Execute one command against an initialized backend
async fn run_command(
    command: &Command,
    backend: &dyn SymbolBackend,
    context_lines: usize,
) -> Result<String, ContextError> {
    let diagnostics = TracingDiagnostics;
    match command {
        Command::Definition { symbol } => {
            DefinitionResolver::new(backend, &diagnostics)
                .resolve_definitions(symbol)
                .await
        }
        Command::References { symbol, .. } => {
            ReferenceAggregator::new(backend, RealFileSystem, &diagnostics)
                .find_references(symbol, context_lines)
                .await
        }
    }
}

/// Start the server, warm it up and run the command; returns stdout text
async fn run(args: &Args) -> Result<String, Box<dyn std::error::Error>> {
    let root = match args.root.clone() {
        Some(root) => root,
        None => std::env::current_dir()?,
    };
    let root = root
        .canonicalize()
        .map_err(|e| format!("Invalid workspace root {}: {}", root.display(), e))?;

    let config = BridgeConfig::from_env(root)
        .with_server_path(args.server_path.clone())
        .with_server_args(args.server_args.clone())
        .with_context_lines(args.command.context_lines());
    info!(
        "Using language server {} for {}",
        config.server.command,
        config.server.root.display()
    );

    let started = Instant::now();
    let backend = LspBackend::start(&config.server).await?;
    log_timing!(Level::INFO, "server_start", started.elapsed());

    if args.no_warmup {
        info!("Warm-up disabled");
    } else {
        let started = Instant::now();
        let strategy = strategy_for(
            &config.server.server_name(),
            config.warmup.clone(),
            Arc::new(TracingDiagnostics),
        );
        strategy.warm_up(&backend, &config.server.root).await;
        log_timing!(Level::INFO, "warm_up", started.elapsed());
    }

    let started = Instant::now();
    let result = run_command(&args.command, &backend, config.context_lines).await;
    log_timing!(Level::INFO, "command", started.elapsed());

    if let Err(e) = backend.shutdown().await {
        warn!("Language server did not shut down cleanly: {}", e);
    }

    Ok(result?)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let log_config = LogConfig::from_env().with_overrides(args.log_level.clone(), args.log_file.clone());
    if let Err(e) = init_logging(log_config) {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }

    match run(&args).await {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MockBackend;

    #[test]
    fn test_parse_references_with_global_flags() {
        let args = Args::try_parse_from([
            "lsp-context-bridge",
            "references",
            "Calculator::add",
            "--context-lines",
            "2",
            "--server-path",
            "/usr/bin/clangd-18",
            "--server-arg",
            "--background-index",
            "--no-warmup",
        ])
        .unwrap();

        assert_eq!(
            args.command,
            Command::References {
                symbol: "Calculator::add".to_string(),
                context_lines: Some(2),
            }
        );
        assert_eq!(args.command.context_lines(), Some(2));
        assert_eq!(args.server_path.as_deref(), Some("/usr/bin/clangd-18"));
        assert_eq!(args.server_args, vec!["--background-index".to_string()]);
        assert!(args.no_warmup);
    }

    #[test]
    fn test_parse_definition() {
        let args =
            Args::try_parse_from(["lsp-context-bridge", "--root", "/work", "definition", "main"])
                .unwrap();
        assert_eq!(
            args.command,
            Command::Definition {
                symbol: "main".to_string()
            }
        );
        assert_eq!(args.root, Some(PathBuf::from("/work")));
        assert_eq!(args.command.context_lines(), None);
    }

    #[test]
    fn test_subcommand_is_required() {
        assert!(Args::try_parse_from(["lsp-context-bridge"]).is_err());
    }

    #[tokio::test]
    async fn test_command_failure_message_is_readable() {
        let backend = MockBackend::new().with_symbol_error("add", "server gone");
        let error: Box<dyn std::error::Error> = run_command(
            &Command::References {
                symbol: "add".to_string(),
                context_lines: None,
            },
            &backend,
            5,
        )
        .await
        .unwrap_err()
        .into();

        assert_eq!(
            error.to_string(),
            "failed to fetch symbol: Backend unavailable: server gone"
        );
    }

    #[tokio::test]
    async fn test_run_reports_missing_server_by_message() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args::try_parse_from([
            "lsp-context-bridge",
            "--root",
            dir.path().to_str().unwrap(),
            "--server-path",
            "definitely-not-a-language-server-binary",
            "--no-warmup",
            "definition",
            "main",
        ])
        .unwrap();

        let error = run(&args).await.unwrap_err();
        assert!(
            error
                .to_string()
                .starts_with("Process error: Failed to spawn 'definitely-not-a-language-server-binary'")
        );
    }

    #[tokio::test]
    async fn test_run_command_dispatches_to_engine() {
        let backend = MockBackend::new();

        let definition = run_command(
            &Command::Definition {
                symbol: "missing_symbol".to_string(),
            },
            &backend,
            5,
        )
        .await
        .unwrap();
        assert_eq!(definition, "missing_symbol not found");

        let references = run_command(
            &Command::References {
                symbol: "missing_symbol".to_string(),
                context_lines: None,
            },
            &backend,
            5,
        )
        .await
        .unwrap();
        assert_eq!(references, "No references found for symbol: missing_symbol");
    }
}
