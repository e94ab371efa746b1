//! Backend warm-up
//!
//! Some servers answer the first queries slowly while they load their
//! index. A warm-up strategy runs once after startup to front-load that
//! cost. Warm-up is best effort: every failure is logged and swallowed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::{DirEntry, WalkDir};

use crate::backend::SymbolBackend;
use crate::config::WarmUpConfig;
use crate::diagnostics::Diagnostics;

const COMPONENT: &str = "warmup";

#[async_trait]
pub trait WarmUpStrategy: Send + Sync {
    /// Prepare `backend` for queries about `workspace_root`; never fails
    async fn warm_up(&self, backend: &dyn SymbolBackend, workspace_root: &Path);
}

/// Strategy for servers that need nothing
#[derive(Debug, Default)]
pub struct NoWarmUp;

#[async_trait]
impl WarmUpStrategy for NoWarmUp {
    async fn warm_up(&self, _backend: &dyn SymbolBackend, _workspace_root: &Path) {}
}

/// clangd: prime the static index, then open a few translation units
pub struct ClangdWarmUp {
    config: WarmUpConfig,
    diagnostics: Arc<dyn Diagnostics>,
}

impl ClangdWarmUp {
    pub fn new(config: WarmUpConfig, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            config,
            diagnostics,
        }
    }

    async fn prime_index(&self, backend: &dyn SymbolBackend) {
        self.diagnostics
            .info(COMPONENT, "Warming up static index".to_string());

        // "::" loads the index, "" then touches every symbol in it
        for (step, query) in ["::", ""].into_iter().enumerate() {
            if step > 0 {
                tokio::time::sleep(self.config.index_query_delay).await;
            }
            match backend.symbol(query).await {
                Ok(_) => self
                    .diagnostics
                    .debug(COMPONENT, format!("Warm-up query {:?} completed", query)),
                Err(e) => self
                    .diagnostics
                    .warn(COMPONENT, format!("Warm-up query {:?} failed: {}", query, e)),
            }
        }
    }

    async fn open_core_files(&self, backend: &dyn SymbolBackend, workspace_root: &Path) {
        let candidates = collect_source_files(workspace_root, &self.config, &*self.diagnostics);
        self.diagnostics.debug(
            COMPONENT,
            format!(
                "{} source files found under {}",
                candidates.len(),
                workspace_root.display()
            ),
        );

        let mut opened = 0;
        for path in candidates {
            if opened >= self.config.max_files {
                break;
            }
            if let Err(e) = backend.open_file(&path).await {
                self.diagnostics.warn(
                    COMPONENT,
                    format!("Failed to open {}: {}", path.display(), e),
                );
                continue;
            }
            self.diagnostics
                .debug(COMPONENT, format!("Opened {}", path.display()));
            opened += 1;
            tokio::time::sleep(self.config.open_delay).await;
        }

        self.diagnostics
            .info(COMPONENT, format!("Opened {} source files", opened));
    }
}

#[async_trait]
impl WarmUpStrategy for ClangdWarmUp {
    async fn warm_up(&self, backend: &dyn SymbolBackend, workspace_root: &Path) {
        self.prime_index(backend).await;
        self.open_core_files(backend, workspace_root).await;
    }
}

/// Pick the strategy for a server executable name
pub fn strategy_for(
    server_name: &str,
    config: WarmUpConfig,
    diagnostics: Arc<dyn Diagnostics>,
) -> Box<dyn WarmUpStrategy> {
    if server_name.starts_with("clangd") {
        Box::new(ClangdWarmUp::new(config, diagnostics))
    } else {
        Box::new(NoWarmUp)
    }
}

fn is_skipped_dir(entry: &DirEntry, config: &WarmUpConfig) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || config.skip_dirs.iter().any(|skip| *skip == name)
}

/// Source files under `root` in file-name order, skipping hidden and build
/// directories
pub fn collect_source_files(
    root: &Path,
    config: &WarmUpConfig,
    diagnostics: &dyn Diagnostics,
) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_skipped_dir(entry, config));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                diagnostics.warn(COMPONENT, format!("Skipping unreadable entry: {}", e));
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let is_source = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| config.source_extensions.iter().any(|wanted| wanted == ext));
        if is_source {
            files.push(entry.into_path());
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::MockBackend;
    use crate::diagnostics::{DiagnosticLevel, RecordingDiagnostics};
    use crate::test_utils::fixtures::{source_tree, write_file};
    use std::time::Duration;

    #[cfg(feature = "test-logging")]
    crate::setup_test_logging!();

    fn fast_config() -> WarmUpConfig {
        WarmUpConfig {
            index_query_delay: Duration::ZERO,
            open_delay: Duration::ZERO,
            ..WarmUpConfig::default()
        }
    }

    #[test]
    fn test_collect_skips_hidden_and_build_dirs() {
        let dir = source_tree(&[
            ("src/a.cpp", "int a;"),
            ("src/b.cc", "int b;"),
            ("src/c.hpp", "int c;"),
            ("lib/d.cxx", "int d;"),
            (".cache/e.cpp", "int e;"),
            ("build/f.cpp", "int f;"),
            ("cmake-build-debug/g.cpp", "int g;"),
        ]);
        let root = dir.path();

        let diagnostics = RecordingDiagnostics::new();
        let files = collect_source_files(root, &fast_config(), &diagnostics);
        let relative: Vec<PathBuf> = files
            .iter()
            .map(|path| path.strip_prefix(root).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("lib/d.cxx"),
                PathBuf::from("src/a.cpp"),
                PathBuf::from("src/b.cc"),
            ]
        );
    }

    #[test]
    fn test_hidden_workspace_root_is_still_walked() {
        let dir = source_tree(&[]);
        let root = dir.path().join(".workspace");
        write_file(&root, "main.cpp", "int main() {}");

        let diagnostics = RecordingDiagnostics::new();
        let files = collect_source_files(&root, &fast_config(), &diagnostics);
        assert_eq!(files, vec![root.join("main.cpp")]);
    }

    #[tokio::test]
    async fn test_clangd_warm_up_queries_then_opens_at_most_three() {
        let dir = source_tree(&[
            ("a.cpp", ""),
            ("b.cpp", ""),
            ("c.cpp", ""),
            ("d.cpp", ""),
            ("e.cpp", ""),
        ]);
        let root = dir.path();

        let backend = MockBackend::new().with_open_failure(root.join("b.cpp"));
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let strategy = ClangdWarmUp::new(fast_config(), diagnostics.clone());

        strategy.warm_up(&backend, root).await;

        let expected: Vec<String> = vec![
            "symbol:::".to_string(),
            "symbol:".to_string(),
            format!("open:{}", root.join("a.cpp").display()),
            format!("open:{}", root.join("b.cpp").display()),
            format!("open:{}", root.join("c.cpp").display()),
            format!("open:{}", root.join("d.cpp").display()),
        ];
        assert_eq!(backend.calls(), expected);
        assert_eq!(diagnostics.messages_at_least(DiagnosticLevel::Warn).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_index_queries_do_not_stop_warm_up() {
        let dir = source_tree(&[("main.cpp", "int main() {}")]);

        let backend = MockBackend::new()
            .with_symbol_error("::", "not ready")
            .with_symbol_error("", "not ready");
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let strategy = ClangdWarmUp::new(fast_config(), diagnostics.clone());

        strategy.warm_up(&backend, dir.path()).await;

        assert_eq!(backend.calls().len(), 3);
        assert_eq!(diagnostics.messages_at_least(DiagnosticLevel::Warn).len(), 2);
    }

    #[tokio::test]
    async fn test_missing_workspace_is_tolerated() {
        let backend = MockBackend::new();
        let diagnostics = Arc::new(RecordingDiagnostics::new());
        let strategy = ClangdWarmUp::new(fast_config(), diagnostics.clone());

        strategy
            .warm_up(&backend, Path::new("/definitely/not/a/workspace"))
            .await;

        assert_eq!(backend.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_strategy_selection_by_server_name() {
        let diagnostics: Arc<dyn Diagnostics> = Arc::new(RecordingDiagnostics::new());
        let backend = MockBackend::new();

        strategy_for("gopls", fast_config(), diagnostics.clone())
            .warm_up(&backend, Path::new("/tmp"))
            .await;
        assert!(backend.calls().is_empty());

        strategy_for("clangd-18", fast_config(), diagnostics)
            .warm_up(&backend, Path::new("/definitely/not/a/workspace"))
            .await;
        assert_eq!(backend.calls().len(), 2);
    }
}
