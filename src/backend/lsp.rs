//! `SymbolBackend` over a language server process

use async_trait::async_trait;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::backend::definition::expand_definition;
use crate::backend::files::{OpenFileTracker, OpenOutcome};
use crate::backend::{BackendError, SymbolBackend, SymbolResultSet};
use crate::config::ServerConfig;
use crate::io::{FileSystemTrait, RealFileSystem, ServerProcess, StopMode};
use crate::lsp::LspClient;
use crate::symbol::FileLocation;
use crate::symbol::location::uri_from_path;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Language server session used as the engine's backend
pub struct LspBackend<F: FileSystemTrait = RealFileSystem> {
    client: LspClient,
    process: Option<ServerProcess>,
    documents: Mutex<OpenFileTracker>,
    fs: F,
}

impl LspBackend<RealFileSystem> {
    /// Spawn the configured server and complete the initialize handshake
    pub async fn start(config: &ServerConfig) -> Result<Self, BackendError> {
        info!(
            "Starting language server {} in {}",
            config.command,
            config.root.display()
        );

        let mut process = ServerProcess::spawn(&config.command, &config.args, Some(&config.root))?;
        let (stdout, stdin) = process.take_stdio()?;
        let mut client = LspClient::new(stdout, stdin, config.request_timeout);

        let handshake = match uri_from_path(&config.root) {
            Ok(root_uri) => client
                .initialize(root_uri, config.init_timeout)
                .await
                .map_err(BackendError::from),
            Err(e) => Err(BackendError::from(e)),
        };

        if let Err(e) = handshake {
            warn!("Language server failed to initialize: {}", e);
            if let Err(stop_error) = process.stop(StopMode::Force).await {
                debug!("Failed to stop language server: {}", stop_error);
            }
            return Err(e);
        }

        Ok(Self::from_parts(client, Some(process), RealFileSystem))
    }
}

impl<F: FileSystemTrait> LspBackend<F> {
    /// Assemble a backend from an already initialized client
    pub fn from_parts(client: LspClient, process: Option<ServerProcess>, fs: F) -> Self {
        Self {
            client,
            process,
            documents: Mutex::new(OpenFileTracker::new()),
            fs,
        }
    }

    /// Shut the server down politely, then reap the process
    pub async fn shutdown(mut self) -> Result<(), BackendError> {
        if let Err(e) = self.client.shutdown().await {
            warn!("Language server shutdown request failed: {}", e);
        }
        if let Some(mut process) = self.process.take() {
            process.stop(StopMode::Graceful(SHUTDOWN_GRACE)).await?;
        }
        Ok(())
    }

    fn read_source(&self, path: &Path) -> Result<String, BackendError> {
        self.fs
            .read_to_string(path)
            .map_err(|source| BackendError::FileRead {
                path: path.to_path_buf(),
                source,
            })
    }
}

#[async_trait]
impl<F: FileSystemTrait + 'static> SymbolBackend for LspBackend<F> {
    async fn symbol(&self, query: &str) -> Result<SymbolResultSet, BackendError> {
        debug!("workspace/symbol query {:?}", query);
        let payload = self.client.workspace_symbol(query).await?;
        Ok(SymbolResultSet::new(payload))
    }

    async fn open_file(&self, path: &Path) -> Result<(), BackendError> {
        let content = self.read_source(path)?;
        let mut documents = self
            .documents
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let outcome = documents.ensure_open(path, content, &self.client)?;
        if outcome != OpenOutcome::Unchanged {
            debug!("{} open documents", documents.open_count());
        }
        Ok(())
    }

    async fn references(
        &self,
        location: &FileLocation,
        include_declaration: bool,
    ) -> Result<Vec<FileLocation>, BackendError> {
        let uri = location.lsp_uri()?;
        let locations = self
            .client
            .references(uri, location.range.start.into(), include_declaration)
            .await?;
        Ok(locations.iter().map(FileLocation::from).collect())
    }

    async fn full_definition(
        &self,
        location: &FileLocation,
    ) -> Result<(String, FileLocation), BackendError> {
        let uri = location.lsp_uri()?;
        let symbols = self.client.document_symbol(uri).await?;
        let text = self.read_source(&location.file_path)?;
        expand_definition(&location.file_path, &text, symbols.as_ref(), location)
    }
}
