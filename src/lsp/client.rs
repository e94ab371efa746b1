//! High-level LSP client
//!
//! Provides a typed, high-level API for Language Server Protocol
//! communication using the lsp-types crate for full type safety.

use lsp_types::{
    ClientCapabilities, DidChangeTextDocumentParams, DidOpenTextDocumentParams,
    DocumentSymbolParams, DocumentSymbolResponse, InitializeParams, InitializeResult,
    InitializedParams, Location, PartialResultParams, Position, ReferenceContext, ReferenceParams,
    TextDocumentClientCapabilities, TextDocumentContentChangeEvent, TextDocumentIdentifier,
    TextDocumentItem, TextDocumentPositionParams, Uri, VersionedTextDocumentIdentifier,
    WorkDoneProgressParams, WorkspaceClientCapabilities, WorkspaceFolder, WorkspaceSymbolParams,
};
use serde_json::Value;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::lsp::protocol::{JsonRpcClient, JsonRpcError};
use crate::symbol::location::pathbuf_from_uri;

// ============================================================================
// LSP Client Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LspError {
    #[error("JSON-RPC error: {0}")]
    JsonRpc(#[from] JsonRpcError),

    #[error("LSP client not initialized")]
    NotInitialized,

    #[error("LSP protocol error: {0}")]
    Protocol(String),
}

// ============================================================================
// High-level LSP Client
// ============================================================================

/// High-level LSP client over any async byte stream pair
pub struct LspClient {
    rpc_client: JsonRpcClient,

    initialized: bool,
}

impl LspClient {
    pub fn new<R, W>(reader: R, writer: W, request_timeout: Duration) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self {
            rpc_client: JsonRpcClient::new(reader, writer, request_timeout),
            initialized: false,
        }
    }

    /// Run the `initialize` handshake for `root_uri`
    pub async fn initialize(
        &mut self,
        root_uri: Uri,
        timeout: Duration,
    ) -> Result<InitializeResult, LspError> {
        if self.initialized {
            return Err(LspError::Protocol("Client already initialized".to_string()));
        }

        info!("Initializing LSP client for {}", root_uri.as_str());

        let root_name = pathbuf_from_uri(&root_uri)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "workspace".to_string());

        let params = InitializeParams {
            process_id: Some(std::process::id()),
            #[allow(deprecated)]
            root_path: None,
            #[allow(deprecated)]
            root_uri: Some(root_uri.clone()),
            initialization_options: None,
            work_done_progress_params: WorkDoneProgressParams::default(),
            capabilities: ClientCapabilities {
                workspace: Some(WorkspaceClientCapabilities {
                    workspace_folders: Some(true),
                    symbol: Some(lsp_types::WorkspaceSymbolClientCapabilities {
                        dynamic_registration: Some(false),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                text_document: Some(TextDocumentClientCapabilities {
                    references: Some(lsp_types::ReferenceClientCapabilities {
                        dynamic_registration: Some(false),
                    }),
                    document_symbol: Some(lsp_types::DocumentSymbolClientCapabilities {
                        dynamic_registration: Some(false),
                        symbol_kind: None,
                        hierarchical_document_symbol_support: Some(true),
                        tag_support: None,
                    }),
                    ..Default::default()
                }),
                window: None,
                general: None,
                experimental: None,
                notebook_document: None,
            },
            trace: None,
            workspace_folders: Some(vec![WorkspaceFolder {
                uri: root_uri,
                name: root_name,
            }]),
            client_info: Some(lsp_types::ClientInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
            locale: None,
        };

        let result: InitializeResult = self
            .rpc_client
            .request_with_timeout("initialize", Some(params), timeout)
            .await?;

        debug!("LSP server capabilities: {:?}", result.capabilities);

        self.rpc_client
            .notify("initialized", Some(InitializedParams {}))?;

        self.initialized = true;
        info!("LSP client initialized successfully");
        Ok(result)
    }

    /// Send `shutdown` followed by `exit`
    pub async fn shutdown(&mut self) -> Result<(), LspError> {
        if !self.initialized {
            return Ok(());
        }

        info!("Shutting down LSP client");
        let _: Value = self.rpc_client.request("shutdown", None::<Value>).await?;
        self.rpc_client.notify("exit", None::<Value>)?;
        self.initialized = false;
        Ok(())
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> Result<(), LspError> {
        if self.initialized {
            Ok(())
        } else {
            Err(LspError::NotInitialized)
        }
    }

    // ========================================================================
    // Symbol and Navigation Methods
    // ========================================================================

    /// Raw `workspace/symbol` payload; decoding is left to the caller since
    /// servers answer in several shapes
    pub async fn workspace_symbol(&self, query: &str) -> Result<Value, LspError> {
        self.ensure_initialized()?;
        let params = WorkspaceSymbolParams {
            partial_result_params: PartialResultParams::default(),
            work_done_progress_params: WorkDoneProgressParams::default(),
            query: query.to_string(),
        };
        Ok(self
            .rpc_client
            .request("workspace/symbol", Some(params))
            .await?)
    }

    pub async fn references(
        &self,
        uri: Uri,
        position: Position,
        include_declaration: bool,
    ) -> Result<Vec<Location>, LspError> {
        self.ensure_initialized()?;
        let params = ReferenceParams {
            text_document_position: TextDocumentPositionParams {
                text_document: TextDocumentIdentifier { uri },
                position,
            },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
            context: ReferenceContext {
                include_declaration,
            },
        };
        let locations: Option<Vec<Location>> = self
            .rpc_client
            .request("textDocument/references", Some(params))
            .await?;
        Ok(locations.unwrap_or_default())
    }

    pub async fn document_symbol(
        &self,
        uri: Uri,
    ) -> Result<Option<DocumentSymbolResponse>, LspError> {
        self.ensure_initialized()?;
        let params = DocumentSymbolParams {
            text_document: TextDocumentIdentifier { uri },
            work_done_progress_params: WorkDoneProgressParams::default(),
            partial_result_params: PartialResultParams::default(),
        };
        Ok(self
            .rpc_client
            .request("textDocument/documentSymbol", Some(params))
            .await?)
    }

    // ========================================================================
    // Document Synchronization
    // ========================================================================

    pub fn did_open(
        &self,
        uri: Uri,
        language_id: &str,
        version: i32,
        text: String,
    ) -> Result<(), LspError> {
        self.ensure_initialized()?;
        let params = DidOpenTextDocumentParams {
            text_document: TextDocumentItem {
                uri,
                language_id: language_id.to_string(),
                version,
                text,
            },
        };
        Ok(self
            .rpc_client
            .notify("textDocument/didOpen", Some(params))?)
    }

    pub fn did_change(&self, uri: Uri, version: i32, text: String) -> Result<(), LspError> {
        self.ensure_initialized()?;
        let params = DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier { uri, version },
            content_changes: vec![TextDocumentContentChangeEvent {
                range: None,
                range_length: None,
                text,
            }],
        };
        Ok(self
            .rpc_client
            .notify("textDocument/didChange", Some(params))?)
    }
}
