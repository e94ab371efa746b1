//! Language Server Protocol transport
//!
//! Three layers, bottom to top:
//! - **framing**: `Content-Length` message framing as a tokio codec
//! - **protocol**: JSON-RPC 2.0 request/response correlation
//! - **client**: typed LSP requests and notifications

pub mod client;
pub mod framing;
pub mod protocol;

pub use client::{LspClient, LspError};
