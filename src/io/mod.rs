//! I/O layer - Generic abstractions for process management and file access
//!
//! - **Process**: language server process lifecycle with stdio hand-off
//! - **File system**: trait-based file reads, swappable in tests

pub mod file_system;
pub mod process;

pub use file_system::{FileSystemTrait, RealFileSystem};
pub use process::{ProcessError, ServerProcess, StopMode};
