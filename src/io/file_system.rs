//! File system abstraction layer
//!
//! Provides trait-based abstractions for the few file system operations the
//! engine needs, so reference rendering and definition expansion can be
//! exercised against an in-memory file system.

use std::path::Path;

// ============================================================================
// File System Trait
// ============================================================================

/// Trait for file system operations
pub trait FileSystemTrait: Clone + Send + Sync {
    /// Read file contents as bytes
    fn read(&self, path: &Path) -> Result<Vec<u8>, std::io::Error>;

    /// Read file contents as text, replacing invalid UTF-8 sequences
    fn read_to_string(&self, path: &Path) -> Result<String, std::io::Error> {
        let bytes = self.read(path)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

// ============================================================================
// Real File System Implementation
// ============================================================================

/// Real file system implementation using std::fs
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystemTrait for RealFileSystem {
    fn read(&self, path: &Path) -> Result<Vec<u8>, std::io::Error> {
        std::fs::read(path)
    }
}

// ============================================================================
// Test File System Implementation
// ============================================================================


#[cfg(test)]
pub use test_filesystem::TestFileSystem;

// ============================================================================
// Tests
// ============================================================================
